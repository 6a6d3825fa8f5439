// src/types.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.shodan.io";

/// Nominal number of matches Shodan returns on a full search page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub resolver: ResolverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: "ShodanFinder/0.1".to_string(),
            search: SearchConfig::default(),
            output: OutputConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub max_pages: u32,
    pub concurrency: usize,
    pub requests_per_second: u32,
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            concurrency: 5,
            requests_per_second: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub prefix: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub enabled: bool,
    pub concurrency: usize,
    pub timeout: Duration,
    pub nameservers: Vec<String>,
    pub use_system_resolver: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            concurrency: 50,
            timeout: Duration::from_secs(5),
            nameservers: vec![
                "8.8.8.8:53".to_string(),
                "8.8.4.4:53".to_string(),
                "1.1.1.1:53".to_string(),
                "1.0.0.1:53".to_string(),
            ],
            use_system_resolver: false,
        }
    }
}

/// Per-query record kept for the end-of-run summary.
#[derive(Debug)]
pub struct QueryOutcome {
    pub query: String,
    pub pages_fetched: u32,
    pub candidates: usize,
    pub error: Option<FinderError>,
}

impl QueryOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything one fan-out produced for a domain.
#[derive(Debug)]
pub struct Discovery {
    pub domain: String,
    pub hostnames: Vec<String>,
    pub outcomes: Vec<QueryOutcome>,
    pub dns_outcome: QueryOutcome,
    pub verified: bool,
    pub duration: Duration,
}

impl Discovery {
    /// Failed search queries followed by the DNS fetch, if it failed too.
    pub fn failures(&self) -> impl Iterator<Item = &QueryOutcome> {
        self.outcomes
            .iter()
            .chain(std::iter::once(&self.dns_outcome))
            .filter(|outcome| outcome.is_failure())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureRecord {
    pub query: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: String,
    pub total: usize,
    pub queries_used: Vec<String>,
    pub subdomains: Vec<String>,
    pub failures: Vec<FailureRecord>,
    pub verified: bool,
    pub duration_secs: f64,
    pub timestamp: String,
}

impl DomainReport {
    pub fn from_discovery(discovery: &Discovery, queries: &[String]) -> Self {
        Self {
            domain: discovery.domain.clone(),
            total: discovery.hostnames.len(),
            queries_used: queries.to_vec(),
            subdomains: discovery.hostnames.clone(),
            failures: discovery
                .failures()
                .map(|outcome| FailureRecord {
                    query: outcome.query.clone(),
                    error: outcome
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_default(),
                })
                .collect(),
            verified: discovery.verified,
            duration_secs: discovery.duration.as_secs_f64(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("API error: {0}")]
    ApiError(String),

    #[error("JSON parse error: {0}\nBody: {1}")]
    JsonParseError(String, String),

    #[error("Resolution error: {0}")]
    ResolutionError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}
