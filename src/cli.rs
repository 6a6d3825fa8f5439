use crate::config::parse_format;
use crate::error::Result;
use crate::types::Config;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "shodanfinder",
    version,
    about = "Subdomain discovery through the Shodan search API",
    long_about = "ShodanFinder runs a battery of Shodan searches for a domain, pulls hostnames out of\nevery match (hostnames, certificate subjects and SANs, HTTP metadata), merges them with\nShodan's DNS subdomain list and optionally keeps only the names that resolve."
)]
pub struct Args {
    /// Target domain
    #[arg(value_name = "DOMAIN")]
    pub domain: String,

    /// Shodan API key (repeat or comma-separate for several)
    #[arg(short = 'k', long = "api-key", value_name = "KEY", value_delimiter = ',')]
    pub api_keys: Vec<String>,

    /// Output file prefix; writes PREFIX.txt and PREFIX.json
    #[arg(short = 'o', long = "output", value_name = "PREFIX")]
    pub output: Option<PathBuf>,

    /// Stdout format: text, json or csv
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Custom query (repeatable); replaces the built-in battery
    #[arg(short = 'q', long = "query", value_name = "QUERY")]
    pub queries: Vec<String>,

    /// File with one query per line; `{domain}` is substituted
    #[arg(long = "queries-file", value_name = "FILE")]
    pub queries_file: Option<PathBuf>,

    /// Maximum result pages per query
    #[arg(long = "max-pages")]
    pub max_pages: Option<u32>,

    /// Queries run at the same time
    #[arg(short = 't', long = "concurrency")]
    pub concurrency: Option<usize>,

    /// API requests per second across all queries
    #[arg(short = 'r', long = "rate")]
    pub rate: Option<u32>,

    /// HTTP timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Keep only hostnames that resolve
    #[arg(long = "verify")]
    pub verify: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<PathBuf>,

    /// Silent mode (only output hostnames)
    #[arg(long = "silent")]
    pub silent: bool,

    /// Verbose mode
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Command-line values win over the config file and environment.
    pub fn apply_to(&self, config: &mut Config) -> Result<()> {
        if !self.api_keys.is_empty() {
            config.api_keys = self
                .api_keys
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        if let Some(prefix) = &self.output {
            config.output.prefix = Some(prefix.clone());
        }
        if let Some(format) = &self.format {
            config.output.format = parse_format(format)?;
        }
        if let Some(max_pages) = self.max_pages {
            config.search.max_pages = max_pages;
        }
        if let Some(concurrency) = self.concurrency {
            config.search.concurrency = concurrency;
        }
        if let Some(rate) = self.rate {
            config.search.requests_per_second = rate;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = Duration::from_secs(timeout);
        }
        if self.verify {
            config.resolver.enabled = true;
        }
        Ok(())
    }
}
