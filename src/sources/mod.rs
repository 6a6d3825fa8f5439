// src/sources/mod.rs
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

mod shodan;
#[cfg(test)]
pub(crate) mod stubs;

pub use shodan::ShodanClient;

/// One page of search results, records left untyped.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub matches: Vec<Value>,
    pub total: Option<u64>,
}

impl SearchPage {
    /// Reads `matches` and `total` out of a search response body. Missing or
    /// mistyped fields read as an empty page.
    pub fn from_value(body: Value) -> Self {
        let total = body.get("total").and_then(Value::as_u64);
        let matches = match body {
            Value::Object(mut map) => match map.remove("matches") {
                Some(Value::Array(matches)) => matches,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { matches, total }
    }
}

/// The host-intelligence API as the runner sees it. Implementations issue
/// exactly one request per call; pacing is the caller's job.
#[async_trait]
pub trait HostSearchApi: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, page: u32) -> Result<SearchPage>;

    /// Subdomain labels (not full names) known for `domain`.
    async fn dns_subdomains(&self, domain: &str) -> Result<Vec<String>>;
}
