// src/runner.rs
use crate::error::Result;
use crate::extract::extract_candidates;
use crate::sources::HostSearchApi;
use crate::types::{FinderError, DEFAULT_PAGE_SIZE};
use governor::DefaultDirectRateLimiter;
use log::{debug, warn};
use std::sync::Arc;

/// What one query produced. `error` is set when paging stopped on a failure;
/// `candidates` still holds everything gathered before it.
#[derive(Debug, Default)]
pub struct QueryRun {
    pub candidates: Vec<String>,
    pub pages_fetched: u32,
    pub error: Option<FinderError>,
}

/// Runs searches page by page against the API, one rate-limiter permit per
/// request.
pub struct QueryRunner {
    api: Arc<dyn HostSearchApi>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    page_size: usize,
}

impl QueryRunner {
    pub fn new(api: Arc<dyn HostSearchApi>, rate_limiter: Arc<DefaultDirectRateLimiter>) -> Self {
        Self {
            api,
            rate_limiter,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// A page holding fewer matches than this is taken as the last one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn api_name(&self) -> &str {
        self.api.name()
    }

    pub async fn run(&self, query: &str, max_pages: u32) -> QueryRun {
        let mut run = QueryRun::default();

        for page in 1..=max_pages {
            self.rate_limiter.until_ready().await;

            let result = match self.api.search(query, page).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("[{}] {} failed on page {}: {}", self.api.name(), query, page, e);
                    run.error = Some(e);
                    break;
                }
            };
            run.pages_fetched = page;

            let count = result.matches.len();
            if count == 0 {
                debug!("[{}] {} page {} is empty", self.api.name(), query, page);
                break;
            }

            for record in &result.matches {
                run.candidates.extend(extract_candidates(record));
            }

            if count < self.page_size {
                debug!(
                    "[{}] {} page {} is short ({} < {}), stopping",
                    self.api.name(),
                    query,
                    page,
                    count,
                    self.page_size
                );
                break;
            }
        }

        run
    }

    /// Full hostnames (`label.domain`) from the DNS endpoint.
    pub async fn fetch_subdomains(&self, domain: &str) -> Result<Vec<String>> {
        self.rate_limiter.until_ready().await;

        let labels = self.api.dns_subdomains(domain).await?;
        Ok(labels
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(|label| format!("{}.{}", label, domain))
            .collect())
    }
}
