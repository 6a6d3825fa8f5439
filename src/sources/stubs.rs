// src/sources/stubs.rs
// Scripted in-memory API used by the runner and engine tests.

use crate::error::Result;
use crate::sources::{HostSearchApi, SearchPage};
use crate::types::FinderError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum StubPage {
    Records(Vec<Value>),
    Status(u16, &'static str),
    Transport(&'static str),
    Garbled(&'static str),
}

#[derive(Debug, Default)]
pub struct StubApi {
    /// Per-query pages, indexed from page 1. Pages past the end are empty.
    pages: HashMap<String, Vec<StubPage>>,
    /// Served for every page of a query with no script.
    fallback: Option<StubPage>,
    subdomains: Option<std::result::Result<Vec<String>, u16>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, u32)>>,
    dns_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, query: &str, pages: Vec<StubPage>) -> Self {
        self.pages.insert(query.to_string(), pages);
        self
    }

    pub fn with_fallback(mut self, page: StubPage) -> Self {
        self.fallback = Some(page);
        self
    }

    pub fn with_subdomains(mut self, labels: &[&str]) -> Self {
        self.subdomains = Some(Ok(labels.iter().map(|l| l.to_string()).collect()));
        self
    }

    pub fn with_subdomain_status(mut self, status: u16) -> Self {
        self.subdomains = Some(Err(status));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pages_requested(&self, query: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|(q, _)| q == query)
            .map(|(_, page)| page)
            .collect()
    }

    pub fn dns_calls(&self) -> usize {
        self.dns_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// A page of `count` records, each carrying one hostname.
pub fn host_records(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"hostnames": [format!("{}{}.example.com", prefix, i)]}))
        .collect()
}

#[async_trait]
impl HostSearchApi for StubApi {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(&self, query: &str, page: u32) -> Result<SearchPage> {
        self.calls.lock().unwrap().push((query.to_string(), page));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = match self.pages.get(query) {
            Some(pages) => pages.get(page as usize - 1).cloned(),
            None => self.fallback.clone(),
        };

        match scripted {
            None => Ok(SearchPage::default()),
            Some(StubPage::Records(matches)) => Ok(SearchPage {
                total: Some(matches.len() as u64),
                matches,
            }),
            Some(StubPage::Status(status, body)) => Err(FinderError::ApiStatus {
                status,
                body: body.to_string(),
            }),
            Some(StubPage::Transport(message)) => Err(FinderError::NetworkError(message.to_string())),
            Some(StubPage::Garbled(body)) => Err(FinderError::JsonParseError(
                "expected value at line 1 column 1".to_string(),
                body.to_string(),
            )),
        }
    }

    async fn dns_subdomains(&self, _domain: &str) -> Result<Vec<String>> {
        self.dns_calls.fetch_add(1, Ordering::SeqCst);
        match &self.subdomains {
            None => Ok(Vec::new()),
            Some(Ok(labels)) => Ok(labels.clone()),
            Some(Err(status)) => Err(FinderError::ApiStatus {
                status: *status,
                body: "dns lookup failed".to_string(),
            }),
        }
    }
}
