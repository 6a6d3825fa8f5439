// src/engine.rs
use crate::error::Result;
use crate::resolver::Verifier;
use crate::runner::{QueryRun, QueryRunner};
use crate::session::Session;
use crate::sources::ShodanClient;
use crate::types::{Config, Discovery, FinderError, QueryOutcome};
use crate::utils::{is_valid_domain, normalize_hostnames};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

pub struct DiscoveryEngine {
    runner: Arc<QueryRunner>,
    verifier: Option<Verifier>,
    concurrency: usize,
    max_pages: u32,
}

impl DiscoveryEngine {
    /// Wires the Shodan client, shared rate limiter and optional verifier
    /// from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let session = Session::new(config)?;
        let client = ShodanClient::new(session.client.clone(), &config.base_url)?
            .with_api_keys(config.api_keys.clone());

        let runner = QueryRunner::new(Arc::new(client), session.rate_limiter())
            .with_page_size(config.search.page_size);

        let verifier = if config.resolver.enabled {
            Some(Verifier::new(&config.resolver)?)
        } else {
            None
        };

        Ok(Self::with_runner(
            runner,
            verifier,
            config.search.concurrency,
            config.search.max_pages,
        ))
    }

    pub fn with_runner(
        runner: QueryRunner,
        verifier: Option<Verifier>,
        concurrency: usize,
        max_pages: u32,
    ) -> Self {
        Self {
            runner: Arc::new(runner),
            verifier,
            concurrency: concurrency.max(1),
            max_pages,
        }
    }

    /// Discovery followed by DNS verification when a verifier is configured.
    pub async fn run(&self, domain: &str, queries: &[String]) -> Result<Discovery> {
        if !is_valid_domain(domain) {
            return Err(FinderError::InvalidDomain(domain.to_string()));
        }

        let start_time = Instant::now();
        let mut discovery = self.discover(domain, queries).await;

        if let Some(verifier) = &self.verifier {
            let hostnames = std::mem::take(&mut discovery.hostnames);
            discovery.hostnames = verifier.verify(hostnames).await;
            discovery.verified = true;
        }

        discovery.duration = start_time.elapsed();
        Ok(discovery)
    }

    /// Fans `queries` out under the concurrency limit, fetches the DNS
    /// subdomain list alongside, and normalizes everything once all of it
    /// has finished. Failures are recorded per query; none aborts the rest.
    pub async fn discover(&self, domain: &str, queries: &[String]) -> Discovery {
        info!(
            "Running {} queries for {} ({} at a time, up to {} pages each)",
            queries.len(),
            domain,
            self.concurrency,
            self.max_pages
        );
        let start_time = Instant::now();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = FuturesUnordered::new();

        for query in queries {
            let query = query.clone();
            let runner = Arc::clone(&self.runner);
            let semaphore = Arc::clone(&semaphore);
            let max_pages = self.max_pages;

            let handle = tokio::spawn({
                let query = query.clone();
                async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return QueryRun {
                                error: Some(FinderError::Unknown(e.into())),
                                ..QueryRun::default()
                            }
                        }
                    };
                    runner.run(&query, max_pages).await
                }
            });

            tasks.push(async move { (query, handle.await) });
        }

        let dns_task = {
            let runner = Arc::clone(&self.runner);
            let domain = domain.to_string();
            tokio::spawn(async move { runner.fetch_subdomains(&domain).await })
        };

        let mut collected: Vec<String> = Vec::new();
        let mut outcomes = Vec::with_capacity(queries.len());

        while let Some((query, joined)) = tasks.next().await {
            let run = joined.unwrap_or_else(|e| QueryRun {
                error: Some(FinderError::Unknown(anyhow::anyhow!("query task failed: {}", e))),
                ..QueryRun::default()
            });

            match &run.error {
                None => info!(
                    "[{}] {}: {} candidates from {} pages",
                    self.runner.api_name(),
                    query,
                    run.candidates.len(),
                    run.pages_fetched
                ),
                Some(e) => error!(
                    "[{}] {}: failed after {} candidates: {}",
                    self.runner.api_name(),
                    query,
                    run.candidates.len(),
                    e
                ),
            }

            outcomes.push(QueryOutcome {
                query,
                pages_fetched: run.pages_fetched,
                candidates: run.candidates.len(),
                error: run.error,
            });
            collected.extend(run.candidates);
        }

        let dns_label = format!("dns/domain/{}", domain);
        let dns_outcome = match dns_task.await {
            Ok(Ok(names)) => {
                info!("[{}] DNS endpoint returned {} subdomains", self.runner.api_name(), names.len());
                let outcome = QueryOutcome {
                    query: dns_label,
                    pages_fetched: 1,
                    candidates: names.len(),
                    error: None,
                };
                collected.extend(names);
                outcome
            }
            Ok(Err(e)) => {
                warn!("[{}] DNS endpoint failed: {}", self.runner.api_name(), e);
                QueryOutcome {
                    query: dns_label,
                    pages_fetched: 0,
                    candidates: 0,
                    error: Some(e),
                }
            }
            Err(e) => QueryOutcome {
                query: dns_label,
                pages_fetched: 0,
                candidates: 0,
                error: Some(FinderError::Unknown(anyhow::anyhow!("dns task failed: {}", e))),
            },
        };

        let total_found = collected.len();
        let hostnames = normalize_hostnames(collected);
        info!(
            "Collected {} candidates, {} unique for {}",
            total_found,
            hostnames.len(),
            domain
        );

        Discovery {
            domain: domain.to_string(),
            hostnames,
            outcomes,
            dns_outcome,
            verified: false,
            duration: start_time.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::build_rate_limiter;
    use crate::sources::stubs::{host_records, StubApi, StubPage};
    use serde_json::json;
    use std::time::Duration;

    fn engine(api: Arc<StubApi>, concurrency: usize, max_pages: u32) -> DiscoveryEngine {
        let runner = QueryRunner::new(api, build_rate_limiter(1000).unwrap()).with_page_size(100);
        DiscoveryEngine::with_runner(runner, None, concurrency, max_pages)
    }

    fn queries(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("q{}", i)).collect()
    }

    #[tokio::test]
    async fn test_failed_query_is_isolated() {
        let mut api = StubApi::new().with_subdomains(&["www"]);
        for i in [1, 3, 4, 5] {
            api = api.with_pages(
                &format!("q{}", i),
                vec![StubPage::Records(host_records(&format!("q{}-", i), 1))],
            );
        }
        api = api.with_pages("q2", vec![StubPage::Status(500, "internal error")]);
        let api = Arc::new(api);

        let discovery = engine(api.clone(), 2, 3).discover("example.com", &queries(5)).await;

        let failures: Vec<&QueryOutcome> = discovery.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].query, "q2");
        assert!(matches!(
            failures[0].error,
            Some(FinderError::ApiStatus { status: 500, .. })
        ));

        assert_eq!(
            discovery.hostnames,
            vec![
                "q1-0.example.com",
                "q3-0.example.com",
                "q4-0.example.com",
                "q5-0.example.com",
                "www.example.com",
            ]
        );
        assert_eq!(discovery.outcomes.len(), 5);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let api = Arc::new(
            StubApi::new()
                .with_fallback(StubPage::Records(host_records("h", 1)))
                .with_delay(Duration::from_millis(40)),
        );

        let discovery = engine(api.clone(), 2, 1).discover("example.com", &queries(5)).await;

        assert_eq!(api.calls().len(), 5);
        assert_eq!(api.max_in_flight(), 2);
        assert_eq!(discovery.failures().count(), 0);
    }

    #[tokio::test]
    async fn test_dns_failure_is_not_fatal() {
        let api = Arc::new(
            StubApi::new()
                .with_fallback(StubPage::Records(host_records("h", 1)))
                .with_subdomain_status(403),
        );

        let discovery = engine(api.clone(), 4, 1).discover("example.com", &queries(2)).await;

        assert_eq!(discovery.hostnames, vec!["h0.example.com"]);
        assert!(discovery.dns_outcome.is_failure());
        assert_eq!(discovery.failures().count(), 1);
        assert_eq!(api.dns_calls(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let api = Arc::new(
            StubApi::new()
                .with_pages(
                    "A",
                    vec![StubPage::Records(vec![json!({"hostnames": ["x.example.com"]})])],
                )
                .with_pages(
                    "B",
                    vec![StubPage::Records(vec![
                        json!({"ssl": {"cert": {"subject": {"CN": "y.example.com"}}}}),
                    ])],
                )
                .with_subdomains(&["z"]),
        );

        let discovery = engine(api, 2, 3)
            .discover("example.com", &["A".to_string(), "B".to_string()])
            .await;

        assert_eq!(
            discovery.hostnames,
            vec!["x.example.com", "y.example.com", "z.example.com"]
        );
        assert_eq!(discovery.failures().count(), 0);
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_domain() {
        let api = Arc::new(StubApi::new());
        let result = engine(api.clone(), 1, 1).run("not a domain", &queries(1)).await;

        assert!(matches!(result, Err(FinderError::InvalidDomain(_))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out_per_query() {
        use tokio::net::TcpListener;

        // accepts connections and never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = Config {
            api_keys: vec!["test_key".to_string()],
            base_url: format!("http://{}", addr),
            timeout: Duration::from_secs(1),
            search: crate::types::SearchConfig {
                requests_per_second: 100,
                ..Default::default()
            },
            ..Config::default()
        };

        let discovery = DiscoveryEngine::new(&config)
            .unwrap()
            .run("example.com", &["A".to_string(), "B".to_string()])
            .await
            .unwrap();
        server.abort();

        assert!(discovery.hostnames.is_empty());
        assert_eq!(discovery.outcomes.len(), 2);
        for outcome in discovery.failures() {
            assert!(
                matches!(outcome.error, Some(FinderError::NetworkError(_))),
                "{}: {:?}",
                outcome.query,
                outcome.error
            );
        }
        assert_eq!(discovery.failures().count(), 3);
        assert_eq!(discovery.dns_outcome.query, "dns/domain/example.com");
    }

    #[tokio::test]
    async fn test_run_over_http() {
        use mockito::Matcher;

        let mut server = mockito::Server::new_async().await;
        let _search_a = server
            .mock("GET", "/shodan/host/search")
            .match_query(Matcher::UrlEncoded("query".into(), "A".into()))
            .with_status(200)
            .with_body(r#"{"matches": [{"hostnames": ["X.example.com"]}], "total": 1}"#)
            .create_async()
            .await;
        let _search_b = server
            .mock("GET", "/shodan/host/search")
            .match_query(Matcher::UrlEncoded("query".into(), "B".into()))
            .with_status(200)
            .with_body(r#"{"matches": [{"ssl": {"cert": {"subject": {"CN": "y.example.com"}}}}], "total": 1}"#)
            .create_async()
            .await;
        let _dns = server
            .mock("GET", "/dns/domain/example.com")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"subdomains": ["z", "x"]}"#)
            .create_async()
            .await;

        let config = Config {
            api_keys: vec!["test_key".to_string()],
            base_url: server.url(),
            search: crate::types::SearchConfig {
                requests_per_second: 100,
                ..Default::default()
            },
            ..Config::default()
        };

        let discovery = DiscoveryEngine::new(&config)
            .unwrap()
            .run("example.com", &["A".to_string(), "B".to_string()])
            .await
            .unwrap();

        assert_eq!(
            discovery.hostnames,
            vec!["X.example.com", "y.example.com", "z.example.com"]
        );
        assert!(!discovery.verified);
        assert_eq!(discovery.failures().count(), 0);
    }
}
