// src/resolver.rs
use crate::types::{FinderError, ResolverConfig};
use futures::stream::{self, StreamExt};
use log::{debug, info};
use std::future::Future;
use std::net::SocketAddr;
use std::str::FromStr;
use trust_dns_resolver::config::{NameServerConfig, Protocol, ResolverConfig as DnsResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Drops hostnames that do not currently resolve.
pub struct Verifier {
    resolver: TokioAsyncResolver,
    concurrency: usize,
}

impl Verifier {
    pub fn new(config: &ResolverConfig) -> Result<Self, FinderError> {
        let resolver = if config.use_system_resolver {
            TokioAsyncResolver::tokio_from_system_conf()
                .map_err(|e| FinderError::ResolutionError(format!("Failed to create system resolver: {}", e)))?
        } else {
            if config.nameservers.is_empty() {
                return Err(FinderError::ConfigError(
                    "No nameservers configured for verification".to_string(),
                ));
            }
            let mut resolver_config = DnsResolverConfig::new();

            for ns in &config.nameservers {
                let socket_addr = SocketAddr::from_str(ns)
                    .map_err(|e| FinderError::ConfigError(format!("Invalid nameserver address {}: {}", ns, e)))?;
                resolver_config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Udp));
            }

            let mut opts = ResolverOpts::default();
            opts.timeout = config.timeout;
            opts.attempts = 2;

            TokioAsyncResolver::tokio(resolver_config, opts)
        };

        Ok(Self {
            resolver,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Keeps the hostnames that resolve, in input order.
    pub async fn verify(&self, hostnames: Vec<String>) -> Vec<String> {
        let total = hostnames.len();
        info!("Verifying {} hostnames...", total);

        let resolved = retain_resolving(hostnames, self.concurrency, |hostname| {
            let resolver = self.resolver.clone();
            async move {
                match resolver.lookup_ip(hostname.as_str()).await {
                    Ok(lookup) => lookup.iter().next().is_some(),
                    Err(e) => {
                        debug!("{} did not resolve: {}", hostname, e);
                        false
                    }
                }
            }
        })
        .await;

        info!("{} of {} hostnames resolved", resolved.len(), total);
        resolved
    }
}

/// Runs `lookup` over every hostname with at most `concurrency` lookups in
/// flight and keeps the ones it answers `true` for. Order is preserved.
pub async fn retain_resolving<F, Fut>(hostnames: Vec<String>, concurrency: usize, lookup: F) -> Vec<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = bool>,
{
    stream::iter(hostnames)
        .map(|hostname| {
            let check = lookup(hostname.clone());
            async move { (hostname, check.await) }
        })
        .buffered(concurrency.max(1))
        .filter_map(|(hostname, resolves)| async move { resolves.then_some(hostname) })
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_retain_resolving_filters_and_keeps_order() {
        let hostnames = vec![
            "a.example.com".to_string(),
            "gone.example.com".to_string(),
            "b.example.com".to_string(),
            "c.example.com".to_string(),
        ];

        let kept = retain_resolving(hostnames, 3, |hostname| async move {
            // make later names answer first
            let delay = if hostname.starts_with('a') { 30 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            !hostname.starts_with("gone")
        })
        .await;

        assert_eq!(kept, vec!["a.example.com", "b.example.com", "c.example.com"]);
    }

    #[tokio::test]
    async fn test_retain_resolving_bounds_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let hostnames: Vec<String> = (0..8).map(|i| format!("h{}.example.com", i)).collect();

        let kept = retain_resolving(hostnames, 2, |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                true
            }
        })
        .await;

        assert_eq!(kept.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_invalid_nameserver_is_config_error() {
        let config = ResolverConfig {
            nameservers: vec!["not-an-address".to_string()],
            ..ResolverConfig::default()
        };
        assert!(matches!(Verifier::new(&config), Err(FinderError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_empty_nameserver_list_is_config_error() {
        let config = ResolverConfig {
            enabled: true,
            nameservers: Vec::new(),
            ..ResolverConfig::default()
        };
        assert!(matches!(Verifier::new(&config), Err(FinderError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_verifier_builds_from_nameservers() {
        let verifier = Verifier::new(&ResolverConfig::default()).unwrap();
        assert_eq!(verifier.concurrency, 50);
        assert!(verifier.verify(Vec::new()).await.is_empty());
    }
}
