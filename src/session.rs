// src/session.rs
use crate::types::{Config, FinderError};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client plus the single rate limiter every request goes through.
#[derive(Clone)]
pub struct Session {
    pub client: Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self, FinderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| FinderError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter = build_rate_limiter(config.search.requests_per_second)?;

        Ok(Session {
            client,
            rate_limiter,
        })
    }

    pub fn rate_limiter(&self) -> Arc<DefaultDirectRateLimiter> {
        Arc::clone(&self.rate_limiter)
    }
}

/// `per_second` permits a second, burst of one.
pub fn build_rate_limiter(per_second: u32) -> Result<Arc<DefaultDirectRateLimiter>, FinderError> {
    let rate = NonZeroU32::new(per_second).ok_or_else(|| {
        FinderError::ConfigError("requests per second must be greater than 0".to_string())
    })?;
    let quota = Quota::per_second(rate).allow_burst(NonZeroU32::MIN);
    Ok(Arc::new(RateLimiter::direct(quota)))
}
