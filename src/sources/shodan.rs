// src/sources/shodan.rs
use crate::error::{body_snippet, Result};
use crate::sources::{HostSearchApi, SearchPage};
use crate::types::FinderError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// Client for the two Shodan endpoints this tool uses.
#[derive(Debug, Clone)]
pub struct ShodanClient {
    name: String,
    client: Client,
    base_url: Url,
    api_keys: Vec<String>,
}

impl ShodanClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| FinderError::ConfigError(format!("Invalid API base URL {}: {}", base_url, e)))?;

        Ok(Self {
            name: "shodan".to_string(),
            client,
            base_url,
            api_keys: Vec::new(),
        })
    }

    pub fn with_api_keys(mut self, keys: Vec<String>) -> Self {
        self.api_keys = keys;
        self
    }

    fn get_random_api_key(&self) -> Result<&String> {
        use rand::seq::SliceRandom;
        let mut rng = rand::thread_rng();
        self.api_keys
            .choose(&mut rng)
            .ok_or_else(|| FinderError::ConfigError("No Shodan API key configured".to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined)
            .map_err(|e| FinderError::ConfigError(format!("Invalid endpoint URL {}: {}", joined, e)))
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FinderError::NetworkError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FinderError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(FinderError::ApiStatus {
                status: status.as_u16(),
                body: body_snippet(&text),
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| FinderError::JsonParseError(e.to_string(), body_snippet(&text)))?;

        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(FinderError::ApiError(error.to_string()));
        }

        Ok(body)
    }
}

#[async_trait]
impl HostSearchApi for ShodanClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, page: u32) -> Result<SearchPage> {
        let mut url = self.endpoint("/shodan/host/search")?;
        url.query_pairs_mut()
            .append_pair("key", self.get_random_api_key()?)
            .append_pair("query", query)
            .append_pair("page", &page.to_string());

        debug!("[{}] search page {} for {}", self.name, page, query);
        let body = self.get_json(url).await?;
        Ok(SearchPage::from_value(body))
    }

    async fn dns_subdomains(&self, domain: &str) -> Result<Vec<String>> {
        let path = format!("/dns/domain/{}", urlencoding::encode(domain));
        let mut url = self.endpoint(&path)?;
        url.query_pairs_mut()
            .append_pair("key", self.get_random_api_key()?);

        debug!("[{}] dns lookup for {}", self.name, domain);
        let body = self.get_json(url).await?;

        Ok(body
            .get("subdomains")
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}
