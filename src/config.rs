// src/config.rs
use crate::error::{ErrorContext, Result};
use crate::types::{Config, FinderError, OutputFormat};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml::value::Table;

pub const API_KEY_ENV: &str = "SHODAN_API_KEY";
pub const API_URL_ENV: &str = "SHODAN_API_URL";

/// Defaults, then the TOML file at `path`, then environment. A path that
/// was asked for but does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(path) = path {
        if !path.exists() {
            return Err(FinderError::ConfigError(format!("Config file {:?} does not exist", path)));
        }
        let contents = fs::read_to_string(path)
            .with_context(FinderError::ConfigError, || format!("Failed to read config file {:?}", path))?;
        apply_toml(&mut config, &contents)?;
    }

    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn apply_toml(config: &mut Config, contents: &str) -> Result<()> {
    let root: Table = toml::from_str(contents)
        .with_context(FinderError::ConfigError, || "Failed to parse config file".to_string())?;

    if let Some(shodan) = root.get("shodan").and_then(|v| v.as_table()) {
        if let Some(keys) = string_list(shodan, "api_keys") {
            config.api_keys = keys;
        }
        if let Some(url) = shodan.get("base_url").and_then(|v| v.as_str()) {
            config.base_url = url.to_string();
        }
        if let Some(agent) = shodan.get("user_agent").and_then(|v| v.as_str()) {
            config.user_agent = agent.to_string();
        }
        if let Some(secs) = unsigned(shodan, "timeout_secs")? {
            config.timeout = Duration::from_secs(secs);
        }
    }

    if let Some(search) = root.get("search").and_then(|v| v.as_table()) {
        if let Some(pages) = unsigned(search, "max_pages")? {
            config.search.max_pages = narrow(pages, "max_pages")?;
        }
        if let Some(concurrency) = unsigned(search, "concurrency")? {
            config.search.concurrency = narrow(concurrency, "concurrency")?;
        }
        if let Some(rps) = unsigned(search, "requests_per_second")? {
            config.search.requests_per_second = narrow(rps, "requests_per_second")?;
        }
        if let Some(size) = unsigned(search, "page_size")? {
            config.search.page_size = narrow(size, "page_size")?;
        }
    }

    if let Some(resolver) = root.get("resolver").and_then(|v| v.as_table()) {
        if let Some(enabled) = resolver.get("enabled").and_then(|v| v.as_bool()) {
            config.resolver.enabled = enabled;
        }
        if let Some(concurrency) = unsigned(resolver, "concurrency")? {
            config.resolver.concurrency = narrow(concurrency, "resolver.concurrency")?;
        }
        if let Some(secs) = unsigned(resolver, "timeout_secs")? {
            config.resolver.timeout = Duration::from_secs(secs);
        }
        if let Some(nameservers) = string_list(resolver, "nameservers") {
            config.resolver.nameservers = nameservers;
        }
        if let Some(system) = resolver.get("use_system_resolver").and_then(|v| v.as_bool()) {
            config.resolver.use_system_resolver = system;
        }
    }

    if let Some(output) = root.get("output").and_then(|v| v.as_table()) {
        if let Some(prefix) = output.get("prefix").and_then(|v| v.as_str()) {
            config.output.prefix = Some(PathBuf::from(prefix));
        }
        if let Some(format) = output.get("format").and_then(|v| v.as_str()) {
            config.output.format = parse_format(format)?;
        }
    }

    Ok(())
}

fn string_list(table: &Table, key: &str) -> Option<Vec<String>> {
    table.get(key).and_then(|v| v.as_array()).map(|values| {
        values
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn unsigned(table: &Table, key: &str) -> Result<Option<u64>> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| FinderError::ConfigError(format!("{} must be a non-negative integer", key))),
    }
}

fn narrow<T: TryFrom<u64>>(value: u64, key: &str) -> Result<T> {
    T::try_from(value).map_err(|_| FinderError::ConfigError(format!("{} is out of range", key)))
}

pub fn parse_format(format: &str) -> Result<OutputFormat> {
    match format.to_lowercase().as_str() {
        "text" | "txt" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        "csv" => Ok(OutputFormat::Csv),
        other => Err(FinderError::ConfigError(format!("Unknown output format: {}", other))),
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(keys) = env::var(API_KEY_ENV) {
        let keys: Vec<String> = keys
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !keys.is_empty() {
            config.api_keys = keys;
        }
    }
    if let Ok(url) = env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.base_url = url.trim().to_string();
        }
    }
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.api_keys.is_empty() {
        return Err(FinderError::ConfigError(format!(
            "A Shodan API key is required (--api-key, {} or the config file)",
            API_KEY_ENV
        )));
    }
    if config.timeout.as_secs() == 0 {
        return Err(FinderError::ConfigError("Timeout must be greater than 0".to_string()));
    }
    if config.search.concurrency == 0 {
        return Err(FinderError::ConfigError("Concurrency must be greater than 0".to_string()));
    }
    if config.search.requests_per_second == 0 {
        return Err(FinderError::ConfigError(
            "Requests per second must be greater than 0".to_string(),
        ));
    }
    if config.search.page_size == 0 {
        return Err(FinderError::ConfigError("Page size must be greater than 0".to_string()));
    }
    if config.resolver.enabled {
        if config.resolver.concurrency == 0 {
            return Err(FinderError::ConfigError(
                "Resolver concurrency must be greater than 0".to_string(),
            ));
        }
        if config.resolver.timeout.is_zero() {
            return Err(FinderError::ConfigError(
                "Resolver timeout must be greater than 0".to_string(),
            ));
        }
        if !config.resolver.use_system_resolver && config.resolver.nameservers.is_empty() {
            return Err(FinderError::ConfigError(
                "Verification needs at least one nameserver or use_system_resolver = true".to_string(),
            ));
        }
    }
    Ok(())
}
