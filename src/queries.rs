// src/queries.rs
use crate::error::{ErrorContext, Result};
use crate::types::FinderError;
use crate::utils::read_lines;
use std::path::Path;

/// Search filters tried for every target, each matched against the quoted
/// domain.
const DOMAIN_FILTERS: &[&str] = &[
    "hostname",
    "ssl.cert.subject.cn",
    "ssl.cert.subject.an",
    "ssl.cert.issuer.cn",
    "ssl.cert.issuer.o",
    "http.title",
    "http.html",
    "http.component",
    "ssl.cert.subject.alt_names",
    "ssl.cert.extensions.subject_alt_name",
    "http.server",
    "http.headers",
    "http.location",
    "smtp.starttls.tls.certificate.parsed.subject.common_name",
    "smtp.starttls.tls.certificate.parsed.extensions.subject_alt_name.dns_names",
    "ftp.banner",
    "dns.txt",
    "dns.mx",
    "org",
    "asn.description",
    "ssl.cert.serial",
    "ssl.cert.fingerprint",
    "all",
];

/// Filters also tried against `*.domain`.
const WILDCARD_FILTERS: &[&str] = &["hostname", "ssl.cert.subject.cn", "ssl.cert.subject.alt_names"];

pub fn default_queries(domain: &str) -> Vec<String> {
    DOMAIN_FILTERS
        .iter()
        .map(|filter| format!("{}:\"{}\"", filter, domain))
        .chain(
            WILDCARD_FILTERS
                .iter()
                .map(|filter| format!("{}:\"*.{}\"", filter, domain)),
        )
        .collect()
}

/// One query per line; blank lines and `#` comments are skipped and
/// `{domain}` is replaced with the target.
pub fn load_queries<P: AsRef<Path>>(path: P, domain: &str) -> Result<Vec<String>> {
    let path = path.as_ref();
    let lines = read_lines(path)
        .with_context(FinderError::ConfigError, || format!("Failed to read queries from {:?}", path))?;

    Ok(expand_templates(lines, domain))
}

pub fn expand_templates<I>(lines: I, domain: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.replace("{domain}", domain))
        .collect()
}
