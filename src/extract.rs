// src/extract.rs
//! Hostname extraction from Shodan search matches.
//!
//! Match records are loosely typed and their shape drifts between services
//! and over time, so every lookup here is optional. A field that is missing
//! or has the wrong type contributes nothing; it never fails the record.
use serde_json::{Map, Value};

const SAN_EXTENSION_KEYS: [&str; 2] = ["subjectAltName", "subject_alt_name"];
const SAN_LIST_KEYS: [&str; 3] = ["alt_names", "subject_alt_names", "san"];
const HTTP_KEYS: [&str; 2] = ["title", "host"];

/// Pulls every hostname-like string out of one search match.
///
/// Over-inclusive on purpose: anything shaped like a name (contains a dot)
/// is kept, including the odd HTTP title.
pub fn extract_candidates(record: &Value) -> Vec<String> {
    let mut candidates = Vec::new();

    let Some(record) = record.as_object() else {
        return candidates;
    };

    if let Some(hostnames) = record.get("hostnames").and_then(Value::as_array) {
        candidates.extend(hostnames.iter().filter_map(Value::as_str).map(str::to_string));
    }

    if let Some(cert) = path(record, &["ssl", "cert"]).and_then(Value::as_object) {
        if let Some(subject) = cert.get("subject").and_then(Value::as_object) {
            candidates.extend(
                subject
                    .values()
                    .filter_map(Value::as_str)
                    .filter(|v| looks_like_host(v))
                    .map(str::to_string),
            );
        }

        if let Some(extensions) = cert.get("extensions") {
            collect_extensions(extensions, &mut candidates);
        }

        for key in SAN_LIST_KEYS {
            if let Some(list) = cert.get(key) {
                collect_san_value(list, &mut candidates);
            }
        }
    }

    if let Some(http) = record.get("http").and_then(Value::as_object) {
        candidates.extend(
            HTTP_KEYS
                .iter()
                .filter_map(|key| http.get(*key).and_then(Value::as_str))
                .filter(|v| looks_like_host(v))
                .map(str::to_string),
        );
    }

    candidates
}

fn path<'a>(root: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    let (first, rest) = keys.split_first()?;
    rest.iter()
        .try_fold(root.get(*first)?, |node, key| node.as_object()?.get(*key))
}

fn collect_extensions(extensions: &Value, out: &mut Vec<String>) {
    match extensions {
        Value::Object(map) => {
            for key in SAN_EXTENSION_KEYS {
                if let Some(san) = map.get(key) {
                    collect_san_value(san, out);
                }
            }
        }
        // Shodan's own layout: [{"name": "subjectAltName", "data": "..."}]
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => push_tokens(s, out),
                    Value::Object(ext) => {
                        let is_san = ext
                            .get("name")
                            .and_then(Value::as_str)
                            .is_some_and(|name| SAN_EXTENSION_KEYS.contains(&name));
                        if is_san {
                            if let Some(data) = ext.get("data") {
                                collect_san_value(data, out);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::String(s) => push_tokens(s, out),
        _ => {}
    }
}

fn collect_san_value(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => push_tokens(s, out),
        Value::Array(items) => {
            for s in items.iter().filter_map(Value::as_str) {
                push_tokens(s, out);
            }
        }
        _ => {}
    }
}

fn push_tokens(raw: &str, out: &mut Vec<String>) {
    for token in raw.split(',') {
        let token = strip_dns_prefix(token.trim());
        if looks_like_host(token) {
            out.push(token.to_string());
        }
    }
}

fn strip_dns_prefix(token: &str) -> &str {
    match token.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("dns:") => token[4..].trim_start(),
        _ => token,
    }
}

fn looks_like_host(value: &str) -> bool {
    value.contains('.')
}
