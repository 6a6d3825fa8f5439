// src/output.rs
use crate::error::{ErrorContext, Result};
use crate::types::{DomainReport, FinderError, OutputConfig, OutputFormat};
use log::{info, warn};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Prints the report to stdout and, with a prefix configured, saves it
    /// to disk. Returns the files written.
    pub fn write_report(&self, report: &DomainReport) -> Result<Vec<PathBuf>> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.write_output(&mut handle, report)?;

        match &self.config.prefix {
            Some(prefix) => save_files(prefix, report),
            None => Ok(Vec::new()),
        }
    }

    pub fn write_output<W: Write>(&self, writer: &mut W, report: &DomainReport) -> Result<()> {
        match self.config.format {
            OutputFormat::Text => write_text(writer, report),
            OutputFormat::Json => write_json(writer, report),
            OutputFormat::Csv => write_csv(writer, report),
        }
    }
}

/// `{prefix}.txt` always; then `{prefix}.json`, or `{prefix}.csv` when the
/// JSON file cannot be produced.
pub fn save_files(prefix: &Path, report: &DomainReport) -> Result<Vec<PathBuf>> {
    if let Some(parent) = prefix.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Could not create directory {:?}: {}", parent, e);
        }
    }

    let mut written = Vec::new();

    let txt_path = with_suffix(prefix, "txt");
    fs::write(&txt_path, report.subdomains.join("\n"))
        .with_context(FinderError::OutputError, || format!("Failed to save {:?}", txt_path))?;
    info!("TXT results saved to {:?}", txt_path);
    written.push(txt_path);

    let json_path = with_suffix(prefix, "json");
    let json_result = serde_json::to_vec_pretty(report)
        .with_context(FinderError::OutputError, || "Failed to serialize JSON".to_string())
        .and_then(|bytes| {
            fs::write(&json_path, bytes)
                .with_context(FinderError::OutputError, || format!("Failed to save {:?}", json_path))
        });

    match json_result {
        Ok(()) => {
            info!("JSON results saved to {:?}", json_path);
            written.push(json_path);
        }
        Err(e) => {
            warn!("{}; falling back to CSV", e);
            let csv_path = with_suffix(prefix, "csv");
            let mut file = File::create(&csv_path)
                .with_context(FinderError::OutputError, || format!("Failed to create {:?}", csv_path))?;
            write_csv(&mut file, report)?;
            info!("CSV results saved to {:?}", csv_path);
            written.push(csv_path);
        }
    }

    Ok(written)
}

fn with_suffix(prefix: &Path, extension: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn write_text<W: Write>(writer: &mut W, report: &DomainReport) -> Result<()> {
    for hostname in &report.subdomains {
        writeln!(writer, "{}", hostname).map_err(|e| FinderError::OutputError(e.to_string()))?;
    }
    Ok(())
}

fn write_json<W: Write>(writer: &mut W, report: &DomainReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| FinderError::OutputError(format!("Failed to serialize JSON: {}", e)))?;

    writeln!(writer, "{}", json).map_err(|e| FinderError::OutputError(e.to_string()))?;

    Ok(())
}

fn write_csv<W: Write>(writer: &mut W, report: &DomainReport) -> Result<()> {
    writeln!(writer, "Domain,Subdomain").map_err(|e| FinderError::OutputError(e.to_string()))?;

    for hostname in &report.subdomains {
        writeln!(writer, "{},{}", csv_field(&report.domain), csv_field(hostname))
            .map_err(|e| FinderError::OutputError(e.to_string()))?;
    }

    Ok(())
}

/// Extracted candidates can be arbitrary text (HTTP titles), so quote when
/// needed.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
