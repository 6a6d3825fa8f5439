use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use shodanfinder::config::{load_config, validate_config};
use shodanfinder::output::OutputManager;
use shodanfinder::queries::{default_queries, expand_templates, load_queries};
use shodanfinder::{Args, DiscoveryEngine, DomainReport};
use std::process;

const BANNER: &str = r#"
  ___ _            _           ___ _         _
 / __| |_  ___  __| |__ _ _ _ | __(_)_ _  __| |___ _ _
 \__ \ ' \/ _ \/ _` / _` | ' \| _|| | ' \/ _` / -_) '_|
 |___/_||_\___/\__,_\__,_|_||_|_| |_|_||_\__,_\___|_|

        Subdomain discovery through Shodan
"#;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else if args.silent {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if !args.silent {
        eprintln!("{}", BANNER);
    }

    let mut config = load_config(args.config_path.as_deref())?;
    args.apply_to(&mut config)?;
    if let Err(e) = validate_config(&config) {
        error!("{}", e);
        process::exit(1);
    }

    let domain = args.domain.trim().to_lowercase();
    let queries = if !args.queries.is_empty() {
        expand_templates(args.queries.clone(), &domain)
    } else if let Some(path) = &args.queries_file {
        load_queries(path, &domain)?
    } else {
        default_queries(&domain)
    };

    let engine = DiscoveryEngine::new(&config)?;
    let discovery = engine
        .run(&domain, &queries)
        .await
        .with_context(|| format!("Discovery failed for {}", domain))?;

    let report = DomainReport::from_discovery(&discovery, &queries);
    let written = OutputManager::new(config.output.clone()).write_report(&report)?;

    info!(
        "Found {} unique hostnames for {} with {} queries in {:.2}s",
        report.total,
        domain,
        queries.len(),
        discovery.duration.as_secs_f64()
    );
    for path in &written {
        info!("Results written to {}", path.display());
    }

    let failures: Vec<_> = discovery.failures().collect();
    if !failures.is_empty() {
        warn!("{} of {} requests failed:", failures.len(), queries.len() + 1);
        for outcome in failures {
            if let Some(e) = &outcome.error {
                warn!("  {} -> {}", outcome.query, e);
            }
        }
    }

    Ok(())
}
