// src/lib.rs
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod output;
pub mod queries;
pub mod resolver;
pub mod runner;
pub mod session;
pub mod sources;
pub mod types;
pub mod utils;

pub use cli::Args;
pub use engine::DiscoveryEngine;
pub use extract::extract_candidates;
pub use runner::{QueryRun, QueryRunner};
pub use types::{Config, Discovery, DomainReport, FinderError, QueryOutcome};
pub use utils::normalize_hostnames;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
