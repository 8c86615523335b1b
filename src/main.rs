mod config;
mod db;
mod engine;
mod error;
mod models;
mod query;
mod run;

use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

fn main() -> ExitCode {
    match main_inner() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The logger may not be installed yet when configuration fails.
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn main_inner() -> Result<()> {
    let mut config = Config::from_env()?;
    let raw: Vec<String> = std::env::args().collect();
    let args = config.apply_flags(&raw)?;
    init_logger(config.log_level);
    debug!(db = %config.db_path.display(), owner = %config.owner, "starting");

    ensure_parent_dir(&config.db_path)?;
    let db = db::Database::open(&config.db_path)?;
    run::as_cli(&args, &db, &config)
}

fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display())),
        _ => Ok(()),
    }
}
