//! Runtime settings, read from the environment and global command-line flags.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

const DB_FILE: &str = "finsight.db";
const DEFAULT_OWNER: &str = "default";

pub(crate) const ENV_DB: &str = "FINSIGHT_DB";
pub(crate) const ENV_USER: &str = "FINSIGHT_USER";
pub(crate) const ENV_LOG: &str = "FINSIGHT_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub db_path: PathBuf,
    /// Owner id every query and mutation is scoped to.
    pub owner: String,
    pub log_level: LevelFilter,
    /// Print JSON envelopes instead of text.
    pub json: bool,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, which maps a variable name
    /// to its value.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match var(ENV_DB) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };
        let owner = var(ENV_USER)
            .or_else(|| var("USER"))
            .unwrap_or_else(|| DEFAULT_OWNER.to_string());
        let log_level = match var(ENV_LOG) {
            Some(level) => level
                .trim()
                .parse::<LevelFilter>()
                .with_context(|| format!("Invalid {ENV_LOG} value: {level}"))?,
            None => LevelFilter::WARN,
        };

        Ok(Self {
            db_path,
            owner,
            log_level,
            json: false,
        })
    }

    /// Applies the global `--json` and `--user <id>` flags and returns the
    /// remaining arguments in order.
    pub(crate) fn apply_flags(&mut self, args: &[String]) -> Result<Vec<String>> {
        let mut rest = Vec::with_capacity(args.len());
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--json" => self.json = true,
                "--user" => {
                    let owner = iter
                        .next()
                        .filter(|v| !v.trim().is_empty())
                        .ok_or_else(|| anyhow!("--user requires a value"))?;
                    self.owner = owner.clone();
                }
                _ => rest.push(arg.clone()),
            }
        }
        if self.owner.trim().is_empty() {
            bail!("Owner id must not be empty");
        }
        Ok(rest)
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "finsight", "FinSight")
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().join(DB_FILE))
}
