//! Metrics configuration layered from a TOML file and `SETLIST_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use setlist_metrics::MetricsConfig;

pub const ENV_PREFIX: &str = "SETLIST";

/// `<config_dir>/setlist/config.toml`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("setlist")
        .join("config.toml")
}

/// Load the metrics configuration.
///
/// An explicit `path` must exist; the default path is optional. Environment
/// variables override file values (`SETLIST_TOP_N=5`).
pub fn load(path: Option<&Path>) -> Result<MetricsConfig> {
    load_with_env(path, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
}

fn load_with_env(path: Option<&Path>, env: Environment) -> Result<MetricsConfig> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path(), false),
    };

    let settings = Config::builder()
        .add_source(File::from(path.as_path()).format(FileFormat::Toml).required(required))
        .add_source(env)
        .build()
        .with_context(|| format!("failed to read config from {}", path.display()))?;

    settings
        .try_deserialize()
        .context("invalid metrics configuration")
}
