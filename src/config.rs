//! Configuration loader and validator for the catalog mirror.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional YAML file, and process environment variables.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://selectionway.examsaathi.site";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub server: Server,
    pub upstream: Upstream,
}

/// Storage and sync settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    pub database_url: String,
    pub sync_interval_secs: u64,
    /// Number of batches synced concurrently within one pass.
    pub sync_concurrency: usize,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
    pub author: String,
}

/// Remote catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Upstream {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for App {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/catalog-mirror.db".into(),
            sync_interval_secs: 120,
            sync_concurrency: 1,
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            author: "catalog-mirror".into(),
        }
    }
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE_URL.into(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.app.sync_interval_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Load configuration: defaults, then the YAML file at `path` (if given), then
/// environment overrides. The result is validated.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load`], reading overrides through `lookup` instead of the process
/// environment.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    apply_env(&mut cfg, lookup)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Override configuration values from environment-style lookups.
pub fn apply_env<F>(cfg: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        cfg.app.database_url = url;
    }
    if let Some(host) = lookup("HOST") {
        cfg.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        cfg.server.port = parse_env("PORT", port)?;
    }
    if let Some(url) = lookup("UPSTREAM_BASE_URL").or_else(|| lookup("SOURCE_API")) {
        cfg.upstream.base_url = url;
    }
    if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
        cfg.upstream.timeout_secs = parse_env("UPSTREAM_TIMEOUT_SECS", secs)?;
    }
    if let Some(secs) = lookup("SYNC_INTERVAL_SECS") {
        cfg.app.sync_interval_secs = parse_env("SYNC_INTERVAL_SECS", secs)?;
    }
    if let Some(n) = lookup("SYNC_CONCURRENCY") {
        cfg.app.sync_concurrency = parse_env("SYNC_CONCURRENCY", n)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.database_url.trim().is_empty() {
        return Err(ConfigError::Invalid("app.database_url must be non-empty"));
    }
    if cfg.app.sync_interval_secs == 0 {
        return Err(ConfigError::Invalid("app.sync_interval_secs must be > 0"));
    }
    if cfg.app.sync_concurrency == 0 {
        return Err(ConfigError::Invalid("app.sync_concurrency must be > 0"));
    }
    if cfg.server.host.trim().is_empty() {
        return Err(ConfigError::Invalid("server.host must be non-empty"));
    }
    let base = cfg.upstream.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ConfigError::Invalid(
            "upstream.base_url must be an http(s) URL",
        ));
    }
    if cfg.upstream.timeout_secs == 0 {
        return Err(ConfigError::Invalid("upstream.timeout_secs must be > 0"));
    }
    Ok(())
}

/// Example YAML configuration with every key at its default value.
pub fn example() -> &'static str {
    r#"app:
  database_url: "sqlite://./data/catalog-mirror.db"
  sync_interval_secs: 120
  sync_concurrency: 1

server:
  host: "0.0.0.0"
  port: 3000
  author: "catalog-mirror"

upstream:
  base_url: "https://selectionway.examsaathi.site"
  timeout_secs: 30
"#
}
