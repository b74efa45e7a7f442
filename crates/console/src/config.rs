use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use mirror_core::LaunchConfig;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_API_ROOT: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Root every endpoint path is resolved against, e.g. `http://host:5000/api`.
    pub api_root: String,
    /// Period of the background sync while a job list is displayed.
    pub poll_interval_secs: u64,
    /// Used by retry for fields a history record does not echo.
    /// Fields left out of the table keep their built-in fallback.
    #[serde(deserialize_with = "over_retry_fallback")]
    pub retry_defaults: LaunchConfig,
}

/// `[retry_defaults]` as written in the file; every field is optional.
#[derive(Deserialize)]
struct RetryDefaultsTable {
    home_dir: Option<String>,
    final_registry: Option<String>,
    registry_auth_file: Option<String>,
    entitlement_key: Option<String>,
}

fn over_retry_fallback<'de, D>(deserializer: D) -> std::result::Result<LaunchConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let table = RetryDefaultsTable::deserialize(deserializer)?;
    let fallback = LaunchConfig::retry_fallback();
    Ok(LaunchConfig {
        home_dir: table.home_dir.unwrap_or(fallback.home_dir),
        final_registry: table.final_registry.unwrap_or(fallback.final_registry),
        registry_auth_file: table.registry_auth_file.unwrap_or(fallback.registry_auth_file),
        entitlement_key: table.entitlement_key.or(fallback.entitlement_key),
    })
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            retry_defaults: LaunchConfig::retry_fallback(),
        }
    }
}

impl ConsoleConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::parse(&s).with_context(|| format!("parse {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let cfg: ConsoleConfig = toml::from_str(s)?;
        Ok(cfg)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
