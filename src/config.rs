//! Startup configuration.
//!
//! Loaded from the YAML file named by `STATIK_CONFIG` (all keys optional),
//! then `LISTEN` overrides the listen address.
//!
//! ```yaml
//! server:
//!   listen_addr: "0.0.0.0:8080"
//!   max_connections: 1024
//!   io_timeout_ms: 30000
//! static_files:
//!   root: "."
//!   confine_to_root: true
//! limits:
//!   max_request_bytes: 65536
//!   max_response_bytes: 104857600
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

pub const CONFIG_PATH_VAR: &str = "STATIK_CONFIG";
pub const LISTEN_VAR: &str = "LISTEN";

/// Smallest response limit that still fits the fixed error pages.
const MIN_RESPONSE_BYTES: usize = 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Connections served at once; further accepts wait for a free slot.
    pub max_connections: usize,
    /// Per read/write timeout in milliseconds, `0` disables it.
    pub io_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    pub confine_to_root: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_request_bytes: usize,
    pub max_response_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            max_connections: 1024,
            io_timeout_ms: 30_000,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            confine_to_root: true,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: 64 * 1024,
            max_response_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn io_timeout(&self) -> Option<Duration> {
        (self.io_timeout_ms > 0).then(|| Duration::from_millis(self.io_timeout_ms))
    }
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration using `lookup` to read environment variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match lookup(CONFIG_PATH_VAR) {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path))?;
                Self::from_yaml(&text).with_context(|| format!("invalid config file {}", path))?
            }
            None => Self::default(),
        };

        if let Some(listen_addr) = lookup(LISTEN_VAR) {
            cfg.server.listen_addr = listen_addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.max_connections == 0 {
            bail!("server.max_connections must be at least 1");
        }
        if self.limits.max_request_bytes == 0 {
            bail!("limits.max_request_bytes must be at least 1");
        }
        if self.limits.max_response_bytes < MIN_RESPONSE_BYTES {
            bail!(
                "limits.max_response_bytes must be at least {} (got {})",
                MIN_RESPONSE_BYTES,
                self.limits.max_response_bytes
            );
        }
        Ok(())
    }
}
