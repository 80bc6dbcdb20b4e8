//! Configuration types for stubber-proxy.
//!
//! Everything can come from a YAML file, from the command line, or both;
//! command-line values are applied on top of the file before validation.

mod admin;
mod history;
mod listen;
mod protocol;
mod upstream;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use admin::{normalize_prefix, AdminConfig, DEFAULT_ADMIN_PREFIX};
pub use history::HistoryConfig;
pub use listen::{ListenConfig, DEFAULT_PORT};
pub use protocol::Protocol;
pub use upstream::{ConnectionPoolConfig, UpstreamConfig, UpstreamErrorMode};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,
}

impl Config {
    /// Config for `target` with every other setting at its default.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            upstream: UpstreamConfig::new(target),
            ..Default::default()
        }
    }

    /// Load and validate a config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file without validating it, so that command-line
    /// overrides can fill in what the file leaves out.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.upstream.validate().map_err(|e| anyhow::anyhow!(e))?;

        if self.history.capacity == 0 {
            anyhow::bail!("'history.capacity' must be at least 1");
        }

        if self.admin.normalized_prefix() == "/" {
            anyhow::bail!(
                "'admin.prefix' must name a path segment, got '{}'",
                self.admin.prefix
            );
        }

        if let Some(ref path) = self.admin.swagger_path {
            if !path.is_file() {
                tracing::warn!(
                    "Swagger document '{}' not found, GET {}swagger will fail",
                    path.display(),
                    self.admin.normalized_prefix()
                );
            }
        }

        Ok(())
    }

    pub fn is_secure_upstream(&self) -> bool {
        self.upstream.protocol().is_ok_and(|p| p.is_secure())
    }
}
