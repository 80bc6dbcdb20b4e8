//! Admin surface configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ADMIN_PREFIX: &str = "/proxy/";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminConfig {
    /// Path prefix reserved for admin commands. Normalized to `/<name>/`.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// API description document served by `GET <prefix>swagger`.
    /// The built-in document is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swagger_path: Option<PathBuf>,
    /// Value for the description document's `host` field.
    /// Defaults to `localhost:<port>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swagger_host: Option<String>,
}

impl AdminConfig {
    pub fn normalized_prefix(&self) -> String {
        normalize_prefix(&self.prefix)
    }

    pub fn swagger_host_or(&self, port: u16) -> String {
        self.swagger_host
            .clone()
            .unwrap_or_else(|| format!("localhost:{port}"))
    }
}

fn default_prefix() -> String {
    DEFAULT_ADMIN_PREFIX.to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            swagger_path: None,
            swagger_host: None,
        }
    }
}

/// Strip surrounding slashes and whitespace, then wrap in exactly one leading
/// and one trailing `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    format!("/{trimmed}/")
}
