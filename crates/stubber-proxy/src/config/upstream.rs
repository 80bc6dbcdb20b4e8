//! Upstream and connection pool configuration.

use super::protocol::Protocol;
use hyper::Uri;
use serde::{Deserialize, Serialize};

/// What a client sees when the upstream cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorMode {
    /// Answer 502 Bad Gateway.
    #[default]
    #[value(name = "bad_gateway")]
    BadGateway,
    /// Leave the response open until the client gives up.
    #[value(name = "hang")]
    Hang,
}

impl UpstreamErrorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamErrorMode::BadGateway => "bad_gateway",
            UpstreamErrorMode::Hang => "hang",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL of the real service, e.g. `https://backend:8443`.
    #[serde(default)]
    pub url: String,
    /// Skip TLS certificate verification (for self-signed certs in dev/test)
    #[serde(default)]
    pub tls_skip_verify: bool,
    /// Rewrite `Host` to the upstream authority even for plain HTTP targets.
    #[serde(default)]
    pub change_origin: bool,
    #[serde(default)]
    pub on_error: UpstreamErrorMode,
}

impl UpstreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn uri(&self) -> Result<Uri, String> {
        self.url
            .parse::<Uri>()
            .map_err(|e| format!("Invalid upstream URL '{}': {e}", self.url))
    }

    /// Parse and extract protocol from URL
    pub fn protocol(&self) -> Result<Protocol, String> {
        let uri = self.uri()?;
        let scheme = uri
            .scheme_str()
            .ok_or_else(|| format!("Invalid URL format (missing scheme): {}", self.url))?;
        Protocol::from_scheme(scheme)
    }

    /// `host[:port]` of the upstream, used when rewriting `Host`.
    pub fn authority(&self) -> Option<String> {
        self.uri()
            .ok()
            .and_then(|uri| uri.authority().map(|a| a.as_str().to_string()))
    }

    /// URL that request targets are appended to.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Whether outgoing requests carry the upstream authority as `Host`.
    pub fn rewrites_host(&self) -> bool {
        self.change_origin || self.protocol().is_ok_and(|p| p.is_secure())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("No upstream target configured (use --target or 'upstream.url')".into());
        }
        self.protocol()?;
        if self.authority().is_none() {
            return Err(format!("Upstream URL '{}' has no host", self.url));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConnectionPoolConfig {
    #[serde(default = "default_pool_max_idle_per_host")]
    pub max_idle_per_host: usize,

    #[serde(default = "default_pool_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_keepalive_timeout")]
    pub keepalive_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_pool_max_idle_per_host(),
            idle_timeout_secs: default_pool_idle_timeout(),
            keepalive_timeout_secs: default_keepalive_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

fn default_pool_idle_timeout() -> u64 {
    90
}

fn default_keepalive_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    5
}
