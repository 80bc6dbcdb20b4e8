//! HTTP client creation and configuration.
//!
//! One pooled client is shared by every proxied request.

use super::tls::{empty_roots_client_config, insecure_client_config};
use crate::config::Config;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::{info, warn};

/// Type alias for the HTTP client used by the proxy.
pub type HttpClient =
    Client<hyper_rustls::HttpsConnector<HttpConnector>, BoxBody<Bytes, hyper::Error>>;

/// Create the shared HTTP client with connection pooling.
pub fn create_http_client(config: &Config) -> Result<HttpClient, anyhow::Error> {
    // Native-roots loading builds its config from the process-wide provider.
    // Err only means one is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let pool = &config.connection_pool;

    let mut http_connector = HttpConnector::new();
    http_connector.set_keepalive(Some(Duration::from_secs(pool.keepalive_timeout_secs)));
    http_connector.set_connect_timeout(Some(Duration::from_secs(pool.connect_timeout_secs)));
    http_connector.enforce_http(false); // Allow both HTTP and HTTPS

    let tls = hyper_rustls::HttpsConnectorBuilder::new();
    let tls = if config.upstream.tls_skip_verify {
        warn!("TLS certificate verification DISABLED for the upstream (development/testing only)");
        tls.with_tls_config(insecure_client_config()?)
    } else {
        match tls.with_native_roots() {
            Ok(tls) => tls,
            Err(e) => {
                warn!(
                    "Failed to load native root certificates ({}), HTTPS upstreams cannot be verified",
                    e
                );
                hyper_rustls::HttpsConnectorBuilder::new()
                    .with_tls_config(empty_roots_client_config()?)
            }
        }
    };
    let https_connector = tls.https_or_http().enable_http1().wrap_connector(http_connector);

    let http_client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(pool.idle_timeout_secs))
        .pool_max_idle_per_host(pool.max_idle_per_host)
        .build(https_connector);

    info!(
        "Connection pool configured (HTTP/1.1): max_idle={}, idle_timeout={}s, keepalive={}s, connect_timeout={}s",
        pool.max_idle_per_host,
        pool.idle_timeout_secs,
        pool.keepalive_timeout_secs,
        pool.connect_timeout_secs
    );

    Ok(http_client)
}
