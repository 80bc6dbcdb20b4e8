//! Listener and per-connection loop.

use super::context::ProxyState;
use super::dispatcher::dispatch;
use crate::config::Config;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

pub struct ProxyServer {
    state: Arc<ProxyState>,
}

impl ProxyServer {
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        Ok(Self {
            state: Arc::new(ProxyState::new(config)?),
        })
    }

    pub fn state(&self) -> &Arc<ProxyState> {
        &self.state
    }

    /// Bind the configured listen address. Port 0 picks a free port.
    pub async fn bind(self) -> Result<BoundProxyServer, anyhow::Error> {
        let addr = self.state.config.listen.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;
        Ok(BoundProxyServer {
            state: self.state,
            listener,
        })
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        self.bind().await?.serve().await
    }
}

/// A server with its listener open, ready to accept.
pub struct BoundProxyServer {
    state: Arc<ProxyState>,
    listener: TcpListener,
}

impl BoundProxyServer {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &Arc<ProxyState> {
        &self.state
    }

    /// Accept connections until the listener fails.
    pub async fn serve(self) -> Result<(), anyhow::Error> {
        let addr = self.local_addr()?;
        let config = &self.state.config;
        info!("Listening on http://{}", addr);
        info!(
            "Proxying to {} (HTTPS: {})",
            config.upstream.base_url(),
            config.is_secure_upstream()
        );
        info!(
            "API description at http://{}{}swagger",
            self.state.swagger_host, self.state.admin_prefix
        );

        loop {
            let (stream, remote_addr) = self.listener.accept().await?;
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { dispatch(&state, req).await }
                });

                // Client disconnects land here too; not worth more than debug.
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}
