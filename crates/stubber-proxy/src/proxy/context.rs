//! Shared state handed to every request.

use super::client::{create_http_client, HttpClient};
use crate::config::Config;
use crate::delay::DelayScheduler;
use crate::recording::HistoryLog;
use crate::stubs::MockRegistry;
use std::sync::Arc;

/// Registries, upstream client and settings used by the dispatcher and the
/// admin commands.
pub struct ProxyState {
    pub config: Arc<Config>,
    pub registry: Arc<MockRegistry>,
    /// Same table the registry updates; shared, not a copy.
    pub delays: Arc<DelayScheduler>,
    pub history: Arc<HistoryLog>,
    pub http_client: HttpClient,
    /// Normalized admin prefix, `/name/`.
    pub admin_prefix: String,
    /// `host` value served in the API description.
    pub swagger_host: String,
}

impl ProxyState {
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let http_client = create_http_client(&config)?;
        let delays = Arc::new(DelayScheduler::new());
        let registry = Arc::new(MockRegistry::new(Arc::clone(&delays)));
        let history = Arc::new(HistoryLog::new(config.history.capacity));
        let admin_prefix = config.admin.normalized_prefix();
        let swagger_host = config.admin.swagger_host_or(config.listen.port);

        Ok(Self {
            config: Arc::new(config),
            registry,
            delays,
            history,
            http_client,
            admin_prefix,
            swagger_host,
        })
    }
}
