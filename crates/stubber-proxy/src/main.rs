use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use stubber_proxy::config::{Config, UpstreamErrorMode};
use stubber_proxy::proxy::ProxyServer;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Stubber - stub, delay or proxy HTTP calls to a single upstream
#[derive(Parser, Debug)]
#[command(name = "stubber-proxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Upstream base URL, e.g. http://backend:8080
    #[arg(short, long, env = "STUBBER_TARGET")]
    target: Option<String>,

    /// Port to listen on [default: 5001]
    #[arg(short, long, env = "STUBBER_PORT")]
    port: Option<u16>,

    /// Address to listen on [default: 0.0.0.0]
    #[arg(long)]
    host: Option<IpAddr>,

    /// YAML config file; command-line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, env = "STUBBER_DEBUG_LOG")]
    debug_log: bool,

    /// Host written into the API description document
    #[arg(long)]
    swagger_host: Option<String>,

    /// Number of proxied requests kept in the history [default: 50]
    #[arg(long)]
    history_capacity: Option<usize>,

    /// Path prefix of the admin commands [default: /proxy/]
    #[arg(long)]
    admin_prefix: Option<String>,

    /// What to answer when the upstream cannot be reached
    #[arg(long, value_enum)]
    on_upstream_error: Option<UpstreamErrorMode>,

    /// Do not verify upstream TLS certificates
    #[arg(long)]
    tls_skip_verify: bool,
}

impl Args {
    fn into_config(self) -> Result<Config, anyhow::Error> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(target) = self.target {
            config.upstream.url = target;
        }
        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(host) = self.host {
            config.listen.host = host;
        }
        if let Some(swagger_host) = self.swagger_host {
            config.admin.swagger_host = Some(swagger_host);
        }
        if let Some(capacity) = self.history_capacity {
            config.history.capacity = capacity;
        }
        if let Some(prefix) = self.admin_prefix {
            config.admin.prefix = prefix;
        }
        if let Some(mode) = self.on_upstream_error {
            config.upstream.on_error = mode;
        }
        if self.tls_skip_verify {
            config.upstream.tls_skip_verify = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Admin command summary, logged at startup and printed on bad usage.
fn usage(port: u16, prefix: &str) -> String {
    let base = format!("http://localhost:{port}{prefix}");
    format!(
        "Usage: stubber-proxy --target=http://targethost.com [--port=5001]\n\
         \n\
         Admin commands:\n\
         \x20 PUT    {base}setMockResponse        {{\"url\": \"/path\", \"statusCode\": 200, \"body\": {{}}, \"responseHeaders\": {{}}, \"delay\": 0, \"times\": 1}}\n\
         \x20 DELETE {base}clearMockResponse      {{\"url\": \"/path\"}}\n\
         \x20 DELETE {base}clearAllMockResponses\n\
         \x20 GET    {base}listMockResponses\n\
         \x20 POST   {base}setDelays              {{\"delays\": [{{\"url\": \"/path\", \"delay\": 1000}}]}}\n\
         \x20 DELETE {base}clearAllDelays\n\
         \x20 GET    {base}listProxiedRequests?limit=10\n\
         \x20 DELETE {base}clearProxiedCalls\n\
         \x20 GET    {base}swagger\n\
         \x20 GET    {base}metrics"
    )
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.debug_log);

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{}", usage(stubber_proxy::config::DEFAULT_PORT, "/proxy/"));
            std::process::exit(2);
        }
    };

    info!("stubber-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    for line in usage(config.listen.port, &config.admin.normalized_prefix()).lines() {
        info!("{}", line);
    }

    let server = match ProxyServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to create proxy: {:#}", e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Proxy server stopped: {:#}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
}
