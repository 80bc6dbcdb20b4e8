//! Proxy server module.
//!
//! Every inbound request is either an admin command, a stubbed response
//! or a call forwarded to the single configured upstream.
//!
//! # Module Structure
//!
//! - `server` - ProxyServer struct and accept loop
//! - `dispatcher` - routing and the stubbed/proxied paths
//! - `context` - state shared by every request
//! - `forwarding` - request forwarding to the upstream
//! - `client` - HTTP client creation and configuration
//! - `tls` - upstream TLS settings
//! - `headers` - marker headers set on generated responses
//! - `response_ext` - response body conversions

mod client;
mod context;
mod dispatcher;
mod forwarding;
mod headers;
mod response_ext;
mod server;
mod tls;

pub use client::{create_http_client, HttpClient};
pub use context::ProxyState;
pub use dispatcher::{dispatch, route, Route};
pub use forwarding::{build_upstream_request, ForwardError};
pub use headers::{X_STUBBER_STUBBED, X_STUBBER_UPSTREAM_ERROR};
pub use response_ext::ProxyResponse;
pub use server::{BoundProxyServer, ProxyServer};
