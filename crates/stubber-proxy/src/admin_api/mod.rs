//! Admin command surface for stubber-proxy.
//!
//! Requests under the admin prefix (default `/proxy/`) never reach the
//! upstream. They manage:
//! - Mock responses (set, clear, clear all, list use counts)
//! - Per-URL delays (bulk set, clear all)
//! - The proxied request history (list, clear)
//! - The API description document and Prometheus metrics
//!
//! # Module Structure
//!
//! - `router` - command parsing and dispatch
//! - `types` - payloads and response helpers
//! - `error` - admin error type and status mapping
//! - `handlers` - one module per resource

mod error;
mod handlers;
mod router;
mod types;


pub use error::AdminError;
pub use handlers::system::{load_swagger, BUILTIN_SWAGGER};
pub use router::{admin_action, route_admin, AdminCommand};
pub use types::{ClearMockRequest, SetDelaysRequest, SetMockRequest, ALLOWED_METHODS};
