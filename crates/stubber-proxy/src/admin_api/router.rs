//! Command dispatch for the admin surface.
//!
//! An admin request is one whose URI path starts with the configured prefix.
//! The remainder of the path names the command; the query string is kept
//! apart and only read by commands that take parameters.

use crate::admin_api::error::AdminError;
use crate::admin_api::handlers::{delays, history, mocks, system};
use crate::admin_api::types::{collect_body, error_response};
use crate::metrics;
use crate::proxy::ProxyState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response};
use tracing::{debug, error};

/// Admin commands, keyed by (method, command name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// PUT setMockResponse
    SetMockResponse,
    /// DELETE clearMockResponse
    ClearMockResponse,
    /// DELETE clearAllMockResponses
    ClearAllMockResponses,
    /// DELETE clearAllDelays
    ClearAllDelays,
    /// DELETE clearProxiedCalls
    ClearProxiedCalls,
    /// GET listMockResponses
    ListMockResponses,
    /// GET listProxiedRequests
    ListProxiedRequests,
    /// POST setDelays
    SetDelays,
    /// GET swagger
    Swagger,
    /// GET metrics
    Metrics,
    /// OPTIONS on any command
    Options,
}

impl AdminCommand {
    pub fn parse(method: &Method, action: &str) -> Option<Self> {
        if *method == Method::OPTIONS {
            return Some(AdminCommand::Options);
        }
        let command = match (method, action) {
            (&Method::PUT, "setMockResponse") => AdminCommand::SetMockResponse,
            (&Method::DELETE, "clearMockResponse") => AdminCommand::ClearMockResponse,
            (&Method::DELETE, "clearAllMockResponses") => AdminCommand::ClearAllMockResponses,
            (&Method::DELETE, "clearAllDelays") => AdminCommand::ClearAllDelays,
            (&Method::DELETE, "clearProxiedCalls") => AdminCommand::ClearProxiedCalls,
            (&Method::GET, "listMockResponses") => AdminCommand::ListMockResponses,
            (&Method::GET, "listProxiedRequests") => AdminCommand::ListProxiedRequests,
            (&Method::POST, "setDelays") => AdminCommand::SetDelays,
            (&Method::GET, "swagger") => AdminCommand::Swagger,
            (&Method::GET, "metrics") => AdminCommand::Metrics,
            _ => return None,
        };
        Some(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdminCommand::SetMockResponse => "setMockResponse",
            AdminCommand::ClearMockResponse => "clearMockResponse",
            AdminCommand::ClearAllMockResponses => "clearAllMockResponses",
            AdminCommand::ClearAllDelays => "clearAllDelays",
            AdminCommand::ClearProxiedCalls => "clearProxiedCalls",
            AdminCommand::ListMockResponses => "listMockResponses",
            AdminCommand::ListProxiedRequests => "listProxiedRequests",
            AdminCommand::SetDelays => "setDelays",
            AdminCommand::Swagger => "swagger",
            AdminCommand::Metrics => "metrics",
            AdminCommand::Options => "options",
        }
    }
}

/// The command part of `path` if it lies under `prefix`.
///
/// `prefix` must already be normalized (`/name/`). Matching is literal and
/// case-sensitive, so `/proxy` alone is ordinary traffic.
pub fn admin_action<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    path.strip_prefix(prefix)
}

/// Execute the admin command named by `action`.
///
/// Failures never touch state; they are logged and answered with their
/// status code and an empty body.
pub async fn route_admin<B>(state: &ProxyState, req: Request<B>, action: &str) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    debug!("Admin command: {} {}", method, action);

    let Some(command) = AdminCommand::parse(&method, action) else {
        let err = AdminError::UnknownCommand {
            method,
            action: action.to_string(),
        };
        error!("{}", err);
        metrics::record_admin_command("unknown", false);
        return error_response(&err);
    };

    let query = req.uri().query().map(str::to_string);
    match execute(state, command, req.into_body(), query.as_deref()).await {
        Ok(response) => {
            metrics::record_admin_command(command.name(), true);
            response
        }
        Err(err) => {
            error!("{} failed: {}", command.name(), err);
            metrics::record_admin_command(command.name(), false);
            error_response(&err)
        }
    }
}

async fn execute<B>(
    state: &ProxyState,
    command: AdminCommand,
    body: B,
    query: Option<&str>,
) -> Result<Response<Full<Bytes>>, AdminError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    match command {
        AdminCommand::SetMockResponse => mocks::handle_set(state, &collect_body(body).await?),
        AdminCommand::ClearMockResponse => mocks::handle_clear(state, &collect_body(body).await?),
        AdminCommand::ClearAllMockResponses => Ok(mocks::handle_clear_all(state)),
        AdminCommand::ListMockResponses => Ok(mocks::handle_list(state)),
        AdminCommand::SetDelays => delays::handle_set(state, &collect_body(body).await?),
        AdminCommand::ClearAllDelays => Ok(delays::handle_clear_all(state)),
        AdminCommand::ListProxiedRequests => Ok(history::handle_list(state, query)),
        AdminCommand::ClearProxiedCalls => Ok(history::handle_clear(state)),
        AdminCommand::Swagger => system::handle_swagger(state),
        AdminCommand::Metrics => Ok(system::handle_metrics()),
        AdminCommand::Options => Ok(system::handle_options()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(
            AdminCommand::parse(&Method::PUT, "setMockResponse"),
            Some(AdminCommand::SetMockResponse)
        );
        assert_eq!(
            AdminCommand::parse(&Method::POST, "setDelays"),
            Some(AdminCommand::SetDelays)
        );
        assert_eq!(
            AdminCommand::parse(&Method::GET, "listProxiedRequests"),
            Some(AdminCommand::ListProxiedRequests)
        );
        assert_eq!(
            AdminCommand::parse(&Method::DELETE, "clearAllDelays"),
            Some(AdminCommand::ClearAllDelays)
        );
    }

    #[test]
    fn test_parse_wrong_method_is_unknown() {
        assert_eq!(AdminCommand::parse(&Method::GET, "setMockResponse"), None);
        assert_eq!(AdminCommand::parse(&Method::POST, "clearAllDelays"), None);
        assert_eq!(AdminCommand::parse(&Method::GET, "SWAGGER"), None);
        assert_eq!(AdminCommand::parse(&Method::GET, ""), None);
    }

    #[test]
    fn test_options_matches_any_action() {
        for action in ["", "setMockResponse", "anything/at/all"] {
            assert_eq!(
                AdminCommand::parse(&Method::OPTIONS, action),
                Some(AdminCommand::Options)
            );
        }
    }

    #[test]
    fn test_admin_action_literal_prefix() {
        assert_eq!(admin_action("/proxy/", "/proxy/swagger"), Some("swagger"));
        assert_eq!(admin_action("/proxy/", "/proxy/"), Some(""));
        assert_eq!(admin_action("/proxy/", "/proxy"), None);
        assert_eq!(admin_action("/proxy/", "/Proxy/swagger"), None);
        assert_eq!(admin_action("/proxy/", "/api/proxy/swagger"), None);
    }

    #[test]
    fn test_command_names_round_trip() {
        let commands = [
            (Method::PUT, AdminCommand::SetMockResponse),
            (Method::DELETE, AdminCommand::ClearMockResponse),
            (Method::DELETE, AdminCommand::ClearAllMockResponses),
            (Method::DELETE, AdminCommand::ClearAllDelays),
            (Method::DELETE, AdminCommand::ClearProxiedCalls),
            (Method::GET, AdminCommand::ListMockResponses),
            (Method::GET, AdminCommand::ListProxiedRequests),
            (Method::POST, AdminCommand::SetDelays),
            (Method::GET, AdminCommand::Swagger),
            (Method::GET, AdminCommand::Metrics),
        ];
        for (method, command) in commands {
            assert_eq!(AdminCommand::parse(&method, command.name()), Some(command));
        }
    }
}
