//! Proxied request history handlers.

use crate::admin_api::types::{json_response, ok_response};
use crate::proxy::ProxyState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use tracing::info;

/// GET listProxiedRequests?limit=N - Most recent proxied requests first
pub fn handle_list(state: &ProxyState, query: Option<&str>) -> Response<Full<Bytes>> {
    json_response(&state.history.list(parse_limit(query)))
}

/// DELETE clearProxiedCalls - Empty the history
pub fn handle_clear(state: &ProxyState) -> Response<Full<Bytes>> {
    let removed = state.history.clear();
    info!("Clearing proxied calls ({} removed)", removed);
    ok_response()
}

/// The `limit` query parameter. Absent or not an integer means no limit.
pub fn parse_limit(query: Option<&str>) -> Option<i64> {
    query?
        .split('&')
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| *key == "limit")
        .and_then(|(_, value)| value.trim().parse().ok())
}
