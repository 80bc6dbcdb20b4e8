//! Mock response management handlers.

use crate::admin_api::error::AdminError;
use crate::admin_api::types::{
    json_response, ok_response, parse_payload, ClearMockRequest, SetMockRequest,
};
use crate::proxy::ProxyState;
use crate::upsert::Upsert;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use tracing::{info, warn};

/// PUT setMockResponse - Register or replace a mock response
pub fn handle_set(state: &ProxyState, body: &[u8]) -> Result<Response<Full<Bytes>>, AdminError> {
    let request: SetMockRequest = parse_payload(body)?;
    let delay = request.delay();
    let stub = request.into_stub()?;
    let url = stub.path.clone();

    info!(
        "Setting mock [URL: {}] [Status code: {}] {} [Delay: {} ms] [Times: {}]",
        url,
        stub.status_code,
        describe_body(&stub.body),
        delay.as_millis(),
        stub.remaining_uses
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
    );

    let outcome = state.registry.set(stub, delay);
    match (&outcome.stub, &outcome.delay) {
        (Upsert::Replaced(_), _) => warn!(
            "Mock response already set for url '{}', will be overridden with new response",
            url
        ),
        (Upsert::Inserted, Upsert::Replaced(previous)) => warn!(
            "Response delay already set for url '{}' ({} ms), will be overridden",
            url,
            previous.as_millis()
        ),
        (Upsert::Inserted, Upsert::Inserted) => {}
    }

    Ok(ok_response())
}

/// DELETE clearMockResponse - Remove one mock response and its delay
pub fn handle_clear(state: &ProxyState, body: &[u8]) -> Result<Response<Full<Bytes>>, AdminError> {
    let request: ClearMockRequest = parse_payload(body)?;

    if state.registry.clear(&request.url) {
        info!("Clearing mock response for url '{}'", request.url);
    } else {
        warn!(
            "Mock response is not set for url '{}', skipping clearMockResponse",
            request.url
        );
    }

    Ok(ok_response())
}

/// DELETE clearAllMockResponses - Remove every mock response, keeping delays
pub fn handle_clear_all(state: &ProxyState) -> Response<Full<Bytes>> {
    let removed = state.registry.clear_all();
    info!("Clearing all mock responses ({} removed)", removed);
    ok_response()
}

/// GET listMockResponses - Delivery count per registered URL
pub fn handle_list(state: &ProxyState) -> Response<Full<Bytes>> {
    json_response(&state.registry.use_counts())
}

fn describe_body(body: &serde_json::Value) -> String {
    match body {
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            format!("[Response body: {body}]")
        }
        serde_json::Value::String(s) => format!("[Raw response body: {s}]"),
        other => format!("[Raw response body: {other}]"),
    }
}
