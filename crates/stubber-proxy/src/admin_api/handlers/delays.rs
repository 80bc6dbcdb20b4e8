//! Delay handlers.

use crate::admin_api::error::AdminError;
use crate::admin_api::types::{ok_response, parse_payload, SetDelaysRequest};
use crate::delay::DelayEntry;
use crate::proxy::ProxyState;
use crate::upsert::Upsert;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use serde::Deserialize;
use tracing::{info, warn};

/// POST setDelays - Configure delays for several URLs
///
/// Entries without a string `url` or a non-negative integer `delay` are
/// skipped; the remaining entries are still applied.
pub fn handle_set(state: &ProxyState, body: &[u8]) -> Result<Response<Full<Bytes>>, AdminError> {
    let request: SetDelaysRequest = parse_payload(body)?;

    let mut entries = Vec::with_capacity(request.delays.len());
    for (index, raw) in request.delays.iter().enumerate() {
        match DelayEntry::deserialize(raw) {
            Ok(entry) => {
                info!(
                    "Setting delay of {} milliseconds for URL: {}",
                    entry.delay_ms, entry.path
                );
                entries.push(entry);
            }
            Err(e) => warn!("Skipping delay entry #{} ({}): {}", index, raw, e),
        }
    }

    for (url, outcome) in state.delays.set_delays_bulk(entries) {
        if let Upsert::Replaced(previous) = outcome {
            warn!(
                "Response delay already set for url '{}' ({} ms), will be overridden",
                url,
                previous.as_millis()
            );
        }
    }

    Ok(ok_response())
}

/// DELETE clearAllDelays - Remove every delay
pub fn handle_clear_all(state: &ProxyState) -> Response<Full<Bytes>> {
    let removed = state.delays.clear_all();
    info!("Clearing all delays ({} removed)", removed);
    ok_response()
}
