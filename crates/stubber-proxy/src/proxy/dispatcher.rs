//! Per-request dispatch: admin command, stubbed response or proxied call.
//!
//! ```text
//! Routing ──▶ Admin    (path under the admin prefix)
//!         ──▶ Stubbed  (a mock matches the full target or the bare path)
//!         ──▶ Proxied  (everything else)
//! ```
//!
//! A stub delivery is reserved before its delay and only counted once the
//! body has been written. If the client goes away first, the reservation is
//! released with the dropped future.

use super::context::ProxyState;
use super::forwarding::forward_request_streaming;
use super::response_ext::{bad_gateway, stub_response, ProxyResponse, ResponseExt};
use crate::admin_api::{admin_action, route_admin};
use crate::config::UpstreamErrorMode;
use crate::delay::apply_delay;
use crate::metrics;
use crate::recording::{RequestSnapshot, ResponseMeta};
use crate::stubs::DeliveryClaim;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request};
use std::convert::Infallible;
use tracing::{debug, error, info, warn};

/// Where a request goes.
#[derive(Debug)]
pub enum Route {
    /// Admin command named by the remainder of the path.
    Admin(String),
    Stubbed(DeliveryClaim),
    Proxied,
}

/// Decide the route for `req`, reserving a stub delivery when one matches.
pub fn route<B>(state: &ProxyState, req: &Request<B>) -> Route {
    let path = req.uri().path();
    if let Some(action) = admin_action(&state.admin_prefix, path) {
        return Route::Admin(action.to_string());
    }

    let target = request_target(req);
    match state.registry.claim(target, path) {
        Some(claim) => Route::Stubbed(claim),
        None => Route::Proxied,
    }
}

/// Handle one inbound request.
pub async fn dispatch<B>(state: &ProxyState, req: Request<B>) -> Result<ProxyResponse, Infallible>
where
    B: Body<Data = Bytes, Error = hyper::Error> + Send + Sync + 'static,
{
    let response = match route(state, &req) {
        Route::Admin(action) => {
            metrics::record_route("admin");
            route_admin(state, req, &action).await.into_boxed()
        }
        Route::Stubbed(claim) => {
            metrics::record_route("stubbed");
            serve_stub(claim, req.method()).await
        }
        Route::Proxied => {
            metrics::record_route("proxied");
            proxy(state, req).await
        }
    };
    Ok(response)
}

async fn serve_stub(claim: DeliveryClaim, method: &Method) -> ProxyResponse {
    let delay = claim.delay();
    let stub = claim.stub();
    info!(
        "Returning mock data [URL: {}] [Status code: {}] [Delay: {} ms] [Times: {} left]",
        claim.key(),
        stub.status_code,
        delay.as_millis(),
        stub.remaining_uses
            .map_or_else(|| "unlimited".to_string(), |n| n.saturating_sub(1).to_string())
    );

    if !delay.is_zero() {
        metrics::record_delay("stubbed", delay.as_millis());
        apply_delay(delay).await;
    }
    stub_response(claim, method)
}

async fn proxy<B>(state: &ProxyState, req: Request<B>) -> ProxyResponse
where
    B: Body<Data = Bytes, Error = hyper::Error> + Send + Sync + 'static,
{
    let target = request_target(&req).to_string();
    info!("Proxying request {}", target);

    let handle = state.history.append(RequestSnapshot::new(
        req.method().as_str(),
        &target,
        req.headers(),
    ));

    let delay = state.delays.get_delay(&target);
    if !delay.is_zero() {
        info!("Delaying call by {} milliseconds", delay.as_millis());
        metrics::record_delay("proxied", delay.as_millis());
        apply_delay(delay).await;
    }

    match forward_request_streaming(&state.http_client, &state.config.upstream, req).await {
        Ok(response) => {
            let meta = ResponseMeta::new(response.status().as_u16(), response.headers());
            if !state.history.patch_response(handle, meta) {
                // Evicted or cleared while the call was in flight.
                debug!(
                    "History record {} gone before its response arrived",
                    handle.sequence()
                );
            }
            response
        }
        Err(err) => {
            error!("Proxy error for {}: {}", target, err);
            metrics::record_upstream_error(err.kind());
            match state.config.upstream.on_error {
                UpstreamErrorMode::BadGateway => bad_gateway(),
                UpstreamErrorMode::Hang => {
                    warn!("Leaving request {} unanswered (on_error: hang)", target);
                    std::future::pending::<ProxyResponse>().await
                }
            }
        }
    }
}

/// Path plus query string, as the client sent it.
fn request_target<B>(req: &Request<B>) -> &str {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path())
}
