//! Building stubbed responses and tying delivery accounting to the body.

use super::registry::DeliveryClaim;
use super::types::{DeliveryOutcome, MockStub};
use crate::metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::{Body, Frame, SizeHint};
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use serde::Serialize;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, warn};

/// Content type every stub starts from; stub headers may override it.
pub const DEFAULT_STUB_CONTENT_TYPE: &str = "application/json";

/// Encode a stub body the way it goes on the wire.
///
/// Objects and arrays become JSON indented by four spaces, strings are
/// written raw, other primitives as their JSON text.
pub fn render_body(body: &serde_json::Value) -> Bytes {
    match body {
        serde_json::Value::String(s) => Bytes::from(s.clone()),
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            Bytes::from(to_json_4(body).unwrap_or_else(|_| body.to_string()))
        }
        other => Bytes::from(other.to_string()),
    }
}

/// Serialize with four-space indentation.
pub fn to_json_4<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Builder for stub responses.
pub struct StubResponseBuilder {
    status: StatusCode,
    body: Bytes,
    headers: HeaderMap,
}

impl StubResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(DEFAULT_STUB_CONTENT_TYPE),
        );
        Self {
            status,
            body: Bytes::new(),
            headers,
        }
    }

    /// Start from a registered stub: its status, headers over the default, its body.
    pub fn from_stub(stub: &MockStub) -> Self {
        let status = StatusCode::from_u16(stub.status_code).unwrap_or_else(|_| {
            warn!(
                "Mock response for '{}' has invalid status {}, using 500",
                stub.path, stub.status_code
            );
            StatusCode::INTERNAL_SERVER_ERROR
        });
        Self::new(status)
            .merge_headers(&stub.headers)
            .body(render_body(&stub.body))
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(mut self, name: &HeaderName, value: &HeaderValue) -> Self {
        self.headers.insert(name.clone(), value.clone());
        self
    }

    /// Overlay headers; names compare case-insensitively, so a stub's
    /// `content-type` replaces the default one.
    pub fn merge_headers<'a, H>(mut self, headers: H) -> Self
    where
        H: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    self.headers.insert(name, value);
                }
                _ => warn!("Skipping invalid mock response header '{}: {}'", key, value),
            }
        }
        self
    }

    pub fn build(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Response body that records the stub delivery once the last frame has
/// been handed to the transport.
///
/// hyper drops a body without polling it when there is nothing to write:
/// an empty body, a `HEAD` request, or a 1xx/204/304 status. Such a body
/// settles its claim on drop. Any other body dropped before its last frame
/// (client disconnected) releases the reservation without counting a
/// delivery.
pub struct DeliveryBody<B> {
    inner: B,
    claim: Option<DeliveryClaim>,
    nothing_to_send: bool,
}

impl<B: Body> DeliveryBody<B> {
    pub fn new(inner: B, claim: DeliveryClaim) -> Self {
        let nothing_to_send = inner.is_end_stream() || inner.size_hint().exact() == Some(0);
        Self {
            inner,
            claim: Some(claim),
            nothing_to_send,
        }
    }

    /// Mark the response as one whose body never reaches the wire.
    pub fn head_only(mut self) -> Self {
        self.nothing_to_send = true;
        self
    }
}

impl<B> DeliveryBody<B> {
    fn settle(&mut self) {
        let Some(claim) = self.claim.take() else {
            return;
        };
        let key = claim.key().to_string();
        let outcome = claim.complete();
        metrics::record_stub_delivery(outcome);
        match outcome {
            DeliveryOutcome::Delivered {
                remaining: Some(left),
            } => debug!("Mock response for '{}' delivered, {} left", key, left),
            DeliveryOutcome::Delivered { remaining: None } => {
                debug!("Mock response for '{}' delivered", key)
            }
            DeliveryOutcome::Expired => debug!("Mock response for '{}' expired", key),
            DeliveryOutcome::Stale => {
                debug!("Mock response for '{}' changed during delivery", key)
            }
        }
    }
}

impl<B> Drop for DeliveryBody<B> {
    fn drop(&mut self) {
        if self.nothing_to_send {
            self.settle();
        }
    }
}

impl<B> Body for DeliveryBody<B>
where
    B: Body + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => this.settle(),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.settle(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        // Stay open until polled so an empty body still settles its claim.
        self.claim.is_none() && self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
