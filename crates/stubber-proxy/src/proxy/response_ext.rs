//! Conversions from the concrete response types the proxy produces into
//! the boxed body type hyper is served with.

use super::headers::{StubberHeadersExt, VALUE_TRUE, X_STUBBER_STUBBED, X_STUBBER_UPSTREAM_ERROR};
use crate::stubs::{DeliveryBody, DeliveryClaim, StubResponseBuilder};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode};
use std::convert::Infallible;

pub type ProxyResponse = Response<BoxBody<Bytes, hyper::Error>>;

/// Extension trait for `Response<Full<Bytes>>` providing common transformations.
pub trait ResponseExt {
    /// Convert the response body into a boxed body type.
    fn into_boxed(self) -> ProxyResponse;
}

impl ResponseExt for Response<Full<Bytes>> {
    fn into_boxed(self) -> ProxyResponse {
        self.map(|b| BoxBody::new(b.map_err(|never: Infallible| match never {})))
    }
}

/// The response for a claimed stub, answering a `method` request. The claim
/// completes once the body has been fully handed to the connection, or once
/// the head has when no body goes on the wire.
pub fn stub_response(claim: DeliveryClaim, method: &Method) -> ProxyResponse {
    let mut response = StubResponseBuilder::from_stub(claim.stub()).build();
    response.set_header(&X_STUBBER_STUBBED, &VALUE_TRUE);
    let head_only = is_head_only(method, response.status());
    response.map(|body| {
        let body = DeliveryBody::new(body, claim);
        let body = if head_only { body.head_only() } else { body };
        BoxBody::new(body.map_err(|never: Infallible| match never {}))
    })
}

/// Responses hyper writes without a body.
fn is_head_only(method: &Method, status: StatusCode) -> bool {
    *method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

/// 502 answered when the upstream cannot be reached.
pub fn bad_gateway() -> ProxyResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(b"{}")));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response.set_header(&X_STUBBER_UPSTREAM_ERROR, &VALUE_TRUE);
    response.into_boxed()
}
