//! Marker headers stubber-proxy adds to responses it produces itself.

use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;

/// Set on every response served from a mock.
pub static X_STUBBER_STUBBED: HeaderName = HeaderName::from_static("x-stubber-stubbed");
/// Set on the 502 produced when the upstream could not be reached.
pub static X_STUBBER_UPSTREAM_ERROR: HeaderName =
    HeaderName::from_static("x-stubber-upstream-error");

pub static VALUE_TRUE: HeaderValue = HeaderValue::from_static("true");

/// Extension trait for inserting stubber headers into responses.
pub trait StubberHeadersExt {
    /// Insert a header with a static name and value.
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue);
}

impl<B> StubberHeadersExt for Response<B> {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
        self.headers_mut().insert(name.clone(), value.clone());
    }
}
