//! Payload types and response helpers for the admin commands.

use super::error::AdminError;
use crate::stubs::{to_json_4, MockStub};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_TYPE,
};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Body of `PUT setMockResponse`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMockRequest {
    pub url: String,
    /// `null`, `0` or absent mean 200.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Required, but may be `null`.
    pub body: serde_json::Value,
    #[serde(default)]
    pub response_headers: Option<BTreeMap<String, serde_json::Value>>,
    /// Milliseconds; absent means no delay.
    #[serde(default)]
    pub delay: Option<u64>,
    /// Absent means unlimited; zero or negative means a single delivery.
    #[serde(default)]
    pub times: Option<i64>,
}

impl SetMockRequest {
    pub fn status(&self) -> Result<u16, AdminError> {
        match self.status_code {
            None | Some(0) => Ok(200),
            Some(code) if (100..=999).contains(&code) => Ok(code),
            Some(code) => Err(AdminError::validation(format!(
                "statusCode {code} is not a valid HTTP status"
            ))),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay.unwrap_or(0))
    }

    pub fn remaining_uses(&self) -> Option<u64> {
        self.times
            .map(|times| u64::try_from(times).unwrap_or(0).max(1))
    }

    /// Header values that are not strings are sent as their JSON text.
    pub fn headers(&self) -> BTreeMap<String, String> {
        self.response_headers
            .iter()
            .flatten()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect()
    }

    pub fn into_stub(self) -> Result<MockStub, AdminError> {
        let status = self.status()?;
        let headers = self.headers();
        let remaining_uses = self.remaining_uses();
        let mut stub = MockStub::new(self.url, self.body).with_status(status);
        stub.headers = headers;
        stub.remaining_uses = remaining_uses;
        Ok(stub)
    }
}

/// Body of `DELETE clearMockResponse`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClearMockRequest {
    pub url: String,
}

/// Body of `POST setDelays`. Entries are checked one by one so that a bad
/// entry does not reject the others.
#[derive(Debug, Clone, Deserialize)]
pub struct SetDelaysRequest {
    pub delays: Vec<serde_json::Value>,
}

/// Parse a JSON payload, classifying failures as malformed or invalid.
pub fn parse_payload<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, AdminError> {
    Ok(serde_json::from_slice(body)?)
}

// =============================================================================
// Response helper functions
// =============================================================================

/// Build an admin response: JSON content type plus the CORS headers every
/// admin answer carries.
pub fn admin_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    build_response_with_headers(
        status,
        [
            (CONTENT_TYPE.as_str(), "application/json"),
            (ACCESS_CONTROL_ALLOW_ORIGIN.as_str(), "*"),
            (ACCESS_CONTROL_ALLOW_METHODS.as_str(), ALLOWED_METHODS),
        ],
        body,
    )
}

/// 200 with an empty body.
pub fn ok_response() -> Response<Full<Bytes>> {
    admin_response(StatusCode::OK, Bytes::new())
}

/// 200 with `body` as JSON indented by four spaces.
pub fn json_response<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    let json = to_json_4(body).unwrap_or_else(|_| "{}".to_string());
    admin_response(StatusCode::OK, json)
}

/// Status only; details stay in the log.
pub fn error_response(err: &AdminError) -> Response<Full<Bytes>> {
    admin_response(err.status(), Bytes::new())
}

pub fn options_response() -> Response<Full<Bytes>> {
    let mut response = ok_response();
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Build an HTTP response with headers.
///
/// This function handles the unlikely case where Response::builder() fails
/// by returning a minimal 500 error response.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder.body(Full::new(body.into())).unwrap_or_else(|_| {
        let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// Collect request body into bytes
pub async fn collect_body<B>(body: B) -> Result<Bytes, AdminError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    body.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| AdminError::MalformedPayload(format!("Failed to read request body: {e}")))
}
