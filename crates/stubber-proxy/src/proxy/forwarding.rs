//! Request forwarding to the upstream.
//!
//! Bodies are streamed in both directions; nothing is buffered.

use super::client::HttpClient;
use crate::config::UpstreamConfig;
use crate::metrics;
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, HOST};
use hyper::{Request, Response};
use std::time::Instant;
use tracing::debug;

/// Why a request could not be forwarded.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Invalid upstream request for '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: hyper::http::Error,
    },
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

impl ForwardError {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidUri { .. } => "invalid_uri",
            ForwardError::Upstream(_) => "upstream",
        }
    }
}

/// Build the upstream request: same method and target, all headers copied,
/// `Host` replaced by the upstream authority when `upstream.rewrites_host()`.
pub fn build_upstream_request<B>(
    upstream: &UpstreamConfig,
    req: Request<B>,
) -> Result<Request<B>, ForwardError> {
    let (parts, body) = req.into_parts();
    let upstream_path = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let full_uri = format!("{}{}", upstream.base_url(), upstream_path);

    debug!("Forwarding (streaming) to: {}", full_uri);

    let mut builder = Request::builder().method(parts.method).uri(&full_uri);
    if let Some(headers) = builder.headers_mut() {
        *headers = parts.headers;
        if upstream.rewrites_host() {
            if let Some(authority) = upstream.authority() {
                match HeaderValue::from_str(&authority) {
                    Ok(value) => {
                        headers.insert(HOST, value);
                    }
                    Err(_) => {
                        headers.remove(HOST);
                    }
                }
            }
        }
    }

    builder
        .body(body)
        .map_err(|source| ForwardError::InvalidUri {
            uri: full_uri,
            source,
        })
}

/// Forward a request with streaming body (no buffering).
///
/// Resolves as soon as the upstream response head has arrived.
pub async fn forward_request_streaming<B>(
    http_client: &HttpClient,
    upstream: &UpstreamConfig,
    req: Request<B>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, ForwardError>
where
    B: Body<Data = Bytes, Error = hyper::Error> + Send + Sync + 'static,
{
    let method = req.method().clone();
    let upstream_req = build_upstream_request(upstream, req)?.map(BoxBody::new);

    let start = Instant::now();
    let upstream_response = http_client.request(upstream_req).await?;
    metrics::record_upstream_duration(
        method.as_str(),
        upstream_response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    let (parts, body) = upstream_response.into_parts();
    Ok(Response::from_parts(parts, BoxBody::new(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::ACCEPT;
    use hyper::Method;

    fn request(uri: &str) -> Request<()> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(HOST, "stubber.local:5001")
            .header(ACCEPT, "application/json")
            .body(())
            .unwrap()
    }

    #[test]
    fn test_target_appended_to_upstream() {
        let upstream = UpstreamConfig::new("http://backend:8080/");
        let out = build_upstream_request(&upstream, request("/api/items?page=2")).unwrap();
        assert_eq!(out.uri(), "http://backend:8080/api/items?page=2");
        assert_eq!(out.method(), Method::POST);
        assert_eq!(out.headers()[ACCEPT], "application/json");
    }

    #[test]
    fn test_http_upstream_keeps_client_host() {
        let upstream = UpstreamConfig::new("http://backend:8080");
        let out = build_upstream_request(&upstream, request("/a")).unwrap();
        assert_eq!(out.headers()[HOST], "stubber.local:5001");
    }

    #[test]
    fn test_https_upstream_rewrites_host() {
        let upstream = UpstreamConfig::new("https://api.example.com");
        let out = build_upstream_request(&upstream, request("/a")).unwrap();
        assert_eq!(out.headers()[HOST], "api.example.com");
        assert_eq!(out.headers().get_all(HOST).iter().count(), 1);
    }

    #[test]
    fn test_change_origin_rewrites_host() {
        let mut upstream = UpstreamConfig::new("http://backend:8080");
        upstream.change_origin = true;
        let out = build_upstream_request(&upstream, request("/a")).unwrap();
        assert_eq!(out.headers()[HOST], "backend:8080");
    }

    #[test]
    fn test_invalid_upstream_uri() {
        let upstream = UpstreamConfig::new("http://bad host");
        let err = build_upstream_request(&upstream, request("/a")).unwrap_err();
        assert_eq!(err.kind(), "invalid_uri");
    }
}
