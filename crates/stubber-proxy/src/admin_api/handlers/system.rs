//! System handlers: API description, metrics, CORS preflight.

use crate::admin_api::error::AdminError;
use crate::admin_api::types::*;
use crate::metrics;
use crate::proxy::ProxyState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use std::path::Path;

/// Admin API description shipped with the binary.
pub const BUILTIN_SWAGGER: &str = include_str!("../../../swagger/swagger.json");

/// GET swagger - API description with `host` pointing at this proxy
pub fn handle_swagger(state: &ProxyState) -> Result<Response<Full<Bytes>>, AdminError> {
    let document = load_swagger(state.config.admin.swagger_path.as_deref(), &state.swagger_host)?;
    Ok(json_response(&document))
}

/// Read the description document (a configured file, or the built-in one)
/// and set its `host` field.
pub fn load_swagger(path: Option<&Path>, host: &str) -> Result<serde_json::Value, AdminError> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            AdminError::DescriptionUnavailable(format!("{}: {e}", path.display()))
        })?,
        None => BUILTIN_SWAGGER.to_string(),
    };

    let mut document: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| AdminError::DescriptionUnavailable(format!("invalid JSON: {e}")))?;
    let fields = document.as_object_mut().ok_or_else(|| {
        AdminError::DescriptionUnavailable("document is not a JSON object".to_string())
    })?;
    fields.insert(
        "host".to_string(),
        serde_json::Value::String(host.to_string()),
    );
    Ok(document)
}

/// GET metrics - Prometheus metrics
pub fn handle_metrics() -> Response<Full<Bytes>> {
    let mut response = admin_response(StatusCode::OK, metrics::collect_metrics());
    if let Ok(value) = metrics::metrics_content_type().parse() {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

/// OPTIONS <any> - CORS preflight
pub fn handle_options() -> Response<Full<Bytes>> {
    options_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_swagger_gets_host() {
        let doc = load_swagger(None, "localhost:5001").unwrap();
        assert_eq!(doc["host"], "localhost:5001");
        assert_eq!(doc["swagger"], "2.0");
        assert!(doc["paths"]["/setMockResponse"]["put"].is_object());
    }

    #[test]
    fn test_swagger_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"swagger": "2.0", "host": "old"}}"#).unwrap();
        let doc = load_swagger(Some(file.path()), "stubber:80").unwrap();
        assert_eq!(doc["host"], "stubber:80");
    }

    #[test]
    fn test_swagger_unavailable() {
        let err = load_swagger(Some(Path::new("/nonexistent/swagger.json")), "h").unwrap_err();
        assert!(matches!(err, AdminError::DescriptionUnavailable(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        let err = load_swagger(Some(file.path()), "h").unwrap_err();
        assert!(matches!(err, AdminError::DescriptionUnavailable(_)));
    }

    #[test]
    fn test_metrics_response() {
        let resp = handle_metrics();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
