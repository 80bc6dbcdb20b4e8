//! Errors raised while executing admin commands.

use hyper::{Method, StatusCode};
use serde_json::error::Category;

/// Error types for admin commands. None of them mutates any state.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Could not parse body data: {0}")]
    MalformedPayload(String),
    #[error("Invalid body data: {0}")]
    ValidationError(String),
    #[error("Did not understand admin action: {action} (Method: {method})")]
    UnknownCommand { method: Method, action: String },
    #[error("API description unavailable: {0}")]
    DescriptionUnavailable(String),
}

impl AdminError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdminError::DescriptionUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AdminError::ValidationError(message.into())
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => AdminError::ValidationError(err.to_string()),
            Category::Syntax | Category::Eof | Category::Io => {
                AdminError::MalformedPayload(err.to_string())
            }
        }
    }
}
