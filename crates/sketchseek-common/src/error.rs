use serde::Deserialize;
use thiserror::Error;

/// Failure talking to the search backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Non-2xx response. `message` is the backend's `detail` or a generic fallback.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Build a status error from a raw response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        ApiError::Status {
            status,
            message: error_message(status, body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Extract the user-facing message from an error response body.
///
/// A string `detail` is used verbatim; structured details (validation error
/// lists) are rendered as JSON. Anything unparseable falls back to
/// `API error: <status>`.
pub fn error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);

    match detail {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Null | serde_json::Value::String(_)) | None => {
            format!("API error: {}", status)
        }
        Some(other) => other.to_string(),
    }
}
