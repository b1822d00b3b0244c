//! Uniform `{success, data}` response wrapper.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// Body of every non-empty response.
///
/// `data` holds the payload on success and the error message on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub data: Value,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::String(message.into()),
        }
    }

    /// Renders the envelope as JSON with an explicit status code.
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
