//! API request/response models.

use crate::error::ObservationError;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

/// Response for the known-routes endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct KnownRoutesResponse {
    pub routes: Vec<String>,
}

/// Which side of the request a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    Backend,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub kind: ErrorKind,
    pub error: String,
    /// Per-parameter messages for invalid requests.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

/// 400 with per-field messages.
pub fn invalid_request(message: impl Into<String>, fields: BTreeMap<String, String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            success: false,
            kind: ErrorKind::InvalidRequest,
            error: message.into(),
            fields,
        }),
    )
}

/// 500 for store, snapshot and serialization failures. Logged at error level.
pub fn backend_error(context: &str, err: &ObservationError) -> ApiError {
    error!(error = %err, "{}", context);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            success: false,
            kind: ErrorKind::Backend,
            error: format!("{}: {}", context, err),
            fields: BTreeMap::new(),
        }),
    )
}

/// Map a domain error onto the matching response.
pub fn api_error(context: &str, err: ObservationError) -> ApiError {
    match err {
        ObservationError::InvalidParameter { field, message } => {
            let mut fields = BTreeMap::new();
            fields.insert(field, message);
            invalid_request("Invalid request parameters", fields)
        }
        ObservationError::InvalidFilterField(field) => {
            let mut fields = BTreeMap::new();
            fields.insert(field, "Not a valid field name.".to_string());
            invalid_request("Invalid request parameters", fields)
        }
        other => backend_error(context, &other),
    }
}
