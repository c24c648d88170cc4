//! HTTP response types and error mapping
//!
//! Wire formats for the token endpoint. Validation failures carry per-field
//! details; every other failure maps to one stable, generic 500 body so
//! internal detail never leaks to the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::AppError;

/// Request body for `POST /api/ks`; unknown fields are ignored
///
/// `entryId` is kept as a raw JSON value so that type violations surface in
/// the same validation format as pattern violations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KsRequest {
    #[serde(default, rename = "entryId")]
    pub entry_id: Option<serde_json::Value>,
}

/// Successful token response
#[derive(Debug, Clone, Serialize)]
pub struct KsResponse {
    pub ks: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Per-field detail in a validation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// `400` body for schema violations
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorBody {
    pub status: u16,
    pub error: &'static str,
    pub details: Vec<FieldError>,
}

impl ValidationErrorBody {
    pub fn new(details: Vec<FieldError>) -> Self {
        Self {
            status: 400,
            error: "Validation Error",
            details,
        }
    }
}

/// Generic failure body for configuration and upstream errors
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrorBody::new(vec![FieldError { field, message }])),
            )
                .into_response(),
            other => {
                // logged here, never echoed to the caller
                error!(error = %other, "token request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "Failed to generate KS token".to_string(),
                        status: 500,
                    }),
                )
                    .into_response()
            }
        }
    }
}
