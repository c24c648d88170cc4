//! Health check HTTP handler

use axum::{Json, response::IntoResponse};

use crate::web::responses::HealthResponse;

/// `GET /health`
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::ok())
}
