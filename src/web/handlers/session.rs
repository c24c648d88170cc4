//! Session token HTTP handler

use axum::{
    Json,
    extract::State,
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::models::EntryId;
use crate::web::AppState;
use crate::web::responses::{KsRequest, KsResponse};

/// `POST /api/ks`
///
/// Validates the optional entry id at the boundary; a malformed id or an
/// unparseable body is rejected before anything leaves the process. A
/// missing or empty body is treated as a request for the configured default
/// entry.
pub async fn generate_ks(
    State(state): State<AppState>,
    body: Result<Option<Json<KsRequest>>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(body) => body.map(|Json(request)| request).unwrap_or_default(),
        Err(rejection) => {
            return AppError::validation("body", rejection.body_text()).into_response();
        }
    };

    let entry_id = match request.entry_id {
        None => None,
        Some(serde_json::Value::String(raw)) => match raw.parse::<EntryId>() {
            Ok(entry_id) => Some(entry_id),
            Err(e) => return e.into_response(),
        },
        Some(_) => {
            return AppError::validation("entryId", "must be a string").into_response();
        }
    };

    match state.session_tokens.issue(entry_id.as_ref(), &[]).await {
        Ok(token) => Json(KsResponse {
            ks: token.into_inner(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}
