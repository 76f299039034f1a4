//! Import flash message handler

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};

use crate::{get_user_email, AppError, AppState};

/// GET /api/imports/flash - Fetch and consume the pending cancelled-record
/// message for the calling user
///
/// Returns `null` when nothing is pending. A second call after a successful
/// fetch also returns `null`; the message is one-shot.
pub async fn get_import_flash(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_email = get_user_email(&headers);

    match state.flash.take(&user_email) {
        Some(flash) => Ok(Json(serde_json::to_value(flash)?)),
        None => Ok(Json(serde_json::Value::Null)),
    }
}
