//! Audit log handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{get_user_email, AppError, AppState, MAX_PAGE_LIMIT};
use sitebook_core::tax::DateWindow;
use sitebook_core::AuditEntry;

/// Query parameters for the audit log
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_audit_limit() -> i64 {
    100
}

#[derive(Serialize)]
pub struct AuditListResponse {
    pub entries: Vec<AuditEntry>,
    pub total: i64,
}

/// GET /api/audit - List audit log entries, newest first
pub async fn list_audit_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQuery>,
) -> Result<Json<AuditListResponse>, AppError> {
    let window = DateWindow::parse(params.start_date.as_deref(), params.end_date.as_deref())
        .map_err(|e| AppError::bad_request(&e.to_string()))?;
    let limit = params.limit.max(1).min(MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let entries = state.db.list_audit_log(&window, limit, offset)?;
    let total = state.db.count_audit_log(&window)?;

    Ok(Json(AuditListResponse { entries, total }))
}

#[derive(Serialize)]
pub struct ClearAuditResponse {
    pub deleted: usize,
}

/// DELETE /api/audit - Clear the audit log
///
/// Writes a fresh CLEAR_ALL entry afterwards so the wipe itself is recorded.
pub async fn clear_audit_log(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ClearAuditResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let deleted = state.db.clear_audit_log()?;

    state.db.log_audit(
        &user_email,
        sitebook_core::models::AuditAction::ClearAll,
        Some("audit_log"),
        None,
        Some(&format!("deleted={}", deleted)),
    )?;

    Ok(Json(ClearAuditResponse { deleted }))
}
