//! Sales import, listing, project linking and export handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, Request, State},
    http::{header, Response, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::flash::ImportFlash;
use crate::{get_user_email, AppError, AppState, MAX_PAGE_LIMIT, SuccessResponse};
use sitebook_core::db::SaleTotals;
use sitebook_core::import::parse_sales_csv;
use sitebook_core::models::{AuditAction, SaleRecord};
use sitebook_core::tax::DateWindow;

use super::purchases::{read_csv_upload, ClearResponse, ImportResponse};

/// Query parameters for listing sales
#[derive(Debug, Deserialize)]
pub struct SaleQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

#[derive(Serialize)]
pub struct SaleListResponse {
    pub sales: Vec<SaleRecord>,
    pub totals: SaleTotals,
}

/// GET /api/sales - List sales with window, pagination and totals
pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SaleQuery>,
) -> Result<Json<SaleListResponse>, AppError> {
    let window = DateWindow::parse(params.start_date.as_deref(), params.end_date.as_deref())
        .map_err(|e| AppError::bad_request(&e.to_string()))?;
    let limit = params.limit.max(1).min(MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let sales = state.db.list_sales(&window, limit, offset)?;
    let totals = state.db.sale_totals(&window)?;

    Ok(Json(SaleListResponse { sales, totals }))
}

/// POST /api/sales/import - Import sales from an RRA CSV export
///
/// Same reconciling contract as the purchases import.
pub async fn import_sales(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let user_email = get_user_email(&headers);

    let file_data = read_csv_upload(multipart).await?;
    let rows =
        parse_sales_csv(&file_data[..]).map_err(|e| AppError::bad_request(&e.to_string()))?;

    let outcome = state.db.import_sales(&user_email, rows)?;
    info!(
        inserted = outcome.inserted,
        deleted = outcome.deleted,
        unchanged = outcome.unchanged,
        "Sales import applied"
    );

    if !outcome.cancelled.is_empty() {
        state.flash.put(
            &user_email,
            ImportFlash {
                kind: "sales".to_string(),
                cancelled: outcome.cancelled.clone(),
            },
        );
    }

    Ok(Json(ImportResponse {
        inserted: outcome.inserted,
        deleted: outcome.deleted,
        unchanged: outcome.unchanged,
    }))
}

/// Request body for linking a sale to a project
#[derive(Debug, Deserialize)]
pub struct LinkProjectRequest {
    /// Project to attribute the sale to (null unlinks it)
    pub project_id: Option<i64>,
}

/// POST /api/sales/:id/project - Attribute a sale to a project
pub async fn link_sale_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: LinkProjectRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    // Verify project exists if provided
    if let Some(project_id) = req.project_id {
        state.db.get_project(project_id)?;
    }

    state.db.link_sale_to_project(id, req.project_id)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Update,
        Some("sales"),
        Some(id),
        Some(&format!("project_id={:?}", req.project_id)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/sales/export - Download sales as CSV with project names
pub async fn export_sales(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(params): Query<super::WindowQuery>,
) -> Result<Response<Body>, AppError> {
    let user_email = get_user_email(&headers);
    let window = params.window()?;

    let sales = state.db.list_sales(&window, i64::MAX, 0)?;
    let project_names: HashMap<i64, String> = state
        .db
        .list_projects()?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let csv = sitebook_core::export::sales_csv(&sales, &project_names)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Export,
        Some("sales"),
        None,
        Some(&format!("count={}", sales.len())),
    )?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"sales.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::internal(&e.to_string()))
}

/// DELETE /api/sales - Remove every sale record
pub async fn clear_sales(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ClearResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let deleted = state.db.clear_sales()?;

    state.db.log_audit(
        &user_email,
        AuditAction::ClearAll,
        Some("sales"),
        None,
        Some(&format!("deleted={}", deleted)),
    )?;

    Ok(Json(ClearResponse { deleted }))
}
