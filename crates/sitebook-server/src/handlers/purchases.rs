//! Purchase import, listing and export handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Query, Request, State},
    http::{header, Response, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::flash::ImportFlash;
use crate::{get_user_email, AppError, AppState, MAX_PAGE_LIMIT, MAX_UPLOAD_SIZE};
use sitebook_core::db::PurchaseTotals;
use sitebook_core::import::parse_purchases_csv;
use sitebook_core::models::{AuditAction, PurchaseRecord};
use sitebook_core::tax::DateWindow;

/// Query parameters for listing purchases
#[derive(Debug, Deserialize)]
pub struct PurchaseQuery {
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
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseRecord>,
    pub totals: PurchaseTotals,
}

/// Response for the import endpoints
#[derive(Serialize)]
pub struct ImportResponse {
    pub inserted: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

/// GET /api/purchases - List purchases with window, pagination and totals
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PurchaseQuery>,
) -> Result<Json<PurchaseListResponse>, AppError> {
    let window = DateWindow::parse(params.start_date.as_deref(), params.end_date.as_deref())
        .map_err(|e| AppError::bad_request(&e.to_string()))?;
    let limit = params.limit.max(1).min(MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let purchases = state.db.list_purchases(&window, limit, offset)?;
    let totals = state.db.purchase_totals(&window)?;

    Ok(Json(PurchaseListResponse { purchases, totals }))
}

/// Read the uploaded CSV out of a multipart form, enforcing the size limit
pub(crate) async fn read_csv_upload(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Failed to read file data"))?;

            if bytes.len() > MAX_UPLOAD_SIZE {
                return Err(AppError::bad_request(&format!(
                    "File too large. Maximum size is {} MB",
                    MAX_UPLOAD_SIZE / 1024 / 1024
                )));
            }

            file_data = Some(bytes.to_vec());
        }
    }

    file_data.ok_or_else(|| AppError::bad_request("Missing file field"))
}

/// POST /api/purchases/import - Import purchases from an RRA CSV export
///
/// Expects a multipart form with a `file` field (max 10MB). The import
/// reconciles against existing records: receipts missing from the upload
/// are deleted and reported through the one-shot flash store.
pub async fn import_purchases(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let user_email = get_user_email(&headers);

    let file_data = read_csv_upload(multipart).await?;
    let rows = parse_purchases_csv(&file_data[..])
        .map_err(|e| AppError::bad_request(&e.to_string()))?;

    let outcome = state.db.import_purchases(&user_email, rows)?;
    info!(
        inserted = outcome.inserted,
        deleted = outcome.deleted,
        unchanged = outcome.unchanged,
        "Purchases import applied"
    );

    if !outcome.cancelled.is_empty() {
        state.flash.put(
            &user_email,
            ImportFlash {
                kind: "purchases".to_string(),
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

/// GET /api/purchases/export - Download purchases as CSV
pub async fn export_purchases(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(params): Query<super::WindowQuery>,
) -> Result<Response<Body>, AppError> {
    let user_email = get_user_email(&headers);
    let window = params.window()?;

    let purchases = state.db.list_purchases(&window, i64::MAX, 0)?;
    let csv = sitebook_core::export::purchases_csv(&purchases)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Export,
        Some("purchases"),
        None,
        Some(&format!("count={}", purchases.len())),
    )?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"purchases.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::internal(&e.to_string()))
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub deleted: usize,
}

/// DELETE /api/purchases - Remove every purchase record
pub async fn clear_purchases(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ClearResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let deleted = state.db.clear_purchases()?;

    state.db.log_audit(
        &user_email,
        AuditAction::ClearAll,
        Some("purchases"),
        None,
        Some(&format!("deleted={}", deleted)),
    )?;

    Ok(Json(ClearResponse { deleted }))
}
