//! Casual worker and payment handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use sitebook_core::models::{AuditAction, CasualPayment, CasualWorker, NewPayment, NewWorker};
use sitebook_core::tax::DateWindow;

/// GET /api/workers - List workers
pub async fn list_workers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CasualWorker>>, AppError> {
    let workers = state.db.list_workers()?;
    Ok(Json(workers))
}

/// GET /api/workers/:id - Get a single worker
pub async fn get_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CasualWorker>, AppError> {
    let worker = state.db.get_worker(id)?;
    Ok(Json(worker))
}

/// POST /api/workers - Register a worker
pub async fn create_worker(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<CasualWorker>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewWorker =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let id = state.db.create_worker(&req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Create,
        Some("workers"),
        Some(id),
        Some(&format!("name={} {}", req.first_name, req.last_name)),
    )?;

    let worker = state.db.get_worker(id)?;
    Ok(Json(worker))
}

/// PUT /api/workers/:id - Update a worker
pub async fn update_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<CasualWorker>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewWorker =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    state.db.update_worker(id, &req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Update,
        Some("workers"),
        Some(id),
        Some(&format!("name={} {}", req.first_name, req.last_name)),
    )?;

    let worker = state.db.get_worker(id)?;
    Ok(Json(worker))
}

/// Query parameters for listing payments
#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "workerId")]
    pub worker_id: Option<i64>,
}

#[derive(Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<CasualPayment>,
    pub net_total: f64,
    pub tax_total: f64,
    pub grand_total: f64,
}

/// GET /api/payments - List casual payments with totals
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaymentQuery>,
) -> Result<Json<PaymentListResponse>, AppError> {
    let window = DateWindow::parse(params.start_date.as_deref(), params.end_date.as_deref())
        .map_err(|e| AppError::bad_request(&e.to_string()))?;

    let payments = state.db.list_payments(&window, params.worker_id)?;
    let (net_total, tax_total, grand_total) =
        state.db.payment_totals(&window, params.worker_id)?;

    Ok(Json(PaymentListResponse {
        payments,
        net_total,
        tax_total,
        grand_total,
    }))
}

/// GET /api/payments/:id - Get a single payment
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CasualPayment>, AppError> {
    let payment = state.db.get_payment(id)?;
    Ok(Json(payment))
}

/// POST /api/payments - Record a casual payment (withholding computed here)
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<CasualPayment>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewPayment =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    // Worker must exist before we attach a payment
    state.db.get_worker(req.worker_id)?;

    let id = state.db.create_payment(&req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Create,
        Some("payments"),
        Some(id),
        Some(&format!(
            "worker_id={}, net={:.2}",
            req.worker_id, req.net_amount
        )),
    )?;

    let payment = state.db.get_payment(id)?;
    Ok(Json(payment))
}

/// PUT /api/payments/:id - Update a payment (withholding recomputed)
pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<CasualPayment>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewPayment =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    state.db.update_payment(id, &req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Update,
        Some("payments"),
        Some(id),
        Some(&format!(
            "worker_id={}, net={:.2}",
            req.worker_id, req.net_amount
        )),
    )?;

    let payment = state.db.get_payment(id)?;
    Ok(Json(payment))
}

/// DELETE /api/payments/:id - Delete a payment
pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    state.db.delete_payment(id)?;

    state
        .db
        .log_audit(&user_email, AuditAction::Delete, Some("payments"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
