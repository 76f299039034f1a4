//! Invoice handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use sitebook_core::models::{AuditAction, Invoice, NewInvoice};

/// GET /api/invoices - List invoices without their items
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let invoices = state.db.list_invoices()?;
    Ok(Json(invoices))
}

/// GET /api/invoices/:id - Get an invoice with its items
pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Invoice>, AppError> {
    let invoice = state.db.get_invoice(id)?;
    Ok(Json(invoice))
}

/// POST /api/invoices - Create an invoice
///
/// The invoice number, line totals, subtotal, VAT and grand total are
/// all computed server-side.
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Invoice>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 64)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewInvoice =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let invoice = state.db.create_invoice(&req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Create,
        Some("invoices"),
        Some(invoice.id),
        Some(&format!(
            "number={}, client={}, total={:.2}",
            invoice.number, invoice.client_name, invoice.total
        )),
    )?;

    Ok(Json(invoice))
}

/// PUT /api/invoices/:id - Replace an invoice's fields and items
pub async fn update_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Invoice>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 64)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewInvoice =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let invoice = state.db.update_invoice(id, &req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Update,
        Some("invoices"),
        Some(id),
        Some(&format!(
            "number={}, total={:.2}",
            invoice.number, invoice.total
        )),
    )?;

    Ok(Json(invoice))
}

/// DELETE /api/invoices/:id - Delete an invoice and its items
pub async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let invoice = state.db.get_invoice(id)?;
    state.db.delete_invoice(id)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Delete,
        Some("invoices"),
        Some(id),
        Some(&format!("number={}", invoice.number)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}
