//! Loan and repayment handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use sitebook_core::models::{AuditAction, Loan, LoanPayment, NewLoan};

/// GET /api/loans - List loans, newest first
pub async fn list_loans(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Loan>>, AppError> {
    let loans = state.db.list_loans()?;
    Ok(Json(loans))
}

/// POST /api/loans - Record a loan
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Loan>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewLoan =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let id = state.db.create_loan(&req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Create,
        Some("loans"),
        Some(id),
        Some(&format!(
            "lender={}, total={:.2}",
            req.lender_name, req.total_amount
        )),
    )?;

    let loan = state.db.get_loan(id)?;
    Ok(Json(loan))
}

/// PUT /api/loans/:id - Update a loan (status re-evaluated against the new total)
pub async fn update_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Loan>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewLoan =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    state.db.update_loan(id, &req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Update,
        Some("loans"),
        Some(id),
        Some(&format!(
            "lender={}, total={:.2}",
            req.lender_name, req.total_amount
        )),
    )?;

    let loan = state.db.get_loan(id)?;
    Ok(Json(loan))
}

/// DELETE /api/loans/:id - Delete a loan and its repayments
pub async fn delete_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let loan = state.db.get_loan(id)?;
    state.db.delete_loan(id)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Delete,
        Some("loans"),
        Some(id),
        Some(&format!("lender={}", loan.lender_name)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/loans/:id/payments - List repayments for a loan
pub async fn list_loan_payments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<LoanPayment>>, AppError> {
    // 404 for unknown loans rather than an empty list
    state.db.get_loan(id)?;
    let payments = state.db.list_loan_payments(id)?;
    Ok(Json(payments))
}

/// Request body for recording a repayment
#[derive(Debug, Deserialize)]
pub struct LoanPaymentRequest {
    pub amount: f64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// POST /api/loans/:id/payments - Record a repayment
///
/// Returns the updated loan; it flips to Cleared once repayments reach
/// the total.
pub async fn add_loan_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Loan>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: LoanPaymentRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    if req.amount <= 0.0 {
        return Err(AppError::bad_request("Repayment amount must be positive"));
    }

    let loan = state
        .db
        .add_loan_payment(id, req.amount, req.date, req.note.as_deref())?;

    state.db.log_audit(
        &user_email,
        AuditAction::Update,
        Some("loans"),
        Some(id),
        Some(&format!(
            "repayment={:.2}, paid={:.2}/{:.2}, status={}",
            req.amount, loan.amount_paid, loan.total_amount, loan.status
        )),
    )?;

    Ok(Json(loan))
}
