//! Expense handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, Response, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use sitebook_core::models::{AuditAction, Expense, NewExpense};

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: Option<i64>,
}

#[derive(Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub total: f64,
}

fn expense_window(
    params: &ExpenseQuery,
) -> Result<sitebook_core::tax::DateWindow, AppError> {
    sitebook_core::tax::DateWindow::parse(params.start_date.as_deref(), params.end_date.as_deref())
        .map_err(|e| AppError::bad_request(&e.to_string()))
}

/// GET /api/expenses - List expenses with grand total
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<ExpenseListResponse>, AppError> {
    let window = expense_window(&params)?;

    let expenses = state.db.list_expenses(&window, params.project_id)?;
    let total = state.db.sum_expenses(&window, params.project_id)?;

    Ok(Json(ExpenseListResponse { expenses, total }))
}

/// POST /api/expenses - Record an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewExpense =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let id = state.db.create_expense(&req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Create,
        Some("expenses"),
        Some(id),
        Some(&format!(
            "recipient={}, amount={:.2}",
            req.recipient_name, req.amount
        )),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}

/// PUT /api/expenses/:id - Update an expense
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewExpense =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    state.db.update_expense(id, &req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Update,
        Some("expenses"),
        Some(id),
        Some(&format!(
            "recipient={}, amount={:.2}",
            req.recipient_name, req.amount
        )),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    state.db.delete_expense(id)?;

    state
        .db
        .log_audit(&user_email, AuditAction::Delete, Some("expenses"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/expenses/export - Download expenses as CSV
pub async fn export_expenses(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(params): Query<ExpenseQuery>,
) -> Result<Response<Body>, AppError> {
    let user_email = get_user_email(&headers);
    let window = expense_window(&params)?;

    let expenses = state.db.list_expenses(&window, params.project_id)?;
    let csv = sitebook_core::export::expenses_csv(&expenses)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Export,
        Some("expenses"),
        None,
        Some(&format!("count={}", expenses.len())),
    )?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"expenses.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::internal(&e.to_string()))
}
