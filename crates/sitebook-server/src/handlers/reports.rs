//! Tax report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{AppError, AppState};
use sitebook_core::tax::TaxSummary;

/// GET /api/reports/tax-summary - VAT and withholding position over a window
pub async fn get_tax_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<super::WindowQuery>,
) -> Result<Json<TaxSummary>, AppError> {
    let window = params.window()?;
    let summary = state.db.tax_summary(&window)?;
    Ok(Json(summary))
}
