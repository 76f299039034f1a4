//! Dashboard handler

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{AppError, AppState};
use sitebook_core::db::DashboardTotals;

/// GET /api/dashboard - Headline totals
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardTotals>, AppError> {
    let totals = state.db.dashboard_totals()?;
    Ok(Json(totals))
}
