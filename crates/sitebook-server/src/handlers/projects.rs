//! Project management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use sitebook_core::models::{AuditAction, NewProject, Project};

/// GET /api/projects - List all projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = state.db.list_projects()?;
    Ok(Json(projects))
}

/// GET /api/projects/:id - Get a single project
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, AppError> {
    let project = state.db.get_project(id)?;
    Ok(Json(project))
}

/// POST /api/projects - Create a new project
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Project>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewProject =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let id = state.db.create_project(&req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Create,
        Some("projects"),
        Some(id),
        Some(&format!("name={}, client={}", req.name, req.client_name)),
    )?;

    let project = state.db.get_project(id)?;
    Ok(Json(project))
}

/// PUT /api/projects/:id - Update a project
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Project>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: NewProject =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    state.db.update_project(id, &req)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Update,
        Some("projects"),
        Some(id),
        Some(&format!("name={}, status={}", req.name, req.status)),
    )?;

    let project = state.db.get_project(id)?;
    Ok(Json(project))
}

/// DELETE /api/projects/:id - Delete a project
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let project = state.db.get_project(id)?;
    state.db.delete_project(id)?;

    state.db.log_audit(
        &user_email,
        AuditAction::Delete,
        Some("projects"),
        Some(id),
        Some(&format!("name={}", project.name)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}
