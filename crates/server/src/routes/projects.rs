//! Project CRUD.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use tally_core::{CompanyId, ProjectId, Role};

use super::{optional_text, require_text};
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::{Project, ProjectChanges};
use crate::state::AppState;

/// Validate a project body against the company it is written into.
async fn validate(
    state: &AppState,
    company_id: CompanyId,
    body: ProjectChanges,
) -> Result<ProjectChanges, AppError> {
    if !body.has_valid_dates() {
        return Err(AppError::BadRequest(
            "end_date must not be before start_date".to_owned(),
        ));
    }
    if state
        .store()
        .get_client(company_id, body.client_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "client {} does not belong to this company",
            body.client_id
        )));
    }

    Ok(ProjectChanges {
        name: require_text("name", &body.name)?,
        description: optional_text(body.description),
        ..body
    })
}

#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Project>>, AppError> {
    let member = caller.member()?;
    Ok(Json(state.store().list_projects(member.company_id).await?))
}

#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ProjectId>,
) -> Result<Json<Project>, AppError> {
    let member = caller.member()?;
    let project = state
        .store()
        .get_project(member.company_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;
    Ok(Json(project))
}

#[instrument(skip(state, caller, body))]
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<ProjectChanges>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let admin = caller.require(Role::Admin)?;
    let body = validate(&state, admin.company_id, body).await?;
    let project = state.store().create_project(admin.company_id, body).await?;
    tracing::info!(project_id = %project.id, client_id = %project.client_id, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

#[instrument(skip(state, caller, body))]
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ProjectId>,
    Json(body): Json<ProjectChanges>,
) -> Result<Json<Project>, AppError> {
    let admin = caller.require(Role::Admin)?;
    let body = validate(&state, admin.company_id, body).await?;
    let project = state
        .store()
        .update_project(admin.company_id, id, body)
        .await?;
    Ok(Json(project))
}

#[instrument(skip(state, caller))]
pub async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ProjectId>,
) -> Result<StatusCode, AppError> {
    let admin = caller.require(Role::Admin)?;
    state.store().delete_project(admin.company_id, id).await?;
    tracing::info!(project_id = %id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}
