//! Member management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use tally_core::{Email, MemberId, PermissionDenied, Role, SubjectId};

use super::{optional_text, require_text};
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::{Member, MemberChanges, NewMember};
use crate::state::AppState;

/// Direct member creation. The operator supplies the identity-provider
/// subject; no invitation is involved.
#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub subject: String,
    pub email: Email,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: String,
    #[serde(default)]
    pub manager_id: Option<MemberId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub manager_id: Option<MemberId>,
}

/// A manager reference must point at a manager or admin of the same company.
async fn check_manager(
    state: &AppState,
    actor: &Member,
    manager_id: Option<MemberId>,
) -> Result<(), AppError> {
    let Some(manager_id) = manager_id else {
        return Ok(());
    };
    let manager = state
        .store()
        .get_member(actor.company_id, manager_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("manager {manager_id} not found")))?;
    if manager.role < Role::Manager {
        return Err(AppError::BadRequest(format!(
            "member {manager_id} is not a manager"
        )));
    }
    Ok(())
}

#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Member>>, AppError> {
    let manager = caller.require(Role::Manager)?;
    let members = state.store().list_members(manager.company_id).await?;
    Ok(Json(members))
}

#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<MemberId>,
) -> Result<Json<Member>, AppError> {
    let viewer = caller.member()?;
    if viewer.id != id {
        caller.require(Role::Manager)?;
    }
    let member = state
        .store()
        .get_member(viewer.company_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("member {id}")))?;
    Ok(Json(member))
}

#[instrument(skip(state, caller, body))]
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let admin = caller.require(Role::Admin)?;

    let role: Role = body.role.parse()?;
    let subject = SubjectId::parse(body.subject.trim())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    check_manager(&state, admin, body.manager_id).await?;

    let member = state
        .store()
        .create_member(NewMember {
            subject,
            company_id: admin.company_id,
            email: body.email,
            first_name: require_text("first_name", &body.first_name)?,
            last_name: body.last_name.trim().to_owned(),
            role,
            manager_id: body.manager_id,
        })
        .await?;

    tracing::info!(member_id = %member.id, role = %member.role, created_by = %admin.id, "Member added");
    Ok((StatusCode::CREATED, Json(member)))
}

#[instrument(skip(state, caller, body))]
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<MemberId>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<Json<Member>, AppError> {
    let actor = caller.require(Role::Manager)?;
    let target = state
        .store()
        .get_member(actor.company_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("member {id}")))?;

    // Managers cannot edit admins.
    if !actor.role.can_assign(target.role) {
        return Err(PermissionDenied {
            required: target.role,
        }
        .into());
    }

    let role = body.role.as_deref().map(str::parse::<Role>).transpose()?;
    if let Some(role) = role {
        if target.id == actor.id && role != actor.role {
            return Err(AppError::Forbidden("cannot change your own role".to_owned()));
        }
        if !actor.role.can_assign(role) {
            return Err(PermissionDenied { required: role }.into());
        }
    }
    if body.manager_id == Some(target.id) {
        return Err(AppError::BadRequest("a member cannot manage themselves".to_owned()));
    }
    check_manager(&state, actor, body.manager_id).await?;

    let changes = MemberChanges {
        first_name: body
            .first_name
            .map(|v| require_text("first_name", &v))
            .transpose()?,
        last_name: optional_text(body.last_name),
        role,
        manager_id: body.manager_id,
    };

    let member = state
        .store()
        .update_member(actor.company_id, id, changes)
        .await?;
    tracing::info!(member_id = %member.id, role = %member.role, updated_by = %actor.id, "Member updated");
    Ok(Json(member))
}

#[instrument(skip(state, caller))]
pub async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<MemberId>,
) -> Result<StatusCode, AppError> {
    let admin = caller.require(Role::Admin)?;
    if admin.id == id {
        return Err(AppError::Forbidden("cannot remove yourself".to_owned()));
    }

    state.store().delete_member(admin.company_id, id).await?;
    tracing::info!(member_id = %id, removed_by = %admin.id, "Member removed");
    Ok(StatusCode::NO_CONTENT)
}
