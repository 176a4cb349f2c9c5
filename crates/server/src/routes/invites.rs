//! Invitation routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use tally_core::{Email, InviteId, Role};

use super::require_text;
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::{Invite, Member};
use crate::services::invites::{self, InvitePreview, IssuedInvite};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub email: Email,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Invite>>, AppError> {
    let manager = caller.require(Role::Manager)?;
    Ok(Json(
        state.store().list_pending_invites(manager.company_id).await?,
    ))
}

#[instrument(skip(state, caller, body))]
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<IssuedInvite>), AppError> {
    let manager = caller.require(Role::Manager)?;
    let role: Role = body.role.parse()?;
    let issued = invites::issue(&state, manager, body.email, role).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

#[instrument(skip(state, caller))]
pub async fn revoke(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<InviteId>,
) -> Result<Json<Invite>, AppError> {
    let manager = caller.require(Role::Manager)?;
    Ok(Json(invites::revoke(&state, manager, id).await?))
}

/// Token lookup for the accept page; needs no identity.
#[instrument(skip(state, token))]
pub async fn preview(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InvitePreview>, AppError> {
    Ok(Json(invites::preview(&state, &token).await?))
}

#[instrument(skip(state, caller, token, body))]
pub async fn accept(
    State(state): State<AppState>,
    caller: Caller,
    Path(token): Path<String>,
    Json(body): Json<AcceptInviteRequest>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let subject = caller.require_unaffiliated()?;
    let member = invites::accept(
        &state,
        subject,
        &token,
        require_text("first_name", &body.first_name)?,
        body.last_name.trim().to_owned(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(member)))
}
