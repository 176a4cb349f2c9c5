//! The caller's own identity and profile.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tally_core::{Role, SubjectId};

use super::{optional_text, require_text};
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::{Company, Member, MemberChanges};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: SubjectId,
    /// `null` until the caller creates or joins a company.
    pub role: Option<Role>,
    pub member: Option<Member>,
    pub company: Option<Company>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[instrument(skip(state, caller))]
pub async fn show(State(state): State<AppState>, caller: Caller) -> Result<Json<MeResponse>, AppError> {
    let company = match &caller.member {
        Some(member) => state.store().get_company(member.company_id).await?,
        None => None,
    };

    Ok(Json(MeResponse {
        role: caller.principal_role().role(),
        subject: caller.subject,
        member: caller.member,
        company,
    }))
}

#[instrument(skip(state, caller, body))]
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Member>, AppError> {
    let member = caller.member()?;

    let changes = MemberChanges {
        first_name: body
            .first_name
            .map(|v| require_text("first_name", &v))
            .transpose()?,
        last_name: optional_text(body.last_name),
        ..MemberChanges::default()
    };

    let updated = state
        .store()
        .update_member(member.company_id, member.id, changes)
        .await?;
    Ok(Json(updated))
}
