//! Client CRUD.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use tally_core::{ClientId, Role};

use super::{optional_text, require_text};
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::{Client, ClientChanges};
use crate::state::AppState;

fn normalize(body: ClientChanges) -> Result<ClientChanges, AppError> {
    Ok(ClientChanges {
        name: require_text("name", &body.name)?,
        email: body.email,
        phone: optional_text(body.phone),
        address: optional_text(body.address),
        notes: optional_text(body.notes),
    })
}

#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Client>>, AppError> {
    let member = caller.member()?;
    Ok(Json(state.store().list_clients(member.company_id).await?))
}

#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ClientId>,
) -> Result<Json<Client>, AppError> {
    let member = caller.member()?;
    let client = state
        .store()
        .get_client(member.company_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;
    Ok(Json(client))
}

#[instrument(skip(state, caller, body))]
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<ClientChanges>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let admin = caller.require(Role::Admin)?;
    let client = state
        .store()
        .create_client(admin.company_id, normalize(body)?)
        .await?;
    tracing::info!(client_id = %client.id, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

#[instrument(skip(state, caller, body))]
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ClientId>,
    Json(body): Json<ClientChanges>,
) -> Result<Json<Client>, AppError> {
    let admin = caller.require(Role::Admin)?;
    let client = state
        .store()
        .update_client(admin.company_id, id, normalize(body)?)
        .await?;
    Ok(Json(client))
}

#[instrument(skip(state, caller))]
pub async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ClientId>,
) -> Result<StatusCode, AppError> {
    let admin = caller.require(Role::Admin)?;
    state.store().delete_client(admin.company_id, id).await?;
    tracing::info!(client_id = %id, "Client deleted");
    Ok(StatusCode::NO_CONTENT)
}
