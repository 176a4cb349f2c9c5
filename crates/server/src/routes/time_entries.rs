//! Time entry routes.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use tally_core::{MemberId, TimeEntryId, WeeklySheet};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::TimeEntry;
use crate::services::time_entries::{self, BatchResult, PeriodSummary, ReviewAction};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub member_id: Option<MemberId>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub date: Option<NaiveDate>,
    pub member_id: Option<MemberId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TimeEntry>>, AppError> {
    let viewer = caller.member()?;
    let entries =
        time_entries::list(&state, viewer, query.member_id, query.from, query.to).await?;
    Ok(Json(entries))
}

#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<TimeEntryId>,
) -> Result<Json<TimeEntry>, AppError> {
    let viewer = caller.member()?;
    let entry = state
        .store()
        .get_time_entry(viewer.company_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("time entry {id}")))?;
    time_entries::visible_member(viewer, Some(entry.member_id))?;
    Ok(Json(entry))
}

/// Save a weekly sheet; invalid cells are dropped and counted.
#[instrument(skip(state, caller, sheet))]
pub async fn batch(
    State(state): State<AppState>,
    caller: Caller,
    Json(sheet): Json<WeeklySheet>,
) -> Result<(StatusCode, Json<BatchResult>), AppError> {
    let member = caller.member()?;
    let result = time_entries::submit_sheet(&state, member, &sheet).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Apply `submit`, `approve`, `reject` or `reopen`. The body is optional
/// and only read for a rejection reason.
#[instrument(skip(state, caller, body))]
pub async fn review(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, action)): Path<(TimeEntryId, ReviewAction)>,
    body: Bytes,
) -> Result<Json<TimeEntry>, AppError> {
    let actor = caller.member()?;
    let request: ReviewRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ReviewRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };

    let entry = time_entries::review(&state, actor, id, action, request.reason).await?;
    Ok(Json(entry))
}

#[instrument(skip(state, caller))]
pub async fn summary(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<PeriodSummary>, AppError> {
    let viewer = caller.member()?;
    let summary =
        time_entries::period_summary(&state, viewer, query.date, query.member_id).await?;
    Ok(Json(summary))
}
