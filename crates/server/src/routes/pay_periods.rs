//! Pay period lookup.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tally_core::PayPeriod;
use tally_core::period::{PeriodHalf, PeriodStatus, period_containing, week_days};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// Defaults to today in the company's calendar.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PeriodView {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half: PeriodHalf,
    pub days: i64,
    pub status: PeriodStatus,
    /// Monday-to-Sunday week of the reference date; omitted when that week
    /// runs off the end of the calendar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<[NaiveDate; 7]>,
}

impl PeriodView {
    fn new(period: PayPeriod, reference: NaiveDate, now: NaiveDateTime) -> Self {
        Self {
            start: period.start,
            end: period.end,
            start_date: period.start_date(),
            end_date: period.end_date(),
            half: period.half(),
            days: period.days(),
            status: period.status(now),
            week: week_days(reference),
        }
    }
}

#[instrument(skip(state, _caller))]
pub async fn current(
    State(state): State<AppState>,
    _caller: Caller,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodView>, AppError> {
    let reference = query.date.unwrap_or_else(|| state.local_today());
    Ok(Json(PeriodView::new(
        period_containing(reference),
        reference,
        state.local_now(),
    )))
}
