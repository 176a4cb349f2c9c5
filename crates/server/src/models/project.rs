//! Project records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{ClientId, CompanyId, ProjectId, ProjectStatus};

/// Work done for a client; time is logged against projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: ProjectId,
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable project fields, used for both create and replace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectChanges {
    pub client_id: ClientId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl ProjectChanges {
    /// Whether the date range is ordered (open-ended ranges always are).
    #[must_use]
    pub fn has_valid_dates(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}
