//! Time entry repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use tally_core::{
    CompanyId, EntryDuration, MemberId, ProjectId, TimeEntryDraft, TimeEntryId, TimeEntryStatus,
};

use super::{PgStore, RepositoryError, map_write_error};
use crate::models::{StatusChange, TimeEntry, TimeEntryFilter};

const ENTRY_COLUMNS: &str = "id, company_id, member_id, project_id, entry_date, duration_minutes, \
                             description, status, created_by, updated_by, approved_by, \
                             approved_at, rejection_reason, created_at, updated_at";

/// Time entry persistence.
#[async_trait]
pub trait TimeEntryRepository: Send + Sync {
    /// Insert drafts for `member_id` in one transaction.
    ///
    /// Entries are never deduplicated; each call creates new rows.
    async fn insert_time_entries(
        &self,
        company_id: CompanyId,
        member_id: MemberId,
        drafts: &[TimeEntryDraft],
    ) -> Result<Vec<TimeEntry>, RepositoryError>;

    /// List entries matching `filter`, ordered by date then ID.
    async fn list_time_entries(
        &self,
        filter: TimeEntryFilter,
    ) -> Result<Vec<TimeEntry>, RepositoryError>;

    /// Get an entry by ID.
    async fn get_time_entry(
        &self,
        company_id: CompanyId,
        id: TimeEntryId,
    ) -> Result<Option<TimeEntry>, RepositoryError>;

    /// Apply a status change if the entry is still in `change.from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the entry's status moved on.
    async fn transition_time_entry(
        &self,
        change: StatusChange,
    ) -> Result<TimeEntry, RepositoryError>;
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct TimeEntryRow {
    id: TimeEntryId,
    company_id: CompanyId,
    member_id: MemberId,
    project_id: ProjectId,
    entry_date: NaiveDate,
    duration_minutes: i32,
    description: String,
    status: TimeEntryStatus,
    created_by: MemberId,
    updated_by: MemberId,
    approved_by: Option<MemberId>,
    approved_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TimeEntryRow> for TimeEntry {
    type Error = RepositoryError;

    fn try_from(row: TimeEntryRow) -> Result<Self, Self::Error> {
        let duration = u32::try_from(row.duration_minutes)
            .ok()
            .and_then(|minutes| EntryDuration::from_minutes(minutes).ok())
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid duration {} for time entry {}",
                    row.duration_minutes, row.id
                ))
            })?;

        Ok(Self {
            id: row.id,
            company_id: row.company_id,
            member_id: row.member_id,
            project_id: row.project_id,
            date: row.entry_date,
            duration,
            description: row.description,
            status: row.status,
            created_by: row.created_by,
            updated_by: row.updated_by,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl TimeEntryRepository for PgStore {
    async fn insert_time_entries(
        &self,
        company_id: CompanyId,
        member_id: MemberId,
        drafts: &[TimeEntryDraft],
    ) -> Result<Vec<TimeEntry>, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        let mut entries = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let minutes = i32::try_from(draft.duration.minutes()).map_err(|_| {
                RepositoryError::DataCorruption("duration exceeds column range".to_owned())
            })?;

            let row = sqlx::query_as::<_, TimeEntryRow>(&format!(
                "INSERT INTO time_entry
                     (company_id, member_id, project_id, entry_date, duration_minutes,
                      description, created_by, updated_by)
                 VALUES ($1, $2, $3, $4, $5, $6, $2, $2)
                 RETURNING {ENTRY_COLUMNS}"
            ))
            .bind(company_id)
            .bind(member_id)
            .bind(draft.project_id)
            .bind(draft.date)
            .bind(minutes)
            .bind(&draft.description)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "project does not exist"))?;

            entries.push(row.try_into()?);
        }

        tx.commit().await?;
        Ok(entries)
    }

    async fn list_time_entries(
        &self,
        filter: TimeEntryFilter,
    ) -> Result<Vec<TimeEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, TimeEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entry
             WHERE company_id = $1
               AND ($2::INTEGER IS NULL OR member_id = $2)
               AND ($3::DATE IS NULL OR entry_date >= $3)
               AND ($4::DATE IS NULL OR entry_date <= $4)
             ORDER BY entry_date, id"
        ))
        .bind(filter.company_id)
        .bind(filter.member_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_time_entry(
        &self,
        company_id: CompanyId,
        id: TimeEntryId,
    ) -> Result<Option<TimeEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, TimeEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entry WHERE id = $1 AND company_id = $2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn transition_time_entry(
        &self,
        change: StatusChange,
    ) -> Result<TimeEntry, RepositoryError> {
        let row = sqlx::query_as::<_, TimeEntryRow>(&format!(
            "UPDATE time_entry
             SET status = $3,
                 updated_by = $4,
                 updated_at = $5,
                 approved_by = CASE WHEN $3 = 'approved' THEN $4 END,
                 approved_at = CASE WHEN $3 = 'approved' THEN $5 END,
                 rejection_reason = CASE
                     WHEN $3 = 'rejected' THEN $6
                     WHEN $3 = 'approved' THEN NULL
                     ELSE rejection_reason
                 END
             WHERE id = $1 AND status = $2
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(change.id)
        .bind(change.from)
        .bind(change.to)
        .bind(change.actor)
        .bind(change.at)
        .bind(&change.rejection_reason)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or_else(|| {
            RepositoryError::Conflict(format!("time entry is no longer {}", change.from))
        })?
        .try_into()
    }
}
