//! Time entry workflow: weekly batches, review transitions and period totals.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tally_core::duration::aggregate;
use tally_core::period::{PeriodStatus, period_containing};
use tally_core::timesheet::collect_drafts;
use tally_core::{
    MemberId, PayPeriod, PermissionDenied, ProjectId, Role, TimeEntryId, TimeEntryStatus,
    TotalMinutes, WeeklySheet,
};

use crate::error::AppError;
use crate::models::{Member, StatusChange, TimeEntry, TimeEntryFilter};
use crate::state::AppState;

/// Entries created from a weekly sheet.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub entries: Vec<TimeEntry>,
    /// Cells with text that were dropped as invalid.
    pub skipped: usize,
    pub total_minutes: TotalMinutes,
}

/// Save a weekly sheet as draft entries owned by `member`.
///
/// # Errors
///
/// - `Submission` if the sheet has no valid cell
/// - `NotFound` if any project is not in the member's company
pub async fn submit_sheet(
    state: &AppState,
    member: &Member,
    sheet: &WeeklySheet,
) -> Result<BatchResult, AppError> {
    let collected = collect_drafts(sheet)?;

    let projects: BTreeSet<ProjectId> = collected.drafts.iter().map(|d| d.project_id).collect();
    for project_id in projects {
        if state
            .store()
            .get_project(member.company_id, project_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!("project {project_id}")));
        }
    }

    let total_minutes = collected.total();
    let entries = state
        .store()
        .insert_time_entries(member.company_id, member.id, &collected.drafts)
        .await?;

    tracing::info!(
        member_id = %member.id,
        created = entries.len(),
        skipped = collected.skipped,
        total = %total_minutes,
        "Weekly sheet saved"
    );

    Ok(BatchResult {
        entries,
        skipped: collected.skipped,
        total_minutes,
    })
}

/// A review step on a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Owner hands a draft in for review.
    Submit,
    /// Manager accepts a submitted entry.
    Approve,
    /// Manager sends a submitted entry back.
    Reject,
    /// Owner moves a rejected entry back to draft.
    Reopen,
}

impl ReviewAction {
    /// Status the entry moves to.
    #[must_use]
    pub const fn target(self) -> TimeEntryStatus {
        match self {
            Self::Submit => TimeEntryStatus::Submitted,
            Self::Approve => TimeEntryStatus::Approved,
            Self::Reject => TimeEntryStatus::Rejected,
            Self::Reopen => TimeEntryStatus::Draft,
        }
    }

    /// Whether only the entry's owner may take this step.
    #[must_use]
    pub const fn is_owner_action(self) -> bool {
        matches!(self, Self::Submit | Self::Reopen)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Reopen => "reopen",
        }
    }
}

/// Apply a review step to an entry in the actor's company.
///
/// # Errors
///
/// - `NotFound` if the entry is not in the actor's company
/// - `Forbidden` if an owner-only step is taken by someone else
/// - `PermissionDenied` if a reviewer step is taken below manager
/// - `Conflict` if the entry's status does not allow the step
pub async fn review(
    state: &AppState,
    actor: &Member,
    id: TimeEntryId,
    action: ReviewAction,
    reason: Option<String>,
) -> Result<TimeEntry, AppError> {
    let entry = state
        .store()
        .get_time_entry(actor.company_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("time entry {id}")))?;

    if action.is_owner_action() {
        if entry.member_id != actor.id {
            return Err(AppError::Forbidden(format!(
                "only the entry's owner can {}",
                action.as_str()
            )));
        }
    } else if actor.role < Role::Manager {
        return Err(PermissionDenied {
            required: Role::Manager,
        }
        .into());
    }

    let to = action.target();
    if !entry.status.can_transition_to(to) {
        return Err(AppError::Conflict(format!(
            "cannot {} a {} entry",
            action.as_str(),
            entry.status
        )));
    }

    let rejection_reason = match action {
        ReviewAction::Reject => reason
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty()),
        _ => None,
    };

    let updated = state
        .store()
        .transition_time_entry(StatusChange {
            id,
            from: entry.status,
            to,
            actor: actor.id,
            at: state.now(),
            rejection_reason,
        })
        .await?;

    tracing::info!(
        entry_id = %id,
        actor_id = %actor.id,
        from = %entry.status,
        to = %updated.status,
        "Time entry status changed"
    );
    Ok(updated)
}

/// Whose entries a listing covers.
///
/// Employees only ever see their own; managers and admins may narrow to one
/// member or see the whole company.
///
/// # Errors
///
/// Returns `PermissionDenied` if an employee asks for someone else.
pub fn visible_member(
    viewer: &Member,
    requested: Option<MemberId>,
) -> Result<Option<MemberId>, AppError> {
    if viewer.role >= Role::Manager {
        return Ok(requested);
    }
    match requested {
        Some(id) if id != viewer.id => Err(PermissionDenied {
            required: Role::Manager,
        }
        .into()),
        _ => Ok(Some(viewer.id)),
    }
}

/// List entries visible to `viewer`.
///
/// # Errors
///
/// `BadRequest` if `from` is after `to`; see [`visible_member`].
pub async fn list(
    state: &AppState,
    viewer: &Member,
    member_id: Option<MemberId>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<TimeEntry>, AppError> {
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(AppError::BadRequest("from must not be after to".to_owned()));
    }

    let entries = state
        .store()
        .list_time_entries(TimeEntryFilter {
            company_id: viewer.company_id,
            member_id: visible_member(viewer, member_id)?,
            from,
            to,
        })
        .await?;
    Ok(entries)
}

/// Per-project total within a pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTotal {
    pub project_id: ProjectId,
    pub minutes: TotalMinutes,
    /// `H:MM`
    pub formatted: String,
}

/// Totals for one pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodSummary {
    pub period: PayPeriod,
    pub status: PeriodStatus,
    pub member_id: Option<MemberId>,
    pub projects: Vec<ProjectTotal>,
    pub total_minutes: TotalMinutes,
    pub total: String,
}

/// Sum entries per project over a period.
#[must_use]
pub fn summarize(
    period: PayPeriod,
    status: PeriodStatus,
    member_id: Option<MemberId>,
    entries: &[TimeEntry],
) -> PeriodSummary {
    let mut by_project: BTreeMap<ProjectId, Vec<_>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| period.contains_date(e.date)) {
        by_project.entry(entry.project_id).or_default().push(entry.duration);
    }

    let projects: Vec<ProjectTotal> = by_project
        .into_iter()
        .map(|(project_id, durations)| {
            let minutes = aggregate(durations);
            ProjectTotal {
                project_id,
                minutes,
                formatted: minutes.to_string(),
            }
        })
        .collect();

    let total_minutes = TotalMinutes::new(projects.iter().map(|p| p.minutes.minutes()).sum());

    PeriodSummary {
        period,
        status,
        member_id,
        projects,
        total_minutes,
        total: total_minutes.to_string(),
    }
}

/// Totals for the pay period containing `date` (default: local today).
///
/// # Errors
///
/// See [`visible_member`].
pub async fn period_summary(
    state: &AppState,
    viewer: &Member,
    date: Option<NaiveDate>,
    member_id: Option<MemberId>,
) -> Result<PeriodSummary, AppError> {
    let period = period_containing(date.unwrap_or_else(|| state.local_today()));
    let member_id = visible_member(viewer, member_id)?;

    let entries = state
        .store()
        .list_time_entries(TimeEntryFilter {
            company_id: viewer.company_id,
            member_id,
            from: Some(period.start_date()),
            to: Some(period.end_date()),
        })
        .await?;

    Ok(summarize(
        period,
        period.status(state.local_now()),
        member_id,
        &entries,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use tally_core::{CompanyId, Email, EntryDuration, SubjectId};

    use super::*;

    fn member(id: i32, role: Role) -> Member {
        Member {
            id: MemberId::new(id),
            subject: SubjectId::parse(&format!("sub-{id}")).unwrap(),
            company_id: CompanyId::new(1),
            email: Email::parse(&format!("m{id}@acme.test")).unwrap(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            manager_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn entry(project: i32, day: u32, minutes: u32) -> TimeEntry {
        TimeEntry {
            id: TimeEntryId::new(1),
            company_id: CompanyId::new(1),
            member_id: MemberId::new(1),
            project_id: ProjectId::new(project),
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            duration: EntryDuration::from_minutes(minutes).unwrap(),
            description: String::new(),
            status: TimeEntryStatus::Draft,
            created_by: MemberId::new(1),
            updated_by: MemberId::new(1),
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_employee_sees_only_self() {
        let employee = member(5, Role::Employee);
        assert_eq!(visible_member(&employee, None).unwrap(), Some(MemberId::new(5)));
        assert_eq!(
            visible_member(&employee, Some(MemberId::new(5))).unwrap(),
            Some(MemberId::new(5))
        );
        assert!(matches!(
            visible_member(&employee, Some(MemberId::new(6))),
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_manager_sees_requested_or_all() {
        let manager = member(2, Role::Manager);
        assert_eq!(visible_member(&manager, None).unwrap(), None);
        assert_eq!(
            visible_member(&manager, Some(MemberId::new(6))).unwrap(),
            Some(MemberId::new(6))
        );
    }

    #[test]
    fn test_review_actions_follow_state_machine() {
        assert!(TimeEntryStatus::Draft.can_transition_to(ReviewAction::Submit.target()));
        assert!(TimeEntryStatus::Submitted.can_transition_to(ReviewAction::Approve.target()));
        assert!(!TimeEntryStatus::Draft.can_transition_to(ReviewAction::Approve.target()));
        assert!(TimeEntryStatus::Rejected.can_transition_to(ReviewAction::Reopen.target()));
        assert!(ReviewAction::Reopen.is_owner_action());
        assert!(!ReviewAction::Reject.is_owner_action());
    }

    #[test]
    fn test_summarize_groups_by_project_within_period() {
        let period = period_containing(NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
        let entries = [
            entry(1, 15, 90),
            entry(2, 16, 30),
            entry(1, 29, 45),
            // first half of the month, outside the period
            entry(1, 14, 600),
        ];
        let summary = summarize(period, PeriodStatus::Open, None, &entries);

        assert_eq!(summary.projects.len(), 2);
        assert_eq!(summary.projects[0].project_id, ProjectId::new(1));
        assert_eq!(summary.projects[0].minutes.minutes(), 135);
        assert_eq!(summary.projects[0].formatted, "2:15");
        assert_eq!(summary.projects[1].formatted, "0:30");
        assert_eq!(summary.total_minutes.minutes(), 165);
        assert_eq!(summary.total, "2:45");
    }

    #[test]
    fn test_summarize_empty_period() {
        let period = period_containing(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let summary = summarize(period, PeriodStatus::Closed, Some(MemberId::new(1)), &[]);
        assert!(summary.projects.is_empty());
        assert_eq!(summary.total, "0:00");
    }
}
