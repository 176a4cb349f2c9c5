//! Time entry records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use tally_core::{CompanyId, EntryDuration, MemberId, ProjectId, TimeEntryId, TimeEntryStatus};

/// A persisted time entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub company_id: CompanyId,
    /// Whose time this is.
    pub member_id: MemberId,
    pub project_id: ProjectId,
    pub date: NaiveDate,
    #[serde(rename = "duration_minutes")]
    pub duration: EntryDuration,
    pub description: String,
    pub status: TimeEntryStatus,
    pub created_by: MemberId,
    pub updated_by: MemberId,
    pub approved_by: Option<MemberId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which entries to list. Date bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEntryFilter {
    pub company_id: CompanyId,
    pub member_id: Option<MemberId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TimeEntryFilter {
    /// Whether `entry` passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        entry.company_id == self.company_id
            && self.member_id.is_none_or(|id| entry.member_id == id)
            && self.from.is_none_or(|from| entry.date >= from)
            && self.to.is_none_or(|to| entry.date <= to)
    }
}

/// A guarded status transition.
///
/// The store applies it only if the entry is still in `from`, so two
/// reviewers racing on the same entry cannot both win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: TimeEntryId,
    pub from: TimeEntryStatus,
    pub to: TimeEntryStatus,
    pub actor: MemberId,
    pub at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

impl StatusChange {
    /// Apply the change to a record already known to be in `from`.
    pub fn apply(self, entry: &mut TimeEntry) {
        entry.status = self.to;
        entry.updated_by = self.actor;
        entry.updated_at = self.at;
        match self.to {
            TimeEntryStatus::Approved => {
                entry.approved_by = Some(self.actor);
                entry.approved_at = Some(self.at);
                entry.rejection_reason = None;
            }
            TimeEntryStatus::Rejected => {
                entry.approved_by = None;
                entry.approved_at = None;
                entry.rejection_reason = self.rejection_reason;
            }
            TimeEntryStatus::Draft | TimeEntryStatus::Submitted => {
                entry.approved_by = None;
                entry.approved_at = None;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(member: i32, day: u32) -> TimeEntry {
        let now = DateTime::parse_from_rfc3339("2024-05-20T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        TimeEntry {
            id: TimeEntryId::new(1),
            company_id: CompanyId::new(1),
            member_id: MemberId::new(member),
            project_id: ProjectId::new(1),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            duration: EntryDuration::from_minutes(60).unwrap(),
            description: String::new(),
            status: TimeEntryStatus::Submitted,
            created_by: MemberId::new(member),
            updated_by: MemberId::new(member),
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let filter = TimeEntryFilter {
            company_id: CompanyId::new(1),
            member_id: None,
            from: NaiveDate::from_ymd_opt(2024, 5, 13),
            to: NaiveDate::from_ymd_opt(2024, 5, 19),
        };
        assert!(filter.matches(&entry(1, 13)));
        assert!(filter.matches(&entry(1, 19)));
        assert!(!filter.matches(&entry(1, 12)));
        assert!(!filter.matches(&entry(1, 20)));
    }

    #[test]
    fn test_filter_by_member_and_company() {
        let filter = TimeEntryFilter {
            company_id: CompanyId::new(1),
            member_id: Some(MemberId::new(2)),
            from: None,
            to: None,
        };
        assert!(filter.matches(&entry(2, 1)));
        assert!(!filter.matches(&entry(3, 1)));

        let mut foreign = entry(2, 1);
        foreign.company_id = CompanyId::new(9);
        assert!(!filter.matches(&foreign));
    }

    #[test]
    fn test_approve_then_reject_records_reviewer() {
        let mut e = entry(2, 14);
        let at = e.created_at + chrono::TimeDelta::hours(1);
        StatusChange {
            id: e.id,
            from: TimeEntryStatus::Submitted,
            to: TimeEntryStatus::Approved,
            actor: MemberId::new(7),
            at,
            rejection_reason: None,
        }
        .apply(&mut e);
        assert_eq!(e.status, TimeEntryStatus::Approved);
        assert_eq!(e.approved_by, Some(MemberId::new(7)));
        assert_eq!(e.approved_at, Some(at));
        assert_eq!(e.updated_by, MemberId::new(7));

        let mut r = entry(2, 14);
        StatusChange {
            id: r.id,
            from: TimeEntryStatus::Submitted,
            to: TimeEntryStatus::Rejected,
            actor: MemberId::new(7),
            at,
            rejection_reason: Some("wrong project".to_owned()),
        }
        .apply(&mut r);
        assert_eq!(r.rejection_reason.as_deref(), Some("wrong project"));
        assert_eq!(r.approved_by, None);
    }

    #[test]
    fn test_serializes_duration_minutes() {
        let json = serde_json::to_value(entry(1, 13)).unwrap();
        assert_eq!(json["duration_minutes"], 60);
        assert_eq!(json["status"], "submitted");
        assert_eq!(json["date"], "2024-05-13");
    }
}
