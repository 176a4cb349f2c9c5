//! Status enums for persisted entities.

use serde::{Deserialize, Serialize};

/// Lifecycle of a time entry.
///
/// ```text
/// draft -> submitted -> approved
///                    -> rejected -> draft
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "time_entry_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TimeEntryStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl TimeEntryStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Submitted)
                | (Self::Submitted, Self::Approved | Self::Rejected)
                | (Self::Rejected, Self::Draft)
        )
    }

    /// Entries in these states can still be edited by their owner.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns the wire/database name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for TimeEntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "project_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
}

/// Invitation status.
///
/// Expiry is not a stored state; a pending invite past its `expires_at` is
/// simply no longer redeemable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "invite_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    #[default]
    Pending,
    Accepted,
    Revoked,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TimeEntryStatus; 4] = [
        TimeEntryStatus::Draft,
        TimeEntryStatus::Submitted,
        TimeEntryStatus::Approved,
        TimeEntryStatus::Rejected,
    ];

    #[test]
    fn test_legal_transitions() {
        use TimeEntryStatus::{Approved, Draft, Rejected, Submitted};
        let legal = [
            (Draft, Submitted),
            (Submitted, Approved),
            (Submitted, Rejected),
            (Rejected, Draft),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_approved_is_terminal() {
        assert!(
            ALL.iter()
                .all(|&to| !TimeEntryStatus::Approved.can_transition_to(to))
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::OnHold).ok().as_deref(),
            Some("\"on_hold\"")
        );
        assert_eq!(
            serde_json::to_string(&TimeEntryStatus::Submitted).ok().as_deref(),
            Some("\"submitted\"")
        );
    }
}
