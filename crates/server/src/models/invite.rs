//! Invitation records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tally_core::{CompanyId, Email, InviteId, InviteStatus, MemberId, Role};

/// An invitation for an email address to join a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Invite {
    pub id: InviteId,
    pub company_id: CompanyId,
    pub email: Email,
    pub role: Role,
    /// Secret redemption token; only ever sent to the recipient.
    #[serde(skip_serializing)]
    pub token: String,
    pub status: InviteStatus,
    pub invited_by: MemberId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invite {
    /// Returns true once `now` is past the expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Returns true if the invite can still be accepted at `now`.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == InviteStatus::Pending && !self.is_expired(now)
    }
}

/// An invitation to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvite {
    pub company_id: CompanyId,
    pub email: Email,
    pub role: Role,
    pub token: String,
    pub invited_by: MemberId,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn invite(status: InviteStatus) -> Invite {
        let created_at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Invite {
            id: InviteId::new(1),
            company_id: CompanyId::new(1),
            email: Email::parse("new@example.com").unwrap(),
            role: Role::Employee,
            token: "secret".to_owned(),
            status,
            invited_by: MemberId::new(1),
            created_at,
            expires_at: created_at + TimeDelta::days(7),
            accepted_at: None,
        }
    }

    #[test]
    fn test_redeemable_until_expiry() {
        let pending = invite(InviteStatus::Pending);
        assert!(pending.is_redeemable(pending.created_at));
        assert!(pending.is_redeemable(pending.expires_at));
        assert!(!pending.is_redeemable(pending.expires_at + TimeDelta::seconds(1)));
    }

    #[test]
    fn test_used_or_revoked_is_not_redeemable() {
        for status in [InviteStatus::Accepted, InviteStatus::Revoked] {
            let inv = invite(status);
            assert!(!inv.is_redeemable(inv.created_at));
        }
    }

    #[test]
    fn test_token_is_not_serialized() {
        let json = serde_json::to_value(invite(InviteStatus::Pending)).unwrap();
        assert!(json.get("token").is_none());
        assert_eq!(json["role"], "employee");
    }
}
