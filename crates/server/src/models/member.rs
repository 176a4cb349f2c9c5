//! Company membership records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{CompanyId, Email, MemberId, PrincipalRole, Role, SubjectId};

/// A subject's membership in a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Member {
    pub id: MemberId,
    /// Identity-provider subject this membership belongs to.
    pub subject: SubjectId,
    pub company_id: CompanyId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Manager who reviews this member's time.
    pub manager_id: Option<MemberId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// The member's role as an authorization principal.
    #[must_use]
    pub const fn principal(&self) -> PrincipalRole {
        PrincipalRole::Member(self.role)
    }

    /// "First Last", trimmed.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Who a new member is, before they belong to a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub subject: SubjectId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
}

impl MemberProfile {
    /// Place the profile in a company with a role.
    #[must_use]
    pub fn join(self, company_id: CompanyId, role: Role) -> NewMember {
        NewMember {
            subject: self.subject,
            company_id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            manager_id: None,
        }
    }
}

/// Fields for a new membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub subject: SubjectId,
    pub company_id: CompanyId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub manager_id: Option<MemberId>,
}

/// Partial member update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MemberChanges {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub manager_id: Option<MemberId>,
}

impl MemberChanges {
    /// Whether the update touches anything besides the member's own name.
    #[must_use]
    pub const fn is_profile_only(&self) -> bool {
        self.role.is_none() && self.manager_id.is_none()
    }

    /// Apply the changes to an existing record in place.
    pub fn apply(self, member: &mut Member) {
        if let Some(first_name) = self.first_name {
            member.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            member.last_name = last_name;
        }
        if let Some(role) = self.role {
            member.role = role;
        }
        if let Some(manager_id) = self.manager_id {
            member.manager_id = Some(manager_id);
        }
    }
}
