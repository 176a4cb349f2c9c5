//! Role hierarchy and permission checks.
//!
//! Roles form a fixed total order `employee < manager < admin`. A caller who
//! is authenticated but not (yet) a member of any company carries
//! [`PrincipalRole::NoRole`], which never satisfies any requirement.
//!
//! ```
//! use tally_core::authz::{PrincipalRole, Role, has_at_least_role};
//!
//! assert!(has_at_least_role(PrincipalRole::Member(Role::Admin), Role::Manager));
//! assert!(!has_at_least_role(PrincipalRole::Member(Role::Employee), Role::Manager));
//! assert!(!has_at_least_role(PrincipalRole::NoRole, Role::Employee));
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A role string that is not one of `employee`, `manager`, `admin`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0:?}")]
pub struct InvalidRoleError(pub String);

/// The principal's role rank is below what the operation requires.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("requires {required} role")]
pub struct PermissionDenied {
    /// Minimum role the operation asked for.
    pub required: Role,
}

/// Member role within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "member_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Records their own time.
    Employee,
    /// Manages employees and reviews time.
    Manager,
    /// Owns company settings, clients and projects.
    Admin,
}

impl Role {
    /// All roles, lowest rank first.
    pub const ALL: [Self; 3] = [Self::Employee, Self::Manager, Self::Admin];

    /// Numeric rank: employee=1, manager=2, admin=3.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Employee => 1,
            Self::Manager => 2,
            Self::Admin => 3,
        }
    }

    /// Returns the wire/database name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Whether a member holding `self` may grant `target` to someone else.
    ///
    /// Nobody can hand out a role above their own.
    #[must_use]
    pub const fn can_assign(self, target: Self) -> bool {
        self.rank() >= target.rank()
    }

    /// Whether the role may be carried by an email invitation.
    #[must_use]
    pub const fn is_invitable(self) -> bool {
        matches!(self, Self::Employee | Self::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InvalidRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            other => Err(InvalidRoleError(other.to_owned())),
        }
    }
}

/// The role a request is evaluated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "role")]
pub enum PrincipalRole {
    /// Unauthenticated, or authenticated without a membership.
    NoRole,
    /// A company member with a role.
    Member(Role),
}

impl PrincipalRole {
    /// The member role, if any.
    #[must_use]
    pub const fn role(self) -> Option<Role> {
        match self {
            Self::NoRole => None,
            Self::Member(role) => Some(role),
        }
    }
}

impl From<Option<Role>> for PrincipalRole {
    fn from(role: Option<Role>) -> Self {
        role.map_or(Self::NoRole, Self::Member)
    }
}

impl From<Role> for PrincipalRole {
    fn from(role: Role) -> Self {
        Self::Member(role)
    }
}

/// Whether `principal` ranks at or above `required`.
#[must_use]
pub const fn has_at_least_role(principal: PrincipalRole, required: Role) -> bool {
    match principal {
        PrincipalRole::NoRole => false,
        PrincipalRole::Member(role) => role.rank() >= required.rank(),
    }
}

/// String form of [`has_at_least_role`] for values arriving from outside.
///
/// `None` is the no-role sentinel and yields `Ok(false)` whatever is being
/// asked for.
///
/// # Errors
///
/// Returns [`InvalidRoleError`] if a present principal role or the required
/// role is not a recognized role name.
pub fn has_at_least_role_str(
    principal: Option<&str>,
    required: &str,
) -> Result<bool, InvalidRoleError> {
    let Some(principal) = principal else {
        return Ok(false);
    };
    let principal: Role = principal.parse()?;
    let required: Role = required.parse()?;
    Ok(has_at_least_role(PrincipalRole::Member(principal), required))
}

/// Check a requirement and turn a failure into a [`PermissionDenied`].
///
/// # Errors
///
/// Returns [`PermissionDenied`] when `principal` ranks below `required`.
pub const fn authorize(principal: PrincipalRole, required: Role) -> Result<(), PermissionDenied> {
    if has_at_least_role(principal, required) {
        Ok(())
    } else {
        Err(PermissionDenied { required })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_matches_rank_order() {
        for principal in Role::ALL {
            for required in Role::ALL {
                assert_eq!(
                    has_at_least_role(principal.into(), required),
                    principal.rank() >= required.rank(),
                    "{principal} vs {required}"
                );
            }
        }
    }

    #[test]
    fn test_ranks() {
        assert_eq!(Role::Employee.rank(), 1);
        assert_eq!(Role::Manager.rank(), 2);
        assert_eq!(Role::Admin.rank(), 3);
        assert!(Role::Employee < Role::Manager && Role::Manager < Role::Admin);
    }

    #[test]
    fn test_no_role_never_passes() {
        for required in Role::ALL {
            assert!(!has_at_least_role(PrincipalRole::NoRole, required));
            assert_eq!(has_at_least_role_str(None, required.as_str()), Ok(false));
        }
    }

    #[test]
    fn test_no_role_does_not_raise_on_unknown_requirement() {
        assert_eq!(has_at_least_role_str(None, "owner"), Ok(false));
    }

    #[test]
    fn test_unknown_roles_are_errors() {
        assert_eq!(
            has_at_least_role_str(Some("superuser"), "employee"),
            Err(InvalidRoleError("superuser".to_owned()))
        );
        assert_eq!(
            has_at_least_role_str(Some("admin"), "root"),
            Err(InvalidRoleError("root".to_owned()))
        );
        assert!(has_at_least_role_str(Some("Admin"), "admin").is_err());
        assert!(has_at_least_role_str(Some(""), "admin").is_err());
    }

    #[test]
    fn test_str_contract_matches_typed() {
        assert_eq!(has_at_least_role_str(Some("manager"), "employee"), Ok(true));
        assert_eq!(has_at_least_role_str(Some("manager"), "admin"), Ok(false));
    }

    #[test]
    fn test_authorize() {
        assert!(authorize(Role::Manager.into(), Role::Manager).is_ok());
        let err = authorize(Role::Employee.into(), Role::Admin).unwrap_err();
        assert_eq!(err.required, Role::Admin);
        assert_eq!(err.to_string(), "requires admin role");
    }

    #[test]
    fn test_can_assign() {
        assert!(Role::Admin.can_assign(Role::Admin));
        assert!(Role::Manager.can_assign(Role::Manager));
        assert!(Role::Manager.can_assign(Role::Employee));
        assert!(!Role::Manager.can_assign(Role::Admin));
        assert!(!Role::Employee.can_assign(Role::Manager));
    }

    #[test]
    fn test_invitable_roles() {
        assert!(Role::Employee.is_invitable());
        assert!(Role::Manager.is_invitable());
        assert!(!Role::Admin.is_invitable());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }
}
