//! Caller identity and role checks.
//!
//! The service sits behind an identity-aware proxy that authenticates the
//! user and forwards their subject id in a trusted header. The extractor
//! reads that header and loads the caller's membership, which carries the
//! role every permission check is made against.

use axum::{extract::FromRequestParts, http::request::Parts};

use tally_core::authz::authorize;
use tally_core::{PermissionDenied, PrincipalRole, Role, SubjectId};

use crate::error::{AppError, set_sentry_user};
use crate::models::Member;
use crate::state::AppState;

/// The authenticated caller of a request.
///
/// Rejects with 401 when the identity header is missing or malformed.
/// A caller who has not joined a company yet has no membership and acts
/// with [`PrincipalRole::NoRole`].
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(caller: Caller) -> Result<impl IntoResponse, AppError> {
///     let manager = caller.require(Role::Manager)?;
///     Ok(format!("Hello, {}!", manager.first_name))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Caller {
    pub subject: SubjectId,
    pub member: Option<Member>,
}

impl Caller {
    /// Role used for authorization.
    #[must_use]
    pub fn principal_role(&self) -> PrincipalRole {
        self.member.as_ref().map(|m| m.role).into()
    }

    /// The caller's membership, if their role is at least `required`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PermissionDenied` otherwise, including for callers
    /// without a membership.
    pub fn require(&self, required: Role) -> Result<&Member, AppError> {
        authorize(self.principal_role(), required)?;
        self.member
            .as_ref()
            .ok_or(AppError::PermissionDenied(PermissionDenied { required }))
    }

    /// The caller's membership, whatever their role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PermissionDenied` for callers without a membership.
    pub fn member(&self) -> Result<&Member, AppError> {
        self.require(Role::Employee)
    }

    /// The caller's subject, if they have not joined a company yet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if they already belong to one.
    pub fn require_unaffiliated(&self) -> Result<&SubjectId, AppError> {
        match self.member {
            Some(_) => Err(AppError::Conflict(
                "already a member of a company".to_owned(),
            )),
            None => Ok(&self.subject),
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(&state.settings().identity_header)
            .ok_or_else(|| AppError::Unauthorized("missing identity".to_owned()))?;

        let subject = header
            .to_str()
            .ok()
            .and_then(|raw| SubjectId::parse(raw.trim()).ok())
            .ok_or_else(|| AppError::Unauthorized("invalid identity".to_owned()))?;

        let member = state.store().find_member_by_subject(&subject).await?;
        match &member {
            Some(m) => {
                set_sentry_user(m.id.as_i32(), Some(m.email.as_str()));
                tracing::debug!(subject = %subject, member_id = %m.id, role = %m.role, "Caller resolved");
            }
            None => tracing::debug!(subject = %subject, "Caller has no membership"),
        }

        Ok(Self { subject, member })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use tally_core::{CompanyId, Email, MemberId};

    use super::*;

    fn caller(role: Option<Role>) -> Caller {
        let subject = SubjectId::parse("sub-1").unwrap();
        let member = role.map(|role| Member {
            id: MemberId::new(1),
            subject: subject.clone(),
            company_id: CompanyId::new(1),
            email: Email::parse("a@acme.test").unwrap(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            role,
            manager_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        Caller { subject, member }
    }

    #[test]
    fn test_require_checks_rank() {
        assert!(caller(Some(Role::Admin)).require(Role::Manager).is_ok());
        assert!(caller(Some(Role::Manager)).require(Role::Manager).is_ok());
        assert!(matches!(
            caller(Some(Role::Employee)).require(Role::Manager),
            Err(AppError::PermissionDenied(PermissionDenied {
                required: Role::Manager
            }))
        ));
    }

    #[test]
    fn test_no_membership_is_no_role() {
        let c = caller(None);
        assert_eq!(c.principal_role(), PrincipalRole::NoRole);
        assert!(matches!(c.member(), Err(AppError::PermissionDenied(_))));
        assert!(c.require_unaffiliated().is_ok());
    }

    #[test]
    fn test_members_are_not_unaffiliated() {
        assert!(matches!(
            caller(Some(Role::Employee)).require_unaffiliated(),
            Err(AppError::Conflict(_))
        ));
    }
}
