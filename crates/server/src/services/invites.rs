//! Invitation workflow: issue, preview, accept, revoke.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use serde::Serialize;

use tally_core::{Email, InviteId, PermissionDenied, Role, SubjectId};

use super::email::InvitationMessage;
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::models::{Invite, Member, MemberProfile, NewInvite};
use crate::state::AppState;

/// Random bytes in an invitation token.
pub const TOKEN_BYTES: usize = 32;

/// Generate an unguessable URL-safe invitation token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Result of issuing an invitation.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedInvite {
    pub invite: Invite,
    pub accept_url: String,
    /// False when the notifier failed; the invite is still valid.
    pub notification_sent: bool,
}

/// What an unauthenticated visitor sees for a valid token.
#[derive(Debug, Clone, Serialize)]
pub struct InvitePreview {
    pub email: Email,
    pub role: Role,
    pub company_name: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue an invitation from `inviter` for `email` to join with `role`.
///
/// # Errors
///
/// - `BadRequest` if `role` is not invitable (admin)
/// - `PermissionDenied` if `inviter` may not grant `role`
pub async fn issue(
    state: &AppState,
    inviter: &Member,
    email: Email,
    role: Role,
) -> Result<IssuedInvite, AppError> {
    if !role.is_invitable() {
        return Err(AppError::BadRequest(format!(
            "invitations can grant manager or employee, not {role}"
        )));
    }
    if !inviter.role.can_assign(role) {
        return Err(PermissionDenied { required: role }.into());
    }

    let company = state
        .store()
        .get_company(inviter.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("company".to_owned()))?;

    let expires_at =
        state.now() + TimeDelta::days(i64::from(state.settings().invite_expiry_days));
    let invite = state
        .store()
        .create_invite(NewInvite {
            company_id: company.id,
            email,
            role,
            token: generate_token(),
            invited_by: inviter.id,
            expires_at,
        })
        .await?;

    let accept_url = state.settings().accept_url(&invite.token);
    let message = InvitationMessage {
        recipient: invite.email.to_string(),
        company_name: company.name,
        inviter_name: inviter.display_name(),
        role: role.to_string(),
        accept_url: accept_url.clone(),
    };

    let notification_sent = match state.notifier().send_invitation(&message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(invite_id = %invite.id, error = %e, "Failed to deliver invitation");
            false
        }
    };

    tracing::info!(
        invite_id = %invite.id,
        company_id = %invite.company_id,
        role = %invite.role,
        invited_by = %inviter.id,
        "Invitation issued"
    );

    Ok(IssuedInvite {
        invite,
        accept_url,
        notification_sent,
    })
}

/// Find a pending, unexpired invitation by token.
async fn find_redeemable(state: &AppState, token: &str) -> Result<Invite, AppError> {
    let invite = state
        .store()
        .find_invite_by_token(token)
        .await?
        .ok_or_else(|| AppError::NotFound("invitation".to_owned()))?;

    if invite.is_expired(state.now()) {
        return Err(AppError::Conflict("invitation has expired".to_owned()));
    }
    if !invite.is_redeemable(state.now()) {
        return Err(AppError::Conflict("invitation is no longer pending".to_owned()));
    }
    Ok(invite)
}

/// Describe a valid invitation for the accept page.
///
/// # Errors
///
/// `NotFound` for unknown tokens, `Conflict` for used, revoked or expired ones.
pub async fn preview(state: &AppState, token: &str) -> Result<InvitePreview, AppError> {
    let invite = find_redeemable(state, token).await?;
    let company = state
        .store()
        .get_company(invite.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("company".to_owned()))?;

    Ok(InvitePreview {
        email: invite.email,
        role: invite.role,
        company_name: company.name,
        expires_at: invite.expires_at,
    })
}

/// Accept an invitation as `subject`, creating their membership.
///
/// # Errors
///
/// `NotFound` for unknown tokens, `Conflict` for used, revoked or expired
/// ones or when the subject or email already has a membership.
pub async fn accept(
    state: &AppState,
    subject: &SubjectId,
    token: &str,
    first_name: String,
    last_name: String,
) -> Result<Member, AppError> {
    let invite = find_redeemable(state, token).await?;
    let new_member = MemberProfile {
        subject: subject.clone(),
        email: invite.email.clone(),
        first_name,
        last_name,
    }
    .join(invite.company_id, invite.role);

    let member = state
        .store()
        .accept_invite(invite.id, new_member, state.now())
        .await?;

    tracing::info!(
        invite_id = %invite.id,
        member_id = %member.id,
        company_id = %member.company_id,
        "Invitation accepted"
    );
    Ok(member)
}

/// Revoke a pending invitation in the manager's company.
///
/// # Errors
///
/// `NotFound` if the invite is not in the company, `Conflict` if it is no
/// longer pending.
pub async fn revoke(state: &AppState, manager: &Member, id: InviteId) -> Result<Invite, AppError> {
    let invite = state
        .store()
        .revoke_invite(manager.company_id, id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("invitation {id}")),
            other => other.into(),
        })?;

    tracing::info!(invite_id = %invite.id, revoked_by = %manager.id, "Invitation revoked");
    Ok(invite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_url_safe_and_unpadded() {
        let token = generate_token();
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(token.len(), 43);
        assert!(
            token
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        );
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }
}
