//! Invitation repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tally_core::{CompanyId, InviteId};

use super::{PgStore, RepositoryError, map_write_error};
use crate::models::{Invite, Member, NewInvite, NewMember};

const INVITE_COLUMNS: &str = "id, company_id, email, role, token, status, invited_by, created_at, \
                              expires_at, accepted_at";

/// Invitation persistence.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Store a new pending invitation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a token collision.
    async fn create_invite(&self, invite: NewInvite) -> Result<Invite, RepositoryError>;

    /// Look up an invitation by its token, whatever its status.
    async fn find_invite_by_token(&self, token: &str) -> Result<Option<Invite>, RepositoryError>;

    /// List a company's pending invitations, newest first.
    async fn list_pending_invites(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<Invite>, RepositoryError>;

    /// Move a pending invitation to revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the invite isn't in the company,
    /// or `RepositoryError::Conflict` if it is no longer pending.
    async fn revoke_invite(
        &self,
        company_id: CompanyId,
        id: InviteId,
    ) -> Result<Invite, RepositoryError>;

    /// Mark a pending invitation accepted and create the member, atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the invite was already used or
    /// revoked, or the subject or email is already a member.
    async fn accept_invite(
        &self,
        id: InviteId,
        member: NewMember,
        accepted_at: DateTime<Utc>,
    ) -> Result<Member, RepositoryError>;
}

#[async_trait]
impl InviteRepository for PgStore {
    async fn create_invite(&self, invite: NewInvite) -> Result<Invite, RepositoryError> {
        let invite = sqlx::query_as::<_, Invite>(&format!(
            "INSERT INTO invite (company_id, email, role, token, invited_by, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {INVITE_COLUMNS}"
        ))
        .bind(invite.company_id)
        .bind(&invite.email)
        .bind(invite.role)
        .bind(&invite.token)
        .bind(invite.invited_by)
        .bind(invite.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, "invite token already exists"))?;

        Ok(invite)
    }

    async fn find_invite_by_token(&self, token: &str) -> Result<Option<Invite>, RepositoryError> {
        let invite = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invite WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool())
        .await?;

        Ok(invite)
    }

    async fn list_pending_invites(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<Invite>, RepositoryError> {
        let invites = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invite
             WHERE company_id = $1 AND status = 'pending'
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(company_id)
        .fetch_all(self.pool())
        .await?;

        Ok(invites)
    }

    async fn revoke_invite(
        &self,
        company_id: CompanyId,
        id: InviteId,
    ) -> Result<Invite, RepositoryError> {
        let revoked = sqlx::query_as::<_, Invite>(&format!(
            "UPDATE invite SET status = 'revoked'
             WHERE id = $1 AND company_id = $2 AND status = 'pending'
             RETURNING {INVITE_COLUMNS}"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(self.pool())
        .await?;

        if let Some(invite) = revoked {
            return Ok(invite);
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM invite WHERE id = $1 AND company_id = $2)",
        )
        .bind(id)
        .bind(company_id)
        .fetch_one(self.pool())
        .await?;

        if exists {
            Err(RepositoryError::Conflict("invite is no longer pending".to_owned()))
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn accept_invite(
        &self,
        id: InviteId,
        member: NewMember,
        accepted_at: DateTime<Utc>,
    ) -> Result<Member, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            "UPDATE invite SET status = 'accepted', accepted_at = $2
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(accepted_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "invite is no longer pending".to_owned(),
            ));
        }

        let member = super::members::insert_member(&mut *tx, &member).await?;

        tx.commit().await?;
        Ok(member)
    }
}
