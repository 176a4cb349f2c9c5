//! Member repository.

use async_trait::async_trait;
use sqlx::PgExecutor;

use tally_core::{CompanyId, MemberId, Role, SubjectId};

use super::{PgStore, RepositoryError, map_write_error, require_row};
use crate::models::{Member, MemberChanges, NewMember};

const MEMBER_COLUMNS: &str = "id, subject, company_id, email, first_name, last_name, role, \
                              manager_id, created_at, updated_at";

/// Member persistence.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find the membership for an identity-provider subject.
    async fn find_member_by_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<Member>, RepositoryError>;

    /// Get a member of `company_id` by ID.
    async fn get_member(
        &self,
        company_id: CompanyId,
        id: MemberId,
    ) -> Result<Option<Member>, RepositoryError>;

    /// List a company's members, ordered by last then first name.
    async fn list_members(&self, company_id: CompanyId) -> Result<Vec<Member>, RepositoryError>;

    /// Create a member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the subject or email is taken.
    async fn create_member(&self, member: NewMember) -> Result<Member, RepositoryError>;

    /// Apply a partial update. If the member ends up below manager, anyone
    /// reporting to them loses their manager in the same write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member isn't in the company.
    async fn update_member(
        &self,
        company_id: CompanyId,
        id: MemberId,
        changes: MemberChanges,
    ) -> Result<Member, RepositoryError>;

    /// Delete a member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member isn't in the company,
    /// or `RepositoryError::Conflict` if time entries or invites still
    /// reference them.
    async fn delete_member(&self, company_id: CompanyId, id: MemberId)
    -> Result<(), RepositoryError>;
}

/// Insert a member using any executor, so company creation and invite
/// acceptance can run it inside their transactions.
pub(super) async fn insert_member<'e, E>(
    executor: E,
    member: &NewMember,
) -> Result<Member, RepositoryError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Member>(&format!(
        "INSERT INTO member (subject, company_id, email, first_name, last_name, role, manager_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {MEMBER_COLUMNS}"
    ))
    .bind(&member.subject)
    .bind(member.company_id)
    .bind(&member.email)
    .bind(&member.first_name)
    .bind(&member.last_name)
    .bind(member.role)
    .bind(member.manager_id)
    .fetch_one(executor)
    .await
    .map_err(|e| map_write_error(e, "a member with this subject or email already exists"))
}

#[async_trait]
impl MemberRepository for PgStore {
    async fn find_member_by_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<Member>, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM member WHERE subject = $1"
        ))
        .bind(subject)
        .fetch_optional(self.pool())
        .await?;

        Ok(member)
    }

    async fn get_member(
        &self,
        company_id: CompanyId,
        id: MemberId,
    ) -> Result<Option<Member>, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM member WHERE id = $1 AND company_id = $2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(member)
    }

    async fn list_members(&self, company_id: CompanyId) -> Result<Vec<Member>, RepositoryError> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM member
             WHERE company_id = $1
             ORDER BY last_name, first_name, id"
        ))
        .bind(company_id)
        .fetch_all(self.pool())
        .await?;

        Ok(members)
    }

    async fn create_member(&self, member: NewMember) -> Result<Member, RepositoryError> {
        insert_member(self.pool(), &member).await
    }

    async fn update_member(
        &self,
        company_id: CompanyId,
        id: MemberId,
        changes: MemberChanges,
    ) -> Result<Member, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let member = sqlx::query_as::<_, Member>(&format!(
            "UPDATE member
             SET first_name = COALESCE($3, first_name),
                 last_name = COALESCE($4, last_name),
                 role = COALESCE($5, role),
                 manager_id = COALESCE($6, manager_id),
                 updated_at = NOW()
             WHERE id = $1 AND company_id = $2
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(company_id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(changes.role)
        .bind(changes.manager_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "manager does not exist"))?;
        let member = require_row(member)?;

        if member.role < Role::Manager {
            let released = sqlx::query(
                "UPDATE member SET manager_id = NULL, updated_at = NOW()
                 WHERE company_id = $1 AND manager_id = $2",
            )
            .bind(company_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            if released.rows_affected() > 0 {
                tracing::info!(member_id = %id, reports = released.rows_affected(), "Reports released from demoted manager");
            }
        }

        tx.commit().await?;
        Ok(member)
    }

    async fn delete_member(
        &self,
        company_id: CompanyId,
        id: MemberId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM member WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(self.pool())
            .await
            .map_err(|e| map_write_error(e, "member still has time entries or invites"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
