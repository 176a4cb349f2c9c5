//! Company repository.

use async_trait::async_trait;

use tally_core::{CompanyId, Role};

use super::{PgStore, RepositoryError, map_write_error, require_row};
use crate::models::{Company, CompanyChanges, Member, MemberProfile, NewCompany};

const COMPANY_COLUMNS: &str = "id, name, address, contact_name, contact_email, contact_phone, \
                               created_at, updated_at";

/// Company persistence.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Create a company and make `founder` its first admin, atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the founder's subject or email
    /// is already a member somewhere.
    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        founder: MemberProfile,
    ) -> Result<(Company, Member), RepositoryError>;

    /// Get a company by ID.
    async fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the company doesn't exist.
    async fn update_company(
        &self,
        id: CompanyId,
        changes: CompanyChanges,
    ) -> Result<Company, RepositoryError>;
}

#[async_trait]
impl CompanyRepository for PgStore {
    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        founder: MemberProfile,
    ) -> Result<(Company, Member), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let created = sqlx::query_as::<_, Company>(&format!(
            "INSERT INTO company (name, address, contact_name, contact_email, contact_phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.contact_name)
        .bind(&company.contact_email)
        .bind(&company.contact_phone)
        .fetch_one(&mut *tx)
        .await?;

        let admin = super::members::insert_member(&mut *tx, &founder.join(created.id, Role::Admin))
            .await?;

        tx.commit().await?;
        Ok((created, admin))
    }

    async fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM company WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(company)
    }

    async fn update_company(
        &self,
        id: CompanyId,
        changes: CompanyChanges,
    ) -> Result<Company, RepositoryError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "UPDATE company
             SET name = COALESCE($2, name),
                 address = COALESCE($3, address),
                 contact_name = COALESCE($4, contact_name),
                 contact_email = COALESCE($5, contact_email),
                 contact_phone = COALESCE($6, contact_phone),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.address)
        .bind(&changes.contact_name)
        .bind(&changes.contact_email)
        .bind(&changes.contact_phone)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_write_error(e, "company update conflicts with existing data"))?;

        require_row(company)
    }
}
