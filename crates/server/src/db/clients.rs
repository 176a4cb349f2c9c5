//! Client repository.

use async_trait::async_trait;

use tally_core::{ClientId, CompanyId};

use super::{PgStore, RepositoryError, map_write_error, require_row};
use crate::models::{Client, ClientChanges};

const CLIENT_COLUMNS: &str =
    "id, company_id, name, email, phone, address, notes, created_at, updated_at";

/// Client persistence. Every operation is scoped to one company.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// List a company's clients by name.
    async fn list_clients(&self, company_id: CompanyId) -> Result<Vec<Client>, RepositoryError>;

    /// Get a client by ID.
    async fn get_client(
        &self,
        company_id: CompanyId,
        id: ClientId,
    ) -> Result<Option<Client>, RepositoryError>;

    /// Create a client.
    async fn create_client(
        &self,
        company_id: CompanyId,
        client: ClientChanges,
    ) -> Result<Client, RepositoryError>;

    /// Replace a client's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the client isn't in the company.
    async fn update_client(
        &self,
        company_id: CompanyId,
        id: ClientId,
        client: ClientChanges,
    ) -> Result<Client, RepositoryError>;

    /// Delete a client.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while projects still reference it.
    async fn delete_client(&self, company_id: CompanyId, id: ClientId)
    -> Result<(), RepositoryError>;
}

#[async_trait]
impl ClientRepository for PgStore {
    async fn list_clients(&self, company_id: CompanyId) -> Result<Vec<Client>, RepositoryError> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM client WHERE company_id = $1 ORDER BY name, id"
        ))
        .bind(company_id)
        .fetch_all(self.pool())
        .await?;

        Ok(clients)
    }

    async fn get_client(
        &self,
        company_id: CompanyId,
        id: ClientId,
    ) -> Result<Option<Client>, RepositoryError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM client WHERE id = $1 AND company_id = $2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(client)
    }

    async fn create_client(
        &self,
        company_id: CompanyId,
        client: ClientChanges,
    ) -> Result<Client, RepositoryError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO client (company_id, name, email, phone, address, notes)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(company_id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.notes)
        .fetch_one(self.pool())
        .await?;

        Ok(client)
    }

    async fn update_client(
        &self,
        company_id: CompanyId,
        id: ClientId,
        client: ClientChanges,
    ) -> Result<Client, RepositoryError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "UPDATE client
             SET name = $3, email = $4, phone = $5, address = $6, notes = $7, updated_at = NOW()
             WHERE id = $1 AND company_id = $2
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(id)
        .bind(company_id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.notes)
        .fetch_optional(self.pool())
        .await?;

        require_row(client)
    }

    async fn delete_client(
        &self,
        company_id: CompanyId,
        id: ClientId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM client WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(self.pool())
            .await
            .map_err(|e| map_write_error(e, "client still has projects"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
