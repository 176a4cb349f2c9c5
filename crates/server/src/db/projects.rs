//! Project repository.

use async_trait::async_trait;

use tally_core::{CompanyId, ProjectId};

use super::{PgStore, RepositoryError, map_write_error, require_row};
use crate::models::{Project, ProjectChanges};

const PROJECT_COLUMNS: &str = "id, company_id, client_id, name, description, status, start_date, \
                               end_date, created_at, updated_at";

/// Project persistence. Every operation is scoped to one company; callers
/// check that the client belongs to the same company before writing.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// List a company's projects by name.
    async fn list_projects(&self, company_id: CompanyId) -> Result<Vec<Project>, RepositoryError>;

    /// Get a project by ID.
    async fn get_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
    ) -> Result<Option<Project>, RepositoryError>;

    /// Create a project.
    async fn create_project(
        &self,
        company_id: CompanyId,
        project: ProjectChanges,
    ) -> Result<Project, RepositoryError>;

    /// Replace a project's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project isn't in the company.
    async fn update_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
        project: ProjectChanges,
    ) -> Result<Project, RepositoryError>;

    /// Delete a project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while time entries reference it.
    async fn delete_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
impl ProjectRepository for PgStore {
    async fn list_projects(&self, company_id: CompanyId) -> Result<Vec<Project>, RepositoryError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project WHERE company_id = $1 ORDER BY name, id"
        ))
        .bind(company_id)
        .fetch_all(self.pool())
        .await?;

        Ok(projects)
    }

    async fn get_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
    ) -> Result<Option<Project>, RepositoryError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project WHERE id = $1 AND company_id = $2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(project)
    }

    async fn create_project(
        &self,
        company_id: CompanyId,
        project: ProjectChanges,
    ) -> Result<Project, RepositoryError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO project (company_id, client_id, name, description, status, start_date, end_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(company_id)
        .bind(project.client_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status)
        .bind(project.start_date)
        .bind(project.end_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, "client does not exist"))?;

        Ok(project)
    }

    async fn update_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
        project: ProjectChanges,
    ) -> Result<Project, RepositoryError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "UPDATE project
             SET client_id = $3, name = $4, description = $5, status = $6,
                 start_date = $7, end_date = $8, updated_at = NOW()
             WHERE id = $1 AND company_id = $2
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(company_id)
        .bind(project.client_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status)
        .bind(project.start_date)
        .bind(project.end_date)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_write_error(e, "client does not exist"))?;

        require_row(project)
    }

    async fn delete_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM project WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(self.pool())
            .await
            .map_err(|e| map_write_error(e, "project still has time entries"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
