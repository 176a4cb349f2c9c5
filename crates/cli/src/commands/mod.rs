//! Command implementations.

use secrecy::SecretString;
use thiserror::Error;

use tally_core::{Email, EmailError, InvalidRoleError, InvalidSubjectId, SubjectId};
use tally_server::config::{ConfigError, get_database_url};
use tally_server::db::{self, PgStore, RepositoryError};
use tally_server::error::AppError;
use tally_server::models::MemberProfile;

pub mod company;
pub mod invite;
pub mod member;
pub mod migrate;
pub mod period;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    InvalidSubject(#[from] InvalidSubjectId),

    #[error(transparent)]
    InvalidRole(#[from] InvalidRoleError),

    #[error("{0}")]
    InvalidArgument(String),
}

/// Identity fields shared by the company and member commands.
pub struct ProfileArgs {
    pub subject: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileArgs {
    fn validate(self) -> Result<MemberProfile, CliError> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(CliError::InvalidArgument("first name is required".to_owned()));
        }
        Ok(MemberProfile {
            subject: SubjectId::parse(&self.subject)?,
            email: Email::parse(&self.email)?,
            first_name: first_name.to_owned(),
            last_name: self.last_name.trim().to_owned(),
        })
    }
}

fn database_url() -> Result<SecretString, CliError> {
    Ok(get_database_url("TALLY_DATABASE_URL")?)
}

async fn connect() -> Result<PgStore, CliError> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url()?).await?;
    Ok(PgStore::new(pool))
}
