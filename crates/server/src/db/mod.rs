//! Persistence for Tally.
//!
//! # Tables
//!
//! - `company` - Tenant companies
//! - `member` - A subject's membership (and role) in a company
//! - `client` - A company's clients
//! - `project` - Client projects that time is logged against
//! - `time_entry` - Logged time with its review status
//! - `invite` - Pending, accepted and revoked invitations
//!
//! Every operation is declared on a repository trait so handlers only see
//! `Arc<dyn Store>`. [`PgStore`] is the `PostgreSQL` implementation and
//! [`MemoryStore`] keeps everything in process for tests and local runs.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tally-cli -- migrate
//! ```

pub mod clients;
pub mod companies;
pub mod invites;
pub mod members;
pub mod memory;
pub mod projects;
pub mod time_entries;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use clients::ClientRepository;
pub use companies::CompanyRepository;
pub use invites::InviteRepository;
pub use members::MemberRepository;
pub use memory::MemoryStore;
pub use projects::ProjectRepository;
pub use time_entries::TimeEntryRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (duplicate subject or email, record still referenced).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store:
    CompanyRepository
    + MemberRepository
    + ClientRepository
    + ProjectRepository
    + InviteRepository
    + TimeEntryRepository
{
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map unique and foreign-key violations on a write to `Conflict`.
fn map_write_error(err: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(conflict.to_owned());
    }
    RepositoryError::Database(err)
}

/// Turn "no row" from an `UPDATE`/`DELETE ... RETURNING` into `NotFound`.
fn require_row<T>(row: Option<T>) -> Result<T, RepositoryError> {
    row.ok_or(RepositoryError::NotFound)
}
