//! Database migrations.
//!
//! Migration files live in `crates/server/migrations/` and are embedded at
//! compile time.

use super::{CliError, database_url};

/// Apply all pending migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = tally_server::db::create_pool(&database_url()?).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
