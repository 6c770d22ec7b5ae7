//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! goshop-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GOSHOP_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`, then `sqlite://goshop.db?mode=rwc`)
//!
//! Migration files live in `crates/api/migrations/` and are embedded in the
//! API crate, so the CLI and the server always agree on the schema.

use goshop_api::config::get_database_url;
use goshop_api::db;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("GOSHOP_DATABASE_URL");

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
