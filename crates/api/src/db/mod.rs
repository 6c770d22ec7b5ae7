//! Database operations for the GoShop `SQLite` store.
//!
//! ## Tables
//!
//! - `users` - Accounts with Argon2 password hashes and a role
//! - `products` - Catalog entries with price, image URL and stock
//! - `orders` - Checkout results, one per purchase
//! - `order_items` - Priced lines of an order
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/`, embedded in the binary
//! via [`MIGRATOR`], and applied on startup or with:
//! ```bash
//! goshop-cli migrate
//! ```

pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use goshop_core::Role;

use crate::config::AdminSeedConfig;
use crate::models::User;
use crate::services::auth::password::{PasswordError, hash_password};

pub use orders::{CheckoutError, OrderRepository};
pub use products::ProductRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Errors from first-start admin seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// File databases run in WAL mode. In-memory databases (`sqlite::memory:`)
/// are pinned to a single connection that is never recycled, since every
/// connection would otherwise see its own empty database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let in_memory = url.contains(":memory:") || url.contains("mode=memory");

    let mut options = SqliteConnectOptions::from_str(url)?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    if in_memory {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    options = options
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create the configured admin account if the user table is empty.
///
/// Returns the new admin, or `None` when users already exist.
///
/// # Errors
///
/// Returns `SeedError` if hashing or the insert fails.
pub async fn seed_admin(
    pool: &SqlitePool,
    admin: &AdminSeedConfig,
) -> Result<Option<User>, SeedError> {
    let users = UserRepository::new(pool);
    if users.count().await? > 0 {
        return Ok(None);
    }

    if admin.uses_defaults {
        tracing::warn!(
            email = %admin.email,
            "Seeding admin with default credentials; set GOSHOP_ADMIN_EMAIL and GOSHOP_ADMIN_PASSWORD"
        );
    }

    let password_hash = hash_password(admin.password.expose_secret())?;
    let user = users
        .create(&admin.name, &admin.email, &password_hash, Role::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin account created");
    Ok(Some(user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Fresh in-memory database with all migrations applied.
    pub async fn test_pool() -> SqlitePool {
        let pool = create_pool(&SecretString::from("sqlite::memory:"))
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    fn admin_config() -> AdminSeedConfig {
        AdminSeedConfig {
            name: "Admin Toko".to_string(),
            email: goshop_core::Email::parse("admin@goshop.com").unwrap(),
            password: SecretString::from("admin123"),
            uses_defaults: true,
        }
    }

    #[tokio::test]
    async fn test_seed_admin_only_on_empty_table() {
        let pool = test_pool().await;

        let admin = seed_admin(&pool, &admin_config()).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.email.as_str(), "admin@goshop.com");

        assert!(seed_admin(&pool, &admin_config()).await.unwrap().is_none());
        assert_eq!(UserRepository::new(&pool).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seeded_admin_password_verifies() {
        let pool = test_pool().await;
        seed_admin(&pool, &admin_config()).await.unwrap();

        let email = goshop_core::Email::parse("admin@goshop.com").unwrap();
        let (_, hash) = UserRepository::new(&pool)
            .get_password_hash(&email)
            .await
            .unwrap()
            .unwrap();
        assert!(crate::services::auth::password::verify_password(
            &hash, "admin123"
        ));
    }
}
