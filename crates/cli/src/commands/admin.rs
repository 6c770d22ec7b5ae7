//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin user
//! goshop-cli admin create -n "Admin Toko" -e admin@example.com -p 's3cret-pass'
//!
//! # Create the configured admin on an empty database
//! goshop-cli admin seed
//! ```
//!
//! # Environment Variables
//!
//! - `GOSHOP_DATABASE_URL` - `SQLite` connection string
//! - `GOSHOP_ADMIN_NAME`, `GOSHOP_ADMIN_EMAIL`, `GOSHOP_ADMIN_PASSWORD` -
//!   credentials used by `admin seed`

use goshop_api::config::{AdminSeedConfig, ConfigError, get_database_url};
use goshop_api::db::{self, RepositoryError, SeedError, UserRepository};
use goshop_api::services::auth::{MIN_PASSWORD_LENGTH, hash_password, password::PasswordError};
use goshop_core::{Email, EmailError, Role, UserId};
use sqlx::SqlitePool;
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Password hashing failed: {0}")]
    Password(#[from] PasswordError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seeding failed: {0}")]
    Seed(#[from] SeedError),
}

/// Create a new admin user.
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create_user(name: &str, email: &str, password: &str) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("GOSHOP_DATABASE_URL");

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let user_id = insert_admin(&pool, name, email, password).await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user_id,
        email.trim()
    );
    Ok(user_id)
}

/// Create the configured admin if the user table is empty.
///
/// # Errors
///
/// Returns an error if the admin config is invalid or the database fails.
pub async fn seed() -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let admin = AdminSeedConfig::from_env()?;
    let database_url = get_database_url("GOSHOP_DATABASE_URL");

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    match db::seed_admin(&pool, &admin).await? {
        Some(user) => tracing::info!("Seeded admin {} (ID: {})", user.email, user.id),
        None => tracing::info!("Users already exist, nothing to seed"),
    }
    Ok(())
}

async fn insert_admin(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<UserId, AdminError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::EmptyName);
    }
    let email = Email::parse(email)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword(MIN_PASSWORD_LENGTH));
    }

    let users = UserRepository::new(pool);
    if users.get_by_email(&email).await?.is_some() {
        return Err(AdminError::UserExists(email.into_inner()));
    }

    let password_hash = hash_password(password)?;
    let user = users
        .create(name, &email, &password_hash, Role::Admin)
        .await?;

    Ok(user.id)
}
