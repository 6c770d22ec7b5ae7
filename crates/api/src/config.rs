//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GOSHOP_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `XENDIT_SECRET_KEY` - Xendit API secret key
//!
//! ## Optional
//! - `GOSHOP_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`,
//!   then `sqlite://goshop.db?mode=rwc`)
//! - `GOSHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `GOSHOP_PORT` - Listen port (default: 8080)
//! - `GOSHOP_PUBLIC_URL` - Public URL of this service, used for image links
//!   (default: `http://localhost:8080`)
//! - `GOSHOP_UPLOAD_DIR` - Directory for uploaded product images (default: `./uploads`)
//! - `GOSHOP_MAX_UPLOAD_BYTES` - Request body limit for uploads (default: 10 MiB)
//! - `GOSHOP_CORS_ORIGIN` - Allowed browser origin (default: `http://localhost:5173`)
//! - `GOSHOP_GUEST_CHECKOUT` - Allow checkout without a token (default: false)
//! - `GOSHOP_ADMIN_NAME` / `GOSHOP_ADMIN_EMAIL` / `GOSHOP_ADMIN_PASSWORD` - First-start admin
//! - `XENDIT_API_URL` - Xendit base URL (default: `https://api.xendit.co`)
//! - `XENDIT_SUCCESS_REDIRECT_URL` - Where Xendit sends the buyer after paying
//! - `XENDIT_INVOICE_DURATION_SECS` - Invoice validity (default: 86400)
//! - `XENDIT_TIMEOUT_SECS` - Gateway request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use goshop_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_DATABASE_URL: &str = "sqlite://goshop.db?mode=rwc";
const DEFAULT_ADMIN_NAME: &str = "Admin Toko";
const DEFAULT_ADMIN_EMAIL: &str = "admin@goshop.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `SQLite` connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this service
    pub public_url: Url,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Product image storage
    pub uploads: UploadConfig,
    /// Browser origin allowed by CORS
    pub cors_origin: String,
    /// Whether `/api/checkout` accepts requests without a token
    pub guest_checkout: bool,
    /// Credentials for the admin created on first start
    pub admin: AdminSeedConfig,
    /// Payment gateway
    pub xendit: XenditConfig,
    /// Error tracking
    pub sentry: SentryConfig,
}

/// Where uploaded images live and how large they may be.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

/// Admin account created when the user table is empty.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminSeedConfig {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    /// True when the well-known default credentials are in use.
    pub uses_defaults: bool,
}

impl std::fmt::Debug for AdminSeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeedConfig")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("uses_defaults", &self.uses_defaults)
            .finish()
    }
}

/// Xendit invoice API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct XenditConfig {
    pub secret_key: SecretString,
    pub api_url: Url,
    pub success_redirect_url: String,
    pub invoice_duration_secs: u64,
    pub timeout: Duration,
}

impl std::fmt::Debug for XenditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XenditConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_url", &self.api_url.as_str())
            .field("success_redirect_url", &self.success_redirect_url)
            .field("invoice_duration_secs", &self.invoice_duration_secs)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("GOSHOP_DATABASE_URL");
        let host = parse_env("GOSHOP_HOST", "127.0.0.1")?;
        let port = parse_env("GOSHOP_PORT", "8080")?;
        let public_url = parse_url("GOSHOP_PUBLIC_URL", "http://localhost:8080")?;
        let jwt_secret = get_validated_secret("GOSHOP_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "GOSHOP_JWT_SECRET")?;

        let uploads = UploadConfig {
            dir: PathBuf::from(get_env_or_default("GOSHOP_UPLOAD_DIR", "./uploads")),
            max_bytes: parse_env("GOSHOP_MAX_UPLOAD_BYTES", "10485760")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            public_url,
            jwt_secret,
            uploads,
            cors_origin: get_env_or_default("GOSHOP_CORS_ORIGIN", "http://localhost:5173"),
            guest_checkout: parse_env("GOSHOP_GUEST_CHECKOUT", "false")?,
            admin: AdminSeedConfig::from_env()?,
            xendit: XenditConfig::from_env()?,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AdminSeedConfig {
    /// Load the admin seed credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `GOSHOP_ADMIN_EMAIL` is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let name = get_optional_env("GOSHOP_ADMIN_NAME");
        let email = get_optional_env("GOSHOP_ADMIN_EMAIL");
        let password = get_optional_env("GOSHOP_ADMIN_PASSWORD");
        let uses_defaults = email.is_none() || password.is_none();

        let email_raw = email.as_deref().unwrap_or(DEFAULT_ADMIN_EMAIL);
        let email = Email::parse(email_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("GOSHOP_ADMIN_EMAIL".to_string(), e.to_string())
        })?;

        Ok(Self {
            name: name.unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
            email,
            password: SecretString::from(
                password.unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            ),
            uses_defaults,
        })
    }
}

impl XenditConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_required_secret("XENDIT_SECRET_KEY")?,
            api_url: parse_url("XENDIT_API_URL", "https://api.xendit.co")?,
            success_redirect_url: get_env_or_default(
                "XENDIT_SUCCESS_REDIRECT_URL",
                "http://localhost:5173/profile",
            ),
            invoice_duration_secs: parse_env("XENDIT_INVOICE_DURATION_SECS", "86400")?,
            timeout: Duration::from_secs(parse_env("XENDIT_TIMEOUT_SECS", "30")?),
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`, then the local file.
#[must_use]
pub fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(
            |_| SecretString::from(DEFAULT_DATABASE_URL),
            SecretString::from,
        )
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    Url::parse(&get_env_or_default(key, default))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
