//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ApiConfig;
use crate::services::auth::TokenKeys;
use crate::services::payment::PaymentGateway;
use crate::services::uploads::UploadStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: SqlitePool,
    tokens: TokenKeys,
    payments: Arc<dyn PaymentGateway>,
    uploads: UploadStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Token keys and the upload store are derived from `config`; the payment
    /// gateway is injected so tests can substitute their own.
    #[must_use]
    pub fn new(config: ApiConfig, pool: SqlitePool, payments: Arc<dyn PaymentGateway>) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret);
        let uploads = UploadStore::new(config.uploads.dir.clone(), config.public_url.as_str());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                payments,
                uploads,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Token signing and verification keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    /// The payment gateway used at checkout.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    /// Product image storage.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }
}
