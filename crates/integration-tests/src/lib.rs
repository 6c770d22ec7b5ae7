//! Integration tests for GoShop.
//!
//! Tests drive the real router in-process: every request goes through the
//! full middleware stack, the auth gate and the handlers, against a fresh
//! in-memory `SQLite` database. Payments go to a [`StubGateway`] and uploads
//! to a temporary directory, so no network or external service is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p goshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Registration, login and the token gate
//! - `products` - Catalog listing and filters
//! - `checkout` - Order placement, stock and payment
//! - `admin` - Order management and catalog maintenance

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

use goshop_api::config::{
    AdminSeedConfig, ApiConfig, SentryConfig, UploadConfig, XenditConfig,
};
use goshop_api::db::{self, ProductRepository};
use goshop_api::models::{NewProduct, Product};
use goshop_api::services::payment::{Invoice, InvoiceRequest, PaymentError, PaymentGateway};
use goshop_api::state::AppState;
use goshop_core::Email;

/// Seeded admin credentials.
pub const ADMIN_EMAIL: &str = "admin@goshop.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Base of every public URL the test service hands out.
pub const PUBLIC_URL: &str = "http://localhost:8080";

/// Payment gateway that records invoices instead of calling Xendit.
#[derive(Debug, Default)]
pub struct StubGateway {
    fail: AtomicBool,
    requests: Mutex<Vec<InvoiceRequest>>,
}

impl StubGateway {
    /// Make subsequent invoice calls fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every invoice requested so far.
    pub fn requests(&self) -> Vec<InvoiceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, PaymentError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::Rejected {
                status: 503,
                body: "gateway unavailable".to_string(),
            });
        }

        Ok(Invoice {
            id: format!("inv_{}", request.order_id),
            invoice_url: format!("https://checkout.xendit.test/{}", request.external_id),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Knobs for building a [`TestApp`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TestOptions {
    pub guest_checkout: bool,
}

/// A fully wired service backed by an in-memory database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: Arc<StubGateway>,
    /// Kept alive for the lifetime of the app; uploads land here.
    pub upload_dir: TempDir,
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    /// Parsed body, `Value::Null` when the body is not JSON.
    pub body: Value,
}

impl TestResponse {
    /// The `error` message of an error body.
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    /// Service with default options (checkout requires a token).
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    /// Service with custom options.
    pub async fn spawn_with(options: TestOptions) -> Self {
        let upload_dir = TempDir::new().expect("Failed to create upload dir");
        let config = test_config(&upload_dir, options);

        let pool = db::create_pool(&config.database_url)
            .await
            .expect("Failed to create pool");
        db::MIGRATOR
            .run(&pool)
            .await
            .expect("Failed to run migrations");
        db::seed_admin(&pool, &config.admin)
            .await
            .expect("Failed to seed admin");

        let gateway = Arc::new(StubGateway::default());
        let state = AppState::new(config, pool, gateway.clone());
        let router = goshop_api::app(state.clone());

        Self {
            router,
            state,
            gateway,
            upload_dir,
        }
    }

    /// Database pool.
    pub fn pool(&self) -> &SqlitePool {
        self.state.pool()
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(json).unwrap())),
            None => builder.body(Body::empty()),
        };

        self.send(request.expect("Failed to build request")).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Post a multipart form.
    pub async fn post_multipart(
        &self,
        uri: &str,
        token: Option<&str>,
        form: MultipartForm,
    ) -> TestResponse {
        let (content_type, body) = form.finish();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body)).expect("Failed to build request"))
            .await
    }

    /// Register a customer.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> TestResponse {
        self.post_json(
            "/api/register",
            None,
            &serde_json::json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    /// Log in.
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json(
            "/api/login",
            None,
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Register and log in a customer, returning the token.
    pub async fn customer_token(&self, name: &str, email: &str) -> String {
        let registered = self.register(name, email, "rahasia123").await;
        assert_eq!(registered.status, StatusCode::OK, "{:?}", registered.body);
        self.token_for(email, "rahasia123").await
    }

    /// Token for the seeded admin.
    pub async fn admin_token(&self) -> String {
        self.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    async fn token_for(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// Insert a product directly.
    pub async fn add_product(&self, name: &str, price: &str, category: &str, stock: i64) -> Product {
        ProductRepository::new(self.pool())
            .create(&NewProduct {
                name: name.to_string(),
                price: price.parse().unwrap(),
                image: format!("{PUBLIC_URL}/uploads/{}.png", name.to_lowercase().replace(' ', "-")),
                category: category.to_string(),
                stock,
            })
            .await
            .expect("Failed to insert product")
    }

    /// Current stock of a product, `None` if it was deleted.
    pub async fn stock_of(&self, product: &Product) -> Option<i64> {
        ProductRepository::new(self.pool())
            .get(product.id)
            .await
            .unwrap()
            .map(|p| p.stock)
    }
}

fn test_config(upload_dir: &TempDir, options: TestOptions) -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 8080,
        public_url: Url::parse(PUBLIC_URL).unwrap(),
        jwt_secret: SecretString::from("integration-test-secret-with-plenty-of-entropy-9f3k"),
        uploads: UploadConfig {
            dir: upload_dir.path().to_path_buf(),
            max_bytes: 1024 * 1024,
        },
        cors_origin: "http://localhost:5173".to_string(),
        guest_checkout: options.guest_checkout,
        admin: AdminSeedConfig {
            name: "Admin Toko".to_string(),
            email: Email::parse(ADMIN_EMAIL).unwrap(),
            password: SecretString::from(ADMIN_PASSWORD),
            uses_defaults: true,
        },
        xendit: XenditConfig {
            secret_key: SecretString::from("xnd_development_unused"),
            api_url: Url::parse("http://127.0.0.1:9").unwrap(),
            success_redirect_url: "http://localhost:5173/profile".to_string(),
            invoice_duration_secs: 86_400,
            timeout: Duration::from_secs(1),
        },
        sentry: SentryConfig {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        },
    }
}

/// Minimal `multipart/form-data` body builder.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: &'static str,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub const fn new() -> Self {
        Self {
            boundary: "goshop-test-boundary-7MA4YWxkTrZu0gW",
            body: Vec::new(),
        }
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Content type header value and the encoded body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
