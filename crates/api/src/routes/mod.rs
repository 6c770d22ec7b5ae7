//! HTTP route handlers for the GoShop API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness check
//! GET    /health/ready                 - Readiness check (database)
//! GET    /uploads/{file}               - Uploaded product images
//!
//! # Auth
//! POST   /api/register                 - Create a customer account
//! POST   /api/login                    - Exchange credentials for a token
//!
//! # Catalog
//! GET    /api/products                 - Product listing (?search=&category=)
//!
//! # Orders (requires auth)
//! POST   /api/checkout                 - Place an order and open an invoice
//! GET    /api/my/orders                - Caller's order history
//!
//! # Admin (requires admin role)
//! GET    /api/admin/orders             - All orders
//! PUT    /api/admin/orders/{id}        - Update order status
//! PUT    /api/admin/orders/{id}/status - Update order status
//! POST   /api/admin/products           - Create product (multipart with image)
//! DELETE /api/admin/products/{id}      - Delete product
//! ```

pub mod admin;
pub mod auth;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts},
    routing::{delete, get, post, put},
};
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Room for the non-file multipart fields on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the API error shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `{"message": ...}`
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// `{"data": ...}`
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// `{"message": ..., "data": ...}`
#[derive(Debug, Serialize)]
pub struct MessageWithData<T> {
    pub message: &'static str,
    pub data: T,
}

/// All `/api` routes.
pub fn api_routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(product_routes())
        .merge(order_routes(config.guest_checkout))
        .nest("/admin", admin_routes(config.uploads.max_bytes))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/products", get(products::index))
}

/// Create the order routes router.
///
/// With `guest_checkout` the checkout route accepts anonymous buyers; the
/// order history always requires a token.
pub fn order_routes(guest_checkout: bool) -> Router<AppState> {
    let checkout = if guest_checkout {
        post(orders::guest_checkout)
    } else {
        post(orders::checkout)
    };

    Router::new()
        .route("/checkout", checkout)
        .route("/my/orders", get(orders::mine))
}

/// Create the admin routes router.
pub fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::orders))
        .route("/orders/{id}", put(admin::update_order_status))
        .route("/orders/{id}/status", put(admin::update_order_status))
        .route(
            "/products",
            post(admin::create_product).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/products/{id}", delete(admin::delete_product))
}
