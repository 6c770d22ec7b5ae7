//! HTTP middleware for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS
//! 3. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 4. Request ID (fills the span field, tags Sentry, echoes the header)
//!
//! The auth gate is not a layer: handlers opt in through the extractors in
//! [`auth`].

pub mod auth;
pub mod request_id;

pub use auth::{AuthRejection, AuthUser, OptionalAuth, RequireAdmin, RequireAuth};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
