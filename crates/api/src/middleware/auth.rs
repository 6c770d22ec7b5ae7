//! Bearer-token auth gate.
//!
//! Extractors that verify the `Authorization: Bearer <token>` header and
//! hand the caller's identity to the handler:
//!
//! - [`RequireAuth`] rejects requests without a valid token.
//! - [`RequireAdmin`] additionally requires the `admin` role.
//! - [`OptionalAuth`] never rejects; it yields `None` for anonymous or
//!   invalid credentials.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::Span;

use goshop_core::{Role, UserId};

use crate::error::set_sentry_user;
use crate::state::AppState;

/// Identity of an authenticated caller, taken from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub role: Role,
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("orders for {}", user.id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub AuthUser);

/// Extractor that requires a valid bearer token with the admin role.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub AuthUser);

/// Extractor that reads a bearer token if one is present and valid.
#[derive(Debug, Clone, Copy)]
pub struct OptionalAuth(pub Option<AuthUser>);

/// Why the gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No `Authorization` header.
    MissingToken,
    /// Header present but not `Bearer <token>`.
    BadFormat,
    /// Bad signature, corrupt structure, or expired.
    InvalidToken,
    /// Valid token without the admin role.
    Forbidden,
}

impl AuthRejection {
    const fn status_and_message(self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "missing token"),
            Self::BadFormat => (StatusCode::UNAUTHORIZED, "bad token format"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "admin access required"),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run the gate against the request headers.
fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, AuthRejection> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthRejection::MissingToken)?;

    let value = header.to_str().map_err(|_| AuthRejection::BadFormat)?;
    let token = bearer_token(value).ok_or(AuthRejection::BadFormat)?;

    let claims = state
        .tokens()
        .verify(token)
        .map_err(|_| AuthRejection::InvalidToken)?;

    Ok(AuthUser {
        id: claims.sub,
        role: claims.role,
    })
}

/// Token part of `Bearer <token>`: exactly two space-separated parts, scheme
/// compared case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.contains(' ') {
        return None;
    }
    Some(token)
}

fn record_user(user: &AuthUser) {
    Span::current().record("user_id", user.id.as_i64());
    set_sentry_user(&user.id, None);
}

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = authenticate(parts, &state)?;
        record_user(&user);
        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = authenticate(parts, &state).ok();
        if let Some(user) = &user {
            record_user(user);
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;

    use super::*;
    use crate::config::tests::test_config;
    use crate::db::tests::test_pool;
    use crate::services::payment::XenditClient;

    async fn state() -> AppState {
        let config = test_config();
        let payments = XenditClient::new(&config.xendit).unwrap();
        AppState::new(config, test_pool().await, Arc::new(payments))
    }

    fn parts_with_token(token: &str) -> Parts {
        Request::builder()
            .uri("/api/my/orders")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_fresh_login_token_passes_gate() {
        let state = state().await;
        let issued = state
            .tokens()
            .issue(UserId::new(42), Role::Customer)
            .unwrap();

        let RequireAuth(user) =
            RequireAuth::from_request_parts(&mut parts_with_token(&issued.token), &state)
                .await
                .unwrap();
        assert_eq!(
            user,
            AuthUser {
                id: UserId::new(42),
                role: Role::Customer
            }
        );

        let OptionalAuth(user) =
            OptionalAuth::from_request_parts(&mut parts_with_token(&issued.token), &state)
                .await
                .unwrap();
        assert_eq!(user.map(|u| u.id), Some(UserId::new(42)));
    }

    #[tokio::test]
    async fn test_admin_gate_checks_role() {
        let state = state().await;
        let customer = state
            .tokens()
            .issue(UserId::new(7), Role::Customer)
            .unwrap();
        let admin = state.tokens().issue(UserId::new(1), Role::Admin).unwrap();

        let denied =
            RequireAdmin::from_request_parts(&mut parts_with_token(&customer.token), &state).await;
        assert!(matches!(denied, Err(AuthRejection::Forbidden)));

        let RequireAdmin(user) =
            RequireAdmin::from_request_parts(&mut parts_with_token(&admin.token), &state)
                .await
                .unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let state = state().await;
        let mut parts = Request::builder().body(()).unwrap().into_parts().0;

        let rejected = RequireAuth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(rejected, Err(AuthRejection::MissingToken)));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer abc def"), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AuthRejection::MissingToken.status_and_message(),
            (StatusCode::UNAUTHORIZED, "missing token")
        );
        assert_eq!(
            AuthRejection::BadFormat.status_and_message(),
            (StatusCode::UNAUTHORIZED, "bad token format")
        );
        assert_eq!(
            AuthRejection::InvalidToken.status_and_message(),
            (StatusCode::UNAUTHORIZED, "invalid token")
        );
        assert_eq!(
            AuthRejection::Forbidden.status_and_message().0,
            StatusCode::FORBIDDEN
        );
    }
}
