//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use goshop_core::{Email, Role, UserId};

/// A registered account.
///
/// The password hash is deliberately not a field; repositories hand it out
/// separately so it cannot end up in a response.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
