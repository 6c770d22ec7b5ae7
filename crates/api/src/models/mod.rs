//! Domain models for the API.
//!
//! These derive `sqlx::FromRow` so repositories can decode rows directly,
//! and `Serialize` for the JSON responses.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use product::{DEFAULT_STOCK, NewProduct, Product, ProductFilter};
pub use user::User;
