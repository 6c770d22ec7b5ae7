//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use goshop_core::{Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// An order with its line items.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// `None` for guest orders.
    pub user_id: Option<UserId>,
    /// Customer name at the time of purchase.
    pub customer: String,
    pub total: Money,
    pub status: OrderStatus,
    pub address: String,
    pub payment_method: String,
    /// Gateway invoice id.
    pub payment_reference: Option<String>,
    pub payment_url: Option<String>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

/// A purchased line. Name and price are copied from the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

/// A priced line ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

/// An order ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub customer: String,
    pub address: String,
    pub payment_method: String,
    /// `(product, quantity)` pairs as requested by the buyer.
    pub lines: Vec<(ProductId, i64)>,
}
