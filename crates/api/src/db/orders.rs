//! Order repository: checkout, order history and status management.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use thiserror::Error;

use goshop_core::{Money, OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem, Product};

const ORDER_COLUMNS: &str = "id, user_id, customer, total, status, address, payment_method, \
                             payment_reference, payment_url, created_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, name, price, quantity";

/// Reasons an order cannot be placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("product {0} not found")]
    UnknownProduct(ProductId),

    #[error("insufficient stock for {name}: {available} left, {requested} requested")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("order total is out of range")]
    TotalOverflow,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Place an order in a single transaction.
    ///
    /// Prices come from the catalog, never from the buyer. Each line
    /// decrements the product's stock; if any line cannot be covered the
    /// whole transaction rolls back and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::UnknownProduct` for a missing product,
    /// `CheckoutError::InsufficientStock` when stock is short, and
    /// `CheckoutError::Repository` for database failures.
    pub async fn place(&self, order: &NewOrder) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let mut priced = Vec::with_capacity(order.lines.len());
        let mut total = Money::ZERO;
        for &(product_id, quantity) in &order.lines {
            let item = reserve_line(&mut *tx, product_id, quantity).await?;
            let line_total = item
                .price
                .checked_mul_quantity(item.quantity)
                .ok_or(CheckoutError::TotalOverflow)?;
            total = total
                .checked_add(line_total)
                .ok_or(CheckoutError::TotalOverflow)?;
            priced.push(item);
        }

        let mut placed = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO orders (user_id, customer, total, status, address, payment_method, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(&order.customer)
        .bind(total)
        .bind(OrderStatus::Pending)
        .bind(&order.address)
        .bind(&order.payment_method)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for item in &priced {
            let inserted = sqlx::query_as::<_, OrderItem>(&format!(
                r"
                INSERT INTO order_items (order_id, product_id, name, price, quantity)
                VALUES (?, ?, ?, ?, ?)
                RETURNING {ITEM_COLUMNS}
                "
            ))
            .bind(placed.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;
            placed.items.push(inserted);
        }

        tx.commit().await?;
        Ok(placed)
    }

    /// Record the gateway invoice for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_payment(
        &self,
        id: OrderId,
        reference: &str,
        url: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET payment_reference = ?, payment_url = ? WHERE id = ?")
                .bind(reference)
                .bind(url)
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match order {
            Some(order) => Ok(self.with_items(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Orders placed by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.with_items(orders).await
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.with_items(orders).await
    }

    /// Change an order's status and return the updated order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Load the items of `orders` in one query and attach them.
    async fn with_items(&self, mut orders: Vec<Order>) -> Result<Vec<Order>, RepositoryError> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id IN ("
        ));
        let mut ids = query.separated(", ");
        for order in &orders {
            ids.push_bind(order.id);
        }
        ids.push_unseparated(") ORDER BY id");

        let items = query
            .build_query_as::<OrderItem>()
            .fetch_all(self.pool)
            .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }
}

/// Price one checkout line and take its quantity out of stock.
async fn reserve_line(
    conn: &mut SqliteConnection,
    product_id: ProductId,
    quantity: i64,
) -> Result<NewOrderItem, CheckoutError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, price, image, category, stock, created_at FROM products WHERE id = ?",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(CheckoutError::UnknownProduct(product_id))?;

    let updated = sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?")
        .bind(quantity)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

    if updated.rows_affected() == 0 {
        // Re-read: an earlier line of the same order may have taken stock.
        let available: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_one(&mut *conn)
            .await?;
        return Err(CheckoutError::InsufficientStock {
            name: product.name,
            available,
            requested: quantity,
        });
    }

    Ok(NewOrderItem {
        product_id,
        name: product.name,
        price: product.price,
        quantity,
    })
}
