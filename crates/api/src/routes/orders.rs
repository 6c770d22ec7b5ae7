//! Checkout and order history.
//!
//! Checkout prices every line from the catalog inside one transaction (see
//! [`OrderRepository::place`]), then opens an invoice with the payment
//! gateway. If the gateway fails the order is kept as `Pending` and the buyer
//! gets a 502.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use goshop_core::{Money, OrderId, ProductId};

use super::{ApiJson, Data};
use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{AuthUser, OptionalAuth, RequireAuth};
use crate::models::{NewOrder, Order};
use crate::services::payment::InvoiceRequest;
use crate::state::AppState;

/// Customer name recorded on orders placed without an account.
pub const GUEST_CUSTOMER: &str = "Customer";

/// One requested line.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Checkout form.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    /// What the client thinks the order costs. Only compared, never charged.
    pub total: Option<Money>,
}

impl CheckoutRequest {
    fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(AppError::BadRequest("order has no items".to_string()));
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity < 1) {
            return Err(AppError::BadRequest(format!(
                "quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        if self.address.trim().is_empty() {
            return Err(AppError::BadRequest("address is required".to_string()));
        }
        if self.payment_method.trim().is_empty() {
            return Err(AppError::BadRequest(
                "payment_method is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Successful checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub message: &'static str,
    pub order_id: OrderId,
    pub payment_url: String,
}

/// Place an order as a signed-in customer.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    place_order(&state, Some(user), request).await.map(Json)
}

/// Place an order with or without an account.
///
/// Only mounted when guest checkout is enabled.
#[instrument(skip_all)]
pub async fn guest_checkout(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    place_order(&state, user, request).await.map(Json)
}

/// The caller's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Data<Vec<Order>>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(Data { data: orders }))
}

async fn place_order(
    state: &AppState,
    user: Option<AuthUser>,
    request: CheckoutRequest,
) -> Result<CheckoutResponse> {
    request.validate()?;

    let customer = match user {
        Some(user) => {
            UserRepository::new(state.pool())
                .get_by_id(user.id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("invalid token".to_string()))?
                .name
        }
        None => GUEST_CUSTOMER.to_string(),
    };

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .place(&NewOrder {
            user_id: user.map(|u| u.id),
            customer,
            address: request.address.trim().to_string(),
            payment_method: request.payment_method.trim().to_string(),
            lines: request
                .items
                .iter()
                .map(|item| (item.product_id, item.quantity))
                .collect(),
        })
        .await?;

    if let Some(claimed) = request.total
        && claimed != order.total
    {
        tracing::warn!(
            order_id = %order.id,
            claimed = %claimed,
            charged = %order.total,
            "Client total differs from catalog total"
        );
    }

    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", &order_id)]));

    let gateway = state.payments();
    let invoice = gateway
        .create_invoice(&InvoiceRequest::for_order(order.id, order.total, Utc::now()))
        .await
        .inspect_err(|e| {
            tracing::warn!(
                order_id = %order.id,
                gateway = gateway.name(),
                error = %e,
                "Invoice creation failed, order left pending"
            );
        })?;

    orders
        .set_payment(order.id, &invoice.id, &invoice.invoice_url)
        .await?;

    tracing::info!(
        order_id = %order.id,
        total = %order.total,
        items = order.items.len(),
        "Order created"
    );

    Ok(CheckoutResponse {
        message: "order created",
        order_id: order.id,
        payment_url: invoice.invoice_url,
    })
}
