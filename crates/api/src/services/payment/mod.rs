//! Payment gateway abstraction.
//!
//! Checkout creates a hosted invoice with the gateway and hands the buyer
//! its URL. The gateway sits behind [`PaymentGateway`] so the API can be run
//! and tested without reaching the real service.

mod xendit;

pub use xendit::XenditClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use goshop_core::{Money, OrderId};

/// Errors that can occur when talking to a payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The gateway answered with a body we could not read.
    #[error("failed to parse gateway response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What to bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    pub order_id: OrderId,
    /// Unique per attempt: `ORDER-{id}-{unix seconds}`.
    pub external_id: String,
    pub amount: Money,
}

impl InvoiceRequest {
    #[must_use]
    pub fn for_order(order_id: OrderId, amount: Money, now: DateTime<Utc>) -> Self {
        Self {
            order_id,
            external_id: format!("ORDER-{order_id}-{}", now.timestamp()),
            amount,
        }
    }

    /// Text shown to the buyer on the hosted invoice page.
    #[must_use]
    pub fn description(&self) -> String {
        format!("GoShop payment #{}", self.external_id)
    }
}

/// A created invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    /// Gateway-side invoice id.
    pub id: String,
    /// Hosted payment page for the buyer.
    pub invoice_url: String,
}

/// A service that can bill an order.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted invoice for `request`.
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, PaymentError>;

    /// Gateway name for logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_external_id_format() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let request =
            InvoiceRequest::for_order(OrderId::new(17), "50000".parse().unwrap(), now);

        assert_eq!(request.external_id, format!("ORDER-17-{}", now.timestamp()));
        assert_eq!(
            request.description(),
            format!("GoShop payment #ORDER-17-{}", now.timestamp())
        );
    }
}
