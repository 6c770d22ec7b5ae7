//! Xendit invoice API client.
//!
//! `POST {api_url}/v2/invoices` with HTTP basic auth (secret key as the user,
//! empty password). Only invoice creation is used.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use goshop_core::Money;

use super::{Invoice, InvoiceRequest, PaymentError, PaymentGateway};
use crate::config::XenditConfig;

/// Client for the Xendit invoice API.
pub struct XenditClient {
    client: reqwest::Client,
    endpoint: String,
    secret_key: SecretString,
    success_redirect_url: String,
    invoice_duration_secs: u64,
}

#[derive(Serialize)]
struct CreateInvoiceBody<'a> {
    external_id: &'a str,
    amount: Money,
    description: String,
    invoice_duration: u64,
    success_redirect_url: &'a str,
}

#[derive(Deserialize)]
struct CreateInvoiceResponse {
    id: String,
    invoice_url: String,
}

impl XenditClient {
    /// Create a new Xendit client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client cannot be built.
    pub fn new(config: &XenditConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v2/invoices",
                config.api_url.as_str().trim_end_matches('/')
            ),
            secret_key: config.secret_key.clone(),
            success_redirect_url: config.success_redirect_url.clone(),
            invoice_duration_secs: config.invoice_duration_secs,
        })
    }
}

#[async_trait]
impl PaymentGateway for XenditClient {
    #[instrument(skip(self, request), fields(order_id = %request.order_id, external_id = %request.external_id))]
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, PaymentError> {
        let body = CreateInvoiceBody {
            external_id: &request.external_id,
            amount: request.amount,
            description: request.description(),
            invoice_duration: self.invoice_duration_secs,
            success_redirect_url: &self.success_redirect_url,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(self.secret_key.expose_secret(), Some(""))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Xendit returned non-success status"
            );
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect(),
            });
        }

        let created: CreateInvoiceResponse = serde_json::from_str(&response_text)?;
        tracing::info!(invoice_id = %created.id, "Xendit invoice created");

        Ok(Invoice {
            id: created.id,
            invoice_url: created.invoice_url,
        })
    }

    fn name(&self) -> &'static str {
        "xendit"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use mockito::Matcher;
    use serde_json::json;
    use url::Url;

    use goshop_core::OrderId;

    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> XenditClient {
        XenditClient::new(&XenditConfig {
            secret_key: SecretString::from("xnd_development_abc123"),
            api_url: Url::parse(&server.url()).unwrap(),
            success_redirect_url: "http://localhost:5173/profile".to_string(),
            invoice_duration_secs: 86_400,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn request() -> InvoiceRequest {
        InvoiceRequest::for_order(OrderId::new(5), "60000".parse().unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn test_create_invoice_success() {
        let mut server = mockito::Server::new_async().await;
        let request = request();

        // "xnd_development_abc123:" in base64
        let mock = server
            .mock("POST", "/v2/invoices")
            .match_header(
                "authorization",
                "Basic eG5kX2RldmVsb3BtZW50X2FiYzEyMzo=",
            )
            .match_body(Matcher::PartialJson(json!({
                "external_id": request.external_id,
                "amount": 60000.0,
                "description": request.description(),
                "invoice_duration": 86400,
                "success_redirect_url": "http://localhost:5173/profile",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "inv_579c8d61",
                    "invoice_url": "https://checkout-staging.xendit.co/web/inv_579c8d61",
                    "status": "PENDING"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let invoice = client_for(&server).create_invoice(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(invoice.id, "inv_579c8d61");
        assert_eq!(
            invoice.invoice_url,
            "https://checkout-staging.xendit.co/web/inv_579c8d61"
        );
    }

    #[tokio::test]
    async fn test_create_invoice_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/invoices")
            .with_status(401)
            .with_body(r#"{"error_code":"INVALID_API_KEY"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_invoice(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_create_invoice_unreadable_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/invoices")
            .with_status(200)
            .with_body("<html>gateway maintenance</html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .create_invoice(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Parse(_)));
    }
}
