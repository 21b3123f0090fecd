//! Payment provider client for hosted checkout sessions.
//!
//! Talks to the provider's REST API directly over `reqwest` (form-encoded
//! requests, JSON responses) rather than through an SDK.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PaymentsConfig;

/// Payment provider errors.
#[derive(Debug, Error)]
pub enum PaymentsError {
    /// The HTTP request could not be sent.
    #[error("payment provider request failed: {0}")]
    Request(String),
    /// The provider answered with an error status.
    #[error("payment provider returned {status}: {message}")]
    Provider {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider error message, when one was given.
        message: String,
    },
    /// The provider response could not be parsed.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

/// A hosted checkout session created with the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Provider session ID.
    pub id: String,
    /// Hosted checkout page URL the customer is redirected to.
    pub url: String,
}

/// Parameters for creating a checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutParams<'a> {
    /// Invoice being paid, carried in session metadata for reconciliation.
    pub invoice_id: Uuid,
    /// Invoice owner, carried in session metadata.
    pub user_id: Uuid,
    /// Human-readable invoice number shown on the checkout page.
    pub invoice_number: &'a str,
    /// Amount in minor units (cents).
    pub amount_minor: i64,
    /// Redirect target after successful payment.
    pub success_url: &'a str,
    /// Redirect target after cancelled payment.
    pub cancel_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: Option<String>,
}

/// Client for the payment provider's checkout API.
#[derive(Debug, Clone)]
pub struct PaymentsClient {
    http: reqwest::Client,
    config: PaymentsConfig,
}

impl PaymentsClient {
    /// Creates a new payments client.
    #[must_use]
    pub fn new(config: PaymentsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Creates a hosted checkout session for an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the provider rejects it, or
    /// the response cannot be parsed.
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutParams<'_>,
    ) -> Result<CheckoutSession, PaymentsError> {
        let product_name = format!("Invoice {}", params.invoice_number);
        let amount = params.amount_minor.to_string();
        let invoice_id = params.invoice_id.to_string();
        let user_id = params.user_id.to_string();

        let form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price_data][currency]", "usd"),
            ("line_items[0][price_data][product_data][name]", &product_name),
            ("line_items[0][price_data][unit_amount]", &amount),
            ("line_items[0][quantity]", "1"),
            ("success_url", params.success_url),
            ("cancel_url", params.cancel_url),
            ("metadata[invoice_id]", &invoice_id),
            ("metadata[user_id]", &user_id),
        ];

        let url = format!("{}/v1/checkout/sessions", self.config.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(PaymentsError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| PaymentsError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_session_parses_provider_response() {
        let raw = r#"{
            "id": "cs_test_a1b2c3",
            "object": "checkout.session",
            "url": "https://checkout.example.com/c/pay/cs_test_a1b2c3",
            "amount_total": 14300
        }"#;
        let session: CheckoutSession = serde_json::from_str(raw).unwrap();
        assert_eq!(session.id, "cs_test_a1b2c3");
        assert!(session.url.starts_with("https://checkout.example.com"));
    }
}
