//! Webhook event payloads.
//!
//! Only the fields the reconciler acts on are modeled; everything else in
//! the provider payload is ignored. Unknown event types parse successfully
//! and map to `Other` so the API can acknowledge them without effect.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Payment provider event kinds the reconciler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    /// A hosted checkout session completed successfully.
    CheckoutCompleted,
    /// A payment intent settled.
    PaymentSucceeded,
    /// A payment intent failed after the fact.
    PaymentFailed,
    /// Any event type the reconciler ignores.
    Other(String),
}

impl From<&str> for PaymentEventKind {
    fn from(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => Self::CheckoutCompleted,
            "payment_intent.succeeded" => Self::PaymentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentFailed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A payment provider webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
    /// Provider event ID, used for replay deduplication.
    pub id: String,
    /// Raw event type string.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Unix timestamp the event was created at.
    pub created: i64,
    /// Event payload.
    pub data: PaymentEventData,
}

/// Payload wrapper around the event's subject object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEventData {
    /// The checkout session or payment intent the event describes.
    pub object: PaymentObject,
}

/// The session or intent carried by a payment event.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentObject {
    /// Provider object ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Metadata set when the checkout session was created.
    #[serde(default)]
    pub metadata: PaymentMetadata,
}

/// Metadata Invoya attaches to checkout sessions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentMetadata {
    /// The invoice the payment settles.
    #[serde(default)]
    pub invoice_id: Option<Uuid>,
    /// The invoice owner.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

impl PaymentEvent {
    /// Returns the event kind.
    #[must_use]
    pub fn kind(&self) -> PaymentEventKind {
        PaymentEventKind::from(self.event_type.as_str())
    }

    /// Returns the invoice referenced by the event metadata, if any.
    #[must_use]
    pub const fn invoice_id(&self) -> Option<Uuid> {
        self.data.object.metadata.invoice_id
    }

    /// Returns the event creation time.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created, 0).unwrap_or_else(Utc::now)
    }
}

/// Email provider event kinds the reconciler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailEventKind {
    /// The message reached the recipient's mailbox.
    Delivered,
    /// The message bounced.
    Bounced,
    /// The provider gave up on delivery.
    Failed,
    /// Any event type the reconciler ignores.
    Other(String),
}

impl From<&str> for EmailEventKind {
    fn from(event_type: &str) -> Self {
        match event_type {
            "email.delivered" => Self::Delivered,
            "email.bounced" => Self::Bounced,
            "email.failed" | "email.delivery_failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// An email provider webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailEvent {
    /// Raw event type string.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: EmailEventData,
}

/// Payload of an email event.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailEventData {
    /// Correlation ID minted when the email was sent.
    pub email_id: String,
}

impl EmailEvent {
    /// Returns the event kind.
    #[must_use]
    pub fn kind(&self) -> EmailEventKind {
        EmailEventKind::from(self.event_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checkout_completed() {
        let raw = r#"{
            "id": "evt_1Nv8xQ2eZvKYlo2C",
            "type": "checkout.session.completed",
            "created": 1756100000,
            "data": {
                "object": {
                    "id": "cs_test_a1b2c3",
                    "amount_total": 14300,
                    "metadata": {
                        "invoice_id": "7f4df0fa-4f86-47c6-a111-57c342c109fb",
                        "user_id": "1c1f4a90-9e01-4f3b-bb4f-0e9a4f3c2d10"
                    }
                }
            }
        }"#;

        let event: PaymentEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind(), PaymentEventKind::CheckoutCompleted);
        assert_eq!(
            event.invoice_id(),
            Some("7f4df0fa-4f86-47c6-a111-57c342c109fb".parse().unwrap())
        );
        assert_eq!(event.occurred_at().timestamp(), 1_756_100_000);
    }

    #[test]
    fn test_parse_payment_failed_without_metadata() {
        let raw = r#"{
            "id": "evt_2",
            "type": "payment_intent.payment_failed",
            "created": 1756100500,
            "data": { "object": { "id": "pi_3" } }
        }"#;

        let event: PaymentEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind(), PaymentEventKind::PaymentFailed);
        assert_eq!(event.invoice_id(), None);
    }

    #[test]
    fn test_unknown_payment_event_maps_to_other() {
        let raw = r#"{
            "id": "evt_3",
            "type": "customer.created",
            "created": 1756100000,
            "data": { "object": {} }
        }"#;

        let event: PaymentEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event.kind(),
            PaymentEventKind::Other("customer.created".to_string())
        );
    }

    #[test]
    fn test_parse_email_delivered() {
        let raw = r#"{
            "type": "email.delivered",
            "created_at": "2026-08-25T12:00:00.000Z",
            "data": { "email_id": "a2b01146-e3c6-40a2-a0cf-e79f1cd09e11" }
        }"#;

        let event: EmailEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind(), EmailEventKind::Delivered);
        assert_eq!(event.data.email_id, "a2b01146-e3c6-40a2-a0cf-e79f1cd09e11");
    }

    #[test]
    fn test_email_bounce_kinds() {
        assert_eq!(EmailEventKind::from("email.bounced"), EmailEventKind::Bounced);
        assert_eq!(EmailEventKind::from("email.failed"), EmailEventKind::Failed);
        assert_eq!(
            EmailEventKind::from("email.delivery_failed"),
            EmailEventKind::Failed
        );
        assert_eq!(
            EmailEventKind::from("email.opened"),
            EmailEventKind::Other("email.opened".to_string())
        );
    }
}
