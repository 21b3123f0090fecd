//! Webhook event repository for replay deduplication.
//!
//! Providers redeliver events until acknowledged, so every event is recorded
//! under its `(provider, event_id)` pair before any state changes. A replay
//! trips the unique constraint and is skipped.

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set, SqlErr};
use uuid::Uuid;

use crate::entities::webhook_events;

/// External systems that deliver webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookProvider {
    /// Payment provider events (checkout, payment intents).
    Stripe,
    /// Email provider events (delivery feedback).
    Resend,
}

impl WebhookProvider {
    /// Returns the lowercase string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Resend => "resend",
        }
    }

    /// Resolves a URL path segment to a provider.
    #[must_use]
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "stripe" => Some(Self::Stripe),
            "resend" => Some(Self::Resend),
            _ => None,
        }
    }
}

impl std::fmt::Display for WebhookProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Webhook event repository.
#[derive(Debug, Clone)]
pub struct WebhookEventRepository {
    db: DatabaseConnection,
}

impl WebhookEventRepository {
    /// Creates a new webhook event repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an event if it has not been seen before.
    ///
    /// Returns `true` when the event is new and should be processed, `false`
    /// when this `(provider, event_id)` pair was already recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails for any reason other
    /// than the dedup constraint.
    pub async fn record_if_new(
        &self,
        provider: WebhookProvider,
        event_id: &str,
        event_type: &str,
    ) -> Result<bool, DbErr> {
        let event = webhook_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            provider: Set(provider.as_str().to_string()),
            event_id: Set(event_id.to_string()),
            event_type: Set(event_type.to_string()),
            received_at: Set(chrono::Utc::now().into()),
        };

        match event.insert(&self.db).await {
            Ok(_) => Ok(true),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_path_segments() {
        assert_eq!(
            WebhookProvider::from_path("stripe"),
            Some(WebhookProvider::Stripe)
        );
        assert_eq!(
            WebhookProvider::from_path("resend"),
            Some(WebhookProvider::Resend)
        );
        assert_eq!(WebhookProvider::from_path("paypal"), None);
    }

    #[test]
    fn test_provider_display_matches_storage_form() {
        assert_eq!(WebhookProvider::Stripe.to_string(), "stripe");
        assert_eq!(WebhookProvider::Resend.to_string(), "resend");
    }
}
