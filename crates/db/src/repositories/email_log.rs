//! Email log repository for delivery tracking.
//!
//! Every outgoing email gets one log row keyed by the correlation message ID
//! minted at send time. Provider webhooks later flip the row's status from
//! `sent` to `delivered` or `failed` by looking up that message ID.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::email_logs;

/// What kind of email was sent for an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    /// Initial invoice delivery.
    Invoice,
    /// Payment reminder for an outstanding invoice.
    Reminder,
}

impl EmailKind {
    /// Returns the lowercase string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Reminder => "reminder",
        }
    }
}

/// Delivery status of a logged email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Handed to the SMTP relay; no provider feedback yet.
    Sent,
    /// Provider confirmed delivery to the recipient.
    Delivered,
    /// Provider reported a bounce or gave up on delivery.
    Failed,
}

impl DeliveryStatus {
    /// Returns the lowercase string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }
}

/// Input for recording a sent email.
#[derive(Debug, Clone)]
pub struct RecordEmailInput {
    /// Invoice the email was about.
    pub invoice_id: Uuid,
    /// Owning user ID.
    pub user_id: Uuid,
    /// Recipient address.
    pub recipient: String,
    /// Invoice or reminder.
    pub kind: EmailKind,
    /// Correlation ID minted at send time.
    pub message_id: String,
}

/// Email log repository.
#[derive(Debug, Clone)]
pub struct EmailLogRepository {
    db: DatabaseConnection,
}

impl EmailLogRepository {
    /// Creates a new email log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a freshly sent email with status `sent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record(&self, input: RecordEmailInput) -> Result<email_logs::Model, DbErr> {
        let log = email_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(input.invoice_id),
            user_id: Set(input.user_id),
            recipient: Set(input.recipient),
            email_type: Set(input.kind.as_str().to_string()),
            status: Set(DeliveryStatus::Sent.as_str().to_string()),
            message_id: Set(input.message_id),
            sent_at: Set(chrono::Utc::now().into()),
        };

        log.insert(&self.db).await
    }

    /// Lists an invoice's email history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_invoice(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<email_logs::Model>, DbErr> {
        email_logs::Entity::find()
            .filter(email_logs::Column::UserId.eq(user_id))
            .filter(email_logs::Column::InvoiceId.eq(invoice_id))
            .order_by_desc(email_logs::Column::SentAt)
            .all(&self.db)
            .await
    }

    /// Applies a provider-reported delivery status by correlation message ID.
    ///
    /// Returns the updated row, or `None` when no email with that message ID
    /// was ever recorded (stale or foreign webhook data).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query or update fails.
    pub async fn mark_by_message_id(
        &self,
        message_id: &str,
        status: DeliveryStatus,
    ) -> Result<Option<email_logs::Model>, DbErr> {
        let log = email_logs::Entity::find()
            .filter(email_logs::Column::MessageId.eq(message_id))
            .one(&self.db)
            .await?;

        let Some(log) = log else {
            return Ok(None);
        };

        let mut active: email_logs::ActiveModel = log.into();
        active.status = Set(status.as_str().to_string());
        Ok(Some(active.update(&self.db).await?))
    }
}
