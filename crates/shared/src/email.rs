//! Email service for sending invoice and reminder emails.
//!
//! Uses `lettre` for SMTP transport. Every outgoing message is assigned a
//! correlation ID (its Message-ID) so that delivery-status webhooks can be
//! matched back to the email log entry written at send time.

use chrono::NaiveDate;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Details of an invoice rendered into an outgoing email.
#[derive(Debug, Clone)]
pub struct InvoiceEmail<'a> {
    /// Recipient address.
    pub to_email: &'a str,
    /// Recipient display name.
    pub client_name: &'a str,
    /// Human-readable invoice number.
    pub invoice_number: &'a str,
    /// Invoice total.
    pub total: Decimal,
    /// Invoice due date.
    pub due_date: NaiveDate,
    /// Name shown as the sender.
    pub sender_name: &'a str,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();
        Ok(transport)
    }

    /// Sends an invoice email and returns the minted correlation ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or handed to the relay.
    pub async fn send_invoice_email(&self, email: &InvoiceEmail<'_>) -> Result<String, EmailError> {
        let (subject, html) = invoice_email_body(email);
        self.send_html(email.to_email, &subject, &html).await
    }

    /// Sends a payment reminder email and returns the minted correlation ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or handed to the relay.
    pub async fn send_reminder_email(
        &self,
        email: &InvoiceEmail<'_>,
    ) -> Result<String, EmailError> {
        let (subject, html) = reminder_email_body(email);
        self.send_html(email.to_email, &subject, &html).await
    }

    async fn send_html(
        &self,
        to_email: &str,
        subject: &str,
        html: &str,
    ) -> Result<String, EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let correlation_id = Uuid::new_v4().to_string();

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .message_id(Some(format!("<{correlation_id}@invoya.mail>")))
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(correlation_id)
    }
}

/// Builds the subject and HTML body for an invoice email.
#[must_use]
pub fn invoice_email_body(email: &InvoiceEmail<'_>) -> (String, String) {
    let subject = format!(
        "Invoice {} from {}",
        email.invoice_number, email.sender_name
    );
    let html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Invoice {number}</h2>
  <p>Hi {client},</p>
  <p>{sender} has sent you an invoice for <strong>${total:.2}</strong>, due on {due}.</p>
  <p>Please find the details below and arrange payment by the due date.</p>
  <p>Thank you for your business!</p>
</div>"#,
        number = email.invoice_number,
        client = email.client_name,
        sender = email.sender_name,
        total = email.total,
        due = email.due_date.format("%B %-d, %Y"),
    );
    (subject, html)
}

/// Builds the subject and HTML body for a payment reminder email.
#[must_use]
pub fn reminder_email_body(email: &InvoiceEmail<'_>) -> (String, String) {
    let subject = format!("Payment Reminder: Invoice {}", email.invoice_number);
    let html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Payment Reminder</h2>
  <p>Hi {client},</p>
  <p>This is a friendly reminder that invoice <strong>{number}</strong> for
  <strong>${total:.2}</strong> was due on {due}.</p>
  <p>If you have already made this payment, please disregard this notice.</p>
  <p>Thank you,<br/>{sender}</p>
</div>"#,
        client = email.client_name,
        number = email.invoice_number,
        total = email.total,
        due = email.due_date.format("%B %-d, %Y"),
    );
    (subject, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_email() -> InvoiceEmail<'static> {
        InvoiceEmail {
            to_email: "client@example.com",
            client_name: "Acme Corp",
            invoice_number: "INV-20260003",
            total: dec!(143.00),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            sender_name: "Jordan Freelance",
        }
    }

    #[test]
    fn test_invoice_email_body() {
        let (subject, html) = invoice_email_body(&sample_email());
        assert_eq!(subject, "Invoice INV-20260003 from Jordan Freelance");
        assert!(html.contains("$143.00"));
        assert!(html.contains("Acme Corp"));
        assert!(html.contains("September 15, 2026"));
    }

    #[test]
    fn test_reminder_email_body() {
        let (subject, html) = reminder_email_body(&sample_email());
        assert_eq!(subject, "Payment Reminder: Invoice INV-20260003");
        assert!(html.contains("was due on"));
        assert!(html.contains("$143.00"));
    }
}
