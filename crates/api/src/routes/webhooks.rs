//! Signature-verified webhook endpoints for payment and email providers.
//!
//! Nothing in a webhook request is trusted until its signature checks out
//! against the per-provider secret; only then is the body parsed and acted
//! on. Payment events pass through a dedup ledger so provider redeliveries
//! are acknowledged without effect. Every accepted event is answered with
//! `{"received": true}` even when it references unknown records, because a
//! non-2xx answer would only make the provider retry a delivery that will
//! never apply.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{AppState, routes::error_response};
use invoya_core::webhook::{
    EmailEvent, EmailEventKind, PaymentEvent, PaymentEventKind, verify_signature,
};
use invoya_db::repositories::email_log::{DeliveryStatus, EmailLogRepository};
use invoya_db::repositories::invoice::{InvoiceError, InvoiceRepository};
use invoya_db::repositories::webhook_event::{WebhookEventRepository, WebhookProvider};
use invoya_shared::AppError;

/// Header carrying the payment provider's signature.
const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Header carrying the email provider's signature.
const RESEND_SIGNATURE_HEADER: &str = "resend-signature";

/// Creates the webhook routes (no auth; requests authenticate by signature).
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/{provider}", post(handle_webhook))
}

/// POST /webhooks/{provider} - Receive a provider webhook.
async fn handle_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    match WebhookProvider::from_path(&provider) {
        Some(WebhookProvider::Stripe) => handle_payment_event(&state, &headers, &body).await,
        Some(WebhookProvider::Resend) => handle_email_event(&state, &headers, &body).await,
        None => error_response(&AppError::NotFound("Unknown webhook provider".to_string())),
    }
}

async fn handle_payment_event(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Response {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = verify_signature(
        signature,
        body,
        &state.config.payments.webhook_secret,
        Utc::now().timestamp(),
    ) {
        warn!(error = %e, "Rejected payment webhook");
        return invalid_signature();
    }

    let event: PaymentEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Unparseable payment webhook body");
            return invalid_payload();
        }
    };

    // Record before acting so a redelivery of this event becomes a no-op
    // even if processing below fails halfway.
    let ledger = WebhookEventRepository::new((*state.db).clone());
    match ledger
        .record_if_new(WebhookProvider::Stripe, &event.id, &event.event_type)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            info!(event_id = %event.id, "Replayed webhook event ignored");
            return ack();
        }
        Err(e) => {
            error!(error = %e, event_id = %event.id, "Failed to record webhook event");
            return error_response(&AppError::Database("An error occurred".to_string()));
        }
    }

    match event.kind() {
        PaymentEventKind::CheckoutCompleted | PaymentEventKind::PaymentSucceeded => {
            apply_payment_success(state, &event).await
        }
        PaymentEventKind::PaymentFailed => apply_payment_failure(state, &event).await,
        PaymentEventKind::Other(event_type) => {
            info!(event_type = %event_type, "Ignoring payment event");
            ack()
        }
    }
}

async fn apply_payment_success(state: &AppState, event: &PaymentEvent) -> Response {
    let (Some(invoice_id), Some(user_id)) =
        (event.invoice_id(), event.data.object.metadata.user_id)
    else {
        warn!(event_id = %event.id, "Payment event carries no invoice metadata");
        return ack();
    };

    let invoice_repo = InvoiceRepository::new((*state.db).clone());
    match invoice_repo
        .mark_paid(user_id, invoice_id, event.occurred_at())
        .await
    {
        Ok(Some(invoice)) => {
            info!(
                invoice_id = %invoice_id,
                invoice_number = %invoice.invoice_number,
                "Invoice marked paid"
            );
            ack()
        }
        Ok(None) => {
            info!(invoice_id = %invoice_id, "Invoice already paid");
            ack()
        }
        Err(InvoiceError::NotFound(_)) => {
            warn!(invoice_id = %invoice_id, "Payment event for unknown invoice");
            ack()
        }
        Err(e) => {
            error!(error = %e, invoice_id = %invoice_id, "Failed to apply payment");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}

async fn apply_payment_failure(state: &AppState, event: &PaymentEvent) -> Response {
    let (Some(invoice_id), Some(user_id)) =
        (event.invoice_id(), event.data.object.metadata.user_id)
    else {
        warn!(event_id = %event.id, "Payment event carries no invoice metadata");
        return ack();
    };

    let invoice_repo = InvoiceRepository::new((*state.db).clone());
    match invoice_repo.mark_payment_failed(user_id, invoice_id).await {
        Ok(Some(invoice)) => {
            info!(
                invoice_id = %invoice_id,
                invoice_number = %invoice.invoice_number,
                "Invoice reverted to outstanding after failed payment"
            );
            ack()
        }
        Ok(None) => {
            info!(invoice_id = %invoice_id, "Payment failure for unpaid invoice ignored");
            ack()
        }
        Err(InvoiceError::NotFound(_)) => {
            warn!(invoice_id = %invoice_id, "Payment event for unknown invoice");
            ack()
        }
        Err(e) => {
            error!(error = %e, invoice_id = %invoice_id, "Failed to apply payment failure");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}

async fn handle_email_event(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Response {
    let signature = headers
        .get(RESEND_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = verify_signature(
        signature,
        body,
        &state.config.email.webhook_secret,
        Utc::now().timestamp(),
    ) {
        warn!(error = %e, "Rejected email webhook");
        return invalid_signature();
    }

    let event: EmailEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Unparseable email webhook body");
            return invalid_payload();
        }
    };

    // Email events carry no provider event ID, so they skip the dedup
    // ledger; the status write is idempotent anyway.
    let status = match event.kind() {
        EmailEventKind::Delivered => DeliveryStatus::Delivered,
        EmailEventKind::Bounced | EmailEventKind::Failed => DeliveryStatus::Failed,
        EmailEventKind::Other(event_type) => {
            info!(event_type = %event_type, "Ignoring email event");
            return ack();
        }
    };

    let email_repo = EmailLogRepository::new((*state.db).clone());
    match email_repo
        .mark_by_message_id(&event.data.email_id, status)
        .await
    {
        Ok(Some(log)) => {
            info!(
                message_id = %log.message_id,
                status = status.as_str(),
                "Email delivery status updated"
            );
            ack()
        }
        Ok(None) => {
            info!(message_id = %event.data.email_id, "Delivery event for unknown message");
            ack()
        }
        Err(e) => {
            error!(error = %e, message_id = %event.data.email_id, "Failed to update delivery status");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}

fn ack() -> Response {
    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

fn invalid_signature() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_signature",
            "message": "Webhook signature verification failed"
        })),
    )
        .into_response()
}

fn invalid_payload() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_payload",
            "message": "Malformed webhook payload"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::{Router, body::Body, http::Request};
    use http_body_util::BodyExt;
    use invoya_core::webhook::sign_payload;
    use invoya_shared::AppConfig;
    use rstest::rstest;
    use tower::ServiceExt;

    use crate::test_support::test_state_with_config;

    const PAYMENT_SECRET: &str = "whsec_pay_test";
    const EMAIL_SECRET: &str = "whsec_email_test";

    fn app() -> Router {
        let mut config = AppConfig::default();
        config.payments.webhook_secret = PAYMENT_SECRET.to_string();
        config.email.webhook_secret = EMAIL_SECRET.to_string();
        let state = test_state_with_config(config);
        Router::new().merge(routes()).with_state(state)
    }

    fn signature_header(secret: &str, timestamp: i64, body: &str) -> String {
        format!(
            "t={timestamp},v1={}",
            sign_payload(secret, timestamp, body.as_bytes())
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/paypal")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "not_found");
    }

    #[rstest]
    #[case::stripe("stripe")]
    #[case::resend("resend")]
    #[tokio::test]
    async fn missing_signature_is_rejected(#[case] provider: &str) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/webhooks/{provider}"))
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_signature");
    }

    #[rstest]
    #[case::stale(Utc::now().timestamp() - 3600, PAYMENT_SECRET)]
    #[case::wrong_secret(Utc::now().timestamp(), "some-other-secret")]
    #[tokio::test]
    async fn bad_signatures_are_rejected(#[case] timestamp: i64, #[case] secret: &str) {
        let body = r#"{"id": "evt_1", "type": "payment_intent.succeeded", "created": 0, "data": {"object": {}}}"#;

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/stripe")
                    .header("stripe-signature", signature_header(secret, timestamp, body))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_signature");
    }

    #[tokio::test]
    async fn garbage_body_with_valid_signature_is_rejected() {
        let body = "not json at all";
        let timestamp = Utc::now().timestamp();

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/stripe")
                    .header(
                        "stripe-signature",
                        signature_header(PAYMENT_SECRET, timestamp, body),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_payload");
    }

    #[tokio::test]
    async fn signing_across_providers_does_not_transfer() {
        // A valid email-provider signature must not authorize a payment
        // webhook, and the payment secret never verifies email deliveries.
        let body = r#"{"type": "email.delivered", "data": {"email_id": "msg-1"}}"#;
        let timestamp = Utc::now().timestamp();

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/resend")
                    .header(
                        "resend-signature",
                        signature_header(PAYMENT_SECRET, timestamp, body),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_signature");
    }

    #[tokio::test]
    async fn unhandled_email_event_is_acknowledged() {
        // email.opened is not acted on, so it never touches the database
        // and can be acknowledged end to end.
        let body = r#"{"type": "email.opened", "data": {"email_id": "msg-1"}}"#;
        let timestamp = Utc::now().timestamp();

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/resend")
                    .header(
                        "resend-signature",
                        signature_header(EMAIL_SECRET, timestamp, body),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["received"], true);
    }
}
