//! Payment routes for creating hosted checkout sessions.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use invoya_core::invoice::{InvoiceStatus, total_minor_units};
use invoya_db::repositories::invoice::{InvoiceError, InvoiceRepository};
use invoya_shared::AppError;
use invoya_shared::payments::CheckoutParams;

/// Creates the payment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/payments/create-checkout", post(create_checkout))
}

/// Request body for creating a checkout session.
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Invoice to collect payment for.
    pub invoice_id: Uuid,
}

/// POST /payments/create-checkout - Create a hosted checkout session.
async fn create_checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCheckoutRequest>,
) -> impl IntoResponse {
    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    let detail = match invoice_repo.find(auth.user_id(), payload.invoice_id).await {
        Ok(detail) => detail,
        Err(InvoiceError::NotFound(_)) => {
            return error_response(&AppError::NotFound("Invoice not found".to_string()));
        }
        Err(e) => {
            error!(error = %e, "Failed to load invoice for checkout");
            return error_response(&AppError::Database("An error occurred".to_string()));
        }
    };

    let status = match detail.invoice.status.parse::<InvoiceStatus>() {
        Ok(status) => status,
        Err(e) => {
            error!(error = %e, invoice_id = %payload.invoice_id, "Stored invoice status is invalid");
            return error_response(&AppError::Internal("An error occurred".to_string()));
        }
    };

    if status == InvoiceStatus::Paid {
        return error_response(&AppError::BusinessRule(
            "Invoice is already paid".to_string(),
        ));
    }

    let Some(amount_minor) = total_minor_units(detail.invoice.total) else {
        error!(invoice_id = %payload.invoice_id, total = %detail.invoice.total, "Invoice total cannot be charged");
        return error_response(&AppError::Internal("An error occurred".to_string()));
    };

    let success_url = format!(
        "{}/invoices/{}?payment=success",
        state.config.frontend_url, payload.invoice_id
    );
    let cancel_url = format!(
        "{}/invoices/{}?payment=cancelled",
        state.config.frontend_url, payload.invoice_id
    );

    let params = CheckoutParams {
        invoice_id: payload.invoice_id,
        user_id: auth.user_id(),
        invoice_number: &detail.invoice.invoice_number,
        amount_minor,
        success_url: &success_url,
        cancel_url: &cancel_url,
    };

    match state.payments.create_checkout_session(&params).await {
        Ok(session) => {
            info!(
                user_id = %auth.user_id(),
                invoice_id = %payload.invoice_id,
                session_id = %session.id,
                "Checkout session created"
            );
            (
                StatusCode::OK,
                Json(json!({ "session_id": session.id, "url": session.url })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, invoice_id = %payload.invoice_id, "Failed to create checkout session");
            error_response(&AppError::ExternalService(
                "Failed to create checkout session".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware::from_fn_with_state};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::middleware::auth_middleware;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn create_checkout_requires_auth() {
        let state = test_state();
        let app = Router::new()
            .merge(routes())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/payments/create-checkout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "missing_token");
    }
}
