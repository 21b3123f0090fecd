//! API route definitions.

use axum::{Json, Router, http::StatusCode, middleware, response::{IntoResponse, Response}};
use serde_json::json;

use crate::{AppState, middleware::auth::auth_middleware};
use invoya_shared::AppError;

pub mod analytics;
pub mod auth;
pub mod clients;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod webhooks;

/// Creates the API router with all routes.
///
/// Health, auth, and webhook routes are public; everything else sits behind
/// the JWT middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(clients::routes())
        .merge(invoices::routes())
        .merge(payments::routes())
        .merge(analytics::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(webhooks::routes())
        .merge(protected_routes)
}

/// Renders an `AppError` as the standard JSON error envelope.
pub(crate) fn error_response(err: &AppError) -> Response {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "error": err.error_code(), "message": err.message() })),
    )
        .into_response()
}
