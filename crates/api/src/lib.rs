//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for clients, invoices, payments, and analytics
//! - Authentication middleware
//! - Signature-verified webhook endpoints

pub mod middleware;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

use axum::Router;
use invoya_shared::{AppConfig, EmailService, JwtService, PaymentsClient};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Email service for sending invoice emails.
    pub email_service: Arc<EmailService>,
    /// Payment provider client for checkout sessions.
    pub payments: Arc<PaymentsClient>,
    /// Application configuration (webhook secrets, frontend URL).
    pub config: Arc<AppConfig>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
