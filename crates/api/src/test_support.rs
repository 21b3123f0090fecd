//! Helpers shared by the route test modules.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::AppState;
use invoya_shared::{AppConfig, EmailService, JwtService, PaymentsClient};

/// Builds an `AppState` around a disconnected database handle.
///
/// Handler paths that never reach the database (validation, auth,
/// signature checks) can be exercised without any infrastructure;
/// paths that do touch it fail with a connection error.
pub(crate) fn test_state() -> AppState {
    test_state_with_config(AppConfig::default())
}

pub(crate) fn test_state_with_config(config: AppConfig) -> AppState {
    let expiry = i64::try_from(config.jwt.access_token_expiry_secs).unwrap_or(i64::MAX);
    AppState {
        db: Arc::new(DatabaseConnection::default()),
        jwt_service: Arc::new(JwtService::new(&config.jwt.secret, expiry)),
        email_service: Arc::new(EmailService::new(config.email.clone())),
        payments: Arc::new(PaymentsClient::new(config.payments.clone())),
        config: Arc::new(config),
    }
}
