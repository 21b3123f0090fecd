//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation (e.g., invoice already paid).
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., duplicate invoice number).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External provider error (payment or email provider).
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    ///
    /// Cross-owner lookups surface as `NotFound`; the API never answers 403
    /// for a resource that merely belongs to someone else.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::BusinessRule(_) => 400,
            Self::Conflict(_) => 409,
            Self::ExternalService(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::BusinessRule(_) => "business_rule_violation",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "database_error",
            Self::ExternalService(_) => "external_service_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the human-readable message without the `Display` prefix,
    /// which is what goes into the JSON error envelope.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(msg)
            | Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::BusinessRule(msg)
            | Self::Conflict(msg)
            | Self::Database(msg)
            | Self::ExternalService(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unauthorized(AppError::Unauthorized(String::new()), 401, "unauthorized")]
    #[case::not_found(AppError::NotFound(String::new()), 404, "not_found")]
    #[case::validation(AppError::Validation(String::new()), 400, "validation_error")]
    #[case::business_rule(AppError::BusinessRule(String::new()), 400, "business_rule_violation")]
    #[case::conflict(AppError::Conflict(String::new()), 409, "conflict")]
    #[case::database(AppError::Database(String::new()), 500, "database_error")]
    #[case::external(AppError::ExternalService(String::new()), 502, "external_service_error")]
    #[case::internal(AppError::Internal(String::new()), 500, "internal_error")]
    fn test_envelope_mapping(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_message_strips_display_prefix() {
        let err = AppError::NotFound("Invoice not found".into());
        assert_eq!(err.message(), "Invoice not found");
        assert_eq!(err.to_string(), "Not found: Invoice not found");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Unauthorized("msg".into()).to_string(),
            "Authentication failed: msg"
        );
        assert_eq!(
            AppError::NotFound("msg".into()).to_string(),
            "Not found: msg"
        );
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::BusinessRule("msg".into()).to_string(),
            "Business rule violation: msg"
        );
        assert_eq!(
            AppError::Conflict("msg".into()).to_string(),
            "Conflict: msg"
        );
        assert_eq!(
            AppError::ExternalService("msg".into()).to_string(),
            "External service error: msg"
        );
    }
}
