//! Authentication routes for registration and login.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::{error, info};
use validator::Validate;

use crate::{AppState, routes::error_response};
use invoya_core::auth::{hash_password, verify_password};
use invoya_db::UserRepository;
use invoya_shared::AppError;
use invoya_shared::auth::{AuthResponse, LoginRequest, RegisterRequest, UserInfo};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// POST /auth/register - Create an account and return a token.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return error_response(&AppError::Validation(e.to_string()));
    }

    // Emails are stored lowercase so lookups are case-insensitive
    let email = payload.email.trim().to_lowercase();
    let user_repo = UserRepository::new((*state.db).clone());

    // Check if email already exists
    match user_repo.email_exists(&email).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "email_exists",
                    "message": "An account with this email already exists"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Database error checking email");
            return error_response(&AppError::Database(
                "An error occurred during registration".to_string(),
            ));
        }
    }

    // Hash password
    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return error_response(&AppError::Internal(
                "An error occurred during registration".to_string(),
            ));
        }
    };

    // Create user
    let user = match user_repo
        .create(&email, &password_hash, payload.name.trim())
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return error_response(&AppError::Database(
                "An error occurred during registration".to_string(),
            ));
        }
    };

    // Issue a token right away so registration doubles as first login
    let access_token = match state.jwt_service.generate_access_token(user.id, &user.email) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return error_response(&AppError::Internal(
                "An error occurred during registration".to_string(),
            ));
        }
    };

    info!(user_id = %user.id, email = %user.email, "New user registered");

    let response = AuthResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            name: user.name,
        },
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

/// POST /auth/login - Authenticate a user and return a token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let email = payload.email.trim().to_lowercase();
    let user_repo = UserRepository::new((*state.db).clone());

    // Find user by email
    let user = match user_repo.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %email, "Login attempt for non-existent user");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return error_response(&AppError::Database(
                "An error occurred during login".to_string(),
            ));
        }
    };

    // Verify password
    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return error_response(&AppError::Internal(
                "An error occurred during login".to_string(),
            ));
        }
    }

    // Generate token
    let access_token = match state.jwt_service.generate_access_token(user.id, &user.email) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return error_response(&AppError::Internal(
                "An error occurred during login".to_string(),
            ));
        }
    };

    info!(user_id = %user.id, "User logged in successfully");

    let response = AuthResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            name: user.name,
        },
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::{Router, body::Body, http::{Request, header::CONTENT_TYPE}};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::test_support::test_state;

    fn app() -> Router {
        let state = test_state();
        Router::new().merge(routes()).with_state(state)
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/register")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email": "not-an-email", "password": "longenough1", "name": "Test"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/register")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email": "user@example.com", "password": "short", "name": "Test"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn login_requires_json_body() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Missing content type / body is rejected before any handler logic
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
