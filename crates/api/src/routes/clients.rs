//! Client management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use invoya_db::{
    entities::clients,
    repositories::client::{ClientError, ClientRepository, CreateClientInput, UpdateClientInput},
};
use invoya_shared::AppError;

/// Creates the client routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients))
        .route("/clients", post(create_client))
        .route("/clients/{client_id}", get(get_client))
        .route("/clients/{client_id}", put(update_client))
        .route("/clients/{client_id}", delete(delete_client))
}

/// Request body for creating a client.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    /// Client name.
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Client email address.
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// Company name.
    pub company: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Request body for updating a client.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientRequest {
    /// Client name.
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    /// Client email address.
    #[validate(email(message = "A valid email address is required"))]
    pub email: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Response for a client.
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    /// Client ID.
    pub id: Uuid,
    /// Client name.
    pub name: String,
    /// Client email address.
    pub email: String,
    /// Company name.
    pub company: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<clients::Model> for ClientResponse {
    fn from(model: clients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            company: model.company,
            phone: model.phone,
            address: model.address,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// GET /clients - List the caller's clients.
async fn list_clients(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let client_repo = ClientRepository::new((*state.db).clone());

    match client_repo.list(auth.user_id()).await {
        Ok(clients) => {
            let response: Vec<ClientResponse> =
                clients.into_iter().map(ClientResponse::from).collect();
            (StatusCode::OK, Json(json!({ "clients": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list clients");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}

/// POST /clients - Create a client.
async fn create_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateClientRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return error_response(&AppError::Validation(e.to_string()));
    }

    let client_repo = ClientRepository::new((*state.db).clone());

    let input = CreateClientInput {
        user_id: auth.user_id(),
        name: payload.name,
        email: payload.email,
        company: payload.company,
        phone: payload.phone,
        address: payload.address,
    };

    match client_repo.create(input).await {
        Ok(client) => {
            info!(user_id = %auth.user_id(), client_id = %client.id, "Client created");
            (StatusCode::CREATED, Json(ClientResponse::from(client))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create client");
            client_error_response(&e)
        }
    }
}

/// GET /clients/{client_id} - Get a single client.
async fn get_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> impl IntoResponse {
    let client_repo = ClientRepository::new((*state.db).clone());

    match client_repo.find(auth.user_id(), client_id).await {
        Ok(client) => (StatusCode::OK, Json(ClientResponse::from(client))).into_response(),
        Err(e @ ClientError::NotFound(_)) => client_error_response(&e),
        Err(e) => {
            error!(error = %e, "Failed to get client");
            client_error_response(&e)
        }
    }
}

/// PUT /clients/{client_id} - Update a client.
async fn update_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return error_response(&AppError::Validation(e.to_string()));
    }

    let client_repo = ClientRepository::new((*state.db).clone());

    let input = UpdateClientInput {
        name: payload.name,
        email: payload.email,
        company: payload.company.map(Some),
        phone: payload.phone.map(Some),
        address: payload.address.map(Some),
    };

    match client_repo.update(auth.user_id(), client_id, input).await {
        Ok(client) => {
            info!(user_id = %auth.user_id(), client_id = %client.id, "Client updated");
            (StatusCode::OK, Json(ClientResponse::from(client))).into_response()
        }
        Err(e @ ClientError::NotFound(_)) => client_error_response(&e),
        Err(e) => {
            error!(error = %e, "Failed to update client");
            client_error_response(&e)
        }
    }
}

/// DELETE /clients/{client_id} - Delete a client without invoices.
async fn delete_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> impl IntoResponse {
    let client_repo = ClientRepository::new((*state.db).clone());

    match client_repo.delete(auth.user_id(), client_id).await {
        Ok(()) => {
            info!(user_id = %auth.user_id(), client_id = %client_id, "Client deleted");
            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Err(e @ (ClientError::NotFound(_) | ClientError::HasInvoices(_))) => {
            client_error_response(&e)
        }
        Err(e) => {
            error!(error = %e, "Failed to delete client");
            client_error_response(&e)
        }
    }
}

/// Maps repository errors onto the JSON error envelope.
fn client_error_response(err: &ClientError) -> Response {
    match err {
        ClientError::NotFound(_) => {
            error_response(&AppError::NotFound("Client not found".to_string()))
        }
        ClientError::HasInvoices(count) => error_response(&AppError::BusinessRule(format!(
            "Cannot delete a client with {count} invoices"
        ))),
        ClientError::Database(_) => {
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, header::AUTHORIZATION},
        middleware::from_fn_with_state,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::middleware::auth_middleware;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn list_clients_requires_auth() {
        let state = test_state();
        let app = Router::new()
            .merge(routes())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/clients")
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

    #[tokio::test]
    async fn get_client_rejects_garbage_token() {
        let state = test_state();
        let app = Router::new()
            .merge(routes())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/clients/{}", Uuid::new_v4()))
                    .header(AUTHORIZATION, "Bearer not-a-real-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "invalid_token");
    }
}
