//! Invoice routes: CRUD, PDF download, and email delivery.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use invoya_core::invoice::{InvoiceStatus, LineItem};
use invoya_core::pdf::{DocumentItem, InvoiceDocument, render_invoice};
use invoya_db::UserRepository;
use invoya_db::repositories::email_log::{EmailKind, EmailLogRepository, RecordEmailInput};
use invoya_db::repositories::invoice::{
    CreateInvoiceInput, InvoiceDetail, InvoiceError, InvoiceRepository, UpdateInvoiceInput,
};
use invoya_shared::AppError;
use invoya_shared::email::InvoiceEmail;

/// Creates the invoice routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices))
        .route("/invoices", post(create_invoice))
        .route("/invoices/{invoice_id}", get(get_invoice))
        .route("/invoices/{invoice_id}", put(update_invoice))
        .route("/invoices/{invoice_id}", delete(delete_invoice))
        .route("/invoices/{invoice_id}/pdf", get(download_pdf))
        .route("/invoices/{invoice_id}/send-email", post(send_email))
        .route("/invoices/{invoice_id}/send-email", get(email_history))
}

/// Query parameters for listing invoices.
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    /// Filter by status: draft, sent, paid, overdue.
    pub status: Option<String>,
}

/// One line item in a create/update request.
#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    /// What is being billed.
    pub description: String,
    /// Quantity billed.
    pub quantity: Decimal,
    /// Price per unit.
    pub rate: Decimal,
}

impl From<LineItemRequest> for LineItem {
    fn from(item: LineItemRequest) -> Self {
        Self {
            description: item.description,
            quantity: item.quantity,
            rate: item.rate,
        }
    }
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Client being billed.
    pub client_id: Uuid,
    /// Initial status; defaults to draft.
    pub status: Option<String>,
    /// Date the invoice is issued.
    pub issue_date: NaiveDate,
    /// Date payment is due.
    pub due_date: NaiveDate,
    /// Tax rate in percent (default: 0).
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Free-form notes shown on the invoice.
    pub notes: Option<String>,
    /// Line items; amounts are derived server-side.
    pub items: Vec<LineItemRequest>,
}

/// Request body for updating an invoice.
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    /// Client being billed.
    pub client_id: Option<Uuid>,
    /// Requested status change, validated against the lifecycle.
    pub status: Option<String>,
    /// Date the invoice is issued.
    pub issue_date: Option<NaiveDate>,
    /// Date payment is due.
    pub due_date: Option<NaiveDate>,
    /// Tax rate in percent.
    pub tax_rate: Option<Decimal>,
    /// Free-form notes shown on the invoice.
    pub notes: Option<String>,
    /// Replacement line items; totals are recomputed when present.
    pub items: Option<Vec<LineItemRequest>>,
}

/// Request body for sending an invoice email.
#[derive(Debug, Default, Deserialize)]
pub struct SendEmailRequest {
    /// Email type: invoice (default) or reminder.
    pub email_type: Option<String>,
}

/// Client summary embedded in invoice responses.
#[derive(Debug, Serialize)]
pub struct InvoiceClientResponse {
    /// Client ID.
    pub id: Uuid,
    /// Client name.
    pub name: String,
    /// Client email address.
    pub email: String,
}

/// One invoice in a list response.
#[derive(Debug, Serialize)]
pub struct InvoiceSummaryResponse {
    /// Invoice ID.
    pub id: Uuid,
    /// Human-readable invoice number.
    pub invoice_number: String,
    /// Lifecycle status.
    pub status: String,
    /// Billed client.
    pub client: InvoiceClientResponse,
    /// Date the invoice was issued.
    pub issue_date: String,
    /// Date payment is due.
    pub due_date: String,
    /// Grand total.
    pub total: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// One line item in a detail response.
#[derive(Debug, Serialize)]
pub struct InvoiceItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// What is being billed.
    pub description: String,
    /// Quantity billed.
    pub quantity: String,
    /// Price per unit.
    pub rate: String,
    /// Derived line amount.
    pub amount: String,
    /// Display order.
    pub position: i32,
}

/// Full invoice detail response.
#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    /// Invoice ID.
    pub id: Uuid,
    /// Human-readable invoice number.
    pub invoice_number: String,
    /// Lifecycle status.
    pub status: String,
    /// Billed client.
    pub client: InvoiceClientResponse,
    /// Date the invoice was issued.
    pub issue_date: String,
    /// Date payment is due.
    pub due_date: String,
    /// Sum of line amounts.
    pub subtotal: String,
    /// Tax rate in percent.
    pub tax_rate: String,
    /// Derived tax amount.
    pub tax_amount: String,
    /// Grand total.
    pub total: String,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Line items in display order.
    pub items: Vec<InvoiceItemResponse>,
    /// When the invoice was paid, if it was.
    pub paid_at: Option<String>,
    /// When the invoice was last emailed, if ever.
    pub last_emailed_at: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<InvoiceDetail> for InvoiceDetailResponse {
    fn from(detail: InvoiceDetail) -> Self {
        let invoice = detail.invoice;
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            status: invoice.status,
            client: InvoiceClientResponse {
                id: detail.client.id,
                name: detail.client.name,
                email: detail.client.email,
            },
            issue_date: invoice.issue_date.to_string(),
            due_date: invoice.due_date.to_string(),
            subtotal: invoice.subtotal.to_string(),
            tax_rate: invoice.tax_rate.to_string(),
            tax_amount: invoice.tax_amount.to_string(),
            total: invoice.total.to_string(),
            notes: invoice.notes,
            items: detail
                .items
                .into_iter()
                .map(|item| InvoiceItemResponse {
                    id: item.id,
                    description: item.description,
                    quantity: item.quantity.to_string(),
                    rate: item.rate.to_string(),
                    amount: item.amount.to_string(),
                    position: item.position,
                })
                .collect(),
            paid_at: invoice.paid_at.map(|t| t.to_rfc3339()),
            last_emailed_at: invoice.last_emailed_at.map(|t| t.to_rfc3339()),
            created_at: invoice.created_at.to_rfc3339(),
            updated_at: invoice.updated_at.to_rfc3339(),
        }
    }
}

/// GET /invoices - List the caller's invoices, optionally filtered by status.
async fn list_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListInvoicesQuery>,
) -> impl IntoResponse {
    let status_filter = match query.status.as_deref().map(str::parse::<InvoiceStatus>) {
        Some(Ok(status)) => Some(status),
        Some(Err(e)) => return error_response(&AppError::Validation(e.to_string())),
        None => None,
    };

    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    match invoice_repo.list(auth.user_id(), status_filter).await {
        Ok(invoices) => {
            let response: Vec<InvoiceSummaryResponse> = invoices
                .into_iter()
                .map(|(invoice, client)| InvoiceSummaryResponse {
                    id: invoice.id,
                    invoice_number: invoice.invoice_number,
                    status: invoice.status,
                    client: InvoiceClientResponse {
                        id: client.id,
                        name: client.name,
                        email: client.email,
                    },
                    issue_date: invoice.issue_date.to_string(),
                    due_date: invoice.due_date.to_string(),
                    total: invoice.total.to_string(),
                    created_at: invoice.created_at.to_rfc3339(),
                })
                .collect();

            (StatusCode::OK, Json(json!({ "invoices": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list invoices");
            invoice_error_response(&e)
        }
    }
}

/// POST /invoices - Create an invoice with derived totals and a fresh number.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> impl IntoResponse {
    let status = match payload.status.as_deref().map(str::parse::<InvoiceStatus>) {
        Some(Ok(status)) => Some(status),
        Some(Err(e)) => return error_response(&AppError::Validation(e.to_string())),
        None => None,
    };

    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    let input = CreateInvoiceInput {
        user_id: auth.user_id(),
        client_id: payload.client_id,
        status,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        tax_rate: payload.tax_rate,
        notes: payload.notes,
        items: payload.items.into_iter().map(LineItem::from).collect(),
    };

    match invoice_repo.create(input).await {
        Ok(detail) => {
            info!(
                user_id = %auth.user_id(),
                invoice_id = %detail.invoice.id,
                invoice_number = %detail.invoice.invoice_number,
                "Invoice created"
            );
            (
                StatusCode::CREATED,
                Json(InvoiceDetailResponse::from(detail)),
            )
                .into_response()
        }
        Err(e @ (InvoiceError::ClientNotFound(_) | InvoiceError::Lifecycle(_))) => {
            invoice_error_response(&e)
        }
        Err(e) => {
            error!(error = %e, "Failed to create invoice");
            invoice_error_response(&e)
        }
    }
}

/// GET /invoices/{invoice_id} - Get one invoice with client and items.
async fn get_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    match invoice_repo.find(auth.user_id(), invoice_id).await {
        Ok(detail) => (StatusCode::OK, Json(InvoiceDetailResponse::from(detail))).into_response(),
        Err(e @ InvoiceError::NotFound(_)) => invoice_error_response(&e),
        Err(e) => {
            error!(error = %e, "Failed to get invoice");
            invoice_error_response(&e)
        }
    }
}

/// PUT /invoices/{invoice_id} - Update an invoice.
async fn update_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> impl IntoResponse {
    let status = match payload.status.as_deref().map(str::parse::<InvoiceStatus>) {
        Some(Ok(status)) => Some(status),
        Some(Err(e)) => return error_response(&AppError::Validation(e.to_string())),
        None => None,
    };

    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    let input = UpdateInvoiceInput {
        client_id: payload.client_id,
        status,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        tax_rate: payload.tax_rate,
        notes: payload.notes.map(Some),
        items: payload
            .items
            .map(|items| items.into_iter().map(LineItem::from).collect()),
    };

    match invoice_repo.update(auth.user_id(), invoice_id, input).await {
        Ok(detail) => {
            info!(user_id = %auth.user_id(), invoice_id = %invoice_id, "Invoice updated");
            (StatusCode::OK, Json(InvoiceDetailResponse::from(detail))).into_response()
        }
        Err(
            e @ (InvoiceError::NotFound(_)
            | InvoiceError::ClientNotFound(_)
            | InvoiceError::Lifecycle(_)),
        ) => invoice_error_response(&e),
        Err(e) => {
            error!(error = %e, "Failed to update invoice");
            invoice_error_response(&e)
        }
    }
}

/// DELETE /invoices/{invoice_id} - Delete an invoice and its items.
async fn delete_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    match invoice_repo.delete(auth.user_id(), invoice_id).await {
        Ok(()) => {
            info!(user_id = %auth.user_id(), invoice_id = %invoice_id, "Invoice deleted");
            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Err(e @ InvoiceError::NotFound(_)) => invoice_error_response(&e),
        Err(e) => {
            error!(error = %e, "Failed to delete invoice");
            invoice_error_response(&e)
        }
    }
}

/// GET /invoices/{invoice_id}/pdf - Download the invoice as a PDF.
async fn download_pdf(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    let detail = match invoice_repo.find(auth.user_id(), invoice_id).await {
        Ok(detail) => detail,
        Err(e @ InvoiceError::NotFound(_)) => return invoice_error_response(&e),
        Err(e) => {
            error!(error = %e, "Failed to load invoice for PDF");
            return invoice_error_response(&e);
        }
    };

    let sender_name = match sender_name(&state, auth.user_id()).await {
        Ok(name) => name,
        Err(response) => return response,
    };

    let status = match detail.invoice.status.parse::<InvoiceStatus>() {
        Ok(status) => status,
        Err(e) => {
            error!(error = %e, invoice_id = %invoice_id, "Stored invoice status is invalid");
            return error_response(&AppError::Internal("An error occurred".to_string()));
        }
    };

    let document = InvoiceDocument {
        invoice_number: detail.invoice.invoice_number.clone(),
        status,
        issue_date: detail.invoice.issue_date,
        due_date: detail.invoice.due_date,
        sender_name,
        client_name: detail.client.name,
        client_company: detail.client.company,
        client_address: detail.client.address,
        client_email: detail.client.email,
        items: detail
            .items
            .into_iter()
            .map(|item| DocumentItem {
                description: item.description,
                quantity: item.quantity,
                rate: item.rate,
                amount: item.amount,
            })
            .collect(),
        subtotal: detail.invoice.subtotal,
        tax_rate: detail.invoice.tax_rate,
        tax_amount: detail.invoice.tax_amount,
        total: detail.invoice.total,
        notes: detail.invoice.notes,
    };

    match render_invoice(&document) {
        Ok(bytes) => {
            let disposition = format!(
                "attachment; filename=\"{}.pdf\"",
                detail.invoice.invoice_number
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, invoice_id = %invoice_id, "Failed to render invoice PDF");
            error_response(&AppError::Internal("Failed to generate PDF".to_string()))
        }
    }
}

/// POST /invoices/{invoice_id}/send-email - Email the invoice to its client.
async fn send_email(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
    payload: Option<Json<SendEmailRequest>>,
) -> impl IntoResponse {
    let Json(payload) = payload.unwrap_or_default();

    let kind = match payload.email_type.as_deref() {
        None | Some("invoice") => EmailKind::Invoice,
        Some("reminder") => EmailKind::Reminder,
        Some(other) => {
            return error_response(&AppError::Validation(format!(
                "Unknown email type: {other}. Must be invoice or reminder"
            )));
        }
    };

    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    let detail = match invoice_repo.find(auth.user_id(), invoice_id).await {
        Ok(detail) => detail,
        Err(e @ InvoiceError::NotFound(_)) => return invoice_error_response(&e),
        Err(e) => {
            error!(error = %e, "Failed to load invoice for email");
            return invoice_error_response(&e);
        }
    };

    let sender_name = match sender_name(&state, auth.user_id()).await {
        Ok(name) => name,
        Err(response) => return response,
    };

    let email = InvoiceEmail {
        to_email: &detail.client.email,
        client_name: &detail.client.name,
        invoice_number: &detail.invoice.invoice_number,
        total: detail.invoice.total,
        due_date: detail.invoice.due_date,
        sender_name: &sender_name,
    };

    let send_result = match kind {
        EmailKind::Invoice => state.email_service.send_invoice_email(&email).await,
        EmailKind::Reminder => state.email_service.send_reminder_email(&email).await,
    };

    // Nothing is recorded for a failed send; there is no delivery to track.
    let message_id = match send_result {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, invoice_id = %invoice_id, "Failed to send invoice email");
            return error_response(&AppError::ExternalService(
                "Failed to send email".to_string(),
            ));
        }
    };

    let email_repo = EmailLogRepository::new((*state.db).clone());
    if let Err(e) = email_repo
        .record(RecordEmailInput {
            invoice_id,
            user_id: auth.user_id(),
            recipient: detail.client.email.clone(),
            kind,
            message_id: message_id.clone(),
        })
        .await
    {
        error!(error = %e, message_id = %message_id, "Failed to record email log");
        return error_response(&AppError::Database("An error occurred".to_string()));
    }

    let updated = match invoice_repo
        .record_email_sent(auth.user_id(), invoice_id, kind)
        .await
    {
        Ok(invoice) => invoice,
        Err(e) => {
            error!(error = %e, "Failed to stamp invoice after email");
            return invoice_error_response(&e);
        }
    };

    info!(
        user_id = %auth.user_id(),
        invoice_id = %invoice_id,
        message_id = %message_id,
        email_type = kind.as_str(),
        "Invoice email sent"
    );

    (
        StatusCode::OK,
        Json(json!({
            "message": "Email sent successfully",
            "message_id": message_id,
            "invoice_status": updated.status,
            "last_emailed_at": updated.last_emailed_at.map(|t| t.to_rfc3339()),
        })),
    )
        .into_response()
}

/// GET /invoices/{invoice_id}/send-email - Email history for an invoice.
async fn email_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let invoice_repo = InvoiceRepository::new((*state.db).clone());

    let detail = match invoice_repo.find(auth.user_id(), invoice_id).await {
        Ok(detail) => detail,
        Err(e @ InvoiceError::NotFound(_)) => return invoice_error_response(&e),
        Err(e) => {
            error!(error = %e, "Failed to load invoice for email history");
            return invoice_error_response(&e);
        }
    };

    let email_repo = EmailLogRepository::new((*state.db).clone());
    let logs = match email_repo.list_for_invoice(auth.user_id(), invoice_id).await {
        Ok(logs) => logs,
        Err(e) => {
            error!(error = %e, "Failed to list email logs");
            return error_response(&AppError::Database("An error occurred".to_string()));
        }
    };

    // Logs come back most recent first, so the head is the latest attempt.
    let email_status = logs
        .first()
        .map_or_else(|| "none".to_string(), |log| log.status.clone());

    let email_logs: Vec<serde_json::Value> = logs
        .into_iter()
        .map(|log| {
            json!({
                "id": log.id,
                "recipient": log.recipient,
                "email_type": log.email_type,
                "status": log.status,
                "message_id": log.message_id,
                "sent_at": log.sent_at.to_rfc3339(),
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "email_logs": email_logs,
            "email_status": email_status,
            "last_emailed_at": detail.invoice.last_emailed_at.map(|t| t.to_rfc3339()),
        })),
    )
        .into_response()
}

/// Looks up the caller's display name for use as the email/PDF sender.
async fn sender_name(state: &AppState, user_id: Uuid) -> Result<String, Response> {
    let user_repo = UserRepository::new((*state.db).clone());
    match user_repo.find_by_id(user_id).await {
        Ok(Some(user)) => Ok(user.name),
        Ok(None) => Err(error_response(&AppError::Unauthorized(
            "Account no longer exists".to_string(),
        ))),
        Err(e) => {
            error!(error = %e, "Failed to load user");
            Err(error_response(&AppError::Database(
                "An error occurred".to_string(),
            )))
        }
    }
}

/// Maps repository errors onto the JSON error envelope.
fn invoice_error_response(err: &InvoiceError) -> Response {
    match err {
        InvoiceError::NotFound(_) => {
            error_response(&AppError::NotFound("Invoice not found".to_string()))
        }
        InvoiceError::ClientNotFound(_) => {
            error_response(&AppError::Validation("Client not found".to_string()))
        }
        InvoiceError::NumberConflict => error_response(&AppError::Conflict(err.to_string())),
        InvoiceError::Lifecycle(e) => error_response(&AppError::Validation(e.to_string())),
        InvoiceError::Database(_) => {
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}
