//! Analytics dashboard route.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use invoya_db::repositories::analytics::{AnalyticsRepository, AnalyticsSummary};
use invoya_shared::AppError;

/// Creates the analytics routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/analytics", get(get_analytics))
}

/// Invoice counts by status.
#[derive(Debug, Serialize)]
pub struct InvoiceCountsResponse {
    /// All invoices.
    pub total: u64,
    /// Draft invoices.
    pub draft: u64,
    /// Sent invoices.
    pub sent: u64,
    /// Paid invoices.
    pub paid: u64,
    /// Overdue invoices.
    pub overdue: u64,
}

/// Email delivery counters.
#[derive(Debug, Serialize)]
pub struct EmailStatsResponse {
    /// All emails ever sent.
    pub total_sent: u64,
    /// Emails confirmed delivered.
    pub delivered: u64,
    /// Emails that bounced or failed.
    pub failed: u64,
}

/// One recently created invoice.
#[derive(Debug, Serialize)]
pub struct RecentInvoiceResponse {
    /// Invoice ID.
    pub id: Uuid,
    /// Assigned invoice number.
    pub invoice_number: String,
    /// Billed client's name.
    pub client_name: String,
    /// Invoice total.
    pub total: String,
    /// Current status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// One recent email log entry.
#[derive(Debug, Serialize)]
pub struct RecentEmailActivityResponse {
    /// Invoice number the email was about.
    pub invoice_number: String,
    /// Recipient address.
    pub recipient: String,
    /// Email type: invoice or reminder.
    pub email_type: String,
    /// Current delivery status.
    pub status: String,
    /// Send timestamp.
    pub sent_at: String,
}

/// One client ranked by billed volume.
#[derive(Debug, Serialize)]
pub struct TopClientResponse {
    /// Client ID.
    pub id: Uuid,
    /// Client name.
    pub name: String,
    /// Number of invoices billed to this client.
    pub invoice_count: u64,
    /// Summed invoice totals.
    pub revenue: String,
}

/// Revenue collected in one calendar month.
#[derive(Debug, Serialize)]
pub struct MonthlyRevenueResponse {
    /// Month in `YYYY-MM` form.
    pub month: String,
    /// Summed totals of invoices paid in that month.
    pub revenue: String,
}

/// Full dashboard response.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    /// Revenue over all paid invoices.
    pub total_revenue: String,
    /// Invoice counts by status.
    pub invoice_counts: InvoiceCountsResponse,
    /// Number of clients.
    pub client_count: u64,
    /// Email delivery counters.
    pub email_stats: EmailStatsResponse,
    /// Most recently created invoices.
    pub recent_invoices: Vec<RecentInvoiceResponse>,
    /// Most recent email log entries.
    pub recent_email_activity: Vec<RecentEmailActivityResponse>,
    /// Clients ranked by billed volume.
    pub top_clients: Vec<TopClientResponse>,
    /// Trailing monthly revenue, oldest month first.
    pub monthly_revenue: Vec<MonthlyRevenueResponse>,
}

impl From<AnalyticsSummary> for AnalyticsResponse {
    fn from(summary: AnalyticsSummary) -> Self {
        Self {
            total_revenue: summary.total_revenue.to_string(),
            invoice_counts: InvoiceCountsResponse {
                total: summary.invoice_counts.total,
                draft: summary.invoice_counts.draft,
                sent: summary.invoice_counts.sent,
                paid: summary.invoice_counts.paid,
                overdue: summary.invoice_counts.overdue,
            },
            client_count: summary.client_count,
            email_stats: EmailStatsResponse {
                total_sent: summary.email_stats.total_sent,
                delivered: summary.email_stats.delivered,
                failed: summary.email_stats.failed,
            },
            recent_invoices: summary
                .recent_invoices
                .into_iter()
                .map(|invoice| RecentInvoiceResponse {
                    id: invoice.id,
                    invoice_number: invoice.invoice_number,
                    client_name: invoice.client_name,
                    total: invoice.total.to_string(),
                    status: invoice.status,
                    created_at: invoice.created_at.to_rfc3339(),
                })
                .collect(),
            recent_email_activity: summary
                .recent_email_activity
                .into_iter()
                .map(|activity| RecentEmailActivityResponse {
                    invoice_number: activity.invoice_number,
                    recipient: activity.recipient,
                    email_type: activity.email_type,
                    status: activity.status,
                    sent_at: activity.sent_at.to_rfc3339(),
                })
                .collect(),
            top_clients: summary
                .top_clients
                .into_iter()
                .map(|client| TopClientResponse {
                    id: client.id,
                    name: client.name,
                    invoice_count: client.invoice_count,
                    revenue: client.revenue.to_string(),
                })
                .collect(),
            monthly_revenue: summary
                .monthly_revenue
                .into_iter()
                .map(|month| MonthlyRevenueResponse {
                    month: month.month,
                    revenue: month.revenue.to_string(),
                })
                .collect(),
        }
    }
}

/// GET /analytics - Dashboard summary for the caller's account.
async fn get_analytics(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let analytics_repo = AnalyticsRepository::new((*state.db).clone());

    match analytics_repo.summary(auth.user_id()).await {
        Ok(summary) => (StatusCode::OK, Json(AnalyticsResponse::from(summary))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build analytics summary");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware::from_fn_with_state};
    use tower::ServiceExt;

    use crate::middleware::auth_middleware;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn analytics_requires_auth() {
        let state = test_state();
        let app = Router::new()
            .merge(routes())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/analytics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
