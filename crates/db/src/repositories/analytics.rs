//! Analytics repository for dashboard aggregates.
//!
//! Loads an account's invoices, clients, and email logs, then reduces them
//! in `aggregate`, which is pure over the loaded rows so the arithmetic can
//! be tested without a database.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use invoya_core::invoice::InvoiceStatus;

use crate::entities::{clients, email_logs, invoices};

/// How many recent invoices the summary includes.
const RECENT_INVOICE_LIMIT: usize = 5;
/// How many recent email log entries the summary includes.
const RECENT_EMAIL_LIMIT: usize = 10;
/// How many top clients the summary includes.
const TOP_CLIENT_LIMIT: usize = 5;
/// How many trailing calendar months the revenue series covers.
const REVENUE_MONTHS: usize = 6;

/// Per-status invoice counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceCounts {
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

/// Email delivery counters over the account's log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailStats {
    /// All emails ever handed to the relay.
    pub total_sent: u64,
    /// Emails the provider confirmed delivered.
    pub delivered: u64,
    /// Emails that bounced or failed.
    pub failed: u64,
}

/// A recently created invoice with its client name.
#[derive(Debug, Clone)]
pub struct RecentInvoice {
    /// Invoice ID.
    pub id: Uuid,
    /// Assigned invoice number.
    pub invoice_number: String,
    /// Billed client's name.
    pub client_name: String,
    /// Invoice total.
    pub total: Decimal,
    /// Current status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A recent email log entry with its invoice number.
#[derive(Debug, Clone)]
pub struct RecentEmailActivity {
    /// Invoice number the email was about.
    pub invoice_number: String,
    /// Recipient address.
    pub recipient: String,
    /// Invoice or reminder.
    pub email_type: String,
    /// Current delivery status.
    pub status: String,
    /// Send timestamp.
    pub sent_at: DateTime<Utc>,
}

/// A client ranked by total billed volume.
#[derive(Debug, Clone)]
pub struct TopClient {
    /// Client ID.
    pub id: Uuid,
    /// Client name.
    pub name: String,
    /// Number of invoices billed to this client.
    pub invoice_count: u64,
    /// Summed invoice totals.
    pub revenue: Decimal,
}

/// Revenue collected in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRevenue {
    /// Month in `YYYY-MM` form.
    pub month: String,
    /// Summed totals of invoices paid in that month.
    pub revenue: Decimal,
}

/// Full dashboard summary for one account.
#[derive(Debug, Clone)]
pub struct AnalyticsSummary {
    /// Σ total over paid invoices.
    pub total_revenue: Decimal,
    /// Invoice counts by status.
    pub invoice_counts: InvoiceCounts,
    /// Number of clients.
    pub client_count: u64,
    /// Email delivery counters.
    pub email_stats: EmailStats,
    /// Most recently created invoices.
    pub recent_invoices: Vec<RecentInvoice>,
    /// Most recent email log entries.
    pub recent_email_activity: Vec<RecentEmailActivity>,
    /// Clients ranked by billed volume.
    pub top_clients: Vec<TopClient>,
    /// Trailing monthly revenue series, oldest month first.
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

/// Analytics repository for dashboard queries.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    db: DatabaseConnection,
}

impl AnalyticsRepository {
    /// Creates a new analytics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Builds the dashboard summary for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying queries fail.
    pub async fn summary(&self, user_id: Uuid) -> Result<AnalyticsSummary, DbErr> {
        let invoices = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        let clients = clients::Entity::find()
            .filter(clients::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        let logs = email_logs::Entity::find()
            .filter(email_logs::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        Ok(aggregate(
            &invoices,
            &clients,
            &logs,
            Utc::now().date_naive(),
        ))
    }
}

/// Reduces loaded rows into the dashboard summary.
///
/// `today` anchors the trailing monthly revenue window.
#[must_use]
pub fn aggregate(
    invoices: &[invoices::Model],
    clients: &[clients::Model],
    logs: &[email_logs::Model],
    today: NaiveDate,
) -> AnalyticsSummary {
    let client_names: HashMap<Uuid, &str> = clients
        .iter()
        .map(|client| (client.id, client.name.as_str()))
        .collect();
    let invoice_numbers: HashMap<Uuid, &str> = invoices
        .iter()
        .map(|invoice| (invoice.id, invoice.invoice_number.as_str()))
        .collect();

    let mut invoice_counts = InvoiceCounts::default();
    let mut total_revenue = Decimal::ZERO;
    for invoice in invoices {
        invoice_counts.total += 1;
        match invoice.status.parse::<InvoiceStatus>() {
            Ok(InvoiceStatus::Draft) => invoice_counts.draft += 1,
            Ok(InvoiceStatus::Sent) => invoice_counts.sent += 1,
            Ok(InvoiceStatus::Paid) => {
                invoice_counts.paid += 1;
                total_revenue += invoice.total;
            }
            Ok(InvoiceStatus::Overdue) => invoice_counts.overdue += 1,
            Err(_) => {}
        }
    }

    let mut email_stats = EmailStats::default();
    for log in logs {
        email_stats.total_sent += 1;
        match log.status.as_str() {
            "delivered" => email_stats.delivered += 1,
            "failed" => email_stats.failed += 1,
            _ => {}
        }
    }

    AnalyticsSummary {
        total_revenue,
        invoice_counts,
        client_count: u64::try_from(clients.len()).unwrap_or(u64::MAX),
        email_stats,
        recent_invoices: recent_invoices(invoices, &client_names),
        recent_email_activity: recent_email_activity(logs, &invoice_numbers),
        top_clients: top_clients(invoices, clients),
        monthly_revenue: monthly_revenue(invoices, today),
    }
}

/// Picks the newest invoices and attaches their client names.
fn recent_invoices(
    invoices: &[invoices::Model],
    client_names: &HashMap<Uuid, &str>,
) -> Vec<RecentInvoice> {
    let mut sorted: Vec<&invoices::Model> = invoices.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(RECENT_INVOICE_LIMIT);

    sorted
        .into_iter()
        .map(|invoice| RecentInvoice {
            id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            client_name: client_names
                .get(&invoice.client_id)
                .map_or_else(|| "Unknown client".to_string(), ToString::to_string),
            total: invoice.total,
            status: invoice.status.clone(),
            created_at: invoice.created_at.into(),
        })
        .collect()
}

/// Picks the newest email log entries and attaches their invoice numbers.
fn recent_email_activity(
    logs: &[email_logs::Model],
    invoice_numbers: &HashMap<Uuid, &str>,
) -> Vec<RecentEmailActivity> {
    let mut sorted: Vec<&email_logs::Model> = logs.iter().collect();
    sorted.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    sorted.truncate(RECENT_EMAIL_LIMIT);

    sorted
        .into_iter()
        .map(|log| RecentEmailActivity {
            invoice_number: invoice_numbers
                .get(&log.invoice_id)
                .map_or_else(|| "Unknown invoice".to_string(), ToString::to_string),
            recipient: log.recipient.clone(),
            email_type: log.email_type.clone(),
            status: log.status.clone(),
            sent_at: log.sent_at.into(),
        })
        .collect()
}

/// Ranks clients by summed invoice totals across all statuses.
fn top_clients(invoices: &[invoices::Model], clients: &[clients::Model]) -> Vec<TopClient> {
    let mut volumes: HashMap<Uuid, (u64, Decimal)> = HashMap::new();
    for invoice in invoices {
        let entry = volumes
            .entry(invoice.client_id)
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += invoice.total;
    }

    let mut ranked: Vec<TopClient> = clients
        .iter()
        .filter_map(|client| {
            volumes.get(&client.id).map(|&(invoice_count, revenue)| TopClient {
                id: client.id,
                name: client.name.clone(),
                invoice_count,
                revenue,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    ranked.truncate(TOP_CLIENT_LIMIT);
    ranked
}

/// Builds the trailing monthly revenue series, zero-filling empty months.
///
/// Revenue lands in the month the invoice was paid; rows that predate
/// `paid_at` tracking fall back to their creation month.
fn monthly_revenue(invoices: &[invoices::Model], today: NaiveDate) -> Vec<MonthlyRevenue> {
    let mut per_month: HashMap<(i32, u32), Decimal> = HashMap::new();
    for invoice in invoices {
        if invoice.status != InvoiceStatus::Paid.as_str() {
            continue;
        }
        let paid_date = invoice
            .paid_at
            .map_or_else(|| invoice.created_at.date_naive(), |at| at.date_naive());
        *per_month.entry(month_key(paid_date)).or_insert(Decimal::ZERO) += invoice.total;
    }

    last_n_months(today, REVENUE_MONTHS)
        .into_iter()
        .map(|(year, month)| MonthlyRevenue {
            month: format!("{year:04}-{month:02}"),
            revenue: per_month
                .get(&(year, month))
                .copied()
                .unwrap_or(Decimal::ZERO),
        })
        .collect()
}

/// The `(year, month)` bucket a date falls into.
fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// The last `n` calendar months ending with today's month, oldest first.
fn last_n_months(today: NaiveDate, n: usize) -> Vec<(i32, u32)> {
    let mut months = Vec::with_capacity(n);
    let mut year = today.year();
    let mut month = today.month();

    for _ in 0..n {
        months.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    months.reverse();
    months
}

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod tests;
