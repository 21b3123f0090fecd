//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod analytics;
pub mod client;
pub mod email_log;
pub mod invoice;
pub mod user;
pub mod webhook_event;

pub use analytics::{
    AnalyticsRepository, AnalyticsSummary, EmailStats, InvoiceCounts, MonthlyRevenue,
    RecentEmailActivity, RecentInvoice, TopClient,
};
pub use client::{ClientError, ClientRepository, CreateClientInput, UpdateClientInput};
pub use email_log::{DeliveryStatus, EmailKind, EmailLogRepository, RecordEmailInput};
pub use invoice::{
    CreateInvoiceInput, InvoiceDetail, InvoiceError, InvoiceRepository, UpdateInvoiceInput,
};
pub use user::UserRepository;
pub use webhook_event::{WebhookEventRepository, WebhookProvider};
