//! `SeaORM` entity definitions.

pub mod clients;
pub mod email_logs;
pub mod invoice_items;
pub mod invoices;
pub mod users;
pub mod webhook_events;
