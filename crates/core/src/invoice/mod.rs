//! Invoice domain logic.
//!
//! - `totals` - Derived monetary totals (line amounts, subtotal, tax, total)
//! - `sequence` - Human-readable invoice numbering
//! - `status` - Status lifecycle and transition rules
//! - `types` - Line item types and validation

pub mod error;
pub mod sequence;
pub mod status;
pub mod totals;
pub mod types;

#[cfg(test)]
mod props;

pub use error::InvoiceError;
pub use sequence::{format_invoice_number, next_invoice_number, parse_invoice_number};
pub use status::{InvoiceStatus, check_transition};
pub use totals::{InvoiceTotals, compute_totals, line_amount, total_minor_units};
pub use types::{LineItem, validate_items, validate_tax_rate};
