//! Invoice error types for validation and lifecycle errors.

use thiserror::Error;

use super::status::InvoiceStatus;

/// Errors that can occur during invoice domain operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvoiceError {
    // ========== Line Item Errors ==========
    /// Invoice must have at least one line item.
    #[error("Invoice must have at least one line item")]
    EmptyItems,

    /// Line item description is blank.
    #[error("Line item {index} has a blank description")]
    BlankDescription {
        /// Zero-based index of the offending item.
        index: usize,
    },

    /// Line item quantity must be positive.
    #[error("Line item {index} quantity must be greater than zero")]
    NonPositiveQuantity {
        /// Zero-based index of the offending item.
        index: usize,
    },

    /// Line item rate cannot be negative.
    #[error("Line item {index} rate cannot be negative")]
    NegativeRate {
        /// Zero-based index of the offending item.
        index: usize,
    },

    /// Tax rate must be between 0 and 100 percent.
    #[error("Tax rate must be between 0 and 100")]
    InvalidTaxRate,

    // ========== Lifecycle Errors ==========
    /// The requested status transition is not allowed.
    #[error("Cannot change invoice status from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: InvoiceStatus,
        /// Requested status.
        to: InvoiceStatus,
    },

    /// The status string is not a known status.
    #[error("Unknown invoice status: {0}")]
    UnknownStatus(String),

    // ========== Numbering Errors ==========
    /// The invoice number does not match the `INV-{year}{seq}` shape.
    #[error("Malformed invoice number: {0}")]
    MalformedNumber(String),
}
