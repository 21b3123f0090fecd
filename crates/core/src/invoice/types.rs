//! Invoice domain types shared by totals computation and persistence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::InvoiceError;

/// A single invoice line item as supplied by the caller.
///
/// The line `amount` is never accepted from callers; it is derived as
/// `quantity × rate` when totals are computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What is being billed.
    pub description: String,
    /// Quantity billed (supports fractional units, e.g. hours).
    pub quantity: Decimal,
    /// Price per unit.
    pub rate: Decimal,
}

/// Validates a set of line items for create/update.
///
/// # Errors
///
/// Returns the first violation found: empty item list, blank description,
/// non-positive quantity, or negative rate.
pub fn validate_items(items: &[LineItem]) -> Result<(), InvoiceError> {
    if items.is_empty() {
        return Err(InvoiceError::EmptyItems);
    }

    for (index, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(InvoiceError::BlankDescription { index });
        }
        if item.quantity <= Decimal::ZERO {
            return Err(InvoiceError::NonPositiveQuantity { index });
        }
        if item.rate < Decimal::ZERO {
            return Err(InvoiceError::NegativeRate { index });
        }
    }

    Ok(())
}

/// Validates a tax rate expressed in percent.
///
/// # Errors
///
/// Returns `InvoiceError::InvalidTaxRate` when the rate is negative or
/// above 100.
pub fn validate_tax_rate(tax_rate: Decimal) -> Result<(), InvoiceError> {
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE_HUNDRED {
        return Err(InvoiceError::InvalidTaxRate);
    }
    Ok(())
}
