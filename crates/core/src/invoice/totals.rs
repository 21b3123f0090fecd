//! Derived invoice totals.
//!
//! Totals are always computed server-side from line items and the tax rate;
//! amounts supplied by callers are ignored. All intermediate values use
//! `Decimal` and round to 2 decimal places with banker's rounding.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::types::LineItem;

/// The derived monetary totals of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    /// Sum of all line amounts.
    pub subtotal: Decimal,
    /// `subtotal × tax_rate / 100`.
    pub tax_amount: Decimal,
    /// `subtotal + tax_amount`.
    pub total: Decimal,
}

/// Computes a single line amount: `quantity × rate`, rounded to cents.
#[must_use]
pub fn line_amount(quantity: Decimal, rate: Decimal) -> Decimal {
    (quantity * rate).round_dp(2)
}

/// Computes invoice totals from line items and a percent tax rate.
#[must_use]
pub fn compute_totals(items: &[LineItem], tax_rate: Decimal) -> InvoiceTotals {
    let subtotal: Decimal = items
        .iter()
        .map(|item| line_amount(item.quantity, item.rate))
        .sum();
    let tax_amount = (subtotal * tax_rate / Decimal::ONE_HUNDRED).round_dp(2);
    let total = subtotal + tax_amount;

    InvoiceTotals {
        subtotal,
        tax_amount,
        total,
    }
}

/// Converts a 2-decimal total to minor units (cents) for the payment
/// provider. Returns `None` if the value does not fit in an `i64`.
#[must_use]
pub fn total_minor_units(total: Decimal) -> Option<i64> {
    (total * Decimal::ONE_HUNDRED).round().to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(quantity: Decimal, rate: Decimal) -> LineItem {
        LineItem {
            description: "work".to_string(),
            quantity,
            rate,
        }
    }

    #[test]
    fn test_reference_scenario() {
        // Two items (2 × 50, 3 × 10) at 10% tax.
        let items = vec![item(dec!(2), dec!(50)), item(dec!(3), dec!(10))];
        let totals = compute_totals(&items, dec!(10));

        assert_eq!(totals.subtotal, dec!(130.00));
        assert_eq!(totals.tax_amount, dec!(13.00));
        assert_eq!(totals.total, dec!(143.00));
    }

    #[test]
    fn test_zero_tax_rate() {
        let items = vec![item(dec!(4), dec!(25))];
        let totals = compute_totals(&items, dec!(0));

        assert_eq!(totals.subtotal, dec!(100.00));
        assert_eq!(totals.tax_amount, dec!(0.00));
        assert_eq!(totals.total, dec!(100.00));
    }

    #[test]
    fn test_fractional_quantities_round_to_cents() {
        // 1.5h at 99.99 = 149.985 -> 149.98 (banker's rounding on the half).
        let items = vec![item(dec!(1.5), dec!(99.99))];
        let totals = compute_totals(&items, dec!(0));

        assert_eq!(totals.subtotal, dec!(149.98));
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        // 33.33 at 7.5% = 2.49975 -> 2.50.
        let items = vec![item(dec!(1), dec!(33.33))];
        let totals = compute_totals(&items, dec!(7.5));

        assert_eq!(totals.tax_amount, dec!(2.50));
        assert_eq!(totals.total, dec!(35.83));
    }

    #[test]
    fn test_minor_units_conversion() {
        assert_eq!(total_minor_units(dec!(143.00)), Some(14_300));
        assert_eq!(total_minor_units(dec!(0.01)), Some(1));
        assert_eq!(total_minor_units(dec!(0)), Some(0));
    }
}
