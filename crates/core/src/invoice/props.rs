//! Property-based tests for invoice totals and numbering.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::sequence::{format_invoice_number, next_invoice_number, parse_invoice_number};
use super::totals::{compute_totals, line_amount};
use super::types::LineItem;

/// Strategy to generate positive quantities (0.01 to 1,000.00).
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

/// Strategy to generate non-negative rates (0.00 to 100,000.00).
fn rate() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a tax rate in percent (0.00 to 100.00).
fn tax_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

/// Strategy to generate 1-20 line items.
fn items() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec(
        (quantity(), rate()).prop_map(|(quantity, rate)| LineItem {
            description: "item".to_string(),
            quantity,
            rate,
        }),
        1..20,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Subtotal is exactly the sum of the per-line amounts.
    #[test]
    fn prop_subtotal_is_sum_of_line_amounts(items in items(), tax in tax_rate()) {
        let totals = compute_totals(&items, tax);
        let expected: Decimal = items
            .iter()
            .map(|item| line_amount(item.quantity, item.rate))
            .sum();
        prop_assert_eq!(totals.subtotal, expected);
    }

    /// Total always equals subtotal plus tax, and tax is never negative.
    #[test]
    fn prop_total_is_subtotal_plus_tax(items in items(), tax in tax_rate()) {
        let totals = compute_totals(&items, tax);
        prop_assert_eq!(totals.total, totals.subtotal + totals.tax_amount);
        prop_assert!(totals.tax_amount >= Decimal::ZERO);
        prop_assert!(totals.total >= totals.subtotal);
    }

    /// Every amount is rounded to at most 2 decimal places.
    #[test]
    fn prop_totals_round_to_cents(items in items(), tax in tax_rate()) {
        let totals = compute_totals(&items, tax);
        for value in [totals.subtotal, totals.tax_amount, totals.total] {
            prop_assert_eq!(value, value.round_dp(2));
        }
    }

    /// Totals are deterministic for the same inputs.
    #[test]
    fn prop_totals_deterministic(items in items(), tax in tax_rate()) {
        prop_assert_eq!(compute_totals(&items, tax), compute_totals(&items, tax));
    }

    /// A formatted number always parses back to the year and counter it was
    /// built from.
    #[test]
    fn prop_formatted_number_parses(year in 2000i32..2100, seq in 1u32..100_000) {
        let number = format_invoice_number(year, seq);
        prop_assert_eq!(parse_invoice_number(&number), Ok((year, seq)));
    }

    /// The successor of any valid number carries a counter exactly one
    /// higher, regardless of year rollover.
    #[test]
    fn prop_next_number_increments_by_one(
        last_year in 2000i32..2100,
        next_year in 2000i32..2100,
        seq in 1u32..99_999,
    ) {
        let last = format_invoice_number(last_year, seq);
        let next = next_invoice_number(Some(&last), next_year);
        let (parsed_year, parsed_seq) = parse_invoice_number(&next).unwrap();
        prop_assert_eq!(parsed_year, next_year);
        prop_assert_eq!(parsed_seq, seq + 1);
    }

    /// While the counter stays below 10000, lexicographic order matches
    /// numeric order within a year, so a descending string sort finds the
    /// latest number.
    #[test]
    fn prop_lexicographic_order_matches_counter(
        year in 2000i32..2100,
        a in 1u32..=9999,
        b in 1u32..=9999,
    ) {
        let left = format_invoice_number(year, a);
        let right = format_invoice_number(year, b);
        prop_assert_eq!(a.cmp(&b), left.cmp(&right));
    }
}
