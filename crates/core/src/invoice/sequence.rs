//! Invoice number generation.
//!
//! Numbers have the shape `INV-{year}{seq:04}`, e.g. `INV-20260001`. The
//! trailing counter is per-owner and runs across years: a new year changes
//! the prefix but the counter keeps incrementing from the owner's last
//! number. Zero-padding keeps lexicographic and numeric order identical up
//! to 9999, which is what lets the generator find the latest number with a
//! plain descending string sort; past 9999 the counter simply grows wider.

use super::error::InvoiceError;

/// Prefix shared by all invoice numbers.
pub const NUMBER_PREFIX: &str = "INV-";

/// Formats an invoice number from a year and a sequence counter.
#[must_use]
pub fn format_invoice_number(year: i32, seq: u32) -> String {
    format!("{NUMBER_PREFIX}{year}{seq:04}")
}

/// Parses an invoice number into its `(year, seq)` parts.
///
/// # Errors
///
/// Returns `InvoiceError::MalformedNumber` when the input does not match
/// `INV-` followed by a 4-digit year and at least 4 more digits.
pub fn parse_invoice_number(number: &str) -> Result<(i32, u32), InvoiceError> {
    let malformed = || InvoiceError::MalformedNumber(number.to_string());

    let digits = number.strip_prefix(NUMBER_PREFIX).ok_or_else(malformed)?;
    if digits.len() < 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let year: i32 = digits[..4].parse().map_err(|_| malformed())?;
    let seq: u32 = digits[4..].parse().map_err(|_| malformed())?;
    Ok((year, seq))
}

/// Computes the next invoice number for an owner.
///
/// `last` is the owner's current greatest invoice number, if any. A missing
/// or malformed last number starts the counter at 1.
#[must_use]
pub fn next_invoice_number(last: Option<&str>, year: i32) -> String {
    let next_seq = last
        .and_then(|number| parse_invoice_number(number).ok())
        .map_or(1, |(_, seq)| seq + 1);

    format_invoice_number(year, next_seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_four_digits() {
        assert_eq!(format_invoice_number(2026, 1), "INV-20260001");
        assert_eq!(format_invoice_number(2026, 42), "INV-20260042");
        assert_eq!(format_invoice_number(2026, 9999), "INV-20269999");
    }

    #[test]
    fn test_format_grows_past_9999() {
        assert_eq!(format_invoice_number(2026, 10_000), "INV-202610000");
    }

    #[test]
    fn test_parse_accepts_wide_counters() {
        assert_eq!(parse_invoice_number("INV-20240001").unwrap(), (2024, 1));
        assert_eq!(
            parse_invoice_number("INV-202610000").unwrap(),
            (2026, 10_000)
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["INV-2024", "INV-2024000x", "20240001", "INV-", ""] {
            assert!(matches!(
                parse_invoice_number(bad),
                Err(InvoiceError::MalformedNumber(_))
            ));
        }
    }

    #[test]
    fn test_next_increments_counter() {
        assert_eq!(
            next_invoice_number(Some("INV-20240001"), 2024),
            "INV-20240002"
        );
    }

    #[test]
    fn test_first_invoice_starts_at_one() {
        assert_eq!(next_invoice_number(None, 2026), "INV-20260001");
    }

    #[test]
    fn test_counter_survives_year_rollover() {
        // The counter is owner-global: only the prefix tracks the year.
        assert_eq!(
            next_invoice_number(Some("INV-20250017"), 2026),
            "INV-20260018"
        );
    }

    #[test]
    fn test_malformed_last_restarts_at_one() {
        assert_eq!(
            next_invoice_number(Some("DRAFT-999"), 2026),
            "INV-20260001"
        );
    }
}
