//! Invoice status lifecycle.
//!
//! Status changes requested through the API are validated against an explicit
//! transition table; callers can never jump an invoice to an arbitrary state.
//! Payment reconciliation uses its own narrow paths (`sent → paid` on a
//! success event, `paid → sent` on a failure event) and is the only way an
//! invoice leaves `paid`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::InvoiceError;

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Invoice is being drafted; not yet visible to the client.
    Draft,
    /// Invoice has been sent to the client.
    Sent,
    /// Invoice has been paid in full.
    Paid,
    /// Invoice is past its due date without payment.
    Overdue,
}

impl InvoiceStatus {
    /// Returns the lowercase string form used in the database and API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }

    /// Returns true if a caller-requested transition to `next` is allowed.
    ///
    /// Same-state transitions are no-ops and always allowed. Leaving `paid`
    /// is never allowed here; only payment-failure reconciliation does that.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Draft)
                | (Self::Sent, Self::Sent)
                | (Self::Paid, Self::Paid)
                | (Self::Overdue, Self::Overdue)
                | (Self::Draft, Self::Sent)
                | (Self::Sent, Self::Paid)
                | (Self::Sent, Self::Overdue)
                | (Self::Overdue, Self::Sent)
                | (Self::Overdue, Self::Paid)
        )
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            other => Err(InvoiceError::UnknownStatus(other.to_string())),
        }
    }
}

/// Validates a caller-requested status change.
///
/// # Errors
///
/// Returns `InvoiceError::InvalidTransition` when the lifecycle does not
/// allow moving from `from` to `to`.
pub const fn check_transition(
    from: InvoiceStatus,
    to: InvoiceStatus,
) -> Result<(), InvoiceError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(InvoiceError::InvalidTransition { from, to })
    }
}
