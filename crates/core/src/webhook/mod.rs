//! Provider webhook handling: signature verification and event payloads.
//!
//! Both the payment and email providers sign deliveries with the same
//! `t={timestamp},v1={hex hmac}` scheme over `"{timestamp}.{raw body}"`.
//! Parsing keeps the raw body untouched until the signature has been
//! verified; nothing else in the system ever sees an unverified payload.

pub mod event;
pub mod signature;

pub use event::{EmailEvent, EmailEventKind, PaymentEvent, PaymentEventKind};
pub use signature::{SignatureError, TIMESTAMP_TOLERANCE_SECS, sign_payload, verify_signature};
