//! HMAC-SHA256 webhook signature verification.
//!
//! Signature headers carry `t={unix timestamp},v1={hex digest}` where the
//! digest is computed over `"{timestamp}.{raw body}"`. The timestamp bounds
//! replay: deliveries older (or newer) than the tolerance are rejected even
//! with a valid digest.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted distance between the signature timestamp and now.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Errors from webhook signature verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature header was absent.
    #[error("signature header is missing")]
    MissingHeader,

    /// The header did not contain both a timestamp and a `v1` digest.
    #[error("signature header is malformed")]
    MalformedHeader,

    /// The timestamp is outside the replay tolerance.
    #[error("signature timestamp is outside the allowed tolerance")]
    StaleTimestamp,

    /// No digest in the header matches the payload.
    #[error("signature does not match payload")]
    Mismatch,
}

/// Computes the hex HMAC-SHA256 digest for a timestamped payload.
///
/// This is the signing side of the scheme; production code only verifies,
/// but tests and local tooling use it to produce valid headers.
#[must_use]
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a `t=...,v1=...` signature header against the raw request body.
///
/// `now` is the verifier's clock as a unix timestamp; it is a parameter so
/// tests can pin it.
///
/// # Errors
///
/// Returns a `SignatureError` describing the first check that failed:
/// header shape, timestamp tolerance, then digest comparison.
pub fn verify_signature(
    header: Option<&str>,
    payload: &[u8],
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::MissingHeader)?;

    let mut timestamp: Option<i64> = None;
    let mut digests: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => digests.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if digests.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    if (now - timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    // Hmac::verify_slice is constant-time; a provider may send several v1
    // digests during secret rotation, any one of which may match.
    let matched = digests.iter().any(|digest| {
        hex::decode(digest).is_ok_and(|bytes| {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .expect("HMAC accepts keys of any length");
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            mac.verify_slice(&bytes).is_ok()
        })
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_756_100_000;

    fn signed_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        format!("t={timestamp},v1={}", sign_payload(secret, timestamp, payload))
    }

    #[test]
    fn test_valid_signature_verifies() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
        let header = signed_header(SECRET, NOW, payload);
        assert_eq!(verify_signature(Some(&header), payload, SECRET, NOW), Ok(()));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = br#"{"id":"evt_1","amount":100}"#;
        let header = signed_header(SECRET, NOW, payload);
        let tampered = br#"{"id":"evt_1","amount":999}"#;
        assert_eq!(
            verify_signature(Some(&header), tampered, SECRET, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"{}";
        let header = signed_header("whsec_other", NOW, payload);
        assert_eq!(
            verify_signature(Some(&header), payload, SECRET, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let old = NOW - TIMESTAMP_TOLERANCE_SECS - 1;
        let header = signed_header(SECRET, old, payload);
        assert_eq!(
            verify_signature(Some(&header), payload, SECRET, NOW),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let payload = b"{}";
        let future = NOW + TIMESTAMP_TOLERANCE_SECS + 1;
        let header = signed_header(SECRET, future, payload);
        assert_eq!(
            verify_signature(Some(&header), payload, SECRET, NOW),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn test_missing_header_rejected() {
        assert_eq!(
            verify_signature(None, b"{}", SECRET, NOW),
            Err(SignatureError::MissingHeader)
        );
    }

    #[test]
    fn test_header_without_digest_rejected() {
        assert_eq!(
            verify_signature(Some("t=12345"), b"{}", SECRET, NOW),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn test_header_without_timestamp_rejected() {
        assert_eq!(
            verify_signature(Some("v1=deadbeef"), b"{}", SECRET, NOW),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn test_any_of_multiple_digests_may_match() {
        let payload = b"{}";
        let good = sign_payload(SECRET, NOW, payload);
        let header = format!("t={NOW},v1={:0>64},v1={good}", "0");
        assert_eq!(verify_signature(Some(&header), payload, SECRET, NOW), Ok(()));
    }
}
