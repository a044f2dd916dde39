//! Webhook signature verification.
//!
//! The processor signs every delivery with a header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=...]`, where each `v1` is
//! HMAC-SHA256 over `"{t}.{raw body}"` keyed by the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("malformed signature header")]
    Malformed,
    #[error("timestamp outside tolerance")]
    Expired,
    #[error("no matching signature")]
    Mismatch,
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Verifies `header` against the raw `payload` at time `now` (unix seconds).
pub fn verify(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if now.abs_diff(timestamp) > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    for candidate in signatures {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        if mac_for(secret, timestamp, payload)?
            .verify_slice(&expected)
            .is_ok()
        {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

/// Builds a valid signature header for `payload`. Used when replaying or
/// simulating processor deliveries.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let digest = mac_for(secret, timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={},v1={}", timestamp, hex::encode(digest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_700_000_000;
    const BODY: &[u8] = br#"{"type":"checkout.session.completed"}"#;

    #[test]
    fn accepts_own_signature() {
        let header = signature_header(BODY, SECRET, NOW).expect("sign");
        assert_eq!(verify(BODY, Some(&header), SECRET, 300, NOW + 10), Ok(()));
    }

    #[test]
    fn rejects_tampered_payload() {
        let header = signature_header(BODY, SECRET, NOW).expect("sign");
        let forged = br#"{"type":"checkout.session.completed","x":1}"#;
        assert_eq!(
            verify(forged, Some(&header), SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = signature_header(BODY, "whsec_other", NOW).expect("sign");
        assert_eq!(
            verify(BODY, Some(&header), SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = signature_header(BODY, SECRET, NOW).expect("sign");
        assert_eq!(
            verify(BODY, Some(&header), SECRET, 300, NOW + 301),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert_eq!(
            verify(BODY, None, SECRET, 300, NOW),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify(BODY, Some("v1=abcd"), SECRET, 300, NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify(BODY, Some("t=1700000000"), SECRET, 300, NOW),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn any_matching_v1_is_enough() {
        let valid = signature_header(BODY, SECRET, NOW).expect("sign");
        let v1 = valid.split_once(",v1=").map(|(_, s)| s).expect("v1 part");
        let header = format!("t={NOW},v1=nothex,v1=00ff,v1={v1}");
        assert_eq!(verify(BODY, Some(&header), SECRET, 300, NOW), Ok(()));
    }
}
