//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>]`.
//! Each `v1` is an HMAC-SHA256 of `"{t}.{payload}"` keyed with the endpoint
//! secret. Any matching `v1` is accepted.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Default age after which a signed event is rejected.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Allowed clock skew for timestamps in the future.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

/// Reasons a webhook signature is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header has no timestamp")]
    MissingTimestamp,

    #[error("signature header has no v1 signature")]
    MissingSignature,

    #[error("signature timestamp is not a number: {0}")]
    InvalidTimestamp(String),

    #[error("signature timestamp is {age_secs}s old")]
    Expired { age_secs: i64 },

    #[error("signature timestamp is {ahead_secs}s in the future")]
    FromTheFuture { ahead_secs: i64 },

    #[error("no signature matches the payload")]
    Mismatch,
}

/// Verifies `header` against `payload`.
///
/// `now` is the current unix time in seconds.
///
/// # Errors
///
/// Returns a [`SignatureError`] describing the first check that failed.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_owned()))?;

    let age_secs = now - ts;
    if age_secs > tolerance_secs {
        return Err(SignatureError::Expired { age_secs });
    }
    if -age_secs > MAX_FUTURE_SKEW_SECS {
        return Err(SignatureError::FromTheFuture {
            ahead_secs: -age_secs,
        });
    }

    let matched = signatures.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        signed_mac(payload, secret, timestamp).verify_slice(&expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Produces a `Stripe-Signature` header value for `payload`.
#[must_use]
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let ts = timestamp.to_string();
    let digest = signed_mac(payload, secret, &ts).finalize().into_bytes();
    format!("t={ts},v1={}", hex::encode(digest))
}

fn signed_mac(payload: &[u8], secret: &str, timestamp: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}
