use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::app_error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying `t=<unix ts>,v1=<hex hmac>`.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

fn signed_mac(secret: &str, timestamp: &str, payload: &[u8]) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("HMAC key rejected".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Checks a webhook signature header against the raw request body.
///
/// The MAC covers `"<t>." + payload` byte for byte. Any `v1` entry may
/// match; the timestamp must be within `tolerance_secs` of `now`.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> AppResult<()> {
    // An empty HMAC key is valid for the MAC, so anyone could sign with it.
    if secret.is_empty() {
        return Err(AppError::InvalidSignature("Webhook secret not configured".into()));
    }

    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::InvalidSignature("Missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(AppError::InvalidSignature("Missing signature".into()));
    }
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AppError::InvalidSignature("Invalid timestamp".into()))?;

    let mac = signed_mac(secret, timestamp, payload)?;
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(AppError::InvalidSignature("Signature mismatch".into()));
    }
    if (now - ts).abs() > tolerance_secs {
        return Err(AppError::InvalidSignature("Timestamp outside tolerance".into()));
    }
    Ok(())
}

/// Produces a header value accepted by [`verify_webhook_signature`].
pub fn sign_webhook_payload(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
    let mac = signed_mac(secret, &timestamp.to_string(), payload)?;
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={signature}"))
}
