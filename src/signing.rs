//! Request signing for the points API and the chat webhook.
//!
//! Both services use HMAC-SHA256 over a timestamp: the points API wants a
//! hex digest in headers, the webhook a URL-encoded base64 digest in the
//! query string.

use base64::Engine;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

const SHA256_OUTPUT_LEN: usize = 32;
const SHA256_BLOCK_LEN: usize = 64;

/// HMAC-SHA256 (RFC 2104).
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; SHA256_OUTPUT_LEN] {
    let mut key_block = [0u8; SHA256_BLOCK_LEN];
    if key.len() > SHA256_BLOCK_LEN {
        let hashed = Sha256::digest(key);
        key_block[..SHA256_OUTPUT_LEN].copy_from_slice(&hashed);
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut inner_pad = [0u8; SHA256_BLOCK_LEN];
    let mut outer_pad = [0u8; SHA256_BLOCK_LEN];
    for i in 0..SHA256_BLOCK_LEN {
        inner_pad[i] = key_block[i] ^ 0x36;
        outer_pad[i] = key_block[i] ^ 0x5c;
    }

    let inner = Sha256::new()
        .chain_update(inner_pad)
        .chain_update(data)
        .finalize();
    Sha256::new()
        .chain_update(outer_pad)
        .chain_update(inner)
        .finalize()
        .into()
}

// ---------------------------------------------------------------------------
// Points API
// ---------------------------------------------------------------------------

/// Header set that authenticates one points API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSignature {
    /// `x-message`: the signed UTC timestamp.
    pub message: String,
    /// `x-signature`: lowercase hex HMAC of `message`.
    pub signature: String,
}

impl ApiSignature {
    pub const MESSAGE_HEADER: &'static str = "x-message";
    pub const SIGNATURE_HEADER: &'static str = "x-signature";
    pub const API_KEY_HEADER: &'static str = "x-api-key";
}

/// Sign the current second with the API key.
pub fn api_signature(api_key: &SecretString, now: DateTime<Utc>) -> ApiSignature {
    let message = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let digest = hmac_sha256(api_key.expose_secret().as_bytes(), message.as_bytes());
    ApiSignature {
        message,
        signature: hex::encode(digest),
    }
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

/// Compute `(timestamp_ms, sign)` for the webhook query string.
///
/// The signed string is `"{timestamp_ms}\n{secret}"` keyed by the secret;
/// `sign` is already URL-encoded.
pub fn webhook_signature(secret: &SecretString, timestamp_ms: i64) -> (String, String) {
    let timestamp = timestamp_ms.to_string();
    let secret = secret.expose_secret();
    let string_to_sign = format!("{timestamp}\n{secret}");
    let digest = hmac_sha256(secret.as_bytes(), string_to_sign.as_bytes());
    let encoded = base64::engine::general_purpose::STANDARD.encode(digest);
    (timestamp, urlencoding::encode(&encoded).into_owned())
}

/// Append the signature parameters to a webhook URL.
pub fn signed_webhook_url(base: &str, secret: &SecretString, timestamp_ms: i64) -> String {
    let (timestamp, sign) = webhook_signature(secret, timestamp_ms);
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}timestamp={timestamp}&sign={sign}")
}
