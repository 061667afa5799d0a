//! Bearer token inspection.
//!
//! Tokens issued by the backend are compact JWTs. The client never verifies
//! signatures; it only reads the `exp` claim to know when to drop the session.

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token is not a JWT (expected header.payload.signature)")]
    InvalidFormat,

    #[error("token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token has no usable exp claim")]
    MissingExpiry,
}

#[derive(Deserialize)]
struct ExpiryClaims {
    #[serde(default)]
    exp: Option<f64>,
}

/// Read the expiry instant from a JWT's `exp` claim (seconds since epoch).
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let mut parts = token.trim().split('.');
    let payload_b64 = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => p,
        _ => return Err(TokenError::InvalidFormat),
    };

    // Some issuers keep the padding; the no-pad engine rejects it.
    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64.trim_end_matches('='))?;
    let claims: ExpiryClaims = serde_json::from_slice(&payload_bytes)?;

    let exp = claims
        .exp
        .filter(|exp| exp.is_finite())
        .ok_or(TokenError::MissingExpiry)?;
    let millis = (exp * 1000.0) as i64;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(TokenError::MissingExpiry)
}
