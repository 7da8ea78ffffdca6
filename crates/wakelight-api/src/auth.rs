// ── Session authentication ──
//
// The first frame on every connection proves possession of the shared
// secret: a time-stamped token plus its HMAC-SHA256, hex encoded.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// MAC reported when the device could not determine its own.
pub const UNKNOWN_DEVICE_MAC: &str = "00:00:00:00:00:00";

/// Build the auth token: `<device-name>-<unix seconds>`.
pub fn make_token(device_name: &str, now: DateTime<Utc>) -> String {
    format!("{device_name}-{}", now.timestamp())
}

/// Lowercase hex HMAC-SHA256 of `token` keyed by `secret` (64 chars).
pub fn sign(token: &str, secret: &SecretString) -> Result<String, Error> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| Error::InvalidKey(e.to_string()))?;
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Derive the token for `now` and sign it.
pub fn compute_auth_token_and_hmac(
    device_name: &str,
    secret: &SecretString,
    now: DateTime<Utc>,
) -> Result<(String, String), Error> {
    let token = make_token(device_name, now);
    let hmac = sign(&token, secret)?;
    Ok((token, hmac))
}

/// The `{token, hmac, mac}` frame sent right after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthMessage {
    pub token: String,
    pub hmac: String,
    pub mac: String,
}

impl AuthMessage {
    /// Build the auth frame for this device at `now`.
    ///
    /// A missing device MAC is reported as all zeroes.
    pub fn new(
        device_name: &str,
        device_mac: Option<&str>,
        secret: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let (token, hmac) = compute_auth_token_and_hmac(device_name, secret, now)?;
        Ok(Self {
            token,
            hmac,
            mac: device_mac.unwrap_or(UNKNOWN_DEVICE_MAC).to_owned(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
