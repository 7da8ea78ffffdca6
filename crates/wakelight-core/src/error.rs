// ── Core error types ──
//
// Errors surfaced by the session engine. Transport-layer failures from
// wakelight-api are folded into connection-level variants by the
// `From<wakelight_api::Error>` impl, so callers never match on socket
// details.

use thiserror::Error;

use crate::led::LedError;
use crate::model::mac::MacParseError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Not connected to server")]
    NotConnected,

    #[error("Send failed: {reason}")]
    SendFailed { reason: String },

    #[error("Authentication setup failed: {message}")]
    Auth { message: String },

    // ── Message errors ───────────────────────────────────────────────
    #[error(transparent)]
    InvalidMac(#[from] MacParseError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Hardware errors ──────────────────────────────────────────────
    #[error(transparent)]
    Led(#[from] LedError),

    #[error("Wake-on-LAN failed: {message}")]
    WakeFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<wakelight_api::Error> for CoreError {
    fn from(err: wakelight_api::Error) -> Self {
        match err {
            wakelight_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            wakelight_api::Error::UnsupportedScheme { scheme } => CoreError::Config {
                message: format!("Unsupported URL scheme '{scheme}' (expected ws or wss)"),
            },
            wakelight_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason,
            },
            wakelight_api::Error::ConnectTimeout { timeout_secs } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("handshake timed out after {timeout_secs}s"),
            },
            wakelight_api::Error::NotConnected => CoreError::NotConnected,
            wakelight_api::Error::Send(reason) => CoreError::SendFailed { reason },
            wakelight_api::Error::InvalidKey(message) => CoreError::Auth { message },
            e @ (wakelight_api::Error::Wol(_) | wakelight_api::Error::ShortWrite { .. }) => {
                CoreError::WakeFailed {
                    message: e.to_string(),
                }
            }
        }
    }
}
