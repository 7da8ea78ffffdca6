use thiserror::Error;

/// Top-level error type for the `wakelight-api` crate.
///
/// Covers the collaborators the session engine talks to: the WebSocket
/// transport, auth signing, and the Wake-on-LAN sender.
/// `wakelight-core` maps these into its own error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The endpoint is not a WebSocket URL.
    #[error("Unsupported URL scheme '{scheme}' (expected ws or wss)")]
    UnsupportedScheme { scheme: String },

    /// WebSocket handshake or read failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// Handshake did not finish within the connect timeout.
    #[error("WebSocket connect timed out after {timeout_secs}s")]
    ConnectTimeout { timeout_secs: u64 },

    /// A send was attempted while no connection is established.
    #[error("Not connected")]
    NotConnected,

    /// The outbound queue of the current connection is gone.
    #[error("Send failed: {0}")]
    Send(String),

    // ── Auth ────────────────────────────────────────────────────────
    /// The shared secret could not be used as an HMAC key.
    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),

    // ── Wake-on-LAN ─────────────────────────────────────────────────
    /// Socket creation or `sendto` failed.
    #[error("Wake-on-LAN send failed: {0}")]
    Wol(#[from] std::io::Error),

    /// The kernel accepted fewer bytes than the magic packet holds.
    #[error("Short Wake-on-LAN write: sent {sent} of {expected} bytes")]
    ShortWrite { sent: usize, expected: usize },
}

impl Error {
    /// Returns `true` if this is a connection-level error that the
    /// reconnect loop is expected to recover from.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::WebSocketConnect(_)
                | Self::ConnectTimeout { .. }
                | Self::NotConnected
                | Self::Send(_)
        )
    }
}
