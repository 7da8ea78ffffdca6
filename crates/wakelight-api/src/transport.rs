// Transport seam between the session engine and the wire.
//
// Shaped after an embedded WebSocket client: `start` kicks off a
// connection attempt in the background, lifecycle changes and inbound
// data arrive as events on a channel, and nothing reconnects on its own.
// Inbound messages are delivered as fragments no larger than the
// receive buffer, each tagged with its offset into the whole payload.

use std::time::Duration;

use bytes::Bytes;

use crate::error::Error;

/// Default receive buffer size, in bytes.
pub const DEFAULT_RX_BUFFER_SIZE: usize = 1024;

/// Capacity of the transport → session event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

// ── Events ───────────────────────────────────────────────────────────

/// One piece of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Byte offset of `data` inside the complete payload.
    pub payload_offset: usize,
    /// Length of the complete payload this fragment belongs to.
    pub payload_len: usize,
    pub data: Bytes,
    /// `true` for text frames, `false` for binary.
    pub is_text: bool,
}

/// Notifications delivered by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Error(String),
    Data(Fragment),
}

// ── Transport trait ──────────────────────────────────────────────────

/// A single outbound connection driven by the session manager.
///
/// All methods are non-blocking. `start` begins an attempt whose outcome
/// is reported through the event channel handed out at construction.
pub trait Transport: Send {
    /// Begin a connection attempt in the background.
    fn start(&mut self);

    /// Tear down the current connection (or attempt), if any.
    fn stop(&mut self);

    /// Whether the handshake completed and the link is still up.
    fn is_connected(&self) -> bool;

    /// Queue a text frame on the current connection.
    fn send_text(&self, payload: &str) -> Result<(), Error>;
}

// ── TransportConfig ──────────────────────────────────────────────────

/// Tuning for the WebSocket transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Largest fragment handed to the session, in bytes. Default: 1024.
    pub rx_buffer_size: usize,

    /// Upper bound on the opening handshake. Default: 10s.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            rx_buffer_size: DEFAULT_RX_BUFFER_SIZE,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

// ── Fragmentation ────────────────────────────────────────────────────

/// Split a complete payload into receive-buffer-sized fragments.
///
/// An empty payload still yields one (empty) fragment so the receiver
/// sees that a frame arrived.
pub fn fragment_payload(payload: &Bytes, is_text: bool, max_fragment: usize) -> Vec<Fragment> {
    let payload_len = payload.len();
    if payload_len == 0 {
        return vec![Fragment {
            payload_offset: 0,
            payload_len: 0,
            data: Bytes::new(),
            is_text,
        }];
    }

    let step = max_fragment.max(1);
    (0..payload_len)
        .step_by(step)
        .map(|offset| {
            let end = (offset + step).min(payload_len);
            Fragment {
                payload_offset: offset,
                payload_len,
                data: payload.slice(offset..end),
                is_text,
            }
        })
        .collect()
}
