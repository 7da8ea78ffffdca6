// ── Runtime session configuration ──
//
// These types describe *how* the session runs: where to connect, who we
// are, and how hard to retry. They carry the shared secret but never
// touch disk. The binary builds a `SessionConfig` from the config file.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use wakelight_api::{TransportConfig, UdpWakeSender};

use crate::model::MacAddress;
use crate::reassembly::DEFAULT_MAX_MESSAGE_LEN;

/// Identity reported in the auth frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Prefix of the auth token.
    pub name: String,
    /// Reported MAC; all zeroes when `None`.
    pub mac: Option<MacAddress>,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            name: "esp32".into(),
            mac: None,
        }
    }
}

/// Reconnect pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    /// Period of the supervision loop.
    pub tick: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_backoff: Duration::from_millis(2_000),
            max_backoff: Duration::from_millis(30_000),
            tick: Duration::from_millis(1_000),
        }
    }
}

/// LED actor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedSettings {
    /// How long a `led` command waits for a queue slot.
    pub enqueue_timeout: Duration,
    /// Largest strip the driver will allocate.
    pub max_pixels: usize,
}

impl Default for LedSettings {
    fn default() -> Self {
        Self {
            enqueue_timeout: Duration::from_millis(100),
            max_pixels: 1024,
        }
    }
}

/// Everything the session needs to run against one server.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server endpoint (`ws://` or `wss://`).
    pub url: Url,
    /// HMAC key for the auth frame.
    pub secret: SecretString,
    pub device: DeviceIdentity,
    pub reconnect: ReconnectConfig,
    pub transport: TransportConfig,
    pub led: LedSettings,
    /// Destination of Wake-on-LAN packets.
    pub wol_target: SocketAddr,
    /// Largest inbound message the reassembler accepts.
    pub max_message_len: usize,
}

impl SessionConfig {
    /// A config for `url` with every tunable at its default.
    pub fn new(url: Url, secret: SecretString) -> Self {
        Self {
            url,
            secret,
            device: DeviceIdentity::default(),
            reconnect: ReconnectConfig::default(),
            transport: TransportConfig::default(),
            led: LedSettings::default(),
            wol_target: UdpWakeSender::default().target(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}
