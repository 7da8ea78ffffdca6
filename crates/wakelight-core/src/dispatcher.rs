//! Command dispatch: one complete inbound message in, one outcome out.
//!
//! The dispatcher never touches the connection. It hands a
//! [`DispatchOutcome`] back to the session, which sends the reply or
//! schedules the reconnect.

use std::sync::Arc;
use std::time::Duration;

use wakelight_api::WakeSender;

use crate::command::{Command, ConfigResponse, Reply, messages};
use crate::led::{LedController, LedError};
use crate::model::{LedColor, LedConfig, MacAddress, StripVariant};

/// What the session should do after a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Send this reply on the current connection.
    Reply(Reply),
    /// Drop the connection on the next tick so the server resends config.
    ForceReconnect,
    /// Nothing to send.
    Silent,
}

/// Routes decoded commands to the LED actor and the wake sender.
///
/// `enqueue_timeout` bounds every hand-off to the LED actor, colour updates
/// and reconfigurations alike.
pub struct Dispatcher {
    led: LedController,
    wake: Arc<dyn WakeSender>,
    enqueue_timeout: Duration,
}

impl Dispatcher {
    pub fn new(led: LedController, wake: Arc<dyn WakeSender>, enqueue_timeout: Duration) -> Self {
        Self {
            led,
            wake,
            enqueue_timeout,
        }
    }

    pub fn led(&self) -> &LedController {
        &self.led
    }

    /// Dispatch a reassembled payload. Non-UTF-8 bytes count as invalid JSON.
    pub async fn dispatch_bytes(&self, payload: &[u8]) -> DispatchOutcome {
        match std::str::from_utf8(payload) {
            Ok(text) => self.dispatch(text).await,
            Err(e) => {
                tracing::warn!(error = %e, len = payload.len(), "Payload is not valid UTF-8");
                DispatchOutcome::Reply(Reply::error(None, messages::INVALID_JSON))
            }
        }
    }

    pub async fn dispatch(&self, text: &str) -> DispatchOutcome {
        let command = Command::parse(text);
        tracing::info!(action = ?command.action(), "Command received");
        tracing::debug!(payload = text, "Command payload");

        match command {
            Command::Malformed => {
                tracing::warn!("Invalid JSON payload");
                DispatchOutcome::Reply(Reply::error(None, messages::INVALID_JSON))
            }
            Command::MissingAction(cfg) => {
                if cfg.is_config_incomplete() {
                    tracing::warn!("Server reported config_incomplete; forcing reconnect");
                    DispatchOutcome::ForceReconnect
                } else {
                    DispatchOutcome::Reply(Reply::error(None, messages::MISSING_ACTION))
                }
            }
            Command::Wol { mac } => DispatchOutcome::Reply(self.handle_wol(mac.as_deref())),
            Command::Led { r, g, b, w } => DispatchOutcome::Reply(self.handle_led(r, g, b, w).await),
            Command::Ping => DispatchOutcome::Reply(Reply::Pong),
            Command::Config(cfg) => self.handle_config(&cfg).await,
            Command::Unknown { action } => {
                tracing::warn!(action = %action, "Unsupported action");
                DispatchOutcome::Reply(Reply::error(Some(action.as_str()), messages::UNSUPPORTED_ACTION))
            }
        }
    }

    // ── wol ──────────────────────────────────────────────────────────

    fn handle_wol(&self, mac: Option<&str>) -> Reply {
        let Some(raw) = mac else {
            return Reply::error(Some("wol"), messages::INVALID_OR_MISSING_MAC);
        };
        let target: MacAddress = match raw.parse() {
            Ok(mac) => mac,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected wake request");
                return Reply::error(Some("wol"), messages::INVALID_MAC_FORMAT);
            }
        };

        if let Err(e) = self.wake.send_wake(target.octets()) {
            tracing::error!(target = %target, error = %e, "Failed to send WoL packet");
            return Reply::error(Some("wol"), messages::WOL_SEND_FAILED);
        }

        tracing::info!(target = %target, "WoL packet sent");
        Reply::WolSent { target }
    }

    // ── led ──────────────────────────────────────────────────────────

    async fn handle_led(
        &self,
        r: Option<f64>,
        g: Option<f64>,
        b: Option<f64>,
        w: Option<f64>,
    ) -> Reply {
        if !self.led.is_configured() {
            return Reply::error(Some("led"), messages::LED_NOT_CONFIGURED);
        }

        let (Some(red), Some(green), Some(blue)) =
            (rgb_channel(r), rgb_channel(g), rgb_channel(b))
        else {
            return Reply::InvalidRgb;
        };
        let color = LedColor::rgbw(red, green, blue, w.map_or(0, white_channel));

        match self.led.enqueue(color, self.enqueue_timeout).await {
            Ok(()) => Reply::LedApplied {
                color,
                include_white: w.is_some(),
            },
            Err(LedError::NotConfigured) => {
                Reply::error(Some("led"), messages::LED_NOT_CONFIGURED)
            }
            Err(LedError::QueueFull) => {
                tracing::warn!("LED queue full; update dropped");
                Reply::error(Some("led"), messages::LED_QUEUE_BUSY)
            }
            Err(e) => {
                tracing::error!(error = %e, "LED actor unavailable; update dropped");
                Reply::error(Some("led"), messages::LED_QUEUE_BUSY)
            }
        }
    }

    // ── config ───────────────────────────────────────────────────────

    async fn handle_config(&self, cfg: &ConfigResponse) -> DispatchOutcome {
        match cfg.status.as_deref() {
            None => {
                tracing::warn!("Invalid config response: missing status");
                DispatchOutcome::Silent
            }
            Some("ok") => {
                let config = match led_config_from(cfg) {
                    Ok(config) => config,
                    Err(reason) => {
                        tracing::warn!(reason = %reason, "Invalid LED config from server; forcing reconnect");
                        return DispatchOutcome::ForceReconnect;
                    }
                };
                match self.led.configure(config, self.enqueue_timeout).await {
                    Ok(()) => DispatchOutcome::Silent,
                    Err(e) => {
                        tracing::error!(error = %e, "LED configure failed; forcing reconnect");
                        DispatchOutcome::ForceReconnect
                    }
                }
            }
            Some("error") => {
                if cfg.is_config_incomplete() {
                    tracing::warn!("Server reported config_incomplete; forcing reconnect");
                    return DispatchOutcome::ForceReconnect;
                }
                match cfg.error.as_deref() {
                    Some(error) => tracing::warn!(error, "Server returned config error"),
                    None => tracing::warn!("Server returned unknown config error"),
                }
                DispatchOutcome::Silent
            }
            Some(other) => {
                tracing::warn!(status = other, "Unhandled config status");
                DispatchOutcome::Silent
            }
        }
    }
}

// ── Field conversion ─────────────────────────────────────────────────

/// `r`/`g`/`b` must lie in `[0, 255]`; fractions are truncated.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn rgb_channel(value: Option<f64>) -> Option<u8> {
    value
        .filter(|v| (0.0..=255.0).contains(v))
        .map(|v| v.trunc() as u8)
}

/// `w` is lenient: out-of-range values saturate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn white_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn led_config_from(cfg: &ConfigResponse) -> Result<LedConfig, String> {
    let u32_max = f64::from(u32::MAX);

    let pixel_count = cfg
        .led_count
        .map(f64::trunc)
        .filter(|n| *n >= 1.0 && *n <= u32_max)
        .ok_or_else(|| format!("ledCount must be a positive number, got {:?}", cfg.led_count))?
        as usize;

    let pin = cfg
        .led_pin
        .map(f64::trunc)
        .filter(|n| *n >= 0.0 && *n <= u32_max)
        .ok_or_else(|| format!("ledPin must be a non-negative number, got {:?}", cfg.led_pin))?
        as u32;

    let variant = match cfg.led_type.as_deref() {
        None => StripVariant::default(),
        Some(name) => name
            .parse()
            .map_err(|_| format!("unknown ledType '{name}'"))?,
    };

    Ok(LedConfig {
        pin,
        pixel_count,
        variant,
    })
}

// ── Tests ────────────────────────────────────────────────────────────
