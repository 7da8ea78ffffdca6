//! Hardware actor for the LED strip.
//!
//! Color updates and reconfigurations travel over one bounded queue of
//! [`QUEUE_CAPACITY`] entries to a dedicated consumer thread. That thread
//! owns the hardware; nothing else touches the strip. The network side only
//! ever waits on the queue, and always with a timeout: a full queue is
//! reported as busy, a slow reconfiguration as [`LedError::Timeout`].
//!
//! The consumer skips a refresh when the requested color equals the last
//! one it successfully applied; reconfiguring the strip forgets it.

pub mod hardware;
#[cfg(test)]
pub(crate) mod testing;

use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, oneshot, watch};

use self::hardware::{HardwareError, LedHardware, StripHandle};
use crate::model::{LedColor, LedConfig};

/// Pending requests the actor will hold before refusing more.
pub const QUEUE_CAPACITY: usize = 2;

#[derive(Debug, Error)]
pub enum LedError {
    #[error("LED not configured")]
    NotConfigured,

    #[error("LED queue busy")]
    QueueFull,

    #[error("LED actor has stopped")]
    QueueClosed,

    #[error("LED actor did not confirm the request in time")]
    Timeout,

    #[error("Invalid LED configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error("Failed to start LED actor thread: {0}")]
    Spawn(std::io::Error),

    #[error("LED actor thread panicked")]
    WorkerPanicked,
}

enum LedCommand {
    Apply(LedColor),
    Configure {
        config: LedConfig,
        reply: oneshot::Sender<Result<(), LedError>>,
    },
}

/// What the actor last published about the strip.
#[derive(Debug, Clone, Copy, Default)]
struct LedStatus {
    config: Option<LedConfig>,
    last_applied: Option<LedColor>,
}

// ── Actor ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Refreshed,
    Unchanged,
}

struct Actor {
    hardware: Box<dyn LedHardware>,
    strip: Option<Box<dyn StripHandle>>,
    config: Option<LedConfig>,
    last_applied: Option<LedColor>,
    status: watch::Sender<LedStatus>,
}

impl Actor {
    fn run(mut self, mut rx: mpsc::Receiver<LedCommand>) {
        while let Some(command) = rx.blocking_recv() {
            match command {
                LedCommand::Apply(color) => match self.apply(color) {
                    Ok(Applied::Refreshed) => tracing::debug!(?color, "LED strip refreshed"),
                    Ok(Applied::Unchanged) => {
                        tracing::trace!(?color, "LED color unchanged; skipped");
                    }
                    Err(e) => tracing::error!(error = %e, ?color, "Failed to apply LED color"),
                },
                LedCommand::Configure { config, reply } => {
                    let result = self.configure(config);
                    if let Err(e) = &result {
                        tracing::error!(error = %e, "Failed to create LED strip");
                    }
                    // The requester may have given up waiting.
                    let _ = reply.send(result);
                }
            }
        }

        self.strip = None;
        self.config = None;
        self.publish();
        tracing::debug!("LED queue closed; actor exiting");
    }

    fn publish(&self) {
        let (config, last_applied) = (self.config, self.last_applied);
        self.status.send_modify(|status| {
            *status = LedStatus {
                config,
                last_applied,
            };
        });
    }

    fn teardown(&mut self) {
        if let Some(mut strip) = self.strip.take() {
            if let Err(e) = strip.clear() {
                tracing::warn!(error = %e, "Failed to clear LED strip before release");
            }
        }
        self.config = None;
        self.last_applied = None;
        self.publish();
    }

    fn configure(&mut self, config: LedConfig) -> Result<(), LedError> {
        self.teardown();

        let strip = self.hardware.create(&config)?;
        self.strip = Some(strip);
        self.config = Some(config);
        self.publish();

        tracing::info!(
            pin = config.pin,
            pixels = config.pixel_count,
            variant = %config.variant,
            "LED strip configured"
        );
        Ok(())
    }

    fn apply(&mut self, color: LedColor) -> Result<Applied, LedError> {
        let (Some(strip), Some(config)) = (self.strip.as_mut(), self.config.as_ref()) else {
            return Err(LedError::NotConfigured);
        };

        if self.last_applied == Some(color) {
            return Ok(Applied::Unchanged);
        }

        let pixel = config.variant.layout().encode(color);
        for index in 0..config.pixel_count {
            strip.set_pixel(index, &pixel)?;
        }
        strip.flush()?;

        self.last_applied = Some(color);
        self.publish();
        Ok(Applied::Refreshed)
    }
}

// ── LedController ────────────────────────────────────────────────────

/// Cloneable front end of the LED actor.
///
/// The actor thread exits once every controller clone has been dropped;
/// [`LedWorker::join`] waits for that.
#[derive(Clone)]
pub struct LedController {
    queue: mpsc::Sender<LedCommand>,
    status: watch::Receiver<LedStatus>,
}

/// Owner of the actor thread.
pub struct LedWorker {
    thread: JoinHandle<()>,
}

impl LedController {
    /// Spawn the actor thread over `hardware`. The strip starts unconfigured.
    pub fn start(hardware: impl LedHardware) -> Result<(Self, LedWorker), LedError> {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (status_tx, status_rx) = watch::channel(LedStatus::default());
        let actor = Actor {
            hardware: Box::new(hardware),
            strip: None,
            config: None,
            last_applied: None,
            status: status_tx,
        };

        let thread = std::thread::Builder::new()
            .name("led-actor".into())
            .spawn(move || actor.run(rx))
            .map_err(LedError::Spawn)?;

        tracing::debug!(capacity = QUEUE_CAPACITY, "LED actor started");
        let controller = Self {
            queue: tx,
            status: status_rx,
        };
        Ok((controller, LedWorker { thread }))
    }

    /// Replace the strip with one built for `config`, waiting at most
    /// `timeout` for the actor to confirm.
    ///
    /// Any existing strip is cleared and released first. If allocation
    /// fails the controller is left unconfigured. On [`LedError::Timeout`]
    /// the request stays queued and the actor still carries it out.
    pub async fn configure(&self, config: LedConfig, timeout: Duration) -> Result<(), LedError> {
        if config.pixel_count == 0 {
            return Err(LedError::InvalidConfig {
                reason: "pixel count must be positive".into(),
            });
        }

        let (reply, answer) = oneshot::channel();
        let request = async {
            let queued = self.queue.send(LedCommand::Configure { config, reply }).await;
            if queued.is_err() {
                return Err(LedError::QueueClosed);
            }
            answer.await.unwrap_or(Err(LedError::QueueClosed))
        };

        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| LedError::Timeout)?
    }

    /// Queue `color`, waiting at most `timeout` for a free slot.
    pub async fn enqueue(&self, color: LedColor, timeout: Duration) -> Result<(), LedError> {
        if !self.is_configured() {
            return Err(LedError::NotConfigured);
        }
        self.queue
            .send_timeout(LedCommand::Apply(color), timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => LedError::QueueFull,
                SendTimeoutError::Closed(_) => LedError::QueueClosed,
            })
    }

    pub fn is_configured(&self) -> bool {
        self.status.borrow().config.is_some()
    }

    pub fn config(&self) -> Option<LedConfig> {
        self.status.borrow().config
    }

    /// The color most recently pushed to the strip, if any.
    pub fn last_applied(&self) -> Option<LedColor> {
        self.status.borrow().last_applied
    }
}

impl LedWorker {
    /// Block until the actor thread exits.
    pub fn join(self) -> Result<(), LedError> {
        self.thread.join().map_err(|_| LedError::WorkerPanicked)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
