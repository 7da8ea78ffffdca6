// ── Strip driver seam ──
//
// `LedHardware` creates strips; a `StripHandle` owns one until dropped.
// `SimulatedHardware` is the in-process driver used on hosts without a
// real strip attached, and records what it was asked to show.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::model::LedConfig;

/// Default pixel ceiling for the simulated driver.
pub const DEFAULT_MAX_PIXELS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    #[error("Cannot allocate {pixel_count} pixel strip on pin {pin}: {reason}")]
    Allocation {
        pin: u32,
        pixel_count: usize,
        reason: String,
    },

    #[error("Pixel index {index} out of range for {pixel_count} pixel strip")]
    PixelOutOfRange { index: usize, pixel_count: usize },

    #[error("Expected {expected} channel bytes per pixel, got {got}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("Strip refresh failed: {0}")]
    Flush(String),
}

/// Factory for strip handles.
pub trait LedHardware: Send + 'static {
    /// Allocate a strip for `config`. The previous handle, if any, has
    /// already been cleared and dropped.
    fn create(&mut self, config: &LedConfig) -> Result<Box<dyn StripHandle>, HardwareError>;
}

/// One allocated strip. Dropping the handle releases it.
pub trait StripHandle: Send {
    /// Stage one pixel; `channels` is already in the strip's byte order.
    fn set_pixel(&mut self, index: usize, channels: &[u8]) -> Result<(), HardwareError>;

    /// Push staged pixels to the strip.
    fn flush(&mut self) -> Result<(), HardwareError>;

    /// Turn every pixel off.
    fn clear(&mut self) -> Result<(), HardwareError>;
}

// ── Simulated driver ─────────────────────────────────────────────────

/// Counters and the last flushed frame of a [`SimulatedHardware`].
#[derive(Debug, Clone, Default)]
pub struct StripStats {
    creates: Arc<AtomicU64>,
    flushes: Arc<AtomicU64>,
    frame: Arc<Mutex<Vec<u8>>>,
}

impl StripStats {
    /// Strips allocated so far.
    pub fn creates(&self) -> u64 {
        self.creates.load(Ordering::SeqCst)
    }

    /// Successful refreshes across all strips.
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Raw bytes of the most recent refresh (or clear).
    pub fn frame(&self) -> Vec<u8> {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_frame(&self, frame: &[u8]) {
        let mut guard = self.frame.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clear();
        guard.extend_from_slice(frame);
    }
}

/// Host-side stand-in for the RMT strip driver.
#[derive(Debug, Clone)]
pub struct SimulatedHardware {
    max_pixels: usize,
    stats: StripStats,
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PIXELS)
    }
}

impl SimulatedHardware {
    pub fn new(max_pixels: usize) -> Self {
        Self {
            max_pixels,
            stats: StripStats::default(),
        }
    }

    pub fn stats(&self) -> StripStats {
        self.stats.clone()
    }
}

impl LedHardware for SimulatedHardware {
    fn create(&mut self, config: &LedConfig) -> Result<Box<dyn StripHandle>, HardwareError> {
        if config.pixel_count > self.max_pixels {
            return Err(HardwareError::Allocation {
                pin: config.pin,
                pixel_count: config.pixel_count,
                reason: format!("driver supports at most {} pixels", self.max_pixels),
            });
        }

        let channels = config.variant.layout().channels();
        self.stats.creates.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            pin = config.pin,
            pixels = config.pixel_count,
            variant = %config.variant,
            "Simulated strip allocated"
        );

        Ok(Box::new(SimulatedStrip {
            channels,
            pixels: vec![0; config.pixel_count * channels],
            stats: self.stats.clone(),
        }))
    }
}

struct SimulatedStrip {
    channels: usize,
    pixels: Vec<u8>,
    stats: StripStats,
}

impl StripHandle for SimulatedStrip {
    fn set_pixel(&mut self, index: usize, channels: &[u8]) -> Result<(), HardwareError> {
        if channels.len() != self.channels {
            return Err(HardwareError::ChannelMismatch {
                expected: self.channels,
                got: channels.len(),
            });
        }
        let pixel_count = self.pixels.len() / self.channels;
        let start = index.saturating_mul(self.channels);
        let slot = self
            .pixels
            .get_mut(start..start.saturating_add(self.channels))
            .ok_or(HardwareError::PixelOutOfRange { index, pixel_count })?;
        slot.copy_from_slice(channels);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), HardwareError> {
        self.stats.record_frame(&self.pixels);
        self.stats.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HardwareError> {
        self.pixels.fill(0);
        self.stats.record_frame(&self.pixels);
        Ok(())
    }
}
