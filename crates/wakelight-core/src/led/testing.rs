//! Hardware doubles for unit tests.
#![allow(clippy::unwrap_used)]

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::hardware::{HardwareError, LedHardware, StripHandle};
use crate::model::LedConfig;

/// Hardware whose flushes park until the paired [`Gate`] is dropped.
pub(crate) struct GatedHardware {
    entered: std_mpsc::Sender<()>,
    release: Arc<Mutex<std_mpsc::Receiver<()>>>,
}

/// Test side of [`GatedHardware`]. Dropping it lets every flush through.
pub(crate) struct Gate {
    entered: std_mpsc::Receiver<()>,
    _release: std_mpsc::Sender<()>,
}

impl GatedHardware {
    pub(crate) fn new() -> (Self, Gate) {
        let (entered_tx, entered_rx) = std_mpsc::channel();
        let (release_tx, release_rx) = std_mpsc::channel();
        let hardware = Self {
            entered: entered_tx,
            release: Arc::new(Mutex::new(release_rx)),
        };
        let gate = Gate {
            entered: entered_rx,
            _release: release_tx,
        };
        (hardware, gate)
    }
}

impl Gate {
    /// Block until the actor is parked inside a flush.
    pub(crate) fn wait_for_flush(&self) {
        self.entered.recv_timeout(Duration::from_secs(2)).unwrap();
    }
}

struct GatedStrip {
    entered: std_mpsc::Sender<()>,
    release: Arc<Mutex<std_mpsc::Receiver<()>>>,
}

impl LedHardware for GatedHardware {
    fn create(&mut self, _: &LedConfig) -> Result<Box<dyn StripHandle>, HardwareError> {
        Ok(Box::new(GatedStrip {
            entered: self.entered.clone(),
            release: Arc::clone(&self.release),
        }))
    }
}

impl StripHandle for GatedStrip {
    fn set_pixel(&mut self, _: usize, _: &[u8]) -> Result<(), HardwareError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), HardwareError> {
        let _ = self.entered.send(());
        let _ = self.release.lock().unwrap().recv();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }
}
