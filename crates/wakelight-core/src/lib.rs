// wakelight-core: session and protocol engine between the wire and the hardware.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod led;
pub mod model;
pub mod reassembly;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, ConfigResponse, Reply};
pub use config::{DeviceIdentity, LedSettings, ReconnectConfig, SessionConfig};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::CoreError;
pub use led::hardware::{HardwareError, LedHardware, SimulatedHardware, StripHandle, StripStats};
pub use led::{LedController, LedError, LedWorker};
pub use model::{Channel, ChannelLayout, LedColor, LedConfig, MacAddress, StripVariant};
pub use reassembly::{Reassembler, ReassemblyError};
pub use session::{Backoff, ConnectionState, Session, SessionHandle};
