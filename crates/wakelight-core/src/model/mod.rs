// ── Domain model ──
//
// Value types shared by the dispatcher, the LED actor and the session.

pub mod led;
pub mod mac;

pub use led::{Channel, ChannelLayout, LedColor, LedConfig, StripVariant};
pub use mac::{MacAddress, MacParseError};
