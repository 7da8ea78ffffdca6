// ── Server command decoding ──
//
// Inbound frames are JSON objects keyed by `action`. Decoding is lenient
// about field types: a field of the wrong JSON type reads as absent, and
// the dispatcher decides what an absent field means for each action.

mod reply;

pub use reply::{Reply, messages};

use serde_json::{Map, Value};

/// Error code the server uses when this device has no LED config yet.
pub const CONFIG_INCOMPLETE: &str = "config_incomplete";

/// The `config` payload pushed by the server, fields as found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigResponse {
    pub status: Option<String>,
    pub led_count: Option<f64>,
    pub led_pin: Option<f64>,
    pub led_type: Option<String>,
    pub error: Option<String>,
}

impl ConfigResponse {
    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            status: string_field(obj, "status"),
            led_count: number_field(obj, "ledCount"),
            led_pin: number_field(obj, "ledPin"),
            led_type: string_field(obj, "ledType"),
            error: string_field(obj, "error"),
        }
    }

    /// `true` when the `error` field is `config_incomplete`.
    pub fn is_config_incomplete(&self) -> bool {
        self.error.as_deref() == Some(CONFIG_INCOMPLETE)
    }
}

/// A decoded server message.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send a Wake-on-LAN packet. `mac` is `None` when absent or not a string.
    Wol { mac: Option<String> },
    /// Set the whole strip to one color. Channels are `None` unless numeric.
    Led {
        r: Option<f64>,
        g: Option<f64>,
        b: Option<f64>,
        w: Option<f64>,
    },
    Ping,
    /// Reply to our `get_config` request.
    Config(ConfigResponse),
    /// An action this device does not implement.
    Unknown { action: String },
    /// No string `action`. Carries the config fields in case this is an
    /// action-less error reply to `get_config`.
    MissingAction(ConfigResponse),
    /// Not a JSON object.
    Malformed,
}

impl Command {
    /// Decode one complete text message.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::Malformed,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::Malformed;
        };

        let Some(action) = obj.get("action").and_then(Value::as_str) else {
            return Self::MissingAction(ConfigResponse::from_object(obj));
        };

        match action {
            "wol" => Self::Wol {
                mac: string_field(obj, "mac"),
            },
            "led" => Self::Led {
                r: number_field(obj, "r"),
                g: number_field(obj, "g"),
                b: number_field(obj, "b"),
                w: number_field(obj, "w"),
            },
            "ping" => Self::Ping,
            "config" => Self::Config(ConfigResponse::from_object(obj)),
            other => Self::Unknown {
                action: other.to_owned(),
            },
        }
    }

    /// The wire action name, when there is one.
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Wol { .. } => Some("wol"),
            Self::Led { .. } => Some("led"),
            Self::Ping => Some("ping"),
            Self::Config(_) => Some("config"),
            Self::Unknown { action } => Some(action),
            Self::MissingAction(_) | Self::Malformed => None,
        }
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}
