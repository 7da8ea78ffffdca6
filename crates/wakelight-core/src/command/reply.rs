use serde::Serialize;

use crate::model::{LedColor, MacAddress};

/// Human-readable error texts carried in `message` replies.
pub mod messages {
    pub const INVALID_JSON: &str = "Invalid JSON payload";
    pub const MISSING_ACTION: &str = "Missing action";
    pub const UNSUPPORTED_ACTION: &str = "Unsupported action";
    pub const INVALID_OR_MISSING_MAC: &str = "Invalid or missing mac";
    pub const INVALID_MAC_FORMAT: &str = "Invalid mac format";
    pub const WOL_SEND_FAILED: &str = "Failed to send WoL packet";
    pub const LED_NOT_CONFIGURED: &str = "LED not configured";
    pub const LED_QUEUE_BUSY: &str = "LED queue busy";
}

/// An outbound reply to a server command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Pong,
    WolSent {
        target: MacAddress,
    },
    /// `include_white` mirrors whether the request carried a numeric `w`.
    LedApplied {
        color: LedColor,
        include_white: bool,
    },
    /// Bad or missing `r`/`g`/`b`. Uses an `error` key instead of `message`
    /// to stay wire compatible with existing servers.
    InvalidRgb,
    Error {
        action: Option<String>,
        message: String,
    },
}

#[derive(Serialize, Default)]
struct WireReply<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
    #[serde(rename = "targetMac", skip_serializing_if = "Option::is_none")]
    target_mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    r: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    g: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    b: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    w: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Reply {
    pub fn error(action: Option<&str>, message: &str) -> Self {
        Self::Error {
            action: action.map(str::to_owned),
            message: message.to_owned(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let wire = match self {
            Self::Pong => WireReply {
                status: "ok",
                action: Some("pong"),
                ..WireReply::default()
            },
            Self::WolSent { target } => WireReply {
                status: "ok",
                action: Some("wol"),
                target_mac: Some(target.to_string()),
                ..WireReply::default()
            },
            Self::LedApplied {
                color,
                include_white,
            } => WireReply {
                status: "ok",
                action: Some("led"),
                r: Some(color.red),
                g: Some(color.green),
                b: Some(color.blue),
                w: include_white.then_some(color.white),
                ..WireReply::default()
            },
            Self::InvalidRgb => WireReply {
                status: "error",
                action: Some("led"),
                error: Some("invalid_rgb"),
                ..WireReply::default()
            },
            Self::Error { action, message } => WireReply {
                status: "error",
                action: action.as_deref(),
                message: Some(message.as_str()),
                ..WireReply::default()
            },
        };
        serde_json::to_string(&wire)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn ok_replies() {
        assert_snapshot!(Reply::Pong.to_json().unwrap(), @r#"{"status":"ok","action":"pong"}"#);
        assert_snapshot!(
            Reply::WolSent { target: MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]) }
                .to_json()
                .unwrap(),
            @r#"{"status":"ok","action":"wol","targetMac":"AA:BB:CC:DD:EE:FF"}"#
        );
    }

    #[test]
    fn led_reply_echoes_white_only_when_requested() {
        let color = LedColor::rgbw(10, 20, 30, 0);
        assert_snapshot!(
            Reply::LedApplied { color, include_white: false }.to_json().unwrap(),
            @r#"{"status":"ok","action":"led","r":10,"g":20,"b":30}"#
        );
        assert_snapshot!(
            Reply::LedApplied { color, include_white: true }.to_json().unwrap(),
            @r#"{"status":"ok","action":"led","r":10,"g":20,"b":30,"w":0}"#
        );
    }

    #[test]
    fn error_replies() {
        assert_snapshot!(
            Reply::InvalidRgb.to_json().unwrap(),
            @r#"{"status":"error","action":"led","error":"invalid_rgb"}"#
        );
        assert_snapshot!(
            Reply::error(None, messages::INVALID_JSON).to_json().unwrap(),
            @r#"{"status":"error","message":"Invalid JSON payload"}"#
        );
        assert_snapshot!(
            Reply::error(Some("reboot"), messages::UNSUPPORTED_ACTION).to_json().unwrap(),
            @r#"{"status":"error","action":"reboot","message":"Unsupported action"}"#
        );
    }
}
