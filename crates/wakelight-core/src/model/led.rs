use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// An RGB(W) color with 8-bit channels. `white` is ignored by 3-channel strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LedColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
}

impl LedColor {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white: 0,
        }
    }

    pub const fn rgbw(red: u8, green: u8, blue: u8, white: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white,
        }
    }

    pub const fn channel(self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
            Channel::White => self.white,
        }
    }
}

/// One color component on the wire to the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    White,
}

/// Per-pixel byte order a strip chip expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    order: &'static [Channel],
}

impl ChannelLayout {
    pub const GRB: Self = Self {
        order: &[Channel::Green, Channel::Red, Channel::Blue],
    };

    pub const GRBW: Self = Self {
        order: &[Channel::Green, Channel::Red, Channel::Blue, Channel::White],
    };

    /// Bytes per pixel.
    pub const fn channels(&self) -> usize {
        self.order.len()
    }

    pub const fn order(&self) -> &'static [Channel] {
        self.order
    }

    /// Encode `color` into this layout's byte order.
    pub fn encode(&self, color: LedColor) -> Vec<u8> {
        self.order.iter().map(|&ch| color.channel(ch)).collect()
    }
}

/// Supported strip chips. Wire names are lowercase (`"ws2812b"`, `"sk6812"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StripVariant {
    /// 3-channel GRB.
    #[default]
    Ws2812b,
    /// 4-channel GRBW.
    Sk6812,
}

impl StripVariant {
    pub const fn layout(self) -> ChannelLayout {
        match self {
            Self::Ws2812b => ChannelLayout::GRB,
            Self::Sk6812 => ChannelLayout::GRBW,
        }
    }
}

/// Strip geometry as pushed by the server's config response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedConfig {
    pub pin: u32,
    pub pixel_count: usize,
    pub variant: StripVariant,
}
