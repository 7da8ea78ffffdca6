use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The input did not look like six hex-pair bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid MAC address '{input}' (expected AA:BB:CC:DD:EE:FF, AA-BB-CC-DD-EE-FF or AABBCCDDEEFF)")]
pub struct MacParseError {
    pub input: String,
}

/// A 48-bit hardware address.
///
/// Parses colon-separated, hyphen-separated and bare hex forms, each with
/// exactly two hex digits per byte and either letter case. Always renders
/// as uppercase and colon-separated, which is also the form echoed back to
/// the server in wake replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(self) -> [u8; 6] {
        self.0
    }
}

fn parse_pair(pair: &str) -> Option<u8> {
    if pair.len() != 2 || !pair.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(pair, 16).ok()
}

fn parse_groups<'a>(groups: impl Iterator<Item = &'a str>) -> Option<[u8; 6]> {
    let mut octets = [0u8; 6];
    let mut count = 0;
    for group in groups {
        let slot = octets.get_mut(count)?;
        *slot = parse_pair(group)?;
        count += 1;
    }
    (count == 6).then_some(octets)
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MacParseError {
            input: s.to_owned(),
        };

        let octets = if s.contains(':') {
            parse_groups(s.split(':'))
        } else if s.contains('-') {
            parse_groups(s.split('-'))
        } else if s.len() == 12 && s.is_ascii() {
            parse_groups((0..12).step_by(2).filter_map(|i| s.get(i..i + 2)))
        } else {
            None
        };

        octets.map(Self).ok_or_else(err)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{octet:02X}")?;
        }
        Ok(())
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const OCTETS: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

    #[test]
    fn parses_all_three_encodings() {
        for input in ["AA:BB:CC:DD:EE:FF", "aa-bb-cc-dd-ee-ff", "AaBbCcDdEeFf"] {
            let mac: MacAddress = input.parse().unwrap();
            assert_eq!(mac.octets(), OCTETS, "input {input}");
        }
    }

    #[test]
    fn displays_uppercase_colon_form() {
        let mac: MacAddress = "01-23-45-67-89-ab".parse().unwrap();
        assert_eq!(mac.to_string(), "01:23:45:67:89:AB");
    }

    #[test]
    fn rejects_malformed_input() {
        for input in [
            "",
            "AA:BB:CC:DD:EE",
            "AA:BB:CC:DD:EE:FF:00",
            "AA:BB:CC:DD:EE:GG",
            "A:B:C:D:E:F",
            "AAA:BB:CC:DD:EE:F",
            "AA:BB-CC:DD:EE:FF",
            "+A:BB:CC:DD:EE:FF",
            "AABBCCDDEEF",
            "AABBCCDDEEFF00",
            "not a mac",
        ] {
            assert!(input.parse::<MacAddress>().is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn serde_uses_display_form() {
        let mac = MacAddress::new(OCTETS);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, r#""AA:BB:CC:DD:EE:FF""#);
        let back: MacAddress = serde_json::from_str(r#""aabbccddeeff""#).unwrap();
        assert_eq!(back, mac);
    }
}
