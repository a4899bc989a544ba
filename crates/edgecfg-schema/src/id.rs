use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, SchemaError};

/// Identifier of a setting or readable value.
///
/// Ids arrive as integers or as text (`"0x1A"` hex, otherwise decimal);
/// both normalize here, once, into the single-byte key used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SettingId(u8);

impl SettingId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// The wire byte.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Parse `"0xNN"` (hex) or `"NN"` (decimal).
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u8::from_str_radix(hex, 16),
            None => trimmed.parse::<u8>(),
        };
        parsed
            .map(Self)
            .map_err(|_| SchemaError::InvalidId(text.to_string()))
    }
}

impl fmt::Display for SettingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

impl From<u8> for SettingId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl From<SettingId> for u8 {
    fn from(id: SettingId) -> Self {
        id.0
    }
}

impl FromStr for SettingId {
    type Err = SchemaError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl TryFrom<&str> for SettingId {
    type Error = SchemaError;

    fn try_from(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl TryFrom<&String> for SettingId {
    type Error = SchemaError;

    fn try_from(text: &String) -> Result<Self> {
        Self::parse(text)
    }
}

impl TryFrom<String> for SettingId {
    type Error = SchemaError;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

macro_rules! impl_try_from_int {
    ($($int:ty),*) => {
        $(
            impl TryFrom<$int> for SettingId {
                type Error = SchemaError;

                fn try_from(id: $int) -> Result<Self> {
                    u8::try_from(id)
                        .map(Self)
                        .map_err(|_| SchemaError::InvalidId(id.to_string()))
                }
            }
        )*
    };
}

impl_try_from_int!(u16, u32, u64, usize, i8, i16, i32, i64);

impl Serialize for SettingId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SettingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(SettingIdVisitor)
    }
}

struct SettingIdVisitor;

impl Visitor<'_> for SettingIdVisitor {
    type Value = SettingId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an id between 0 and 255, as a number or a \"0xNN\" string")
    }

    fn visit_u64<E: de::Error>(self, id: u64) -> std::result::Result<SettingId, E> {
        SettingId::try_from(id).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, id: i64) -> std::result::Result<SettingId, E> {
        SettingId::try_from(id).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, text: &str) -> std::result::Result<SettingId, E> {
        SettingId::parse(text).map_err(E::custom)
    }
}
