use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Serialize, Serializer};

use crate::error::{CodecError, Result};

/// Primitive encoding declared by the schema for a setting or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int32,
    Bool,
    Float,
    ByteArray,
    String,
}

impl Conversion {
    pub const ALL: [Conversion; 9] = [
        Conversion::Uint8,
        Conversion::Uint16,
        Conversion::Uint32,
        Conversion::Int8,
        Conversion::Int32,
        Conversion::Bool,
        Conversion::Float,
        Conversion::ByteArray,
        Conversion::String,
    ];

    /// Name as written in schema documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Conversion::Uint8 => "uint8",
            Conversion::Uint16 => "uint16",
            Conversion::Uint32 => "uint32",
            Conversion::Int8 => "int8",
            Conversion::Int32 => "int32",
            Conversion::Bool => "bool",
            Conversion::Float => "float",
            Conversion::ByteArray => "byte_array",
            Conversion::String => "string",
        }
    }

    /// Look up a conversion by its schema name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Resolve a schema name, failing with an error that names the entry.
    pub fn resolve(entry: &str, name: &str) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| CodecError::UnsupportedConversion {
            entry: entry.to_string(),
            conversion: name.to_string(),
        })
    }

    /// Encoded width in bytes, `None` for variable-length kinds.
    pub fn width(self) -> Option<usize> {
        match self {
            Conversion::Uint8 | Conversion::Int8 | Conversion::Bool => Some(1),
            Conversion::Uint16 => Some(2),
            Conversion::Uint32 | Conversion::Int32 | Conversion::Float => Some(4),
            Conversion::ByteArray | Conversion::String => None,
        }
    }

    /// True for the integer kinds.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Conversion::Uint8
                | Conversion::Uint16
                | Conversion::Uint32
                | Conversion::Int8
                | Conversion::Int32
        )
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded setting or value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I32(i32),
    Bool(bool),
    Float(f32),
    ByteArray(Vec<u8>),
    Text(String),
}

impl Value {
    /// The conversion this value naturally encodes with.
    pub fn conversion(&self) -> Conversion {
        match self {
            Value::U8(_) => Conversion::Uint8,
            Value::U16(_) => Conversion::Uint16,
            Value::U32(_) => Conversion::Uint32,
            Value::I8(_) => Conversion::Int8,
            Value::I32(_) => Conversion::Int32,
            Value::Bool(_) => Conversion::Bool,
            Value::Float(_) => Conversion::Float,
            Value::ByteArray(_) => Conversion::ByteArray,
            Value::Text(_) => Conversion::String,
        }
    }

    /// Numeric view used for range checks and comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::U8(v) => Some(f64::from(*v)),
            Value::U16(v) => Some(f64::from(*v)),
            Value::U32(v) => Some(f64::from(*v)),
            Value::I8(v) => Some(f64::from(*v)),
            Value::I32(v) => Some(f64::from(*v)),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Bool(_) | Value::ByteArray(_) | Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::ByteArray(v) => f.write_str(&format_byte_array(v)),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::U8(v) => serializer.serialize_u8(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::ByteArray(v) => serializer.serialize_str(&format_byte_array(v)),
            Value::Text(v) => serializer.serialize_str(v),
        }
    }
}

/// Decode a response payload.
///
/// Fixed-width kinds read exactly their width from the start of `bytes`,
/// little-endian. Trailing bytes are ignored.
pub fn decode(bytes: &[u8], conversion: Conversion) -> Result<Value> {
    let value = match conversion {
        Conversion::Uint8 => Value::U8(u8::from_le_bytes(fixed(bytes, conversion)?)),
        Conversion::Uint16 => Value::U16(u16::from_le_bytes(fixed(bytes, conversion)?)),
        Conversion::Uint32 => Value::U32(u32::from_le_bytes(fixed(bytes, conversion)?)),
        Conversion::Int8 => Value::I8(i8::from_le_bytes(fixed(bytes, conversion)?)),
        Conversion::Int32 => Value::I32(i32::from_le_bytes(fixed(bytes, conversion)?)),
        Conversion::Bool => {
            let [byte] = fixed::<1>(bytes, conversion)?;
            Value::Bool(byte != 0)
        }
        Conversion::Float => Value::Float(f32::from_le_bytes(fixed(bytes, conversion)?)),
        Conversion::ByteArray => Value::ByteArray(bytes.to_vec()),
        Conversion::String => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    };
    Ok(value)
}

/// Encode a value for a write-setting payload.
///
/// A byte array may also be given in its `{0x01, 0xFF}` text form.
pub fn encode(value: &Value, conversion: Conversion) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(conversion.width().unwrap_or(16));
    match (conversion, value) {
        (Conversion::Uint8, Value::U8(v)) => dst.put_u8(*v),
        (Conversion::Uint16, Value::U16(v)) => dst.put_u16_le(*v),
        (Conversion::Uint32, Value::U32(v)) => dst.put_u32_le(*v),
        (Conversion::Int8, Value::I8(v)) => dst.put_i8(*v),
        (Conversion::Int32, Value::I32(v)) => dst.put_i32_le(*v),
        (Conversion::Bool, Value::Bool(v)) => dst.put_u8(u8::from(*v)),
        (Conversion::Float, Value::Float(v)) => dst.put_f32_le(*v),
        (Conversion::ByteArray, Value::ByteArray(v)) => dst.put_slice(v),
        (Conversion::ByteArray, Value::Text(text)) => dst.put_slice(&parse_byte_array(text)?),
        (Conversion::String, Value::Text(v)) => dst.put_slice(v.as_bytes()),
        (expected, got) => {
            return Err(CodecError::ValueMismatch {
                expected: expected.as_str(),
                got: got.conversion().as_str(),
            })
        }
    }
    Ok(dst.freeze())
}

/// Render bytes as `{0x01, 0xFF}`.
pub fn format_byte_array(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(|b| format!("0x{b:02X}")).collect();
    format!("{{{}}}", items.join(", "))
}

/// Parse the `{0x01, 0xFF}` notation.
///
/// Braces are optional, each element may carry a `0x` prefix, and
/// whitespace around elements is ignored. `{}` is the empty array.
pub fn parse_byte_array(text: &str) -> Result<Vec<u8>> {
    let inner = text.replace(['{', '}'], "");
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|part| {
            let part = part.trim();
            let digits = part
                .strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .unwrap_or(part);
            if digits.is_empty() {
                return Err(CodecError::InvalidByteArray(text.to_string()));
            }
            u8::from_str_radix(digits, 16)
                .map_err(|_| CodecError::InvalidByteArray(text.to_string()))
        })
        .collect()
}

fn fixed<const N: usize>(bytes: &[u8], conversion: Conversion) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|head| head.try_into().ok())
        .ok_or(CodecError::ShortPayload {
            conversion: conversion.as_str(),
            needed: N,
            got: bytes.len(),
        })
}
