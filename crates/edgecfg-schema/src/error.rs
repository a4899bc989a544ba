use std::convert::Infallible;

use edgecfg_codec::CodecError;

use crate::id::SettingId;

/// Errors that can occur while loading or consulting a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema document is not valid JSON or has the wrong shape.
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// An id could not be parsed or is outside 0..=255.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// No entry is registered under the id.
    #[error("value with ID {0} not found")]
    UnknownSettingId(SettingId),

    /// Two entries declare the same id.
    #[error("duplicate id {id}: {first} and {second}")]
    DuplicateId {
        id: SettingId,
        first: String,
        second: String,
    },

    /// Operator input does not parse for the entry's conversion.
    #[error("invalid value for {entry}: {reason}")]
    InvalidInput { entry: String, reason: String },

    /// Operator input is outside the entry's declared bounds.
    #[error("invalid value for {entry}: {value} is not between {} and {}", bound(.min), bound(.max))]
    OutOfRange {
        entry: String,
        value: String,
        min: Option<f64>,
        max: Option<f64>,
    },

    /// Conversion error.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<Infallible> for SchemaError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

fn bound(value: &Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub type Result<T> = std::result::Result<T, SchemaError>;
