/// Errors that can occur while encoding or decoding device payloads.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The schema declares a conversion this codec does not know.
    #[error("unsupported conversion \"{conversion}\" for {entry}")]
    UnsupportedConversion { entry: String, conversion: String },

    /// The payload is shorter than the conversion's fixed width.
    #[error("{conversion} payload too short ({got} bytes, need {needed})")]
    ShortPayload {
        conversion: &'static str,
        needed: usize,
        got: usize,
    },

    /// A byte array in `{0x01, 0xFF}` notation could not be parsed.
    #[error("invalid byte array: {0}")]
    InvalidByteArray(String),

    /// The value's type does not match the conversion it is encoded with.
    #[error("cannot encode {got} value as {expected}")]
    ValueMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// The status telegram ended before all fields were read.
    #[error("malformed status telegram ({got} bytes, need {needed})")]
    MalformedTelegram { needed: usize, got: usize },

    /// A write payload does not fit the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;
