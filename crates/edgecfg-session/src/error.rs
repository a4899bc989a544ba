use std::time::Duration;

/// Errors that can occur during a device session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A request is already awaiting its response.
    #[error("a request is already pending")]
    RequestAlreadyPending,

    /// No response arrived in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The notification's leading byte selects no decoder.
    #[error("unknown port {0}")]
    UnknownPort(u8),

    /// A notification with no bytes at all.
    #[error("empty frame")]
    EmptyFrame,

    /// A value response shorter than its header or declared length.
    #[error("truncated response ({got} bytes, need {needed})")]
    TruncatedResponse { needed: usize, got: usize },

    /// The response does not answer the request that was sent.
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply { expected: String, got: String },

    /// The entry declares no default to reset to.
    #[error("{0} has no default value")]
    NoDefault(String),

    /// The notification stream ended while a request was pending.
    #[error("device disconnected")]
    Disconnected,

    /// Schema lookup or input validation failed.
    #[error(transparent)]
    Schema(#[from] edgecfg_schema::SchemaError),

    /// Payload encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] edgecfg_codec::CodecError),

    /// Channel-level error.
    #[error("channel error: {0}")]
    Channel(#[from] edgecfg_channel::ChannelError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
