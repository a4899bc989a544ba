/// Errors that can occur on the device channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The other end of the channel has gone away.
    #[error("channel closed")]
    Closed,

    /// The write was refused by the underlying link.
    #[error("write failed: {0}")]
    Write(String),

    /// No device matched the connection request.
    #[error("device not found: {0}")]
    NotFound(String),

    /// The connected device lacks a required endpoint.
    #[error("missing endpoint {0}")]
    MissingEndpoint(String),

    /// Bluetooth stack error.
    #[cfg(feature = "ble")]
    #[error("bluetooth error: {0}")]
    Ble(#[from] btleplug::Error),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
