//! Inbound port discriminators.
//!
//! Byte 0 of every notification selects the decoder for the rest.

/// Ports carrying a setting or value response: `[port, id, len, payload...]`.
pub const VALUE_RESPONSE_PORTS: [u8; 2] = [3, 30];

/// Port carrying a status telegram.
pub const STATUS_PORT: u8 = 4;

/// Decoder selected by a port byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    ValueResponse,
    Status,
}

impl PortKind {
    /// Classify a port byte. `None` for ports without a decoder.
    pub fn from_port(port: u8) -> Option<Self> {
        if VALUE_RESPONSE_PORTS.contains(&port) {
            Some(PortKind::ValueResponse)
        } else if port == STATUS_PORT {
            Some(PortKind::Status)
        } else {
            None
        }
    }
}

/// Returns a human-readable name for a port.
pub fn port_name(port: u8) -> &'static str {
    match PortKind::from_port(port) {
        Some(PortKind::ValueResponse) => "VALUE",
        Some(PortKind::Status) => "STATUS",
        None => "UNKNOWN",
    }
}
