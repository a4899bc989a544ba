//! Wire-level knowledge of the tracker protocol.
//!
//! - [`value`]: primitive encodings declared by the device schema
//! - [`status`]: the fixed-layout status telegram
//! - [`command`]: the outbound command frames
//! - [`port`]: inbound port discriminators
//!
//! Everything here is pure. No I/O, no shared state.

pub mod command;
pub mod error;
pub mod port;
pub mod status;
pub mod value;

pub use command::{
    read, read_setting, read_status, read_value, write_setting, CMD_READ_SETTING,
    CMD_READ_STATUS, CMD_READ_VALUE, MAX_WRITE_PAYLOAD, READ_CLASS, WRITE_CLASS,
};
pub use error::{CodecError, Result};
pub use port::{port_name, PortKind, STATUS_PORT, VALUE_RESPONSE_PORTS};
pub use status::{decode_status, DeviceType, ResetCause, StatusRecord, STATUS_TELEGRAM_LEN};
pub use value::{decode, encode, format_byte_array, parse_byte_array, Conversion, Value};
