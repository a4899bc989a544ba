//! Inbound frame demultiplexing.
//!
//! Byte 0 of a notification is its port. Value response ports carry
//! `[port, id, len, payload...]`; the status port carries a status
//! telegram body after the port byte.

use std::fmt;

use edgecfg_codec::{decode, decode_status, PortKind, StatusRecord, Value};
use edgecfg_schema::{SchemaRegistry, SettingId};
use serde::Serialize;

use crate::error::{Result, SessionError};

const VALUE_HEADER_LEN: usize = 3;

/// A setting or value read back from the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueReply {
    pub id: SettingId,
    pub name: String,
    pub value: Value,
}

impl fmt::Display for ValueReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

/// A decoded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Value(ValueReply),
    Status(StatusRecord),
}

impl Reply {
    /// Short description used in logs and `UnexpectedReply`.
    pub fn describe(&self) -> String {
        match self {
            Reply::Value(reply) => format!("value {} ({})", reply.name, reply.id),
            Reply::Status(_) => "status telegram".to_string(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(reply) => fmt::Display::fmt(reply, f),
            Reply::Status(status) => write!(
                f,
                "status: reset {}, battery {} mV, temperature {:.2}",
                status.reset, status.battery_mv, status.temperature
            ),
        }
    }
}

/// Decode one inbound frame against the current schema.
pub fn decode_inbound(frame: &[u8], registry: &SchemaRegistry) -> Result<Reply> {
    let Some((&port, body)) = frame.split_first() else {
        return Err(SessionError::EmptyFrame);
    };

    match PortKind::from_port(port) {
        Some(PortKind::ValueResponse) => decode_value_response(frame, registry).map(Reply::Value),
        Some(PortKind::Status) => Ok(Reply::Status(decode_status(body)?)),
        None => Err(SessionError::UnknownPort(port)),
    }
}

fn decode_value_response(frame: &[u8], registry: &SchemaRegistry) -> Result<ValueReply> {
    if frame.len() < VALUE_HEADER_LEN {
        return Err(SessionError::TruncatedResponse {
            needed: VALUE_HEADER_LEN,
            got: frame.len(),
        });
    }

    let id = SettingId::new(frame[1]);
    let declared = usize::from(frame[2]);
    let end = VALUE_HEADER_LEN + declared;
    let payload = frame
        .get(VALUE_HEADER_LEN..end)
        .ok_or(SessionError::TruncatedResponse {
            needed: end,
            got: frame.len(),
        })?;

    let entry = registry.lookup(id)?;
    let value = decode(payload, entry.conversion()?)?;
    Ok(ValueReply {
        id,
        name: entry.name.clone(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use edgecfg_codec::{CodecError, ResetCause};
    use edgecfg_schema::SchemaError;

    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_json(
            r#"{
                "settings": {
                    "gps_interval": { "id": "0x10", "conversion": "uint16" },
                    "ble_name":     { "id": "0x12", "conversion": "string" }
                },
                "values": { "battery": { "id": "0x80", "conversion": "float" } }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn value_response_on_both_ports() {
        let registry = registry();
        for port in [3u8, 30] {
            let reply = decode_inbound(&[port, 0x10, 0x02, 0x2C, 0x01], &registry).unwrap();
            assert_eq!(
                reply,
                Reply::Value(ValueReply {
                    id: SettingId::new(0x10),
                    name: "gps_interval".to_string(),
                    value: Value::U16(300),
                })
            );
        }
    }

    #[test]
    fn trailing_bytes_ignored() {
        let reply = decode_inbound(&[3, 0x12, 0x02, b'h', b'i', 0xEE], &registry()).unwrap();
        assert_eq!(reply.to_string(), "ble_name = hi");
    }

    #[test]
    fn status_port_decodes_body() {
        let frame = [4u8, 8, 0, 50, 0, 255, 0, 128, 128, 128, 0x12, 0x34, 0x11, 0, 0];
        let Reply::Status(status) = decode_inbound(&frame, &registry()).unwrap() else {
            panic!("expected status");
        };
        assert_eq!(status.reset, ResetCause::Lockup);
        assert_eq!(status.battery_mv, 3000);
        assert_eq!(status.temperature, 100.0);
    }

    #[test]
    fn short_status_is_malformed() {
        assert!(matches!(
            decode_inbound(&[4, 0, 0], &registry()),
            Err(SessionError::Codec(CodecError::MalformedTelegram { .. }))
        ));
    }

    #[test]
    fn unknown_port_and_empty_frame() {
        assert!(matches!(
            decode_inbound(&[9, 1, 2], &registry()),
            Err(SessionError::UnknownPort(9))
        ));
        assert!(matches!(
            decode_inbound(&[], &registry()),
            Err(SessionError::EmptyFrame)
        ));
    }

    #[test]
    fn truncated_value_response() {
        assert!(matches!(
            decode_inbound(&[3, 0x10], &registry()),
            Err(SessionError::TruncatedResponse { needed: 3, got: 2 })
        ));
        assert!(matches!(
            decode_inbound(&[3, 0x10, 0x02, 0x2C], &registry()),
            Err(SessionError::TruncatedResponse { needed: 5, got: 4 })
        ));
    }

    #[test]
    fn unknown_id_in_response() {
        assert!(matches!(
            decode_inbound(&[3, 0x42, 0x01, 0x00], &registry()),
            Err(SessionError::Schema(SchemaError::UnknownSettingId(_)))
        ));
    }

    #[test]
    fn short_payload_for_conversion() {
        assert!(matches!(
            decode_inbound(&[3, 0x80, 0x02, 0x00, 0x00], &registry()),
            Err(SessionError::Codec(CodecError::ShortPayload { .. }))
        ));
    }
}
