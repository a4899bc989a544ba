use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Command class prefix for reads.
pub const READ_CLASS: u8 = 0x20;

/// Command class prefix for setting writes.
pub const WRITE_CLASS: u8 = 0x03;

/// Read a single setting.
pub const CMD_READ_SETTING: u8 = 0xA8;

/// Read a single readable value.
pub const CMD_READ_VALUE: u8 = 0xA3;

/// Request a status telegram.
pub const CMD_READ_STATUS: u8 = 0xA4;

/// Largest payload the one-byte length field can describe.
pub const MAX_WRITE_PAYLOAD: usize = u8::MAX as usize;

/// Generic single-id read.
///
/// Wire format:
/// ```text
/// ┌───────┬─────┬──────┬────┐
/// │ 0x20  │ cmd │ 0x01 │ id │
/// └───────┴─────┴──────┴────┘
/// ```
pub fn read(cmd: u8, id: u8) -> Bytes {
    let mut dst = BytesMut::with_capacity(4);
    dst.put_u8(READ_CLASS);
    dst.put_u8(cmd);
    dst.put_u8(0x01);
    dst.put_u8(id);
    dst.freeze()
}

/// `[0x20, 0xA8, 0x01, id]`
pub fn read_setting(id: u8) -> Bytes {
    read(CMD_READ_SETTING, id)
}

/// `[0x20, 0xA3, 0x01, id]`
pub fn read_value(id: u8) -> Bytes {
    read(CMD_READ_VALUE, id)
}

/// `[0x20, 0xA4, 0x00]`
pub fn read_status() -> Bytes {
    Bytes::from_static(&[READ_CLASS, CMD_READ_STATUS, 0x00])
}

/// Write an encoded setting payload.
///
/// Wire format:
/// ```text
/// ┌──────┬────┬─────┬──────────────┐
/// │ 0x03 │ id │ len │ payload ...  │
/// └──────┴────┴─────┴──────────────┘
/// ```
pub fn write_setting(id: u8, payload: &[u8]) -> Result<Bytes> {
    let len = u8::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge {
        size: payload.len(),
        max: MAX_WRITE_PAYLOAD,
    })?;

    let mut dst = BytesMut::with_capacity(3 + payload.len());
    dst.put_u8(WRITE_CLASS);
    dst.put_u8(id);
    dst.put_u8(len);
    dst.put_slice(payload);
    Ok(dst.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{encode, Conversion, Value};

    #[test]
    fn read_setting_frame() {
        assert_eq!(read_setting(0x10).as_ref(), &[0x20, 0xA8, 0x01, 0x10]);
    }

    #[test]
    fn read_value_frame() {
        assert_eq!(read_value(0x07).as_ref(), &[0x20, 0xA3, 0x01, 0x07]);
        assert_eq!(read(0xB1, 0x02).as_ref(), &[0x20, 0xB1, 0x01, 0x02]);
    }

    #[test]
    fn status_frame_has_no_id() {
        assert_eq!(read_status().as_ref(), &[0x20, 0xA4, 0x00]);
    }

    #[test]
    fn write_uint16_setting() {
        let payload = encode(&Value::U16(300), Conversion::Uint16).unwrap();
        let frame = write_setting(0x10, &payload).unwrap();
        assert_eq!(frame.as_ref(), &[0x03, 0x10, 0x02, 0x2C, 0x01]);
    }

    #[test]
    fn write_empty_payload() {
        assert_eq!(write_setting(0x22, &[]).unwrap().as_ref(), &[0x03, 0x22, 0x00]);
    }

    #[test]
    fn write_payload_too_large() {
        let payload = vec![0u8; 256];
        assert!(matches!(
            write_setting(1, &payload),
            Err(CodecError::PayloadTooLarge { size: 256, max: 255 })
        ));
        assert_eq!(write_setting(1, &payload[..255]).unwrap().len(), 258);
    }
}
