//! Status telegram decoding.
//!
//! Layout of the telegram body (the port byte already stripped):
//!
//! ```text
//! ┌────┬──────────────────────────────────────────────────────────────┐
//! │ 0  │ reset cause                                                  │
//! │ 1  │ error bits: lr, ble, ublox, acc, bat, ublox_fix, flash       │
//! │ 2  │ battery: b * 10 + 2500 mV                                    │
//! │ 3  │ bit0 msg, bit1 locked, bit2 lr join, bits 4-7 lr satellites  │
//! │ 4  │ temperature: b * 200 / 255 - 100                             │
//! │ 5  │ uptime in days                                               │
//! │ 6-8│ acceleration x, y, z (scaled like temperature)               │
//! │ 9  │ hardware version: major << 4 | minor                         │
//! │ 10 │ firmware version: major << 4 | minor                         │
//! │ 11 │ firmware type << 4 | hardware type                           │
//! │ 12 │ charge: 0, or b * 100 + 5000 mV                              │
//! │ 13 │ bit0 sat support, bit1 rf scan, bit2 fence, bits 4-7 tries   │
//! └────┴──────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{CodecError, Result};

/// Number of bytes the decoder reads from the telegram body.
///
/// Fields start at offset 0 of the body; there is no header to skip.
/// Trailing bytes past this length are ignored.
pub const STATUS_TELEGRAM_LEN: usize = 14;

/// Why the tracker last restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    ResetPin,
    Watchdog,
    SoftRequest,
    Lockup,
    Unknown,
}

impl ResetCause {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => ResetCause::ResetPin,
            2 => ResetCause::Watchdog,
            4 => ResetCause::SoftRequest,
            8 => ResetCause::Lockup,
            _ => ResetCause::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResetCause::ResetPin => "RESETPIN",
            ResetCause::Watchdog => "DOG",
            ResetCause::SoftRequest => "SREQ",
            ResetCause::Lockup => "LOCKUP",
            ResetCause::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResetCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResetCause {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Hardware or firmware product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Default,
    RhinoEdge,
    ElephantEdge,
    WisentEdge,
    CatTracker,
    RangerEdge,
    RhinoPuck,
    Unknown(u8),
}

impl DeviceType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => DeviceType::Default,
            1 => DeviceType::RhinoEdge,
            2 => DeviceType::ElephantEdge,
            3 => DeviceType::WisentEdge,
            4 => DeviceType::CatTracker,
            5 => DeviceType::RangerEdge,
            6 => DeviceType::RhinoPuck,
            other => DeviceType::Unknown(other),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Default => "default",
            DeviceType::RhinoEdge => "rhinoedge",
            DeviceType::ElephantEdge => "elephantedge",
            DeviceType::WisentEdge => "wisentedge",
            DeviceType::CatTracker => "cattracker",
            DeviceType::RangerEdge => "rangeredge",
            DeviceType::RhinoPuck => "rhinopuck",
            DeviceType::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Decoded status telegram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub reset: ResetCause,
    pub battery_mv: u16,
    pub charge_mv: u16,
    pub temperature: f64,
    pub uptime_days: u8,
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
    pub locked: bool,
    pub message_pending: bool,
    pub lr_joined: bool,
    pub lr_satellites: u8,
    pub err_lr: bool,
    /// Mirrors the operation byte's join flag, not a bit of the error byte.
    pub err_lr_join: bool,
    pub err_ble: bool,
    pub err_ublox: bool,
    pub err_acc: bool,
    pub err_bat: bool,
    pub err_ublox_fix: bool,
    pub err_flash: bool,
    pub hw_major: u8,
    pub hw_minor: u8,
    pub fw_major: u8,
    pub fw_minor: u8,
    pub hw_type: DeviceType,
    pub fw_type: DeviceType,
    pub sat_support: bool,
    pub sat_tries: u8,
    pub rf_scan: bool,
    pub fence: bool,
}

impl StatusRecord {
    /// Short names of the error flags that are set, in telegram order.
    pub fn active_errors(&self) -> Vec<&'static str> {
        [
            ("LR", self.err_lr),
            ("LR_JOIN", self.err_lr_join),
            ("BLE", self.err_ble),
            ("UBLOX", self.err_ublox),
            ("ACC", self.err_acc),
            ("BAT", self.err_bat),
            ("UBLOX_FIX", self.err_ublox_fix),
            ("FLASH", self.err_flash),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    /// `major.minor` hardware version.
    pub fn hw_version(&self) -> String {
        format!("{}.{}", self.hw_major, self.hw_minor)
    }

    /// `major.minor` firmware version.
    pub fn fw_version(&self) -> String {
        format!("{}.{}", self.fw_major, self.fw_minor)
    }
}

/// Decode a status telegram body.
///
/// Only array bounds are checked; every byte value decodes to something.
pub fn decode_status(bytes: &[u8]) -> Result<StatusRecord> {
    if bytes.len() < STATUS_TELEGRAM_LEN {
        return Err(CodecError::MalformedTelegram {
            needed: STATUS_TELEGRAM_LEN,
            got: bytes.len(),
        });
    }

    let reset = bytes[0];
    let err = bytes[1];
    let operation = bytes[3];
    let hw_version = bytes[9];
    let fw_version = bytes[10];
    let types = bytes[11];
    let features = bytes[13];

    let record = StatusRecord {
        reset: ResetCause::from_byte(reset),
        battery_mv: u16::from(bytes[2]) * 10 + 2500,
        charge_mv: match bytes[12] {
            0 => 0,
            chg => u16::from(chg) * 100 + 5000,
        },
        temperature: scale(bytes[4]),
        uptime_days: bytes[5],
        acc_x: scale(bytes[6]),
        acc_y: scale(bytes[7]),
        acc_z: scale(bytes[8]),
        message_pending: bit(operation, 0),
        locked: bit(operation, 1),
        lr_joined: bit(operation, 2),
        lr_satellites: operation >> 4,
        err_lr: bit(err, 0),
        err_lr_join: bit(operation, 2),
        err_ble: bit(err, 1),
        err_ublox: bit(err, 2),
        err_acc: bit(err, 3),
        err_bat: bit(err, 4),
        err_ublox_fix: bit(err, 5),
        err_flash: bit(err, 6),
        hw_major: hw_version >> 4,
        hw_minor: hw_version & 0x0F,
        fw_major: fw_version >> 4,
        fw_minor: fw_version & 0x0F,
        hw_type: DeviceType::from_code(types & 0x0F),
        fw_type: DeviceType::from_code(types >> 4),
        sat_support: bit(features, 0),
        rf_scan: bit(features, 1),
        fence: bit(features, 2),
        sat_tries: features >> 4,
    };

    tracing::trace!(reset = %record.reset, battery_mv = record.battery_mv, "status decoded");
    Ok(record)
}

/// Map a byte linearly onto [-100, 100].
fn scale(byte: u8) -> f64 {
    f64::from(byte) * 200.0 / 255.0 - 100.0
}

fn bit(byte: u8, index: u8) -> bool {
    byte & (1 << index) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram() -> [u8; 16] {
        [0u8; 16]
    }

    #[test]
    fn battery_scaling() {
        let mut bytes = telegram();
        bytes[2] = 50;
        assert_eq!(decode_status(&bytes).unwrap().battery_mv, 3000);

        bytes[2] = 255;
        assert_eq!(decode_status(&bytes).unwrap().battery_mv, 5050);
    }

    #[test]
    fn temperature_spans_full_range() {
        let mut bytes = telegram();
        bytes[4] = 0;
        let cold = decode_status(&bytes).unwrap().temperature;
        assert!((cold - -100.0).abs() < 1e-9);

        bytes[4] = 255;
        let hot = decode_status(&bytes).unwrap().temperature;
        assert!((hot - 100.0).abs() < 1e-9);
        assert_eq!(format!("{hot:.2}"), "100.00");
    }

    #[test]
    fn acceleration_uses_same_scaling() {
        let mut bytes = telegram();
        bytes[6] = 0;
        bytes[7] = 255;
        bytes[8] = 51;
        let record = decode_status(&bytes).unwrap();
        assert!((record.acc_x + 100.0).abs() < 1e-9);
        assert!((record.acc_y - 100.0).abs() < 1e-9);
        assert!((record.acc_z + 60.0).abs() < 1e-9);
    }

    #[test]
    fn reset_cause_names() {
        let mut bytes = telegram();
        assert_eq!(decode_status(&bytes).unwrap().reset.to_string(), "unknown");

        bytes[0] = 8;
        assert_eq!(decode_status(&bytes).unwrap().reset.to_string(), "LOCKUP");

        bytes[0] = 3;
        assert_eq!(decode_status(&bytes).unwrap().reset, ResetCause::Unknown);

        bytes[0] = 2;
        assert_eq!(decode_status(&bytes).unwrap().reset, ResetCause::Watchdog);
    }

    #[test]
    fn error_bits_are_independent() {
        let mut bytes = telegram();
        bytes[1] = 0b0101_0101;
        let record = decode_status(&bytes).unwrap();
        assert!(record.err_lr);
        assert!(!record.err_ble);
        assert!(record.err_ublox);
        assert!(!record.err_acc);
        assert!(record.err_bat);
        assert!(!record.err_ublox_fix);
        assert!(record.err_flash);
        assert_eq!(record.active_errors(), vec!["LR", "UBLOX", "BAT", "FLASH"]);
    }

    #[test]
    fn lr_join_error_follows_operation_byte() {
        let mut bytes = telegram();
        bytes[1] = 0xFF;
        bytes[3] = 0;
        assert!(!decode_status(&bytes).unwrap().err_lr_join);

        bytes[1] = 0;
        bytes[3] = 0b0000_0100;
        let record = decode_status(&bytes).unwrap();
        assert!(record.err_lr_join);
        assert!(record.lr_joined);
        assert_eq!(record.active_errors(), vec!["LR_JOIN"]);
    }

    #[test]
    fn operation_byte_flags_and_satellites() {
        let mut bytes = telegram();
        bytes[3] = 0x93;
        let record = decode_status(&bytes).unwrap();
        assert!(record.message_pending);
        assert!(record.locked);
        assert!(!record.lr_joined);
        assert_eq!(record.lr_satellites, 9);
    }

    #[test]
    fn versions_and_types() {
        let mut bytes = telegram();
        bytes[9] = 0x21;
        bytes[10] = 0x64;
        bytes[11] = 0x42;
        let record = decode_status(&bytes).unwrap();
        assert_eq!(record.hw_version(), "2.1");
        assert_eq!(record.fw_version(), "6.4");
        assert_eq!(record.hw_type, DeviceType::ElephantEdge);
        assert_eq!(record.fw_type, DeviceType::CatTracker);

        bytes[11] = 0xF7;
        let record = decode_status(&bytes).unwrap();
        assert_eq!(record.hw_type.to_string(), "unknown");
        assert_eq!(record.fw_type, DeviceType::Unknown(15));
    }

    #[test]
    fn charge_zero_stays_zero() {
        let mut bytes = telegram();
        assert_eq!(decode_status(&bytes).unwrap().charge_mv, 0);
        bytes[12] = 3;
        assert_eq!(decode_status(&bytes).unwrap().charge_mv, 5300);
    }

    #[test]
    fn feature_byte() {
        let mut bytes = telegram();
        bytes[13] = 0x35;
        let record = decode_status(&bytes).unwrap();
        assert!(record.sat_support);
        assert!(!record.rf_scan);
        assert!(record.fence);
        assert_eq!(record.sat_tries, 3);
    }

    #[test]
    fn uptime_is_raw_days() {
        let mut bytes = telegram();
        bytes[5] = 42;
        assert_eq!(decode_status(&bytes).unwrap().uptime_days, 42);
    }

    #[test]
    fn record_serializes_with_readable_enums() {
        let mut bytes = telegram();
        bytes[0] = 1;
        bytes[11] = 0x16;
        let json = serde_json::to_value(decode_status(&bytes).unwrap()).unwrap();
        assert_eq!(json["reset"], "RESETPIN");
        assert_eq!(json["hw_type"], "rhinopuck");
        assert_eq!(json["fw_type"], "rhinoedge");
        assert_eq!(json["battery_mv"], 2500);
    }

    #[test]
    fn short_telegram_is_malformed() {
        let err = decode_status(&[0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MalformedTelegram {
                needed: STATUS_TELEGRAM_LEN,
                got: 10
            }
        ));
    }

    #[test]
    fn fields_start_at_body_offset_zero() {
        let mut body = [0u8; STATUS_TELEGRAM_LEN + 2];
        body[0] = 8;
        body[2] = 50;
        body[STATUS_TELEGRAM_LEN] = 0xFF;

        let record = decode_status(&body).unwrap();
        assert_eq!(record.reset, ResetCause::Lockup);
        assert_eq!(record.battery_mv, 3000);
        assert!(!record.fence);
    }
}
