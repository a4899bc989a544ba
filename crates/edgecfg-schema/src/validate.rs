use edgecfg_codec::{parse_byte_array, Conversion, Value};

use crate::entry::SchemaEntry;
use crate::error::{Result, SchemaError};

/// Validate operator input for an entry and turn it into a typed value.
///
/// Checks, in order: non-empty input, a known conversion, parseable text,
/// the declared `min`/`max` for numeric kinds, and the declared `length`
/// for byte arrays.
pub fn parse_input(entry: &SchemaEntry, text: &str) -> Result<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SchemaError::InvalidInput {
            entry: entry.name.clone(),
            reason: "no value provided".to_string(),
        });
    }

    let conversion = entry.conversion()?;
    let value = parse_text(&entry.name, conversion, text)?;

    if out_of_range(&value, entry.min, entry.max) {
        return Err(SchemaError::OutOfRange {
            entry: entry.name.clone(),
            value: text.to_string(),
            min: entry.min,
            max: entry.max,
        });
    }

    if let (Value::ByteArray(bytes), Some(length)) = (&value, entry.length) {
        if bytes.len() != length {
            return Err(SchemaError::InvalidInput {
                entry: entry.name.clone(),
                reason: format!("expected {length} bytes, got {}", bytes.len()),
            });
        }
    }

    Ok(value)
}

/// Parse text for a conversion without consulting declared bounds.
///
/// Integers are decimal, booleans are `true`/`false` in any case, byte
/// arrays use the `{0x01, 0xFF}` notation.
pub fn parse_text(entry: &str, conversion: Conversion, text: &str) -> Result<Value> {
    let text = text.trim();
    let value = match conversion {
        Conversion::Uint8 => Value::U8(parse_int(entry, conversion, text)?),
        Conversion::Uint16 => Value::U16(parse_int(entry, conversion, text)?),
        Conversion::Uint32 => Value::U32(parse_int(entry, conversion, text)?),
        Conversion::Int8 => Value::I8(parse_int(entry, conversion, text)?),
        Conversion::Int32 => Value::I32(parse_int(entry, conversion, text)?),
        Conversion::Float => {
            let number: f32 = text
                .parse()
                .ok()
                .filter(|n: &f32| n.is_finite())
                .ok_or_else(|| invalid(entry, format!("'{text}' is not a number")))?;
            Value::Float(number)
        }
        Conversion::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if text.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                return Err(invalid(entry, "must be 'true' or 'false'".to_string()));
            }
        }
        Conversion::ByteArray => Value::ByteArray(parse_byte_array(text)?),
        Conversion::String => Value::Text(text.to_string()),
    };
    Ok(value)
}

/// Floats are compared at `f32` precision so a bound such as `0.1`
/// admits the input `"0.1"`.
fn out_of_range(value: &Value, min: Option<f64>, max: Option<f64>) -> bool {
    match value {
        Value::Float(v) => {
            min.is_some_and(|min| *v < min as f32) || max.is_some_and(|max| *v > max as f32)
        }
        other => other.as_f64().is_some_and(|number| {
            min.is_some_and(|min| number < min) || max.is_some_and(|max| number > max)
        }),
    }
}

fn parse_int<T: TryFrom<i64>>(entry: &str, conversion: Conversion, text: &str) -> Result<T> {
    let wide: i64 = text
        .parse()
        .map_err(|_| invalid(entry, format!("'{text}' is not an integer")))?;
    T::try_from(wide).map_err(|_| invalid(entry, format!("{wide} does not fit in {conversion}")))
}

fn invalid(entry: &str, reason: String) -> SchemaError {
    SchemaError::InvalidInput {
        entry: entry.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use edgecfg_codec::CodecError;

    use super::*;
    use crate::entry::{EntrySpec, Group};
    use crate::id::SettingId;

    fn entry(conversion: &str, min: Option<f64>, max: Option<f64>, length: Option<usize>) -> SchemaEntry {
        SchemaEntry::from_spec(
            "lr_interval",
            Group::Settings,
            EntrySpec {
                id: SettingId::new(0x21),
                conversion: conversion.to_string(),
                min,
                max,
                default: None,
                length,
                description: None,
            },
        )
    }

    #[test]
    fn integer_within_bounds() {
        let e = entry("uint16", Some(1.0), Some(3600.0), None);
        assert_eq!(parse_input(&e, " 300 ").unwrap(), Value::U16(300));
    }

    #[test]
    fn integer_outside_bounds() {
        let e = entry("uint16", Some(1.0), Some(3600.0), None);
        let err = parse_input(&e, "0").unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { .. }));
        assert_eq!(
            err.to_string(),
            "invalid value for lr_interval: 0 is not between 1 and 3600"
        );
        assert!(parse_input(&e, "3601").is_err());
    }

    #[test]
    fn integer_must_fit_type() {
        let e = entry("uint8", None, None, None);
        assert!(matches!(
            parse_input(&e, "256"),
            Err(SchemaError::InvalidInput { .. })
        ));
        assert!(parse_input(&e, "-1").is_err());
        assert_eq!(
            parse_input(&entry("int8", None, None, None), "-128").unwrap(),
            Value::I8(-128)
        );
    }

    #[test]
    fn non_numeric_rejected() {
        let e = entry("int32", None, None, None);
        assert!(matches!(
            parse_input(&e, "12abc"),
            Err(SchemaError::InvalidInput { .. })
        ));
        assert!(parse_input(&entry("float", None, None, None), "NaN").is_err());
    }

    #[test]
    fn float_bounds() {
        let e = entry("float", Some(-1.0), Some(1.0), None);
        assert_eq!(parse_input(&e, "0.25").unwrap(), Value::Float(0.25));
        assert!(matches!(
            parse_input(&e, "1.5"),
            Err(SchemaError::OutOfRange { .. })
        ));
    }

    #[test]
    fn float_on_inexact_bound_is_in_range() {
        let e = entry("float", Some(0.0), Some(0.1), None);
        assert_eq!(parse_input(&e, "0.1").unwrap(), Value::Float(0.1));
        assert!(parse_input(&e, "0.11").is_err());

        let e = entry("float", Some(3.3), Some(10.0), None);
        assert_eq!(parse_input(&e, "3.3").unwrap(), Value::Float(3.3));
        assert!(parse_input(&e, "3.29").is_err());
    }

    #[test]
    fn bool_is_case_insensitive() {
        let e = entry("bool", None, None, None);
        assert_eq!(parse_input(&e, "TRUE").unwrap(), Value::Bool(true));
        assert_eq!(parse_input(&e, "False").unwrap(), Value::Bool(false));
        assert!(parse_input(&e, "1").is_err());
    }

    #[test]
    fn byte_array_length_checked() {
        let e = entry("byte_array", None, None, Some(2));
        assert_eq!(
            parse_input(&e, "{0x01, 0x02}").unwrap(),
            Value::ByteArray(vec![1, 2])
        );
        assert!(matches!(
            parse_input(&e, "{0x01}"),
            Err(SchemaError::InvalidInput { .. })
        ));
        assert!(matches!(
            parse_input(&e, "{0x01, qq}"),
            Err(SchemaError::Codec(CodecError::InvalidByteArray(_)))
        ));
    }

    #[test]
    fn empty_input_rejected() {
        let e = entry("string", None, None, None);
        assert!(matches!(
            parse_input(&e, "   "),
            Err(SchemaError::InvalidInput { .. })
        ));
        assert_eq!(
            parse_input(&e, " tag-7 ").unwrap(),
            Value::Text("tag-7".to_string())
        );
    }

    #[test]
    fn unknown_conversion_rejected() {
        let e = entry("uint64", None, None, None);
        assert!(matches!(
            parse_input(&e, "1"),
            Err(SchemaError::Codec(CodecError::UnsupportedConversion { .. }))
        ));
    }
}
