use std::fmt;

use edgecfg_codec::{parse_byte_array, Conversion, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::id::SettingId;
use crate::validate::parse_text;

/// A schema document as shipped alongside a firmware build.
///
/// Entries keep the order they have in the file.
///
/// ```json
/// {
///   "settings": { "gps_interval": { "id": "0x10", "conversion": "uint16", "min": 1, "max": 3600 } },
///   "values":   { "battery":      { "id": "0x80", "conversion": "float" } }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SchemaDocument {
    #[serde(default)]
    pub settings: IndexMap<String, EntrySpec>,
    #[serde(default)]
    pub values: IndexMap<String, EntrySpec>,
}

/// One entry as declared in the document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EntrySpec {
    pub id: SettingId,
    pub conversion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Which half of the document an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Settings,
    Values,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Settings => f.write_str("settings"),
            Group::Values => f.write_str("values"),
        }
    }
}

/// A registered entry: its name plus the declared metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaEntry {
    pub name: String,
    pub group: Group,
    pub id: SettingId,
    #[serde(rename = "conversion")]
    pub conversion_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaEntry {
    pub fn from_spec(name: impl Into<String>, group: Group, spec: EntrySpec) -> Self {
        Self {
            name: name.into(),
            group,
            id: spec.id,
            conversion_name: spec.conversion,
            min: spec.min,
            max: spec.max,
            default: spec.default,
            length: spec.length,
            description: spec.description,
        }
    }

    /// The declared conversion, or `UnsupportedConversion` naming this entry.
    pub fn conversion(&self) -> Result<Conversion> {
        Ok(Conversion::resolve(&self.name, &self.conversion_name)?)
    }

    /// The declared default as a typed value.
    ///
    /// `Ok(None)` when the entry declares no default.
    pub fn default_value(&self) -> Result<Option<Value>> {
        let text = match &self.default {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };
        let conversion = self.conversion()?;
        parse_text(&self.name, conversion, &text).map(Some)
    }

    /// True when `value` equals the declared default.
    ///
    /// Byte arrays compare by content regardless of how the default is
    /// spelled. Entries without a usable default are never "default".
    pub fn is_default(&self, value: &Value) -> bool {
        match (value, &self.default) {
            (Value::ByteArray(bytes), Some(serde_json::Value::String(text))) => {
                parse_byte_array(text).is_ok_and(|default| &default == bytes)
            }
            _ => matches!(self.default_value(), Ok(Some(default)) if &default == value),
        }
    }
}

#[cfg(test)]
mod tests {
    use edgecfg_codec::CodecError;

    use super::*;
    use crate::error::SchemaError;

    fn entry(conversion: &str, default: Option<serde_json::Value>) -> SchemaEntry {
        SchemaEntry::from_spec(
            "test_entry",
            Group::Settings,
            EntrySpec {
                id: SettingId::new(0x10),
                conversion: conversion.to_string(),
                min: None,
                max: None,
                default,
                length: None,
                description: None,
            },
        )
    }

    #[test]
    fn document_parses_mixed_id_forms() {
        let doc: SchemaDocument = serde_json::from_str(
            r#"{
                "settings": {
                    "gps_interval": { "id": "0x10", "conversion": "uint16", "min": 1, "max": 3600, "default": 600 }
                },
                "values": {
                    "battery": { "id": 128, "conversion": "float", "unit": "V" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(doc.settings["gps_interval"].id, SettingId::new(0x10));
        assert_eq!(doc.settings["gps_interval"].max, Some(3600.0));
        assert_eq!(doc.values["battery"].id, SettingId::new(128));
    }

    #[test]
    fn missing_groups_default_to_empty() {
        let doc: SchemaDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.settings.is_empty());
        assert!(doc.values.is_empty());
    }

    #[test]
    fn unknown_conversion_surfaces_on_use() {
        let err = entry("uint64", None).conversion().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::Codec(CodecError::UnsupportedConversion { ref entry, .. }) if entry == "test_entry"
        ));
    }

    #[test]
    fn default_values_follow_conversion() {
        assert_eq!(
            entry("uint16", Some(serde_json::json!(600))).default_value().unwrap(),
            Some(Value::U16(600))
        );
        assert_eq!(
            entry("bool", Some(serde_json::json!(true))).default_value().unwrap(),
            Some(Value::Bool(true))
        );
        assert_eq!(
            entry("float", Some(serde_json::json!(1.5))).default_value().unwrap(),
            Some(Value::Float(1.5))
        );
        assert_eq!(
            entry("byte_array", Some(serde_json::json!("{0x01, 0x02}")))
                .default_value()
                .unwrap(),
            Some(Value::ByteArray(vec![1, 2]))
        );
        assert_eq!(entry("uint8", None).default_value().unwrap(), None);
    }

    #[test]
    fn is_default_compares_byte_arrays_by_content() {
        let e = entry("byte_array", Some(serde_json::json!("{0x0a,0xff}")));
        assert!(e.is_default(&Value::ByteArray(vec![0x0A, 0xFF])));
        assert!(!e.is_default(&Value::ByteArray(vec![0x0A])));
    }

    #[test]
    fn is_default_for_scalars() {
        let e = entry("int32", Some(serde_json::json!(-5)));
        assert!(e.is_default(&Value::I32(-5)));
        assert!(!e.is_default(&Value::I32(5)));
        assert!(!entry("int32", None).is_default(&Value::I32(0)));
    }
}
