//! Device schema registry.
//!
//! A schema document lists the settings and readable values a firmware
//! build exposes, each with an id and a primitive conversion. The registry
//! indexes both groups by id so inbound responses can be decoded and
//! operator input can be validated and encoded.

pub mod config;
pub mod entry;
pub mod error;
pub mod group;
pub mod id;
pub mod registry;
pub mod validate;

pub use config::RegistryConfig;
pub use entry::{EntrySpec, Group, SchemaDocument, SchemaEntry};
pub use error::{Result, SchemaError};
pub use group::{group_by_prefix, SettingGroup, OTHER_GROUP};
pub use id::SettingId;
pub use registry::SchemaRegistry;
pub use validate::{parse_input, parse_text};
