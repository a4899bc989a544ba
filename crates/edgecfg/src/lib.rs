//! Configurator for BLE edge trackers.
//!
//! edgecfg loads a device schema, reads and writes individual settings,
//! decodes status telegrams and runtime values, and renders the result.
//!
//! # Crate Structure
//!
//! - [`channel`]: duplex link abstraction (in-memory, BLE behind `ble`)
//! - [`codec`]: value codec, status telegram decoder, command builder
//! - [`schema`]: schema registry, id normalization, input validation
//! - [`session`]: request/response correlation and the device session API
//! - [`sim`]: in-process simulated tracker

/// Re-export channel types.
pub mod channel {
    pub use edgecfg_channel::*;
}

/// Re-export codec types.
pub mod codec {
    pub use edgecfg_codec::*;
}

/// Re-export schema types.
pub mod schema {
    pub use edgecfg_schema::*;
}

/// Re-export session types.
pub mod session {
    pub use edgecfg_session::*;
}

pub mod sim;
