//! Device session for edge trackers.
//!
//! Sends commands over a duplex channel, correlates the device's
//! notifications with the single outstanding request, and decodes them
//! against the loaded schema.

pub mod config;
pub mod correlator;
pub mod demux;
pub mod error;
pub mod log;
pub mod session;

pub use config::SessionConfig;
pub use correlator::{spawn_notification_pump, Correlator};
pub use demux::{decode_inbound, Reply, ValueReply};
pub use error::{Result, SessionError};
pub use log::{ActivityLog, LogEntry, LogLevel};
pub use session::{FetchedSetting, Session};
