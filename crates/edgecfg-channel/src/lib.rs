//! Duplex frame channel abstraction for edge tracker links.
//!
//! A tracker exposes one bidirectional data channel made of two one-way
//! endpoints: commands are written to the device, and responses arrive as
//! asynchronous notifications. This crate provides:
//! - [`FrameSink`], the outbound half
//! - [`Notifications`], the inbound queue registered once at connect time
//! - an in-memory pair for tests and simulation
//! - a Nordic UART BLE link (behind the `ble` feature)
//!
//! This is the lowest layer of edgecfg. Everything else builds on top of
//! the [`DuplexChannel`] type provided here.

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "ble")]
pub mod ble;

pub use error::{ChannelError, Result};
pub use memory::{memory_pair, MemoryDevice, MemorySink};
pub use traits::{DuplexChannel, FrameSink, Notifications};
