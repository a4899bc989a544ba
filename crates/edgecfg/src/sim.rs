//! Simulated tracker.
//!
//! Answers the three command shapes the configurator sends, from state
//! seeded with each entry's declared default. Writes update that state
//! silently, as the real device does.

use std::collections::{HashMap, HashSet};

use bytes::{BufMut, Bytes, BytesMut};
use edgecfg_channel::{memory_pair, MemoryDevice, MemorySink};
use edgecfg_codec::{
    encode, CMD_READ_SETTING, CMD_READ_STATUS, CMD_READ_VALUE, READ_CLASS, STATUS_PORT,
    STATUS_TELEGRAM_LEN, WRITE_CLASS,
};
use edgecfg_schema::{SchemaEntry, SchemaRegistry, SettingId};
use edgecfg_session::{Session, SessionConfig};
use tokio::task::JoinHandle;

/// Port used for setting read replies.
pub const SETTING_REPLY_PORT: u8 = 3;

/// Port used for runtime value read replies.
pub const VALUE_REPLY_PORT: u8 = 30;

/// Status body reported unless replaced: soft reset, battery 3700 mV,
/// locked and joined with 3 satellites, about 24.7 degrees, up 12 days,
/// hardware 2.1, firmware 1.3, rhinoedge.
pub const DEFAULT_STATUS: [u8; STATUS_TELEGRAM_LEN] = [
    0x04, 0x00, 120, 0x36, 159, 12, 128, 128, 255, 0x21, 0x13, 0x11, 0, 0x31,
];

#[derive(Debug, Clone)]
pub struct SimulatedTracker {
    state: HashMap<SettingId, Vec<u8>>,
    muted: HashSet<SettingId>,
    status: [u8; STATUS_TELEGRAM_LEN],
}

impl SimulatedTracker {
    /// Seed state from the schema's defaults.
    ///
    /// Entries without a usable default start zeroed (fixed-width kinds)
    /// or empty (strings, byte arrays).
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        let mut state = HashMap::new();
        for entry in registry.settings().into_iter().chain(registry.values()) {
            if let Some(payload) = initial_payload(entry) {
                state.insert(entry.id, payload);
            }
        }
        Self {
            state,
            muted: HashSet::new(),
            status: DEFAULT_STATUS,
        }
    }

    /// Report `body` for status requests.
    pub fn with_status(mut self, body: [u8; STATUS_TELEGRAM_LEN]) -> Self {
        self.status = body;
        self
    }

    /// Never answer reads of `id`.
    pub fn mute(mut self, id: SettingId) -> Self {
        self.muted.insert(id);
        self
    }

    pub fn set(&mut self, id: SettingId, payload: Vec<u8>) {
        self.state.insert(id, payload);
    }

    pub fn get(&self, id: SettingId) -> Option<&[u8]> {
        self.state.get(&id).map(Vec::as_slice)
    }

    /// Handle one command frame; returns the notification to send, if any.
    pub fn handle(&mut self, command: &[u8]) -> Option<Bytes> {
        match command {
            [READ_CLASS, CMD_READ_SETTING, 0x01, id] => self.reply(SETTING_REPLY_PORT, *id),
            [READ_CLASS, CMD_READ_VALUE, 0x01, id] => self.reply(VALUE_REPLY_PORT, *id),
            [READ_CLASS, CMD_READ_STATUS, 0x00] => {
                let mut dst = BytesMut::with_capacity(1 + STATUS_TELEGRAM_LEN);
                dst.put_u8(STATUS_PORT);
                dst.put_slice(&self.status);
                Some(dst.freeze())
            }
            [WRITE_CLASS, id, len, payload @ ..] => {
                let len = usize::from(*len).min(payload.len());
                tracing::debug!(id = %SettingId::new(*id), len, "simulator write");
                self.state.insert(SettingId::new(*id), payload[..len].to_vec());
                None
            }
            other => {
                tracing::warn!(frame = ?other, "simulator ignoring unknown command");
                None
            }
        }
    }

    /// Serve commands from `device` until the host side closes.
    ///
    /// The join handle yields the final state.
    pub fn spawn(mut self, mut device: MemoryDevice) -> JoinHandle<Self> {
        tokio::spawn(async move {
            while let Some(command) = device.recv_command().await {
                if let Some(reply) = self.handle(&command) {
                    if device.notify(reply).await.is_err() {
                        break;
                    }
                }
            }
            self
        })
    }

    fn reply(&self, port: u8, id: u8) -> Option<Bytes> {
        let id = SettingId::new(id);
        if self.muted.contains(&id) {
            return None;
        }
        let Some(payload) = self.state.get(&id) else {
            tracing::warn!(%id, "simulator has no value");
            return None;
        };
        let len = payload.len().min(usize::from(u8::MAX));
        let mut dst = BytesMut::with_capacity(3 + len);
        dst.put_u8(port);
        dst.put_u8(id.get());
        dst.put_u8(len as u8);
        dst.put_slice(&payload[..len]);
        Some(dst.freeze())
    }
}

fn initial_payload(entry: &SchemaEntry) -> Option<Vec<u8>> {
    let conversion = entry.conversion().ok()?;
    if let Ok(Some(value)) = entry.default_value() {
        if let Ok(encoded) = encode(&value, conversion) {
            return Some(encoded.to_vec());
        }
    }
    Some(vec![0; conversion.width().unwrap_or(0)])
}

/// A session wired to a freshly spawned simulator.
pub fn simulated_session(
    registry: SchemaRegistry,
    config: SessionConfig,
) -> (Session<MemorySink>, JoinHandle<SimulatedTracker>) {
    let tracker = SimulatedTracker::from_registry(&registry);
    simulated_session_with(tracker, registry, config)
}

/// Like [`simulated_session`] with a prepared tracker.
pub fn simulated_session_with(
    tracker: SimulatedTracker,
    registry: SchemaRegistry,
    config: SessionConfig,
) -> (Session<MemorySink>, JoinHandle<SimulatedTracker>) {
    let (channel, device) = memory_pair(config.notification_queue);
    let handle = tracker.spawn(device);
    (Session::connect_with_config(channel, registry, config), handle)
}
