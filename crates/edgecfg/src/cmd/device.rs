use std::time::Duration;

use bytes::Bytes;
use edgecfg::channel::{memory_pair, DuplexChannel, FrameSink, MemorySink};
use edgecfg::schema::{SchemaRegistry, SettingId};
use edgecfg::session::{Session, SessionConfig};
use edgecfg::sim::SimulatedTracker;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

#[cfg(feature = "ble")]
use edgecfg::channel::ble::{self, BleConfig, BleLink, BleSink};

use crate::cmd::DeviceArgs;
use crate::exit::{schema_error, CliError, CliResult, INTERNAL, NOT_FOUND, USAGE};
use crate::output::print_activity;

/// Where commands go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSpec {
    Sim,
    Ble(Option<String>),
}

impl DeviceSpec {
    pub fn parse(text: &str) -> CliResult<Self> {
        match text.trim() {
            "sim" => Ok(Self::Sim),
            "ble" => Ok(Self::Ble(None)),
            other => match other.strip_prefix("ble:") {
                Some(target) if !target.is_empty() => Ok(Self::Ble(Some(target.to_string()))),
                _ => Err(CliError::new(
                    USAGE,
                    format!("unknown device {other:?} (expected sim, ble or ble:<name>)"),
                )),
            },
        }
    }
}

/// Outbound half of whichever link was opened.
pub enum DeviceSink {
    Sim(MemorySink),
    #[cfg(feature = "ble")]
    Ble(BleSink),
}

impl FrameSink for DeviceSink {
    async fn send_frame(&self, frame: Bytes) -> edgecfg::channel::Result<()> {
        match self {
            DeviceSink::Sim(sink) => sink.send_frame(frame).await,
            #[cfg(feature = "ble")]
            DeviceSink::Ble(sink) => sink.send_frame(frame).await,
        }
    }
}

enum Link {
    Sim(JoinHandle<SimulatedTracker>),
    #[cfg(feature = "ble")]
    Ble(BleLink),
}

/// An open session plus whatever keeps its link alive.
pub struct DeviceSession {
    pub session: Session<DeviceSink>,
    link: Link,
}

impl DeviceSession {
    pub async fn open(
        spec: &DeviceSpec,
        registry: SchemaRegistry,
        config: SessionConfig,
    ) -> CliResult<Self> {
        match spec {
            DeviceSpec::Sim => {
                let (channel, device) = memory_pair(config.notification_queue);
                let tracker = SimulatedTracker::from_registry(&registry).spawn(device);
                let (sink, notifications) = channel.into_parts();
                let channel = DuplexChannel::new(DeviceSink::Sim(sink), notifications);
                tracing::debug!("using simulated tracker");
                Ok(Self {
                    session: Session::connect_with_config(channel, registry, config),
                    link: Link::Sim(tracker),
                })
            }
            #[cfg(feature = "ble")]
            DeviceSpec::Ble(target) => {
                let ble_config = BleConfig {
                    target: target.clone(),
                    notification_queue: config.notification_queue,
                    ..BleConfig::default()
                };
                let (channel, link) = ble::connect(&ble_config)
                    .await
                    .map_err(|err| crate::exit::channel_error("connect failed", err))?;
                let (sink, notifications) = channel.into_parts();
                let channel = DuplexChannel::new(DeviceSink::Ble(sink), notifications);
                Ok(Self {
                    session: Session::connect_with_config(channel, registry, config),
                    link: Link::Ble(link),
                })
            }
            #[cfg(not(feature = "ble"))]
            DeviceSpec::Ble(_) => Err(CliError::new(
                USAGE,
                "this build has no BLE support (rebuild with the `ble` feature)",
            )),
        }
    }

    /// Tear the link down, printing the activity log first if asked.
    pub async fn close(self, show_log: bool) {
        if show_log {
            print_activity(&self.session.activity());
        }
        let DeviceSession { session, link } = self;
        drop(session);
        match link {
            Link::Sim(tracker) => {
                let _ = tracker.await;
            }
            #[cfg(feature = "ble")]
            Link::Ble(link) => {
                if let Err(err) = link.disconnect().await {
                    tracing::warn!(%err, "disconnect failed");
                }
            }
        }
    }
}

/// Load the schema named by `--schema`.
pub fn load_registry(args: &DeviceArgs) -> CliResult<SchemaRegistry> {
    let path = args
        .schema
        .as_ref()
        .ok_or_else(|| CliError::new(USAGE, "--schema <FILE> is required for this command"))?;
    SchemaRegistry::from_file(path).map_err(|err| schema_error("schema load failed", err))
}

pub fn session_config(args: &DeviceArgs) -> CliResult<SessionConfig> {
    Ok(SessionConfig {
        response_timeout: parse_duration(&args.timeout, false)?,
        write_settle_delay: parse_duration(&args.settle, true)?,
        ..SessionConfig::default()
    })
}

pub fn runtime() -> CliResult<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))
}

/// Accept an id (`0x10`, `16`) or an entry name.
pub fn resolve_id(registry: &SchemaRegistry, text: &str) -> CliResult<SettingId> {
    if let Ok(id) = SettingId::parse(text) {
        return Ok(id);
    }
    registry
        .settings()
        .into_iter()
        .chain(registry.values())
        .find(|entry| entry.name == text)
        .map(|entry| entry.id)
        .ok_or_else(|| CliError::new(NOT_FOUND, format!("no entry named {text:?}")))
}

pub fn parse_duration(input: &str, allow_zero: bool) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 && !allow_zero {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
