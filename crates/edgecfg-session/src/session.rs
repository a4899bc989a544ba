use std::sync::Arc;

use bytes::Bytes;
use edgecfg_channel::{DuplexChannel, FrameSink};
use edgecfg_codec::{command, encode, StatusRecord, Value};
use edgecfg_schema::{parse_input, SchemaEntry, SchemaError, SchemaRegistry, SettingId};
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::correlator::{spawn_notification_pump, Correlator};
use crate::demux::{Reply, ValueReply};
use crate::error::{Result, SessionError};
use crate::log::{ActivityLog, LogEntry};

/// One setting read during [`Session::fetch_all_settings`].
#[derive(Debug)]
pub struct FetchedSetting {
    pub entry: SchemaEntry,
    pub result: Result<Value>,
}

impl FetchedSetting {
    /// True when the read succeeded and matches the declared default.
    pub fn is_default(&self) -> bool {
        self.result
            .as_ref()
            .is_ok_and(|value| self.entry.is_default(value))
    }
}

/// A configuration session with one tracker.
///
/// Owns the correlator and the task that feeds it notifications. Every
/// operation appends to the activity log, whether it succeeds or fails.
pub struct Session<S> {
    correlator: Arc<Correlator<S>>,
    log: Arc<ActivityLog>,
    config: SessionConfig,
    pump: JoinHandle<()>,
}

impl<S: FrameSink> Session<S> {
    /// Start a session over an open channel. Must be called inside a Tokio runtime.
    pub fn connect(channel: DuplexChannel<S>, registry: SchemaRegistry) -> Self {
        Self::connect_with_config(channel, registry, SessionConfig::default())
    }

    /// Start a session with explicit configuration.
    pub fn connect_with_config(
        channel: DuplexChannel<S>,
        registry: SchemaRegistry,
        config: SessionConfig,
    ) -> Self {
        let (sink, notifications) = channel.into_parts();
        let log = Arc::new(ActivityLog::new(config.activity_log_capacity));
        let entries = registry.len();
        let correlator = Arc::new(Correlator::new(
            sink,
            Arc::new(registry),
            config.response_timeout,
            Arc::clone(&log),
        ));
        let pump = spawn_notification_pump(Arc::clone(&correlator), notifications);

        log.info(format!("connected, schema has {entries} entries"));
        Self {
            correlator,
            log,
            config,
            pump,
        }
    }

    /// Replace the schema. Later responses decode against the new one.
    pub fn load_schema(&self, registry: SchemaRegistry) {
        let entries = registry.len();
        self.correlator.set_registry(Arc::new(registry));
        self.log.info(format!("schema loaded, {entries} entries"));
    }

    pub fn registry(&self) -> Arc<SchemaRegistry> {
        self.correlator.registry()
    }

    /// Read a setting.
    pub async fn request_setting<I>(&self, id: I) -> Result<ValueReply>
    where
        I: TryInto<SettingId>,
        SchemaError: From<I::Error>,
    {
        let result = match self.resolve(id) {
            Ok(entry) => self.read(entry.id, command::read_setting).await,
            Err(err) => Err(err),
        };
        self.note("read setting", result, describe_value)
    }

    /// Read a runtime value.
    pub async fn request_value<I>(&self, id: I) -> Result<ValueReply>
    where
        I: TryInto<SettingId>,
        SchemaError: From<I::Error>,
    {
        let result = match self.resolve(id) {
            Ok(entry) => self.read(entry.id, command::read_value).await,
            Err(err) => Err(err),
        };
        self.note("read value", result, describe_value)
    }

    /// Ask for a status telegram.
    pub async fn request_status(&self) -> Result<StatusRecord> {
        let result = match self.correlator.send(command::read_status()).await {
            Ok(Reply::Status(status)) => Ok(status),
            Ok(other) => Err(unexpected("status telegram", &other)),
            Err(err) => Err(err),
        };
        self.note("read status", result, |status| {
            format!(
                "status: reset {}, battery {} mV, fw {}",
                status.reset,
                status.battery_mv,
                status.fw_version()
            )
        })
    }

    /// Validate `text` for a setting, write it, then read it back.
    ///
    /// Returns the read-back value. Nothing is written when validation fails.
    pub async fn update_setting<I>(&self, id: I, text: &str) -> Result<ValueReply>
    where
        I: TryInto<SettingId>,
        SchemaError: From<I::Error>,
    {
        let result = match self.resolve(id).and_then(|entry| {
            let value = parse_input(&entry, text)?;
            Ok((entry, value))
        }) {
            Ok((entry, value)) => self.write_and_verify(&entry, &value).await,
            Err(err) => Err(err),
        };
        self.note("update setting", result, describe_value)
    }

    /// Write a setting's declared default, then read it back.
    pub async fn reset_setting<I>(&self, id: I) -> Result<ValueReply>
    where
        I: TryInto<SettingId>,
        SchemaError: From<I::Error>,
    {
        let result = match self.resolve(id).and_then(|entry| {
            let value = entry
                .default_value()?
                .ok_or_else(|| SessionError::NoDefault(entry.name.clone()))?;
            Ok((entry, value))
        }) {
            Ok((entry, value)) => self.write_and_verify(&entry, &value).await,
            Err(err) => Err(err),
        };
        self.note("reset setting", result, describe_value)
    }

    /// Read every setting, one at a time, in document order.
    pub async fn fetch_all_settings(&self) -> Vec<FetchedSetting> {
        self.fetch_all_settings_with_progress(|_, _, _| {}).await
    }

    /// Like [`fetch_all_settings`](Self::fetch_all_settings), calling
    /// `progress(done, total, entry)` after each read.
    pub async fn fetch_all_settings_with_progress(
        &self,
        mut progress: impl FnMut(usize, usize, &SchemaEntry),
    ) -> Vec<FetchedSetting> {
        let entries: Vec<SchemaEntry> = self.registry().settings().into_iter().cloned().collect();
        let total = entries.len();
        let mut fetched = Vec::with_capacity(total);

        for (index, entry) in entries.into_iter().enumerate() {
            let result = self
                .request_setting(entry.id)
                .await
                .map(|reply| reply.value);
            progress(index + 1, total, &entry);
            fetched.push(FetchedSetting { entry, result });
        }

        let ok = fetched.iter().filter(|f| f.result.is_ok()).count();
        self.log.info(format!("read {ok} of {total} settings"));
        fetched
    }

    /// Snapshot of the activity log, oldest first.
    pub fn activity(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True when no request is outstanding.
    pub fn is_idle(&self) -> bool {
        self.correlator.is_idle()
    }

    fn resolve<I>(&self, id: I) -> Result<SchemaEntry>
    where
        I: TryInto<SettingId>,
        SchemaError: From<I::Error>,
    {
        Ok(self.registry().lookup(id)?.clone())
    }

    async fn read(&self, id: SettingId, build: fn(u8) -> Bytes) -> Result<ValueReply> {
        match self.correlator.send(build(id.get())).await? {
            Reply::Value(reply) if reply.id == id => Ok(reply),
            other => Err(unexpected(&format!("value {id}"), &other)),
        }
    }

    async fn write_and_verify(&self, entry: &SchemaEntry, value: &Value) -> Result<ValueReply> {
        let payload = encode(value, entry.conversion()?)?;
        let frame = command::write_setting(entry.id.get(), &payload)?;
        self.correlator.post(frame).await?;
        self.log.info(format!("wrote {} = {value}", entry.name));

        tokio::time::sleep(self.config.write_settle_delay).await;

        let reply = self.read(entry.id, command::read_setting).await?;
        if reply.value != *value {
            self.log.error(format!(
                "{} reads back as {} after writing {value}",
                entry.name, reply.value
            ));
        }
        Ok(reply)
    }

    fn note<T>(&self, action: &str, result: Result<T>, describe: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(done) => self.log.info(describe(done)),
            Err(err) => self.log.error(format!("{action} failed: {err}")),
        }
        result
    }
}

impl<S> Drop for Session<S> {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

fn describe_value(reply: &ValueReply) -> String {
    reply.to_string()
}

fn unexpected(expected: &str, got: &Reply) -> SessionError {
    SessionError::UnexpectedReply {
        expected: expected.to_string(),
        got: got.describe(),
    }
}
