//! Single-slot request/response correlation.
//!
//! The device answers commands with notifications that carry no request
//! id, so at most one request may be outstanding. The slot is an explicit
//! state machine:
//!
//! ```text
//!   Idle ──send/post──▶ Awaiting { generation, continuation }
//!    ▲                        │
//!    └── reply / timeout / ───┘
//!        write error / drop
//! ```
//!
//! Each arming gets a fresh generation. The in-flight call holds a guard
//! that returns the slot to `Idle` only if the generation still matches,
//! so a late guard never clears a newer request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use edgecfg_channel::{FrameSink, Notifications};
use edgecfg_schema::SchemaRegistry;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::demux::{decode_inbound, Reply};
use crate::error::{Result, SessionError};
use crate::log::ActivityLog;

type Continuation = oneshot::Sender<Result<Reply>>;

enum Slot {
    Idle,
    Awaiting {
        generation: u64,
        /// `None` for write-only commands that expect no notification.
        continuation: Option<Continuation>,
    },
}

/// Correlates outbound commands with inbound notifications.
pub struct Correlator<S> {
    sink: S,
    registry: RwLock<Arc<SchemaRegistry>>,
    slot: Mutex<Slot>,
    generation: AtomicU64,
    response_timeout: Duration,
    log: Arc<ActivityLog>,
}

impl<S: FrameSink> Correlator<S> {
    pub fn new(
        sink: S,
        registry: Arc<SchemaRegistry>,
        response_timeout: Duration,
        log: Arc<ActivityLog>,
    ) -> Self {
        Self {
            sink,
            registry: RwLock::new(registry),
            slot: Mutex::new(Slot::Idle),
            generation: AtomicU64::new(0),
            response_timeout,
            log,
        }
    }

    /// Send a command and wait for the notification that answers it.
    ///
    /// Fails immediately with `RequestAlreadyPending` when another request
    /// is outstanding; nothing is written in that case.
    pub async fn send(&self, frame: Bytes) -> Result<Reply> {
        let (tx, rx) = oneshot::channel();
        let generation = self.arm(Some(tx))?;
        let _guard = SlotGuard {
            slot: &self.slot,
            generation,
        };

        tracing::debug!(generation, frame = ?frame.as_ref(), "sending request");
        self.sink.send_frame(frame).await?;

        match tokio::time::timeout(self.response_timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(SessionError::Disconnected),
            Err(_) => {
                tracing::warn!(generation, timeout = ?self.response_timeout, "request timed out");
                Err(SessionError::Timeout(self.response_timeout))
            }
        }
    }

    /// Write a command that the device does not answer.
    ///
    /// Occupies the slot for the duration of the write.
    pub async fn post(&self, frame: Bytes) -> Result<()> {
        let generation = self.arm(None)?;
        let _guard = SlotGuard {
            slot: &self.slot,
            generation,
        };

        tracing::debug!(generation, frame = ?frame.as_ref(), "posting command");
        self.sink.send_frame(frame).await?;
        Ok(())
    }

    /// Handle one inbound frame.
    ///
    /// The decoded reply, or the decode error, goes to the pending request.
    /// With nothing pending it is logged and dropped.
    pub fn on_notification(&self, frame: &[u8]) {
        tracing::debug!(frame = ?frame, "notification received");
        let decoded = decode_inbound(frame, &self.registry());

        let decoded = match self.take_continuation() {
            Some(continuation) => match continuation.send(decoded) {
                Ok(()) => return,
                Err(unclaimed) => unclaimed,
            },
            None => decoded,
        };

        match decoded {
            Ok(reply) => self.log.info(format!("unsolicited {reply}")),
            Err(err) => self.log.error(format!("dropped notification: {err}")),
        }
    }

    /// Fail the pending request, if any, because the link is gone.
    pub fn close(&self) {
        if let Some(continuation) = self.take_continuation() {
            let _ = continuation.send(Err(SessionError::Disconnected));
        }
    }

    /// True when no request is outstanding.
    pub fn is_idle(&self) -> bool {
        matches!(*self.lock_slot(), Slot::Idle)
    }

    /// Current schema.
    pub fn registry(&self) -> Arc<SchemaRegistry> {
        Arc::clone(&self.registry.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swap in a new schema. Requests already decoded are unaffected.
    pub fn set_registry(&self, registry: Arc<SchemaRegistry>) {
        *self.registry.write().unwrap_or_else(PoisonError::into_inner) = registry;
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    fn arm(&self, continuation: Option<Continuation>) -> Result<u64> {
        let mut slot = self.lock_slot();
        if matches!(*slot, Slot::Awaiting { .. }) {
            return Err(SessionError::RequestAlreadyPending);
        }
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        *slot = Slot::Awaiting {
            generation,
            continuation,
        };
        Ok(generation)
    }

    fn take_continuation(&self) -> Option<Continuation> {
        let mut slot = self.lock_slot();
        if !matches!(*slot, Slot::Awaiting { continuation: Some(_), .. }) {
            return None;
        }
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Awaiting { continuation, .. } => continuation,
            Slot::Idle => None,
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct SlotGuard<'a> {
    slot: &'a Mutex<Slot>,
    generation: u64,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*slot, Slot::Awaiting { generation, .. } if generation == self.generation) {
            *slot = Slot::Idle;
        }
    }
}

/// Feed inbound frames to the correlator in arrival order.
///
/// When the notification stream ends, a pending request fails with
/// `Disconnected`.
pub fn spawn_notification_pump<S: FrameSink>(
    correlator: Arc<Correlator<S>>,
    mut notifications: Notifications,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = notifications.recv().await {
            correlator.on_notification(&frame);
        }
        tracing::debug!("notification stream closed");
        correlator.close();
    })
}

#[cfg(test)]
mod tests {
    use edgecfg_channel::{memory_pair, ChannelError, MemoryDevice, MemorySink};
    use edgecfg_codec::Value;

    use super::*;
    use crate::log::LogLevel;

    const TIMEOUT: Duration = Duration::from_millis(5000);

    fn registry() -> Arc<SchemaRegistry> {
        Arc::new(
            SchemaRegistry::from_json(
                r#"{ "settings": { "gps_interval": { "id": "0x10", "conversion": "uint16" } } }"#,
            )
            .unwrap(),
        )
    }

    fn setup() -> (Arc<Correlator<MemorySink>>, MemoryDevice, JoinHandle<()>) {
        let (channel, device) = memory_pair(8);
        let (sink, notifications) = channel.into_parts();
        let correlator = Arc::new(Correlator::new(
            sink,
            registry(),
            TIMEOUT,
            Arc::new(ActivityLog::new(16)),
        ));
        let pump = spawn_notification_pump(Arc::clone(&correlator), notifications);
        (correlator, device, pump)
    }

    struct FailingSink;

    impl FrameSink for FailingSink {
        async fn send_frame(&self, _frame: Bytes) -> edgecfg_channel::Result<()> {
            Err(ChannelError::Write("link down".to_string()))
        }
    }

    fn expect_value(reply: Reply) -> Value {
        match reply {
            Reply::Value(reply) => reply.value,
            other => panic!("expected value reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_resolves_request() {
        let (correlator, mut device, _pump) = setup();

        let requester = {
            let correlator = Arc::clone(&correlator);
            tokio::spawn(async move { correlator.send(Bytes::from_static(&[0x20, 0xA8, 0x01, 0x10])).await })
        };

        let command = device.recv_command().await.unwrap();
        assert_eq!(command.as_ref(), &[0x20, 0xA8, 0x01, 0x10]);
        device.notify(vec![3, 0x10, 0x02, 0x2C, 0x01]).await.unwrap();

        let reply = requester.await.unwrap().unwrap();
        assert_eq!(expect_value(reply), Value::U16(300));
        assert!(correlator.is_idle());
    }

    #[tokio::test]
    async fn second_request_rejected_while_pending() {
        let (correlator, mut device, _pump) = setup();

        let first = {
            let correlator = Arc::clone(&correlator);
            tokio::spawn(async move { correlator.send(Bytes::from_static(&[0x20, 0xA8, 0x01, 0x10])).await })
        };
        device.recv_command().await.unwrap();

        let second = correlator
            .send(Bytes::from_static(&[0x20, 0xA4, 0x00]))
            .await;
        assert!(matches!(second, Err(SessionError::RequestAlreadyPending)));
        assert!(matches!(
            correlator.post(Bytes::from_static(&[0x03, 0x10, 0x01, 0x00])).await,
            Err(SessionError::RequestAlreadyPending)
        ));
        assert!(device.try_recv_command().is_none());

        device.notify(vec![3, 0x10, 0x02, 0x01, 0x00]).await.unwrap();
        assert_eq!(expect_value(first.await.unwrap().unwrap()), Value::U16(1));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_returns_slot_to_idle() {
        let (correlator, mut device, _pump) = setup();

        let err = correlator
            .send(Bytes::from_static(&[0x20, 0xA8, 0x01, 0x10]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Timeout(t) if t == TIMEOUT));
        assert!(correlator.is_idle());
        device.recv_command().await.unwrap();

        let responder = tokio::spawn(async move {
            device.recv_command().await.unwrap();
            device.notify(vec![30, 0x10, 0x02, 0x05, 0x00]).await.unwrap();
            device
        });
        let reply = correlator
            .send(Bytes::from_static(&[0x20, 0xA8, 0x01, 0x10]))
            .await
            .unwrap();
        assert_eq!(expect_value(reply), Value::U16(5));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn unknown_port_dropped_when_idle() {
        let (correlator, _device, _pump) = setup();
        correlator.on_notification(&[9, 1, 2]);
        assert!(correlator.is_idle());

        let entries = correlator.log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert!(entries[0].message.contains("unknown port 9"));
    }

    #[tokio::test]
    async fn unsolicited_value_logged_as_info() {
        let (correlator, _device, _pump) = setup();
        correlator.on_notification(&[3, 0x10, 0x02, 0x2C, 0x01]);
        let entries = correlator.log.snapshot();
        assert_eq!(entries[0].level, LogLevel::Info);
        assert!(entries[0].message.contains("gps_interval = 300"));
    }

    #[tokio::test]
    async fn unknown_port_rejects_pending_request() {
        let (correlator, mut device, _pump) = setup();

        let requester = {
            let correlator = Arc::clone(&correlator);
            tokio::spawn(async move { correlator.send(Bytes::from_static(&[0x20, 0xA4, 0x00])).await })
        };
        device.recv_command().await.unwrap();
        device.notify(vec![9, 0, 0]).await.unwrap();

        assert!(matches!(
            requester.await.unwrap(),
            Err(SessionError::UnknownPort(9))
        ));
        assert!(correlator.is_idle());
    }

    #[tokio::test]
    async fn write_failure_clears_slot() {
        let correlator = Correlator::new(
            FailingSink,
            registry(),
            TIMEOUT,
            Arc::new(ActivityLog::new(4)),
        );
        let err = correlator
            .send(Bytes::from_static(&[0x20, 0xA4, 0x00]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Channel(ChannelError::Write(_))));
        assert!(correlator.is_idle());

        assert!(correlator
            .post(Bytes::from_static(&[0x03, 0x10, 0x01, 0x00]))
            .await
            .is_err());
        assert!(correlator.is_idle());
    }

    #[tokio::test]
    async fn post_does_not_wait_for_reply() {
        let (correlator, mut device, _pump) = setup();
        correlator
            .post(Bytes::from_static(&[0x03, 0x10, 0x02, 0x2C, 0x01]))
            .await
            .unwrap();
        assert!(correlator.is_idle());
        assert_eq!(
            device.recv_command().await.unwrap().as_ref(),
            &[0x03, 0x10, 0x02, 0x2C, 0x01]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_request_clears_slot() {
        let (correlator, _device, _pump) = setup();
        let outer = tokio::time::timeout(
            Duration::from_millis(10),
            correlator.send(Bytes::from_static(&[0x20, 0xA4, 0x00])),
        )
        .await;
        assert!(outer.is_err());
        assert!(correlator.is_idle());
    }

    #[tokio::test]
    async fn disconnect_fails_pending_request() {
        let (correlator, mut device, pump) = setup();

        let requester = {
            let correlator = Arc::clone(&correlator);
            tokio::spawn(async move { correlator.send(Bytes::from_static(&[0x20, 0xA4, 0x00])).await })
        };
        device.recv_command().await.unwrap();
        drop(device);
        pump.await.unwrap();

        assert!(matches!(
            requester.await.unwrap(),
            Err(SessionError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn registry_swap_applies_to_later_frames() {
        let (correlator, _device, _pump) = setup();
        correlator.set_registry(Arc::new(SchemaRegistry::new()));
        correlator.on_notification(&[3, 0x10, 0x02, 0x2C, 0x01]);
        let entries = correlator.log.snapshot();
        assert!(entries[0].message.contains("not found"));
    }
}
