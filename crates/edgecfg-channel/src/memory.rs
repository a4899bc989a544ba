use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{ChannelError, Result};
use crate::traits::{DuplexChannel, FrameSink};

/// Outbound half of an in-memory link.
#[derive(Debug, Clone)]
pub struct MemorySink {
    commands: mpsc::Sender<Bytes>,
}

impl FrameSink for MemorySink {
    async fn send_frame(&self, frame: Bytes) -> Result<()> {
        tracing::trace!(len = frame.len(), "memory sink write");
        self.commands
            .send(frame)
            .await
            .map_err(|_| ChannelError::Closed)
    }
}

/// Device end of an in-memory link.
///
/// Receives the frames written by the host and pushes notifications back.
#[derive(Debug)]
pub struct MemoryDevice {
    commands: mpsc::Receiver<Bytes>,
    notify: mpsc::Sender<Bytes>,
}

impl MemoryDevice {
    /// Wait for the next frame written by the host.
    ///
    /// Returns `None` once the host side has been dropped.
    pub async fn recv_command(&mut self) -> Option<Bytes> {
        self.commands.recv().await
    }

    /// Take the next host frame without waiting.
    pub fn try_recv_command(&mut self) -> Option<Bytes> {
        self.commands.try_recv().ok()
    }

    /// Push a notification to the host.
    pub async fn notify(&self, frame: impl Into<Bytes>) -> Result<()> {
        self.notify
            .send(frame.into())
            .await
            .map_err(|_| ChannelError::Closed)
    }

    /// A cloneable handle for pushing notifications from elsewhere.
    pub fn notifier(&self) -> mpsc::Sender<Bytes> {
        self.notify.clone()
    }
}

/// Create a connected in-memory link.
///
/// `capacity` bounds both directions.
pub fn memory_pair(capacity: usize) -> (DuplexChannel<MemorySink>, MemoryDevice) {
    let capacity = capacity.max(1);
    let (command_tx, command_rx) = mpsc::channel(capacity);
    let (notify_tx, notify_rx) = mpsc::channel(capacity);

    let host = DuplexChannel::new(
        MemorySink {
            commands: command_tx,
        },
        notify_rx,
    );
    let device = MemoryDevice {
        commands: command_rx,
        notify: notify_tx,
    };
    (host, device)
}
