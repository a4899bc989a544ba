use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// Inbound notification queue.
///
/// Frames are delivered in arrival order, one raw notification per item.
pub type Notifications = mpsc::Receiver<Bytes>;

/// Outbound half of a device channel.
///
/// Implementations write one raw frame per call. Framing beyond a single
/// write is the link's concern, not the caller's.
pub trait FrameSink: Send + Sync + 'static {
    /// Write a frame to the device.
    fn send_frame(&self, frame: Bytes) -> impl Future<Output = Result<()>> + Send;
}

/// A connected link: the outbound sink plus its inbound notifications.
pub struct DuplexChannel<S> {
    pub sink: S,
    pub notifications: Notifications,
}

impl<S: FrameSink> DuplexChannel<S> {
    /// Assemble a channel from its two halves.
    pub fn new(sink: S, notifications: Notifications) -> Self {
        Self {
            sink,
            notifications,
        }
    }

    /// Split the channel into its halves.
    pub fn into_parts(self) -> (S, Notifications) {
        (self.sink, self.notifications)
    }
}

impl<S> std::fmt::Debug for DuplexChannel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplexChannel")
            .field("sink", &std::any::type_name::<S>())
            .finish_non_exhaustive()
    }
}
