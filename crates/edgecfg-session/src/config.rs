use std::time::Duration;

/// Timing and buffering knobs for a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a request waits for its notification.
    pub response_timeout: Duration,
    /// Pause between writing a setting and reading it back.
    pub write_settle_delay: Duration,
    /// Entries kept by the activity log before the oldest are evicted.
    pub activity_log_capacity: usize,
    /// Depth of the inbound notification queue a link should be opened with.
    pub notification_queue: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_millis(5000),
            write_settle_delay: Duration::from_secs(1),
            activity_log_capacity: 200,
            notification_queue: 32,
        }
    }
}
