use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Recency-of-inbound-traffic heuristic. Any valid inbound envelope counts
/// as evidence the other side is alive; a side can therefore look connected
/// purely because it is receiving notifications, even if its own keep-alives
/// go unanswered.
pub struct Liveness {
    last_message: Mutex<Option<Instant>>,
    window: Duration,
}

impl Liveness {
    /// The window is twice the keep-alive interval.
    pub fn new(heartbeat_interval: Duration) -> Self {
        Self {
            last_message: Mutex::new(None),
            window: heartbeat_interval * 2,
        }
    }

    pub fn touch(&self) {
        *self.last_message.lock() = Some(Instant::now());
    }

    pub fn is_connected(&self) -> bool {
        self.last_message
            .lock()
            .is_some_and(|last| last.elapsed() <= self.window)
    }

    /// Back to "unknown/disconnected", as at construction.
    pub fn reset(&self) {
        *self.last_message.lock() = None;
    }
}
