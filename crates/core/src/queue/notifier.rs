//! Queue change notifications for UI listeners

use fieldsync_domain::constants::QUEUE_EVENT_CAPACITY;
use tokio::sync::broadcast;
use tracing::trace;

/// Published after every successful queue mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueChanged {
    /// Queue length after the mutation.
    pub count: usize,
}

/// Fan-out of [`QueueChanged`] events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct QueueNotifier {
    sender: broadcast::Sender<QueueChanged>,
}

impl QueueNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueChanged> {
        self.sender.subscribe()
    }

    pub fn notify(&self, count: usize) {
        if self.sender.send(QueueChanged { count }).is_err() {
            trace!(count, "No queue listeners subscribed");
        }
    }
}

impl Default for QueueNotifier {
    fn default() -> Self {
        Self::new(QUEUE_EVENT_CAPACITY)
    }
}
