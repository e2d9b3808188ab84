use std::sync::Arc;

use tokio::sync::broadcast;

use memwall_types::events::WallEvent;

pub const DEFAULT_CAPACITY: usize = 1024;

/// Fans out wall events to every subscriber.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Slow subscribers lag and skip events rather than block publishers
    broadcast_tx: broadcast::Sender<WallEvent>,
}

impl Dispatcher {
    pub fn new(capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to wall events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<WallEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn broadcast(&self, event: WallEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.inner.broadcast_tx.receiver_count()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
