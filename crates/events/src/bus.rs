//! In-process fan-out buses backed by `tokio::sync::broadcast`.
//!
//! [`Bus`] is shared via `Arc` across the application. Two instantiations
//! exist: [`EventBus`] for outward [`PathEvent`]s and [`SignalBus`] for
//! inbound [`CourseSignal`]s.

use tokio::sync::broadcast;

use crate::event::{CourseSignal, PathEvent};

/// Default buffer capacity for the broadcast channels.
const DEFAULT_CAPACITY: usize = 1024;

/// Capacity-bounded publish/subscribe hub.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published message. When the buffer is full
/// the oldest un-consumed messages are dropped and slow receivers observe
/// `RecvError::Lagged`.
pub struct Bus<T: Clone> {
    sender: broadcast::Sender<T>,
}

/// Outward progression events.
pub type EventBus = Bus<PathEvent>;

/// Inbound course-enrollment signals.
pub type SignalBus = Bus<CourseSignal>;

impl<T: Clone> Bus<T> {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a message to all current subscribers.
    ///
    /// If there are no active subscribers the message is silently dropped;
    /// the persistence layer (when subscribed) ensures database capture.
    pub fn publish(&self, message: T) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(message);
    }

    /// Subscribe to all messages published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T: Clone> Default for Bus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
