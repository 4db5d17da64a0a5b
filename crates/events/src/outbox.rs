//! Per-operation event accumulation.
//!
//! Engine operations record their events into an [`EventOutbox`] while the
//! owning transaction is open and publish the batch only after commit, so
//! no consumer ever observes an event for state that was rolled back.

use crate::bus::EventBus;
use crate::event::PathEvent;

/// Events produced by one engine operation, awaiting publication.
#[derive(Debug, Default)]
pub struct EventOutbox {
    events: Vec<PathEvent>,
}

impl EventOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event for publication after commit.
    pub fn record(&mut self, event: PathEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Take the accumulated events, leaving the outbox empty.
    pub fn drain(&mut self) -> Vec<PathEvent> {
        std::mem::take(&mut self.events)
    }

    /// Publish every accumulated event to the bus, in recording order,
    /// and return them to the caller.
    pub fn publish_to(&mut self, bus: &EventBus) -> Vec<PathEvent> {
        let events = self.drain();
        for event in &events {
            bus.publish(event.clone());
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(id: i64) -> PathEvent {
        PathEvent::PathCompleted {
            path_enrollment_id: id,
            user_id: 1,
            path_id: 1,
        }
    }

    #[test]
    fn drain_empties_the_outbox() {
        let mut outbox = EventOutbox::new();
        outbox.record(completed(1));
        outbox.record(completed(2));
        assert_eq!(outbox.len(), 2);

        let events = outbox.drain();
        assert_eq!(events.len(), 2);
        assert!(outbox.is_empty());
    }

    #[tokio::test]
    async fn publish_to_preserves_recording_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let mut outbox = EventOutbox::new();
        outbox.record(completed(1));
        outbox.record(completed(2));
        let events = outbox.publish_to(&bus);
        assert_eq!(events.len(), 2);

        assert_eq!(rx.recv().await.unwrap().path_enrollment_id(), 1);
        assert_eq!(rx.recv().await.unwrap().path_enrollment_id(), 2);
    }
}
