//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every received [`PathEvent`] to the
//! `path_events` table. It runs as a long-lived background task and shuts
//! down when the bus sender is dropped.

use pathways_core::types::DbId;
use pathways_db::repositories::PathEventRepo;
use pathways_db::DbPool;
use tokio::sync::broadcast;

use crate::event::PathEvent;

/// Background service that persists progression events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop.
    ///
    /// Subscribes via the provided `receiver` and persists every event it
    /// receives. The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PathEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = event.name(),
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event to the `path_events` table.
    async fn persist(pool: &DbPool, event: &PathEvent) -> Result<DbId, sqlx::Error> {
        let payload = serde_json::to_value(event)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        PathEventRepo::insert(
            pool,
            event.name(),
            event.path_enrollment_id(),
            event.user_id(),
            &payload,
        )
        .await
    }
}
