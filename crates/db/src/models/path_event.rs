//! Durable progression-event rows.

use pathways_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `path_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PathEventRow {
    pub id: DbId,
    pub event_type: String,
    pub path_enrollment_id: DbId,
    pub user_id: DbId,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
