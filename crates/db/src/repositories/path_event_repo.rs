//! Repository for the `path_events` table.

use pathways_core::types::DbId;
use sqlx::PgPool;

use crate::models::path_event::PathEventRow;

/// Column list for `path_events` queries.
const COLUMNS: &str = "id, event_type, path_enrollment_id, user_id, payload, created_at";

/// Provides read/write operations for persisted progression events.
pub struct PathEventRepo;

impl PathEventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        path_enrollment_id: DbId,
        user_id: DbId,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO path_events (event_type, path_enrollment_id, user_id, payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(event_type)
        .bind(path_enrollment_id)
        .bind(user_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// List events for an enrollment, oldest first.
    pub async fn list_for_enrollment(
        pool: &PgPool,
        path_enrollment_id: DbId,
    ) -> Result<Vec<PathEventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM path_events \
             WHERE path_enrollment_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, PathEventRow>(&query)
            .bind(path_enrollment_id)
            .fetch_all(pool)
            .await
    }
}
