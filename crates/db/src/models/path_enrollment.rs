//! Path enrollment entity model.

use pathways_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `path_enrollments` table.
///
/// At most one row exists per (user, path) at any time; re-enrollment
/// after a drop reactivates this row instead of inserting a new one.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PathEnrollment {
    pub id: DbId,
    pub user_id: DbId,
    pub path_id: DbId,
    pub status_id: StatusId,
    /// 0..=100, rounded down; 100 for paths with zero required courses.
    pub progress_percentage: i16,
    pub enrolled_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub dropped_at: Option<Timestamp>,
    pub drop_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
