//! Course enrollment entity model (the external collaborator's aggregate).

use pathways_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `course_enrollments` table.
///
/// Exactly one row exists per (user, course); every path that references
/// the course for that user shares it. The progression engine only reads
/// the status and requests lifecycle transitions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseEnrollment {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub status_id: StatusId,
    pub enrolled_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub dropped_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
