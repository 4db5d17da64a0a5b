//! Per-course progress records owned by a path enrollment.

use pathways_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::{CourseProgressStatus, StatusId};

/// A row from the `course_progress` table.
///
/// `course_enrollment_id` is a weak reference: the underlying enrollment
/// may be shared with other paths and is never owned by this record. A
/// `locked` record carries no reference (enforced by a CHECK constraint).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseProgress {
    pub id: DbId,
    pub path_enrollment_id: DbId,
    pub course_id: DbId,
    /// Mirrors the path's course position at creation time.
    pub position: i32,
    pub status_id: StatusId,
    pub course_enrollment_id: Option<DbId>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CourseProgress {
    pub fn is_locked(&self) -> bool {
        self.status_id == CourseProgressStatus::Locked.id()
    }

    pub fn is_completed(&self) -> bool {
        self.status_id == CourseProgressStatus::Completed.id()
    }
}

/// Insert payload for a new progress record.
#[derive(Debug)]
pub struct NewCourseProgress {
    pub path_enrollment_id: DbId,
    pub course_id: DbId,
    pub position: i32,
    pub status: CourseProgressStatus,
    pub course_enrollment_id: Option<DbId>,
}
