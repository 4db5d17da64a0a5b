//! Repository for the `course_progress` table.
//!
//! Every state transition is a gated UPDATE keyed on the current persisted
//! status. Re-running an operation after it committed therefore matches no
//! rows, which is what makes unlocking idempotent under duplicate event
//! delivery.

use pathways_core::types::DbId;
use sqlx::PgConnection;

use crate::models::course_progress::{CourseProgress, NewCourseProgress};
use crate::models::status::CourseProgressStatus;

/// Column list for `course_progress` queries.
const COLUMNS: &str = "id, path_enrollment_id, course_id, position, status_id, \
    course_enrollment_id, started_at, completed_at, created_at, updated_at";

/// Provides state-record operations for per-course progress.
pub struct CourseProgressRepo;

impl CourseProgressRepo {
    /// Insert a new progress record.
    pub async fn insert(
        conn: &mut PgConnection,
        record: &NewCourseProgress,
    ) -> Result<CourseProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO course_progress \
                 (path_enrollment_id, course_id, position, status_id, course_enrollment_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseProgress>(&query)
            .bind(record.path_enrollment_id)
            .bind(record.course_id)
            .bind(record.position)
            .bind(record.status.id())
            .bind(record.course_enrollment_id)
            .fetch_one(conn)
            .await
    }

    /// All records for an enrollment, ordered by position.
    pub async fn list_for_enrollment(
        conn: &mut PgConnection,
        path_enrollment_id: DbId,
    ) -> Result<Vec<CourseProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM course_progress \
             WHERE path_enrollment_id = $1 \
             ORDER BY position"
        );
        sqlx::query_as::<_, CourseProgress>(&query)
            .bind(path_enrollment_id)
            .fetch_all(conn)
            .await
    }

    /// The record for one course within an enrollment.
    pub async fn find_for_enrollment_course(
        conn: &mut PgConnection,
        path_enrollment_id: DbId,
        course_id: DbId,
    ) -> Result<Option<CourseProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM course_progress \
             WHERE path_enrollment_id = $1 AND course_id = $2"
        );
        sqlx::query_as::<_, CourseProgress>(&query)
            .bind(path_enrollment_id)
            .bind(course_id)
            .fetch_optional(conn)
            .await
    }

    /// Records of an enrollment that reference the given course enrollment.
    pub async fn list_for_course_enrollment(
        conn: &mut PgConnection,
        path_enrollment_id: DbId,
        course_enrollment_id: DbId,
    ) -> Result<Vec<CourseProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM course_progress \
             WHERE path_enrollment_id = $1 AND course_enrollment_id = $2 \
             ORDER BY position"
        );
        sqlx::query_as::<_, CourseProgress>(&query)
            .bind(path_enrollment_id)
            .bind(course_enrollment_id)
            .fetch_all(conn)
            .await
    }

    /// Course IDs the learner has completed within this enrollment.
    pub async fn completed_course_ids(
        conn: &mut PgConnection,
        path_enrollment_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT course_id FROM course_progress \
             WHERE path_enrollment_id = $1 AND status_id = $2 \
             ORDER BY position",
        )
        .bind(path_enrollment_id)
        .bind(CourseProgressStatus::Completed.id())
        .fetch_all(conn)
        .await
    }

    /// `(completed_required, required_total)` for the percentage formula.
    ///
    /// Joins through `path_courses` so that `is_required` reflects the
    /// path's current configuration, not a snapshot.
    pub async fn required_counts(
        conn: &mut PgConnection,
        path_enrollment_id: DbId,
    ) -> Result<(i64, i64), sqlx::Error> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT \
                 COUNT(*) FILTER (WHERE cp.status_id = $2), \
                 COUNT(*) \
             FROM course_progress cp \
             JOIN path_enrollments pe ON pe.id = cp.path_enrollment_id \
             JOIN path_courses pc \
                 ON pc.path_id = pe.path_id AND pc.course_id = cp.course_id \
             WHERE cp.path_enrollment_id = $1 AND pc.is_required",
        )
        .bind(path_enrollment_id)
        .bind(CourseProgressStatus::Completed.id())
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// Transition `locked -> available`, assigning the course enrollment.
    ///
    /// Gated on the record still being `locked`; a concurrent invocation
    /// that lost the race affects zero rows and returns `false`.
    pub async fn unlock(
        conn: &mut PgConnection,
        id: DbId,
        course_enrollment_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE course_progress \
             SET status_id = $2, course_enrollment_id = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(CourseProgressStatus::Available.id())
        .bind(course_enrollment_id)
        .bind(CourseProgressStatus::Locked.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `available -> in_progress`, stamping `started_at`.
    ///
    /// Matches no row for any other state, including `locked` (a locked
    /// course can never be started directly).
    pub async fn start(
        conn: &mut PgConnection,
        path_enrollment_id: DbId,
        course_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE course_progress \
             SET status_id = $3, started_at = NOW(), updated_at = NOW() \
             WHERE path_enrollment_id = $1 AND course_id = $2 AND status_id = $4",
        )
        .bind(path_enrollment_id)
        .bind(course_id)
        .bind(CourseProgressStatus::InProgress.id())
        .bind(CourseProgressStatus::Available.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `available | in_progress -> completed`, stamping
    /// `completed_at`. No-op for `locked` and already-`completed` records.
    pub async fn complete_record(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE course_progress \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id IN ($3, $4)",
        )
        .bind(id)
        .bind(CourseProgressStatus::Completed.id())
        .bind(CourseProgressStatus::Available.id())
        .bind(CourseProgressStatus::InProgress.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revert `in_progress | completed -> available`, clearing timestamps.
    ///
    /// Already-`available` records are untouched; `locked` records cannot
    /// match because they carry no course-enrollment reference.
    pub async fn revert_to_available(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE course_progress \
             SET status_id = $2, started_at = NULL, completed_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status_id IN ($3, $4)",
        )
        .bind(id)
        .bind(CourseProgressStatus::Available.id())
        .bind(CourseProgressStatus::InProgress.id())
        .bind(CourseProgressStatus::Completed.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every record of an enrollment.
    ///
    /// Used by non-preserving re-enrollment before the initial layout is
    /// re-seeded from the path's current configuration.
    pub async fn delete_for_enrollment(
        conn: &mut PgConnection,
        path_enrollment_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM course_progress WHERE path_enrollment_id = $1")
            .bind(path_enrollment_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Re-point a record at a (possibly recreated) course enrollment.
    ///
    /// Used by preserving re-enrollment when the underlying enrollment was
    /// dropped and had to be reactivated or replaced.
    pub async fn set_course_enrollment(
        conn: &mut PgConnection,
        id: DbId,
        course_enrollment_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE course_progress \
             SET course_enrollment_id = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(course_enrollment_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Delete the record for a course that was removed from the path.
    pub async fn delete_for_course(
        conn: &mut PgConnection,
        path_enrollment_id: DbId,
        course_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM course_progress \
             WHERE path_enrollment_id = $1 AND course_id = $2",
        )
        .bind(path_enrollment_id)
        .bind(course_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
