//! Repository for the `path_enrollments` table.
//!
//! Status transitions are expressed as gated UPDATEs: the `WHERE` clause
//! checks the current persisted status, so concurrent callers cannot both
//! apply the same transition. `uq_path_enrollments_user_path` makes the
//! concurrent double-enroll race fail fast at insert time.

use pathways_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::path_enrollment::PathEnrollment;
use crate::models::status::PathEnrollmentStatus;

/// Column list for `path_enrollments` queries.
const COLUMNS: &str = "id, user_id, path_id, status_id, progress_percentage, \
    enrolled_at, completed_at, dropped_at, drop_reason, created_at, updated_at";

/// Provides lifecycle operations for path enrollments.
pub struct PathEnrollmentRepo;

impl PathEnrollmentRepo {
    /// Insert a fresh `active` enrollment.
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: DbId,
        path_id: DbId,
        progress_percentage: i16,
    ) -> Result<PathEnrollment, sqlx::Error> {
        let query = format!(
            "INSERT INTO path_enrollments (user_id, path_id, status_id, progress_percentage) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PathEnrollment>(&query)
            .bind(user_id)
            .bind(path_id)
            .bind(PathEnrollmentStatus::Active.id())
            .bind(progress_percentage)
            .fetch_one(conn)
            .await
    }

    /// Find an enrollment by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PathEnrollment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM path_enrollments WHERE id = $1");
        sqlx::query_as::<_, PathEnrollment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find and row-lock an enrollment by ID inside a transaction.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<PathEnrollment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM path_enrollments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, PathEnrollment>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find the enrollment for a (user, path) pair.
    pub async fn find_by_user_and_path(
        pool: &PgPool,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<Option<PathEnrollment>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM path_enrollments WHERE user_id = $1 AND path_id = $2");
        sqlx::query_as::<_, PathEnrollment>(&query)
            .bind(user_id)
            .bind(path_id)
            .fetch_optional(pool)
            .await
    }

    /// Find and row-lock the enrollment for a (user, path) pair.
    ///
    /// Serializes re-enrollment against concurrent progress updates for
    /// the same row.
    pub async fn lock_by_user_and_path(
        conn: &mut PgConnection,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<Option<PathEnrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM path_enrollments \
             WHERE user_id = $1 AND path_id = $2 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, PathEnrollment>(&query)
            .bind(user_id)
            .bind(path_id)
            .fetch_optional(conn)
            .await
    }

    /// Reactivate a dropped enrollment in place (re-enrollment).
    ///
    /// Clears `dropped_at`/`drop_reason`/`completed_at`, resets
    /// `enrolled_at` to now and sets the recomputed percentage.
    pub async fn reactivate(
        conn: &mut PgConnection,
        id: DbId,
        progress_percentage: i16,
    ) -> Result<PathEnrollment, sqlx::Error> {
        let query = format!(
            "UPDATE path_enrollments \
             SET status_id = $2, progress_percentage = $3, enrolled_at = NOW(), \
                 completed_at = NULL, dropped_at = NULL, drop_reason = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PathEnrollment>(&query)
            .bind(id)
            .bind(PathEnrollmentStatus::Active.id())
            .bind(progress_percentage)
            .fetch_one(conn)
            .await
    }

    /// Update the stored percentage.
    pub async fn set_progress(
        conn: &mut PgConnection,
        id: DbId,
        progress_percentage: i16,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE path_enrollments \
             SET progress_percentage = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(progress_percentage)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Transition `active -> completed`, stamping `completed_at`.
    ///
    /// Returns `false` when the enrollment was not `active` (the gated
    /// UPDATE matched no row).
    pub async fn mark_completed(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE path_enrollments \
             SET status_id = $2, completed_at = NOW(), progress_percentage = 100, \
                 updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(PathEnrollmentStatus::Completed.id())
        .bind(PathEnrollmentStatus::Active.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `active -> dropped` with an optional reason.
    pub async fn mark_dropped(
        conn: &mut PgConnection,
        id: DbId,
        reason: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE path_enrollments \
             SET status_id = $2, dropped_at = NOW(), drop_reason = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(PathEnrollmentStatus::Dropped.id())
        .bind(reason)
        .bind(PathEnrollmentStatus::Active.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `completed -> active` (course-level reversion), clearing
    /// `completed_at` and setting the recomputed percentage.
    pub async fn revert_to_active(
        conn: &mut PgConnection,
        id: DbId,
        progress_percentage: i16,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE path_enrollments \
             SET status_id = $2, completed_at = NULL, progress_percentage = $3, \
                 updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(PathEnrollmentStatus::Active.id())
        .bind(progress_percentage)
        .bind(PathEnrollmentStatus::Completed.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Enrollments whose course-progress records reference the given
    /// course enrollment, locked for the duration of a fan-out transaction.
    ///
    /// When `active_only` is set, dropped and completed path enrollments
    /// are excluded (completion fan-out); the drop cascade passes `false`
    /// so completed paths can revert.
    pub async fn lock_for_course_enrollment(
        conn: &mut PgConnection,
        course_enrollment_id: DbId,
        active_only: bool,
    ) -> Result<Vec<PathEnrollment>, sqlx::Error> {
        let filter = if active_only {
            "AND status_id = $2"
        } else {
            "AND status_id <> $2"
        };
        let query = format!(
            "SELECT {COLUMNS} FROM path_enrollments \
             WHERE id IN ( \
                 SELECT path_enrollment_id FROM course_progress \
                 WHERE course_enrollment_id = $1 \
             ) {filter} \
             ORDER BY id \
             FOR UPDATE"
        );
        let status = if active_only {
            PathEnrollmentStatus::Active.id()
        } else {
            PathEnrollmentStatus::Dropped.id()
        };
        sqlx::query_as::<_, PathEnrollment>(&query)
            .bind(course_enrollment_id)
            .bind(status)
            .fetch_all(conn)
            .await
    }
}
