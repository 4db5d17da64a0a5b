//! Repository for the `course_enrollments` table.
//!
//! This is the consumed collaborator contract of the Course Enrollment
//! subsystem: the engine reads status and requests lifecycle transitions,
//! never anything else. All methods take an open connection so they compose
//! under the engine's transactions.

use pathways_core::types::DbId;
use sqlx::PgConnection;

use crate::models::course_enrollment::CourseEnrollment;
use crate::models::status::CourseEnrollmentStatus;

/// Column list for `course_enrollments` queries.
const COLUMNS: &str = "id, user_id, course_id, status_id, enrolled_at, \
    completed_at, dropped_at, created_at, updated_at";

/// Provides the course-enrollment lifecycle contract.
pub struct CourseEnrollmentRepo;

impl CourseEnrollmentRepo {
    /// Find an enrollment by its ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<CourseEnrollment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM course_enrollments WHERE id = $1");
        sqlx::query_as::<_, CourseEnrollment>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find the single enrollment for a (user, course) pair, any status.
    pub async fn find_for_user_course(
        conn: &mut PgConnection,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<CourseEnrollment>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM course_enrollments WHERE user_id = $1 AND course_id = $2");
        sqlx::query_as::<_, CourseEnrollment>(&query)
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(conn)
            .await
    }

    /// Reuse or create the enrollment for a (user, course) pair.
    ///
    /// An existing `active` or `completed` row is returned as-is; a
    /// `dropped` row is reactivated in place; otherwise a fresh `active`
    /// row is inserted. This is the only write path, so at most one row
    /// ever exists per pair (also enforced by
    /// `uq_course_enrollments_user_course`).
    pub async fn find_or_create_active(
        conn: &mut PgConnection,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<CourseEnrollment, sqlx::Error> {
        if let Some(existing) = Self::find_for_user_course(conn, user_id, course_id).await? {
            if existing.status_id == CourseEnrollmentStatus::Dropped.id() {
                return Self::reactivate(conn, existing.id).await;
            }
            return Ok(existing);
        }

        let query = format!(
            "INSERT INTO course_enrollments (user_id, course_id, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseEnrollment>(&query)
            .bind(user_id)
            .bind(course_id)
            .bind(CourseEnrollmentStatus::Active.id())
            .fetch_one(conn)
            .await
    }

    /// Reactivate a dropped enrollment in place.
    pub async fn reactivate(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<CourseEnrollment, sqlx::Error> {
        let query = format!(
            "UPDATE course_enrollments \
             SET status_id = $2, enrolled_at = NOW(), dropped_at = NULL, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseEnrollment>(&query)
            .bind(id)
            .bind(CourseEnrollmentStatus::Active.id())
            .fetch_one(conn)
            .await
    }

    /// Mark an enrollment as completed. No-op if it already is.
    pub async fn complete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE course_enrollments \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id <> $2",
        )
        .bind(id)
        .bind(CourseEnrollmentStatus::Completed.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark an enrollment as dropped. No-op if it already is.
    pub async fn drop_enrollment(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE course_enrollments \
             SET status_id = $2, dropped_at = NOW(), completed_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status_id <> $2",
        )
        .bind(id)
        .bind(CourseEnrollmentStatus::Dropped.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
