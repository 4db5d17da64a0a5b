//! Repository for the `learning_paths` and `path_courses` tables.

use pathways_core::types::DbId;
use sqlx::{PgConnection, PgPool};
use validator::Validate;

use crate::models::learning_path::{CreateLearningPath, CreatePathCourse, LearningPath, PathCourse};

/// Column list for `learning_paths` queries.
const COLUMNS: &str = "id, title, description, prerequisite_mode, \
    is_published, published_at, created_at, updated_at";

/// Column list for `path_courses` queries.
const COURSE_COLUMNS: &str = "id, path_id, course_id, title, position, \
    is_required, min_completion_percentage, created_at, updated_at";

/// Provides CRUD operations for learning paths and their ordered courses.
pub struct LearningPathRepo;

impl LearningPathRepo {
    /// Insert a new learning path together with its course references.
    ///
    /// The path row and all `path_courses` rows are written in one
    /// transaction; a bad course position leaves nothing behind.
    pub async fn create(
        pool: &PgPool,
        input: &CreateLearningPath,
    ) -> Result<LearningPath, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO learning_paths (title, description, prerequisite_mode) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let path = sqlx::query_as::<_, LearningPath>(&insert_query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.prerequisite_mode)
            .fetch_one(&mut *tx)
            .await?;

        for course in &input.courses {
            Self::insert_course(&mut tx, path.id, course).await?;
        }

        tx.commit().await?;
        Ok(path)
    }

    /// Validate a create DTO (title length, positions, percentage bounds).
    pub fn validate(input: &CreateLearningPath) -> Result<(), validator::ValidationErrors> {
        input.validate()
    }

    async fn insert_course(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        path_id: DbId,
        course: &CreatePathCourse,
    ) -> Result<PathCourse, sqlx::Error> {
        let query = format!(
            "INSERT INTO path_courses \
                 (path_id, course_id, title, position, is_required, min_completion_percentage) \
             VALUES ($1, $2, $3, $4, COALESCE($5, true), $6) \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, PathCourse>(&query)
            .bind(path_id)
            .bind(course.course_id)
            .bind(&course.title)
            .bind(course.position)
            .bind(course.is_required)
            .bind(course.min_completion_percentage)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a learning path by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LearningPath>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM learning_paths WHERE id = $1");
        sqlx::query_as::<_, LearningPath>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a learning path by ID on an open connection or transaction.
    pub async fn fetch(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<LearningPath>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM learning_paths WHERE id = $1");
        sqlx::query_as::<_, LearningPath>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List learning paths, optionally restricted to published ones.
    pub async fn list(
        pool: &PgPool,
        published_only: bool,
    ) -> Result<Vec<LearningPath>, sqlx::Error> {
        let query = if published_only {
            format!("SELECT {COLUMNS} FROM learning_paths WHERE is_published = true ORDER BY title")
        } else {
            format!("SELECT {COLUMNS} FROM learning_paths ORDER BY title")
        };
        sqlx::query_as::<_, LearningPath>(&query)
            .fetch_all(pool)
            .await
    }

    /// List a path's courses ordered by position.
    pub async fn list_courses(
        conn: &mut PgConnection,
        path_id: DbId,
    ) -> Result<Vec<PathCourse>, sqlx::Error> {
        let query = format!(
            "SELECT {COURSE_COLUMNS} FROM path_courses WHERE path_id = $1 ORDER BY position"
        );
        sqlx::query_as::<_, PathCourse>(&query)
            .bind(path_id)
            .fetch_all(conn)
            .await
    }

    /// Mark a path as published, stamping `published_at`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn publish(pool: &PgPool, id: DbId) -> Result<Option<LearningPath>, sqlx::Error> {
        let query = format!(
            "UPDATE learning_paths \
             SET is_published = true, published_at = NOW(), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LearningPath>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Unpublish a path. Existing enrollments are unaffected; only new
    /// enrollment attempts are rejected.
    pub async fn unpublish(pool: &PgPool, id: DbId) -> Result<Option<LearningPath>, sqlx::Error> {
        let query = format!(
            "UPDATE learning_paths \
             SET is_published = false, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LearningPath>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Append a course to an existing path.
    pub async fn add_course(
        pool: &PgPool,
        path_id: DbId,
        course: &CreatePathCourse,
    ) -> Result<PathCourse, sqlx::Error> {
        let query = format!(
            "INSERT INTO path_courses \
                 (path_id, course_id, title, position, is_required, min_completion_percentage) \
             VALUES ($1, $2, $3, $4, COALESCE($5, true), $6) \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, PathCourse>(&query)
            .bind(path_id)
            .bind(course.course_id)
            .bind(&course.title)
            .bind(course.position)
            .bind(course.is_required)
            .bind(course.min_completion_percentage)
            .fetch_one(pool)
            .await
    }

    /// Remove a course from a path. Returns `true` if a row was deleted.
    pub async fn remove_course(
        pool: &PgPool,
        path_id: DbId,
        course_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM path_courses WHERE path_id = $1 AND course_id = $2")
            .bind(path_id)
            .bind(course_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
