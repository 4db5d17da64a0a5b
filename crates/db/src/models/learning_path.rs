//! Learning path entity models and DTOs.

use pathways_core::prerequisite::{PathCourseRef, PrerequisiteMode};
use pathways_core::types::{DbId, Timestamp};
use pathways_core::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `learning_paths` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LearningPath {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    /// NULL defaults to `sequential`; see [`LearningPath::prerequisite_mode`].
    pub prerequisite_mode: Option<String>,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LearningPath {
    /// Resolve the stored mode string, defaulting NULL to `sequential`.
    ///
    /// An unknown string on a persisted row is a configuration error and
    /// surfaces as [`CoreError::InvalidPrerequisiteMode`].
    pub fn prerequisite_mode(&self) -> Result<PrerequisiteMode, CoreError> {
        PrerequisiteMode::from_column(self.prerequisite_mode.as_deref())
    }
}

/// A row from the `path_courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PathCourse {
    pub id: DbId,
    pub path_id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub position: i32,
    pub is_required: bool,
    pub min_completion_percentage: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PathCourse {
    /// The evaluator's view of this course reference.
    pub fn as_ref_view(&self) -> PathCourseRef {
        PathCourseRef {
            course_id: self.course_id,
            title: self.title.clone(),
            position: self.position,
            is_required: self.is_required,
        }
    }
}

/// DTO for creating a learning path together with its ordered courses.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLearningPath {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    /// One of `sequential`, `immediate_previous`, `none`; `None` defaults
    /// to `sequential` at read time.
    pub prerequisite_mode: Option<String>,
    #[validate(nested)]
    pub courses: Vec<CreatePathCourse>,
}

/// One course reference inside [`CreateLearningPath`].
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePathCourse {
    pub course_id: DbId,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 1))]
    pub position: i32,
    /// Defaults to `true`.
    pub is_required: Option<bool>,
    #[validate(range(min = 0, max = 100))]
    pub min_completion_percentage: Option<i16>,
}
