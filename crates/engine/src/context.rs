//! Shared per-operation view of a path's configuration.

use pathways_core::prerequisite::{evaluator_for, PathCourseRef, PrerequisiteEvaluator};
use pathways_core::types::DbId;
use pathways_core::{CoreError, PrerequisiteMode};
use pathways_db::models::learning_path::{LearningPath, PathCourse};
use pathways_db::repositories::LearningPathRepo;
use sqlx::PgConnection;

use crate::error::EngineResult;

/// A path, its ordered courses, and the resolved evaluator — loaded once
/// per operation on the operation's own connection.
pub(crate) struct PathContext {
    pub path: LearningPath,
    pub mode: PrerequisiteMode,
    pub courses: Vec<PathCourse>,
    /// Evaluator view of `courses`, same order.
    pub course_refs: Vec<PathCourseRef>,
}

impl PathContext {
    pub async fn load(conn: &mut PgConnection, path_id: DbId) -> EngineResult<Self> {
        let path = LearningPathRepo::fetch(conn, path_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "learning_path",
                id: path_id,
            })?;
        let mode = path.prerequisite_mode()?;
        let courses = LearningPathRepo::list_courses(conn, path_id).await?;
        let course_refs = courses.iter().map(PathCourse::as_ref_view).collect();

        Ok(Self {
            path,
            mode,
            courses,
            course_refs,
        })
    }

    pub fn evaluator(&self) -> &'static dyn PrerequisiteEvaluator {
        evaluator_for(self.mode)
    }

    /// Number of required courses in the current configuration.
    pub fn required_total(&self) -> i64 {
        self.courses.iter().filter(|c| c.is_required).count() as i64
    }
}
