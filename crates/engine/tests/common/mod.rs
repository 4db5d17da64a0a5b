//! Shared fixtures for engine integration tests.

use std::sync::Arc;

use pathways_core::types::DbId;
use pathways_db::models::course_progress::CourseProgress;
use pathways_db::models::learning_path::{CreateLearningPath, CreatePathCourse, LearningPath};
use pathways_db::repositories::{
    CourseEnrollmentRepo, CourseProgressRepo, LearningPathRepo,
};
use pathways_engine::{EnrollmentService, ProgressService};
use pathways_events::{EventBus, PathEvent};
use sqlx::PgPool;

pub fn course(course_id: DbId, position: i32, required: bool) -> CreatePathCourse {
    CreatePathCourse {
        course_id,
        title: format!("Course {course_id}"),
        position,
        is_required: Some(required),
        min_completion_percentage: None,
    }
}

/// Create and publish a path with the given courses.
pub async fn published_path(
    pool: &PgPool,
    mode: Option<&str>,
    courses: Vec<CreatePathCourse>,
) -> LearningPath {
    let input = CreateLearningPath {
        title: "Test Path".to_string(),
        description: None,
        prerequisite_mode: mode.map(str::to_string),
        courses,
    };
    LearningPathRepo::validate(&input).unwrap();
    let path = LearningPathRepo::create(pool, &input).await.unwrap();
    LearningPathRepo::publish(pool, path.id).await.unwrap().unwrap()
}

/// Create an unpublished path with the given courses.
pub async fn draft_path(pool: &PgPool, courses: Vec<CreatePathCourse>) -> LearningPath {
    let input = CreateLearningPath {
        title: "Draft Path".to_string(),
        description: None,
        prerequisite_mode: None,
        courses,
    };
    LearningPathRepo::create(pool, &input).await.unwrap()
}

pub fn services(pool: &PgPool) -> (EnrollmentService, ProgressService, Arc<EventBus>) {
    let bus = Arc::new(EventBus::default());
    (
        EnrollmentService::new(pool.clone(), bus.clone()),
        ProgressService::new(pool.clone(), bus.clone()),
        bus,
    )
}

/// All course-progress records of an enrollment, ordered by position.
pub async fn progress_records(pool: &PgPool, enrollment_id: DbId) -> Vec<CourseProgress> {
    let mut conn = pool.acquire().await.unwrap();
    CourseProgressRepo::list_for_enrollment(&mut conn, enrollment_id)
        .await
        .unwrap()
}

/// The record for one course within an enrollment.
pub async fn record_for(pool: &PgPool, enrollment_id: DbId, course_id: DbId) -> CourseProgress {
    let mut conn = pool.acquire().await.unwrap();
    CourseProgressRepo::find_for_enrollment_course(&mut conn, enrollment_id, course_id)
        .await
        .unwrap()
        .expect("course progress record should exist")
}

/// Simulate the Course Enrollment subsystem completing a course, then run
/// the completion fan-out the listener would trigger.
pub async fn complete_course(
    pool: &PgPool,
    progress: &ProgressService,
    enrollment_id: DbId,
    course_id: DbId,
) -> Vec<PathEvent> {
    let record = record_for(pool, enrollment_id, course_id).await;
    let ce_id = record
        .course_enrollment_id
        .expect("course must be unlocked before it can be completed");

    let mut conn = pool.acquire().await.unwrap();
    CourseEnrollmentRepo::complete(&mut conn, ce_id).await.unwrap();
    drop(conn);

    progress.on_course_completed(ce_id).await.unwrap()
}

/// Simulate the user dropping a course enrollment, then run the drop
/// cascade the listener would trigger.
pub async fn drop_course(
    pool: &PgPool,
    progress: &ProgressService,
    course_enrollment_id: DbId,
    reason: Option<&str>,
) {
    let mut conn = pool.acquire().await.unwrap();
    CourseEnrollmentRepo::drop_enrollment(&mut conn, course_enrollment_id)
        .await
        .unwrap();
    drop(conn);

    progress
        .on_course_dropped(course_enrollment_id, reason)
        .await
        .unwrap();
}
