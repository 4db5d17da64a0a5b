//! Integration tests for course enrollments shared across paths: one
//! completion or drop signal fans out to every path that references the
//! enrollment, atomically.

mod common;

use common::*;
use pathways_db::models::status::{CourseProgressStatus, PathEnrollmentStatus};
use pathways_db::repositories::PathEnrollmentRepo;
use pathways_engine::EnrollOptions;
use pathways_events::PathEvent;
use sqlx::PgPool;

const USER: i64 = 11;
const SHARED_COURSE: i64 = 500;

#[sqlx::test(migrations = "../../db/migrations")]
async fn paths_reuse_one_course_enrollment_per_course(pool: PgPool) {
    let p1 = published_path(
        &pool,
        Some("none"),
        vec![course(SHARED_COURSE, 1, true), course(501, 2, true)],
    )
    .await;
    let p2 = published_path(&pool, Some("none"), vec![course(SHARED_COURSE, 1, true)]).await;
    let (enrollment_svc, _, _) = services(&pool);

    let e1 = enrollment_svc
        .enroll(USER, p1.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;
    let e2 = enrollment_svc
        .enroll(USER, p2.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;

    let ce1 = record_for(&pool, e1.id, SHARED_COURSE)
        .await
        .course_enrollment_id
        .unwrap();
    let ce2 = record_for(&pool, e2.id, SHARED_COURSE)
        .await
        .course_enrollment_id
        .unwrap();
    assert_eq!(ce1, ce2, "both paths must point at the same enrollment");

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM course_enrollments WHERE user_id = $1 AND course_id = $2")
            .bind(USER)
            .bind(SHARED_COURSE)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn one_completion_updates_every_referencing_path(pool: PgPool) {
    let p1 = published_path(
        &pool,
        Some("none"),
        vec![course(SHARED_COURSE, 1, true), course(501, 2, true)],
    )
    .await;
    let p2 = published_path(&pool, Some("none"), vec![course(SHARED_COURSE, 1, true)]).await;
    let (enrollment_svc, progress_svc, _) = services(&pool);

    let e1 = enrollment_svc
        .enroll(USER, p1.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;
    let e2 = enrollment_svc
        .enroll(USER, p2.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;

    // One signal: path 1 moves to 50%, path 2 completes outright.
    let events = complete_course(&pool, &progress_svc, e1.id, SHARED_COURSE).await;

    let updates: Vec<(i64, i16)> = events
        .iter()
        .filter_map(|e| match e {
            PathEvent::PathProgressUpdated {
                path_enrollment_id,
                new_percentage,
                ..
            } => Some((*path_enrollment_id, *new_percentage)),
            _ => None,
        })
        .collect();
    assert!(updates.contains(&(e1.id, 50)));
    assert!(updates.contains(&(e2.id, 100)));
    assert!(events.iter().any(|e| matches!(
        e,
        PathEvent::PathCompleted { path_enrollment_id, .. } if *path_enrollment_id == e2.id
    )));

    let row1 = PathEnrollmentRepo::find_by_id(&pool, e1.id).await.unwrap().unwrap();
    assert_eq!(row1.status_id, PathEnrollmentStatus::Active.id());
    assert_eq!(row1.progress_percentage, 50);
    let row2 = PathEnrollmentRepo::find_by_id(&pool, e2.id).await.unwrap().unwrap();
    assert_eq!(row2.status_id, PathEnrollmentStatus::Completed.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dropped_path_enrollments_are_left_out_of_the_fan_out(pool: PgPool) {
    let p1 = published_path(&pool, Some("none"), vec![course(SHARED_COURSE, 1, true)]).await;
    let p2 = published_path(&pool, Some("none"), vec![course(SHARED_COURSE, 1, true)]).await;
    let (enrollment_svc, progress_svc, _) = services(&pool);

    let e1 = enrollment_svc
        .enroll(USER, p1.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;
    let e2 = enrollment_svc
        .enroll(USER, p2.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;
    enrollment_svc.drop_enrollment(e2.id, None).await.unwrap();

    let events = complete_course(&pool, &progress_svc, e1.id, SHARED_COURSE).await;
    assert!(events
        .iter()
        .all(|e| e.path_enrollment_id() == e1.id));

    let row2 = PathEnrollmentRepo::find_by_id(&pool, e2.id).await.unwrap().unwrap();
    assert_eq!(row2.status_id, PathEnrollmentStatus::Dropped.id());
    assert_eq!(row2.progress_percentage, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dropping_a_shared_course_reverts_completed_paths(pool: PgPool) {
    let p1 = published_path(&pool, Some("none"), vec![course(SHARED_COURSE, 1, true)]).await;
    let p2 = published_path(&pool, Some("none"), vec![course(SHARED_COURSE, 1, true)]).await;
    let (enrollment_svc, progress_svc, _) = services(&pool);

    let e1 = enrollment_svc
        .enroll(USER, p1.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;
    let e2 = enrollment_svc
        .enroll(USER, p2.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;

    let ce_id = record_for(&pool, e1.id, SHARED_COURSE)
        .await
        .course_enrollment_id
        .unwrap();
    complete_course(&pool, &progress_svc, e1.id, SHARED_COURSE).await;

    // Both paths completed off the shared enrollment; dropping it reverts
    // both in one stroke.
    drop_course(&pool, &progress_svc, ce_id, Some("retaking the course")).await;

    for id in [e1.id, e2.id] {
        let row = PathEnrollmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(row.status_id, PathEnrollmentStatus::Active.id());
        assert_eq!(row.progress_percentage, 0);
        assert!(row.completed_at.is_none());

        let record = record_for(&pool, id, SHARED_COURSE).await;
        assert_eq!(record.status_id, CourseProgressStatus::Available.id());
        assert!(record.completed_at.is_none());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn drop_cascade_never_relocks_unlocked_courses(pool: PgPool) {
    let path = published_path(
        &pool,
        Some("sequential"),
        vec![course(SHARED_COURSE, 1, true), course(501, 2, true)],
    )
    .await;
    let (enrollment_svc, progress_svc, _) = services(&pool);
    let enrollment = enrollment_svc
        .enroll(USER, path.id, EnrollOptions::default())
        .await
        .unwrap()
        .enrollment;

    complete_course(&pool, &progress_svc, enrollment.id, SHARED_COURSE).await;
    assert_eq!(
        record_for(&pool, enrollment.id, 501).await.status_id,
        CourseProgressStatus::Available.id()
    );

    let ce_id = record_for(&pool, enrollment.id, SHARED_COURSE)
        .await
        .course_enrollment_id
        .unwrap();
    drop_course(&pool, &progress_svc, ce_id, None).await;

    // The dropped course reverts, but course 501 keeps its unlock.
    assert_eq!(
        record_for(&pool, enrollment.id, SHARED_COURSE).await.status_id,
        CourseProgressStatus::Available.id()
    );
    assert_eq!(
        record_for(&pool, enrollment.id, 501).await.status_id,
        CourseProgressStatus::Available.id()
    );
    assert_eq!(
        progress_svc.progress_percentage(enrollment.id).await.unwrap(),
        0
    );
}
