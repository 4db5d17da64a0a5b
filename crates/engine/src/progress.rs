//! Path progress: completion and drop fan-out, unlocking, course starts,
//! and prerequisite queries.
//!
//! The two fan-out operations span every path enrollment that shares the
//! affected course enrollment and run inside a single transaction: either
//! every referencing path observes the change or none does.

use std::collections::HashSet;
use std::sync::Arc;

use pathways_core::prerequisite::Evaluation;
use pathways_core::progress::progress_percentage;
use pathways_core::types::DbId;
use pathways_core::CoreError;
use pathways_db::models::course_progress::NewCourseProgress;
use pathways_db::models::path_enrollment::PathEnrollment;
use pathways_db::models::status::{CourseProgressStatus, PathEnrollmentStatus};
use pathways_db::repositories::{CourseEnrollmentRepo, CourseProgressRepo, PathEnrollmentRepo};
use pathways_db::DbPool;
use pathways_events::{EventBus, EventOutbox, PathEvent};
use sqlx::PgConnection;

use crate::context::PathContext;
use crate::error::EngineResult;

/// Computes progress and reacts to course-level completion/drop signals.
pub struct ProgressService {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl ProgressService {
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    /// Current percentage for an enrollment, recomputed from storage.
    pub async fn progress_percentage(&self, enrollment_id: DbId) -> EngineResult<i16> {
        let mut conn = self.pool.acquire().await?;
        let (completed, required) =
            CourseProgressRepo::required_counts(&mut conn, enrollment_id).await?;
        Ok(progress_percentage(completed, required))
    }

    /// React to a course enrollment reaching `completed` status.
    ///
    /// Fans out to every *active* path enrollment whose course progress
    /// references the enrollment: the matching record transitions to
    /// `completed`, the percentage is recomputed, and the path either
    /// completes (at 100) or unlocks its next courses. Emits
    /// `PathProgressUpdated` per affected enrollment. A course enrollment
    /// outside any active path is a no-op.
    pub async fn on_course_completed(
        &self,
        course_enrollment_id: DbId,
    ) -> EngineResult<Vec<PathEvent>> {
        let mut tx = self.pool.begin().await?;
        let mut outbox = EventOutbox::new();

        let Some(course_enrollment) =
            CourseEnrollmentRepo::find_by_id(&mut tx, course_enrollment_id).await?
        else {
            tracing::warn!(course_enrollment_id, "Completion signal for unknown enrollment");
            return Ok(Vec::new());
        };

        let enrollments =
            PathEnrollmentRepo::lock_for_course_enrollment(&mut tx, course_enrollment_id, true)
                .await?;

        for enrollment in &enrollments {
            let ctx = PathContext::load(&mut tx, enrollment.path_id).await?;

            let records = CourseProgressRepo::list_for_course_enrollment(
                &mut tx,
                enrollment.id,
                course_enrollment_id,
            )
            .await?;
            for record in &records {
                CourseProgressRepo::complete_record(&mut tx, record.id).await?;
            }

            let previous = enrollment.progress_percentage;
            let (completed, required) =
                CourseProgressRepo::required_counts(&mut tx, enrollment.id).await?;
            let current = progress_percentage(completed, required);

            outbox.record(PathEvent::PathProgressUpdated {
                path_enrollment_id: enrollment.id,
                user_id: enrollment.user_id,
                path_id: enrollment.path_id,
                previous_percentage: previous,
                new_percentage: current,
                completed_course_id: course_enrollment.course_id,
            });

            if current >= 100 {
                if PathEnrollmentRepo::mark_completed(&mut tx, enrollment.id).await? {
                    outbox.record(PathEvent::PathCompleted {
                        path_enrollment_id: enrollment.id,
                        user_id: enrollment.user_id,
                        path_id: enrollment.path_id,
                    });
                }
            } else {
                PathEnrollmentRepo::set_progress(&mut tx, enrollment.id, current).await?;
                self.unlock_in_tx(&mut tx, &mut outbox, &ctx, enrollment).await?;
            }
        }

        tx.commit().await?;
        let events = outbox.publish_to(&self.bus);

        if !enrollments.is_empty() {
            tracing::info!(
                course_enrollment_id,
                course_id = course_enrollment.course_id,
                affected_paths = enrollments.len(),
                "Course completion fanned out",
            );
        }

        Ok(events)
    }

    /// Re-evaluate every `locked` record of an enrollment and unlock those
    /// whose prerequisites are now met.
    ///
    /// Safe to call repeatedly and concurrently: mutation is gated on each
    /// record's persisted state, so a duplicate invocation sees
    /// already-`available` rows and does nothing further, and course
    /// enrollments are reused rather than duplicated.
    pub async fn unlock_next_courses(&self, enrollment_id: DbId) -> EngineResult<Vec<PathEvent>> {
        let mut tx = self.pool.begin().await?;
        let mut outbox = EventOutbox::new();

        let enrollment = PathEnrollmentRepo::lock_by_id(&mut tx, enrollment_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "path_enrollment",
                id: enrollment_id,
            })?;
        let ctx = PathContext::load(&mut tx, enrollment.path_id).await?;

        self.unlock_in_tx(&mut tx, &mut outbox, &ctx, &enrollment).await?;

        tx.commit().await?;
        Ok(outbox.publish_to(&self.bus))
    }

    async fn unlock_in_tx(
        &self,
        conn: &mut PgConnection,
        outbox: &mut EventOutbox,
        ctx: &PathContext,
        enrollment: &PathEnrollment,
    ) -> EngineResult<()> {
        let completed: HashSet<DbId> =
            CourseProgressRepo::completed_course_ids(conn, enrollment.id)
                .await?
                .into_iter()
                .collect();
        let evaluator = ctx.evaluator();

        let records = CourseProgressRepo::list_for_enrollment(conn, enrollment.id).await?;
        for record in records.iter().filter(|r| r.is_locked()) {
            let verdict = evaluator.evaluate(&ctx.course_refs, &completed, record.position);
            if !verdict.is_met {
                continue;
            }

            let ce = CourseEnrollmentRepo::find_or_create_active(
                conn,
                enrollment.user_id,
                record.course_id,
            )
            .await?;

            // Gated on the record still being locked; a lost race emits
            // no duplicate unlock event.
            if CourseProgressRepo::unlock(conn, record.id, ce.id).await? {
                outbox.record(PathEvent::CourseUnlockedInPath {
                    path_enrollment_id: enrollment.id,
                    user_id: enrollment.user_id,
                    path_id: enrollment.path_id,
                    course_id: record.course_id,
                    course_position: record.position,
                });
            }
        }

        Ok(())
    }

    /// React to a course enrollment being dropped by the user.
    ///
    /// Cascades to every path enrollment sharing the course enrollment
    /// (completed paths included, dropped ones excluded): the matching
    /// records revert to `available`, percentages are recomputed, and a
    /// `completed` path enrollment reverts to `active`.
    pub async fn on_course_dropped(
        &self,
        course_enrollment_id: DbId,
        reason: Option<&str>,
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let Some(course_enrollment) =
            CourseEnrollmentRepo::find_by_id(&mut tx, course_enrollment_id).await?
        else {
            tracing::warn!(course_enrollment_id, "Drop signal for unknown enrollment");
            return Ok(());
        };

        let enrollments =
            PathEnrollmentRepo::lock_for_course_enrollment(&mut tx, course_enrollment_id, false)
                .await?;

        for enrollment in &enrollments {
            let records = CourseProgressRepo::list_for_course_enrollment(
                &mut tx,
                enrollment.id,
                course_enrollment_id,
            )
            .await?;
            for record in &records {
                CourseProgressRepo::revert_to_available(&mut tx, record.id).await?;
            }

            let (completed, required) =
                CourseProgressRepo::required_counts(&mut tx, enrollment.id).await?;
            let current = progress_percentage(completed, required);

            if enrollment.status_id == PathEnrollmentStatus::Completed.id() {
                PathEnrollmentRepo::revert_to_active(&mut tx, enrollment.id, current).await?;
            } else {
                PathEnrollmentRepo::set_progress(&mut tx, enrollment.id, current).await?;
            }

            tracing::info!(
                enrollment_id = enrollment.id,
                course_id = course_enrollment.course_id,
                new_percentage = current,
                reason = ?reason,
                "Course drop reverted path progress",
            );
        }

        tx.commit().await?;
        Ok(())
    }

    /// Start an `available` course, stamping `started_at`.
    ///
    /// Returns `true` when the transition happened. A `locked` course (or
    /// any other non-`available` state, or an unknown course) is a silent
    /// no-op, never an error.
    pub async fn start_course(&self, enrollment_id: DbId, course_id: DbId) -> EngineResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let started = CourseProgressRepo::start(&mut conn, enrollment_id, course_id).await?;
        if started {
            tracing::info!(enrollment_id, course_id, "Course started");
        }
        Ok(started)
    }

    /// Evaluate the configured prerequisite policy for one course.
    pub async fn check_prerequisites(
        &self,
        enrollment_id: DbId,
        course_id: DbId,
    ) -> EngineResult<Evaluation> {
        let enrollment = PathEnrollmentRepo::find_by_id(&self.pool, enrollment_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "path_enrollment",
                id: enrollment_id,
            })?;

        let mut conn = self.pool.acquire().await?;
        let ctx = PathContext::load(&mut conn, enrollment.path_id).await?;

        let target = ctx
            .courses
            .iter()
            .find(|c| c.course_id == course_id)
            .ok_or(CoreError::NotFound {
                entity: "path_course",
                id: course_id,
            })?;

        let completed: HashSet<DbId> =
            CourseProgressRepo::completed_course_ids(&mut conn, enrollment_id)
                .await?
                .into_iter()
                .collect();

        Ok(ctx
            .evaluator()
            .evaluate(&ctx.course_refs, &completed, target.position))
    }

    /// Reconcile an enrollment with its path's current course list.
    ///
    /// Courses added to the path since enrollment get a progress record
    /// seeded against the learner's current completed set; records for
    /// removed courses are deleted; the percentage is recomputed. A
    /// `completed` enrollment whose recomputed percentage drops below 100
    /// reverts to `active`. Called after structural changes to a path with
    /// learners mid-progress.
    pub async fn sync_with_path(&self, enrollment_id: DbId) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let enrollment = PathEnrollmentRepo::lock_by_id(&mut tx, enrollment_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "path_enrollment",
                id: enrollment_id,
            })?;
        let ctx = PathContext::load(&mut tx, enrollment.path_id).await?;

        let records = CourseProgressRepo::list_for_enrollment(&mut tx, enrollment.id).await?;
        let path_course_ids: HashSet<DbId> =
            ctx.courses.iter().map(|c| c.course_id).collect();
        let tracked_ids: HashSet<DbId> = records.iter().map(|r| r.course_id).collect();

        for record in records.iter().filter(|r| !path_course_ids.contains(&r.course_id)) {
            CourseProgressRepo::delete_for_course(&mut tx, enrollment.id, record.course_id)
                .await?;
        }

        let completed: HashSet<DbId> = records
            .iter()
            .filter(|r| r.is_completed() && path_course_ids.contains(&r.course_id))
            .map(|r| r.course_id)
            .collect();
        let evaluator = ctx.evaluator();

        for course in ctx.courses.iter().filter(|c| !tracked_ids.contains(&c.course_id)) {
            let verdict = evaluator.evaluate(&ctx.course_refs, &completed, course.position);
            let (status, course_enrollment_id) = if verdict.is_met {
                let ce = CourseEnrollmentRepo::find_or_create_active(
                    &mut tx,
                    enrollment.user_id,
                    course.course_id,
                )
                .await?;
                (CourseProgressStatus::Available, Some(ce.id))
            } else {
                (CourseProgressStatus::Locked, None)
            };

            CourseProgressRepo::insert(
                &mut tx,
                &NewCourseProgress {
                    path_enrollment_id: enrollment.id,
                    course_id: course.course_id,
                    position: course.position,
                    status,
                    course_enrollment_id,
                },
            )
            .await?;
        }

        let (completed_required, required) =
            CourseProgressRepo::required_counts(&mut tx, enrollment.id).await?;
        let current = progress_percentage(completed_required, required);
        if enrollment.status_id == PathEnrollmentStatus::Completed.id() && current < 100 {
            // New required work appeared after completion: the enrollment
            // goes back to active, same as when a completed course is
            // dropped out from under it.
            PathEnrollmentRepo::revert_to_active(&mut tx, enrollment.id, current).await?;
        } else if enrollment.status_id == PathEnrollmentStatus::Active.id() {
            PathEnrollmentRepo::set_progress(&mut tx, enrollment.id, current).await?;
        }

        tx.commit().await?;

        tracing::info!(
            enrollment_id,
            path_id = enrollment.path_id,
            new_percentage = current,
            "Enrollment reconciled with path structure",
        );

        Ok(())
    }
}
