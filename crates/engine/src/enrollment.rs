//! Path enrollment orchestration: enroll, re-enroll, drop, complete.
//!
//! Every public operation runs inside a single transaction against the
//! shared pool and records its events into an outbox that is published
//! only after the transaction commits.

use std::collections::HashSet;
use std::sync::Arc;

use pathways_core::progress::progress_percentage;
use pathways_core::types::DbId;
use pathways_core::CoreError;
use pathways_db::models::course_progress::NewCourseProgress;
use pathways_db::models::path_enrollment::PathEnrollment;
use pathways_db::models::status::{CourseEnrollmentStatus, CourseProgressStatus, PathEnrollmentStatus};
use pathways_db::repositories::{CourseEnrollmentRepo, CourseProgressRepo, PathEnrollmentRepo};
use pathways_db::DbPool;
use pathways_events::{EventBus, EventOutbox, PathEvent};
use sqlx::PgConnection;

use crate::context::PathContext;
use crate::error::{classify_enroll_conflict, EngineError, EngineResult};

/// Options for [`EnrollmentService::enroll`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrollOptions {
    /// On re-enrollment after a drop, keep prior per-course progress
    /// instead of resetting to the initial unlock layout.
    pub preserve_progress: bool,
}

/// Result of a successful enroll call.
#[derive(Debug)]
pub struct EnrollOutcome {
    pub enrollment: PathEnrollment,
    /// `true` when a previously dropped enrollment was reactivated.
    pub reactivated: bool,
    pub events: Vec<PathEvent>,
}

/// Orchestrates the path-enrollment lifecycle for (learner, path) pairs.
pub struct EnrollmentService {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl EnrollmentService {
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    /// Enroll a learner into a path, or reactivate a dropped enrollment.
    ///
    /// Fails with [`CoreError::PathNotPublished`] for unpublished paths and
    /// [`CoreError::AlreadyEnrolled`] when an `active` or `completed`
    /// enrollment exists (including the concurrent-insert race, which the
    /// storage-level unique constraint converts into the same error). The
    /// whole operation is atomic: a failure while seeding course progress
    /// or course enrollments leaves no rows behind.
    pub async fn enroll(
        &self,
        user_id: DbId,
        path_id: DbId,
        options: EnrollOptions,
    ) -> EngineResult<EnrollOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut outbox = EventOutbox::new();

        let ctx = PathContext::load(&mut tx, path_id).await?;
        if !ctx.path.is_published {
            return Err(CoreError::PathNotPublished { path_id }.into());
        }

        let existing = PathEnrollmentRepo::lock_by_user_and_path(&mut tx, user_id, path_id).await?;

        let (enrollment, reactivated) = match existing {
            Some(prior) if prior.status_id == PathEnrollmentStatus::Dropped.id() => {
                let enrollment = self
                    .reactivate(&mut tx, &ctx, &prior, options.preserve_progress)
                    .await?;
                (enrollment, true)
            }
            Some(_) => {
                return Err(CoreError::AlreadyEnrolled { user_id, path_id }.into());
            }
            None => {
                let percentage = progress_percentage(0, ctx.required_total());
                let enrollment = PathEnrollmentRepo::insert(&mut tx, user_id, path_id, percentage)
                    .await
                    .map_err(|e| classify_enroll_conflict(e, user_id, path_id))?;
                seed_initial_layout(&mut tx, &ctx, enrollment.id, user_id).await?;
                (enrollment, false)
            }
        };

        outbox.record(PathEvent::PathEnrollmentCreated {
            path_enrollment_id: enrollment.id,
            user_id,
            path_id,
            progress_percentage: enrollment.progress_percentage,
        });

        tx.commit().await?;
        let events = outbox.publish_to(&self.bus);

        tracing::info!(
            user_id,
            path_id,
            enrollment_id = enrollment.id,
            reactivated,
            preserve_progress = options.preserve_progress,
            "Path enrollment created",
        );

        Ok(EnrollOutcome {
            enrollment,
            reactivated,
            events,
        })
    }

    /// Reactivate a dropped enrollment in place.
    async fn reactivate(
        &self,
        conn: &mut PgConnection,
        ctx: &PathContext,
        prior: &PathEnrollment,
        preserve_progress: bool,
    ) -> EngineResult<PathEnrollment> {
        let percentage = if preserve_progress {
            self.restore_course_links(conn, prior).await?;
            let (completed, required) = CourseProgressRepo::required_counts(conn, prior.id).await?;
            progress_percentage(completed, required)
        } else {
            // Full reset: replace the old records with the initial unlock
            // layout from the path's *current* configuration, so courses
            // added or removed since the original enrollment are picked up.
            CourseProgressRepo::delete_for_enrollment(conn, prior.id).await?;
            seed_initial_layout(conn, ctx, prior.id, prior.user_id).await?;
            progress_percentage(0, ctx.required_total())
        };

        Ok(PathEnrollmentRepo::reactivate(conn, prior.id, percentage).await?)
    }

    /// Re-point non-locked records at live course enrollments.
    ///
    /// Preserving re-enrollment keeps each record's state, but any
    /// underlying course enrollment the user dropped in the meantime must
    /// be reactivated (or recreated) so the weak reference resolves again.
    async fn restore_course_links(
        &self,
        conn: &mut PgConnection,
        prior: &PathEnrollment,
    ) -> EngineResult<()> {
        let records = CourseProgressRepo::list_for_enrollment(conn, prior.id).await?;
        for record in records.iter().filter(|r| !r.is_locked()) {
            let needs_relink = match record.course_enrollment_id {
                Some(ce_id) => match CourseEnrollmentRepo::find_by_id(conn, ce_id).await? {
                    Some(ce) => ce.status_id == CourseEnrollmentStatus::Dropped.id(),
                    None => true,
                },
                None => true,
            };
            if needs_relink {
                let ce = CourseEnrollmentRepo::find_or_create_active(
                    conn,
                    prior.user_id,
                    record.course_id,
                )
                .await?;
                CourseProgressRepo::set_course_enrollment(conn, record.id, ce.id).await?;
            }
        }
        Ok(())
    }

    /// Drop an `active` enrollment.
    ///
    /// Dropping an already-dropped or completed enrollment always fails
    /// with [`CoreError::InvalidStateTransition`]; it never silently
    /// succeeds.
    pub async fn drop_enrollment(
        &self,
        enrollment_id: DbId,
        reason: Option<&str>,
    ) -> EngineResult<Vec<PathEvent>> {
        let mut tx = self.pool.begin().await?;
        let mut outbox = EventOutbox::new();

        let enrollment = PathEnrollmentRepo::lock_by_id(&mut tx, enrollment_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "path_enrollment",
                id: enrollment_id,
            })?;

        if !PathEnrollmentRepo::mark_dropped(&mut tx, enrollment_id, reason).await? {
            return Err(invalid_transition(enrollment.status_id, "dropped"));
        }

        outbox.record(PathEvent::PathDropped {
            path_enrollment_id: enrollment.id,
            user_id: enrollment.user_id,
            path_id: enrollment.path_id,
            reason: reason.map(str::to_string),
        });

        tx.commit().await?;
        let events = outbox.publish_to(&self.bus);

        tracing::info!(
            enrollment_id,
            user_id = enrollment.user_id,
            path_id = enrollment.path_id,
            reason = ?reason,
            "Path enrollment dropped",
        );

        Ok(events)
    }

    /// Complete an `active` enrollment.
    ///
    /// Idempotent: completing an already-completed enrollment is a no-op
    /// that emits nothing. A dropped enrollment cannot be completed.
    pub async fn complete(&self, enrollment_id: DbId) -> EngineResult<Vec<PathEvent>> {
        let mut tx = self.pool.begin().await?;
        let mut outbox = EventOutbox::new();

        let enrollment = PathEnrollmentRepo::lock_by_id(&mut tx, enrollment_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "path_enrollment",
                id: enrollment_id,
            })?;

        if enrollment.status_id == PathEnrollmentStatus::Completed.id() {
            tx.commit().await?;
            return Ok(Vec::new());
        }

        if !PathEnrollmentRepo::mark_completed(&mut tx, enrollment_id).await? {
            return Err(invalid_transition(enrollment.status_id, "completed"));
        }

        outbox.record(PathEvent::PathCompleted {
            path_enrollment_id: enrollment.id,
            user_id: enrollment.user_id,
            path_id: enrollment.path_id,
        });

        tx.commit().await?;
        Ok(outbox.publish_to(&self.bus))
    }
}

/// Map a failed gated transition to the domain error, naming the current
/// state.
fn invalid_transition(from_status: i16, to: &'static str) -> EngineError {
    let from = PathEnrollmentStatus::from_id(from_status)
        .map(PathEnrollmentStatus::name)
        .unwrap_or("unknown");
    CoreError::InvalidStateTransition {
        model: "PathEnrollment",
        from,
        to,
    }
    .into()
}

/// Seed the initial unlock layout for a fresh (or reset) enrollment.
///
/// Every course the evaluator marks reachable against an empty completed
/// set is seeded `available` and given a (reused or created) course
/// enrollment; everything else starts `locked` with no reference. Initial
/// availability is part of enrollment creation, so no unlock events are
/// emitted here.
pub(crate) async fn seed_initial_layout(
    conn: &mut PgConnection,
    ctx: &PathContext,
    path_enrollment_id: DbId,
    user_id: DbId,
) -> EngineResult<()> {
    let evaluator = ctx.evaluator();
    let empty: HashSet<DbId> = HashSet::new();

    for course in &ctx.courses {
        let verdict = evaluator.evaluate(&ctx.course_refs, &empty, course.position);
        let (status, course_enrollment_id) = if verdict.is_met {
            let ce =
                CourseEnrollmentRepo::find_or_create_active(conn, user_id, course.course_id)
                    .await?;
            (CourseProgressStatus::Available, Some(ce.id))
        } else {
            (CourseProgressStatus::Locked, None)
        };

        CourseProgressRepo::insert(
            conn,
            &NewCourseProgress {
                path_enrollment_id,
                course_id: course.course_id,
                position: course.position,
                status,
                course_enrollment_id,
            },
        )
        .await?;
    }

    Ok(())
}
