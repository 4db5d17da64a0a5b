//! Inbound signal listener.
//!
//! Bridges [`CourseSignal`]s from the Course Enrollment subsystem to the
//! [`ProgressService`]: one `EnrollmentCompleted` per course completion
//! triggers the completion fan-out, one `UserDropped` triggers the drop
//! cascade. Runs as a long-lived task until the channel closes or the
//! cancellation token fires.

use std::sync::Arc;

use pathways_events::CourseSignal;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::progress::ProgressService;

/// Long-running consumer of course-enrollment signals.
pub struct CourseSignalListener {
    progress: Arc<ProgressService>,
}

impl CourseSignalListener {
    pub fn new(progress: Arc<ProgressService>) -> Self {
        Self { progress }
    }

    /// Consume signals until the channel closes or `cancel` fires.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<CourseSignal>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Signal listener cancelled, shutting down");
                    break;
                }
                result = receiver.recv() => match result {
                    Ok(signal) => self.handle(signal).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Signal listener lagged, signals were missed");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Signal bus closed, listener shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn handle(&self, signal: CourseSignal) {
        match signal {
            CourseSignal::EnrollmentCompleted {
                course_enrollment_id,
            } => {
                if let Err(e) = self.progress.on_course_completed(course_enrollment_id).await {
                    tracing::error!(
                        error = %e,
                        course_enrollment_id,
                        "Completion fan-out failed",
                    );
                }
            }
            CourseSignal::UserDropped {
                course_enrollment_id,
                reason,
            } => {
                if let Err(e) = self
                    .progress
                    .on_course_dropped(course_enrollment_id, reason.as_deref())
                    .await
                {
                    tracing::error!(
                        error = %e,
                        course_enrollment_id,
                        "Drop cascade failed",
                    );
                }
            }
        }
    }
}
