//! Typed domain events and inbound signals.
//!
//! [`PathEvent`] is a closed enum rather than a stringly-typed envelope:
//! every operation returns the events it produced, and consumers match
//! exhaustively instead of dispatching on name strings.

use pathways_core::types::DbId;
use serde::{Deserialize, Serialize};

/// Outward progression event, emitted after the producing transaction
/// commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PathEvent {
    /// A path enrollment was created or reactivated. Reactivation shares
    /// this shape; it is distinguished in logs only.
    PathEnrollmentCreated {
        path_enrollment_id: DbId,
        user_id: DbId,
        path_id: DbId,
        progress_percentage: i16,
    },

    /// A course completion changed an enrollment's percentage.
    PathProgressUpdated {
        path_enrollment_id: DbId,
        user_id: DbId,
        path_id: DbId,
        previous_percentage: i16,
        new_percentage: i16,
        completed_course_id: DbId,
    },

    /// A previously locked course became available.
    CourseUnlockedInPath {
        path_enrollment_id: DbId,
        user_id: DbId,
        path_id: DbId,
        course_id: DbId,
        course_position: i32,
    },

    /// Every required course of the path is complete.
    PathCompleted {
        path_enrollment_id: DbId,
        user_id: DbId,
        path_id: DbId,
    },

    /// The learner dropped the path.
    PathDropped {
        path_enrollment_id: DbId,
        user_id: DbId,
        path_id: DbId,
        reason: Option<String>,
    },
}

impl PathEvent {
    /// Dot-separated event name used for persistence and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PathEnrollmentCreated { .. } => "path.enrollment_created",
            Self::PathProgressUpdated { .. } => "path.progress_updated",
            Self::CourseUnlockedInPath { .. } => "path.course_unlocked",
            Self::PathCompleted { .. } => "path.completed",
            Self::PathDropped { .. } => "path.dropped",
        }
    }

    /// The enrollment this event concerns.
    pub fn path_enrollment_id(&self) -> DbId {
        match self {
            Self::PathEnrollmentCreated {
                path_enrollment_id, ..
            }
            | Self::PathProgressUpdated {
                path_enrollment_id, ..
            }
            | Self::CourseUnlockedInPath {
                path_enrollment_id, ..
            }
            | Self::PathCompleted {
                path_enrollment_id, ..
            }
            | Self::PathDropped {
                path_enrollment_id, ..
            } => *path_enrollment_id,
        }
    }

    /// The learner this event concerns.
    pub fn user_id(&self) -> DbId {
        match self {
            Self::PathEnrollmentCreated { user_id, .. }
            | Self::PathProgressUpdated { user_id, .. }
            | Self::CourseUnlockedInPath { user_id, .. }
            | Self::PathCompleted { user_id, .. }
            | Self::PathDropped { user_id, .. } => *user_id,
        }
    }
}

/// Inbound signal from the Course Enrollment subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum CourseSignal {
    /// A course enrollment reached `completed` status.
    EnrollmentCompleted { course_enrollment_id: DbId },

    /// A course enrollment was dropped by the user.
    UserDropped {
        course_enrollment_id: DbId,
        reason: Option<String>,
    },
}
