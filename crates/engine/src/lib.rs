//! The learning-path progression engine.
//!
//! Two services own all mutations:
//!
//! - [`EnrollmentService`] — enroll / re-enroll / drop / complete for a
//!   (learner, path) pair. Each operation is one transaction; events are
//!   published only after commit.
//! - [`ProgressService`] — percentage computation, unlocking, the
//!   completion and drop fan-outs across every path sharing a course
//!   enrollment, course starts, and prerequisite queries.
//!
//! [`CourseSignalListener`] bridges inbound signals from the Course
//! Enrollment subsystem to the progress service.

pub mod enrollment;
pub mod error;
pub mod listener;
pub mod progress;

mod context;

pub use enrollment::{EnrollOptions, EnrollOutcome, EnrollmentService};
pub use error::{EngineError, EngineResult};
pub use listener::CourseSignalListener;
pub use progress::ProgressService;
