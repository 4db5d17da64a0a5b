//! Pure domain logic for the learning-path progression engine.
//!
//! No I/O lives here: this crate defines the ID and timestamp aliases, the
//! domain error taxonomy, the prerequisite evaluators with their factory,
//! and the progress-percentage math. Persistence and orchestration build on
//! top of it in `pathways-db` and `pathways-engine`.

pub mod error;
pub mod prerequisite;
pub mod progress;
pub mod types;

pub use error::CoreError;
pub use prerequisite::{
    evaluator_for, Evaluation, MissingPrerequisite, PathCourseRef, PrerequisiteEvaluator,
    PrerequisiteMode,
};
