//! Prerequisite modes and evaluators.
//!
//! A learning path carries one of three unlocking policies. Each policy is
//! an implementation of [`PrerequisiteEvaluator`]: a pure function from the
//! path's ordered course list plus the learner's completed set to a
//! reachability verdict for one target course. The factory
//! [`evaluator_for`] is an exhaustive match over the closed
//! [`PrerequisiteMode`] enum, so an unknown mode can only arise from a bad
//! string at the persistence boundary, where it is rejected as
//! [`CoreError::InvalidPrerequisiteMode`].
//!
//! Optional (`is_required = false`) courses never gate unlocking: both
//! position-based evaluators skip them entirely, mirroring their exclusion
//! from the completion percentage.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// PrerequisiteMode
// ---------------------------------------------------------------------------

/// Unlocking policy for a learning path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteMode {
    /// Every required course at a lower position must be completed.
    Sequential,
    /// Only the nearest required course at a lower position must be completed.
    ImmediatePrevious,
    /// No gating; every course is reachable from the start.
    None,
}

/// Stored string for [`PrerequisiteMode::Sequential`].
pub const MODE_SEQUENTIAL: &str = "sequential";
/// Stored string for [`PrerequisiteMode::ImmediatePrevious`].
pub const MODE_IMMEDIATE_PREVIOUS: &str = "immediate_previous";
/// Stored string for [`PrerequisiteMode::None`].
pub const MODE_NONE: &str = "none";

impl PrerequisiteMode {
    /// The string persisted in `learning_paths.prerequisite_mode`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => MODE_SEQUENTIAL,
            Self::ImmediatePrevious => MODE_IMMEDIATE_PREVIOUS,
            Self::None => MODE_NONE,
        }
    }

    /// Resolve the mode from a nullable database column.
    ///
    /// A NULL (unset) mode defaults to [`Sequential`](Self::Sequential).
    pub fn from_column(value: Option<&str>) -> Result<Self, CoreError> {
        match value {
            Some(s) => s.parse(),
            None => Ok(Self::Sequential),
        }
    }
}

impl FromStr for PrerequisiteMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            MODE_SEQUENTIAL => Ok(Self::Sequential),
            MODE_IMMEDIATE_PREVIOUS => Ok(Self::ImmediatePrevious),
            MODE_NONE => Ok(Self::None),
            other => Err(CoreError::InvalidPrerequisiteMode(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation types
// ---------------------------------------------------------------------------

/// The evaluator's view of one course reference in a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCourseRef {
    pub course_id: DbId,
    pub title: String,
    /// 1-based position within the path; unique, gaps allowed.
    pub position: i32,
    pub is_required: bool,
}

/// An unmet required predecessor, reported in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingPrerequisite {
    pub course_id: DbId,
    pub title: String,
    pub position: i32,
}

/// Verdict for one target course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub is_met: bool,
    /// Unmet required predecessors, ordered by position. Empty when met.
    pub missing: Vec<MissingPrerequisite>,
}

impl Evaluation {
    fn met() -> Self {
        Self {
            is_met: true,
            missing: Vec::new(),
        }
    }

    fn unmet(missing: Vec<MissingPrerequisite>) -> Self {
        Self {
            is_met: false,
            missing,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluators
// ---------------------------------------------------------------------------

/// Decides whether a target course's prerequisites are satisfied.
///
/// Implementations are pure: they read the ordered course list and the
/// completed set, and never touch storage.
pub trait PrerequisiteEvaluator: Send + Sync {
    /// Evaluate reachability of the course at `target_position`.
    ///
    /// `courses` is the path's full course list; ordering is derived from
    /// each entry's `position`, not from slice order. `completed` holds the
    /// course IDs the learner has completed within this path.
    fn evaluate(
        &self,
        courses: &[PathCourseRef],
        completed: &HashSet<DbId>,
        target_position: i32,
    ) -> Evaluation;
}

/// Required predecessors ordered by position, lowest first.
fn required_predecessors<'a>(
    courses: &'a [PathCourseRef],
    target_position: i32,
) -> Vec<&'a PathCourseRef> {
    let mut preds: Vec<&PathCourseRef> = courses
        .iter()
        .filter(|c| c.is_required && c.position < target_position)
        .collect();
    preds.sort_by_key(|c| c.position);
    preds
}

fn to_missing(course: &PathCourseRef) -> MissingPrerequisite {
    MissingPrerequisite {
        course_id: course.course_id,
        title: course.title.clone(),
        position: course.position,
    }
}

/// `sequential`: every required course at a strictly lower position must be
/// completed. `missing` lists all unmet required predecessors in position
/// order.
pub struct SequentialEvaluator;

impl PrerequisiteEvaluator for SequentialEvaluator {
    fn evaluate(
        &self,
        courses: &[PathCourseRef],
        completed: &HashSet<DbId>,
        target_position: i32,
    ) -> Evaluation {
        let missing: Vec<MissingPrerequisite> = required_predecessors(courses, target_position)
            .into_iter()
            .filter(|c| !completed.contains(&c.course_id))
            .map(to_missing)
            .collect();

        if missing.is_empty() {
            Evaluation::met()
        } else {
            Evaluation::unmet(missing)
        }
    }
}

/// `immediate_previous`: only the nearest required course at a lower
/// position must be completed. `missing` carries at most one entry.
pub struct ImmediatePreviousEvaluator;

impl PrerequisiteEvaluator for ImmediatePreviousEvaluator {
    fn evaluate(
        &self,
        courses: &[PathCourseRef],
        completed: &HashSet<DbId>,
        target_position: i32,
    ) -> Evaluation {
        let preds = required_predecessors(courses, target_position);
        match preds.last() {
            Some(nearest) if !completed.contains(&nearest.course_id) => {
                Evaluation::unmet(vec![to_missing(nearest)])
            }
            _ => Evaluation::met(),
        }
    }
}

/// `none`: everything is always reachable.
pub struct NoPrerequisites;

impl PrerequisiteEvaluator for NoPrerequisites {
    fn evaluate(
        &self,
        _courses: &[PathCourseRef],
        _completed: &HashSet<DbId>,
        _target_position: i32,
    ) -> Evaluation {
        Evaluation::met()
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

static SEQUENTIAL: SequentialEvaluator = SequentialEvaluator;
static IMMEDIATE_PREVIOUS: ImmediatePreviousEvaluator = ImmediatePreviousEvaluator;
static NONE: NoPrerequisites = NoPrerequisites;

/// Resolve the evaluator for a path's configured mode.
pub fn evaluator_for(mode: PrerequisiteMode) -> &'static dyn PrerequisiteEvaluator {
    match mode {
        PrerequisiteMode::Sequential => &SEQUENTIAL,
        PrerequisiteMode::ImmediatePrevious => &IMMEDIATE_PREVIOUS,
        PrerequisiteMode::None => &NONE,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: DbId, position: i32, required: bool) -> PathCourseRef {
        PathCourseRef {
            course_id: id,
            title: format!("Course {id}"),
            position,
            is_required: required,
        }
    }

    fn three_required() -> Vec<PathCourseRef> {
        vec![course(1, 1, true), course(2, 2, true), course(3, 3, true)]
    }

    fn completed(ids: &[DbId]) -> HashSet<DbId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn mode_round_trips_through_strings() {
        for mode in [
            PrerequisiteMode::Sequential,
            PrerequisiteMode::ImmediatePrevious,
            PrerequisiteMode::None,
        ] {
            assert_eq!(mode.as_str().parse::<PrerequisiteMode>().unwrap(), mode);
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "random_order".parse::<PrerequisiteMode>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidPrerequisiteMode(s) if s == "random_order"));
    }

    #[test]
    fn null_mode_defaults_to_sequential() {
        assert_eq!(
            PrerequisiteMode::from_column(None).unwrap(),
            PrerequisiteMode::Sequential
        );
        assert_eq!(
            PrerequisiteMode::from_column(Some("none")).unwrap(),
            PrerequisiteMode::None
        );
    }

    #[test]
    fn sequential_requires_all_predecessors() {
        let courses = three_required();
        let eval = SequentialEvaluator;

        // Position 3 needs both 1 and 2.
        let result = eval.evaluate(&courses, &completed(&[]), 3);
        assert!(!result.is_met);
        assert_eq!(
            result.missing.iter().map(|m| m.course_id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        let result = eval.evaluate(&courses, &completed(&[1]), 3);
        assert!(!result.is_met);
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].course_id, 2);

        let result = eval.evaluate(&courses, &completed(&[1, 2]), 3);
        assert!(result.is_met);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn sequential_first_position_is_always_met() {
        let courses = three_required();
        let result = SequentialEvaluator.evaluate(&courses, &completed(&[]), 1);
        assert!(result.is_met);
    }

    #[test]
    fn sequential_skips_optional_predecessors() {
        // Optional course at position 2 never blocks position 3.
        let courses = vec![course(1, 1, true), course(2, 2, false), course(3, 3, true)];
        let result = SequentialEvaluator.evaluate(&courses, &completed(&[1]), 3);
        assert!(result.is_met);
    }

    #[test]
    fn sequential_reports_missing_in_position_order_with_gaps() {
        // Positions with gaps; slice deliberately out of order.
        let courses = vec![course(30, 50, true), course(10, 5, true), course(20, 20, true)];
        let result = SequentialEvaluator.evaluate(&courses, &completed(&[]), 50);
        assert_eq!(
            result.missing.iter().map(|m| m.position).collect::<Vec<_>>(),
            vec![5, 20]
        );
    }

    #[test]
    fn immediate_previous_requires_only_nearest() {
        let courses = three_required();
        let eval = ImmediatePreviousEvaluator;

        // Position 3 needs only course 2.
        let result = eval.evaluate(&courses, &completed(&[2]), 3);
        assert!(result.is_met);

        let result = eval.evaluate(&courses, &completed(&[1]), 3);
        assert!(!result.is_met);
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].course_id, 2);
    }

    #[test]
    fn immediate_previous_with_no_required_predecessor_is_met() {
        let courses = vec![course(1, 1, false), course(2, 2, true)];
        let result = ImmediatePreviousEvaluator.evaluate(&courses, &completed(&[]), 2);
        assert!(result.is_met);
    }

    #[test]
    fn immediate_previous_skips_optional_between() {
        // Required at 1, optional at 2: the nearest *required* predecessor
        // of position 3 is course 1.
        let courses = vec![course(1, 1, true), course(2, 2, false), course(3, 3, true)];
        let result = ImmediatePreviousEvaluator.evaluate(&courses, &completed(&[1]), 3);
        assert!(result.is_met);

        let result = ImmediatePreviousEvaluator.evaluate(&courses, &completed(&[]), 3);
        assert_eq!(result.missing[0].course_id, 1);
    }

    #[test]
    fn none_mode_is_always_met() {
        let courses = three_required();
        let result = NoPrerequisites.evaluate(&courses, &completed(&[]), 3);
        assert!(result.is_met);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn factory_dispatches_by_mode() {
        let courses = three_required();
        let empty = completed(&[]);

        assert!(!evaluator_for(PrerequisiteMode::Sequential)
            .evaluate(&courses, &empty, 3)
            .is_met);
        assert!(!evaluator_for(PrerequisiteMode::ImmediatePrevious)
            .evaluate(&courses, &empty, 3)
            .is_met);
        assert!(evaluator_for(PrerequisiteMode::None)
            .evaluate(&courses, &empty, 3)
            .is_met);
    }
}
