//! Completion-percentage math.
//!
//! Only required courses count. A path with zero required courses is
//! vacuously complete, so its percentage is defined as 100.

/// `floor(100 * completed_required / required_total)`, clamped to 0..=100.
///
/// `required_total == 0` (all-optional and zero-course paths) yields 100.
pub fn progress_percentage(completed_required: i64, required_total: i64) -> i16 {
    if required_total <= 0 {
        return 100;
    }
    let completed = completed_required.clamp(0, required_total);
    (completed * 100 / required_total) as i16
}
