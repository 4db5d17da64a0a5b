use pathways_core::types::DbId;
use pathways_core::CoreError;

/// Service-level error type for engine operations.
///
/// Wraps [`CoreError`] for domain rule violations and `sqlx::Error` for
/// storage failures. Any error inside an operation aborts the whole
/// transaction; no partial state survives.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `pathways_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for engine operation results.
pub type EngineResult<T> = Result<T, EngineError>;

/// Classify an insert failure on `path_enrollments`.
///
/// A unique violation on `uq_path_enrollments_user_path` means a
/// concurrent caller enrolled the same (user, path) first: surface it as
/// [`CoreError::AlreadyEnrolled`] instead of a raw database error, so the
/// losing caller fails fast with the same error a sequential duplicate
/// would get.
pub fn classify_enroll_conflict(err: sqlx::Error, user_id: DbId, path_id: DbId) -> EngineError {
    if let sqlx::Error::Database(db_err) = &err {
        // PostgreSQL unique constraint violation: error code 23505
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint() == Some("uq_path_enrollments_user_path")
        {
            return EngineError::Core(CoreError::AlreadyEnrolled { user_id, path_id });
        }
    }
    EngineError::Database(err)
}
