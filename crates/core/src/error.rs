use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Learning path {path_id} is not published")]
    PathNotPublished { path_id: DbId },

    #[error("User {user_id} is already enrolled in path {path_id}")]
    AlreadyEnrolled { user_id: DbId, path_id: DbId },

    #[error("Invalid state transition on {model}: {from} -> {to}")]
    InvalidStateTransition {
        model: &'static str,
        from: &'static str,
        to: &'static str,
    },

    #[error("Invalid prerequisite mode '{0}'")]
    InvalidPrerequisiteMode(String),
}
