pub mod course_enrollment;
pub mod course_progress;
pub mod learning_path;
pub mod path_enrollment;
pub mod path_event;
pub mod status;
