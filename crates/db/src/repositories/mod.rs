pub mod course_enrollment_repo;
pub mod course_progress_repo;
pub mod learning_path_repo;
pub mod path_enrollment_repo;
pub mod path_event_repo;

pub use course_enrollment_repo::CourseEnrollmentRepo;
pub use course_progress_repo::CourseProgressRepo;
pub use learning_path_repo::LearningPathRepo;
pub use path_enrollment_repo::PathEnrollmentRepo;
pub use path_event_repo::PathEventRepo;
