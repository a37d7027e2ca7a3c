pub mod activity_ops;
pub mod attendance_ops;
pub mod course_ops;
pub mod group_ops;
pub mod service_ops;
pub mod user_ops;
