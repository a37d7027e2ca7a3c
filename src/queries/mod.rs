pub mod activity_queries;
pub mod attendance_queries;
pub mod course_queries;
pub mod group_queries;
pub mod service_queries;
pub mod stats_queries;
pub mod user_queries;
