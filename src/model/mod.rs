pub mod activity;
pub mod attendance;
pub mod course;
pub mod group;
pub mod ids;
pub mod service;
pub mod user;

// Re-exports for convenience
pub use activity::{Activity, ActivityResponse, ResponseStatus};
pub use attendance::{AttendanceRecord, AttendanceType, Period};
pub use course::{Course, CourseProgress, WeekProgress, WeekStatus};
pub use group::{AgeRange, Group};
pub use ids::Id;
pub use service::Service;
pub use user::{Gender, Role, User};
