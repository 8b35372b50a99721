// ── Unified domain model ──
//
// Course-indexed representation of everything the dashboard shows. Every
// per-course mapping is keyed by the same `CourseId` values found in
// `UserData::courses` / `UserData::hidden_courses`.

pub mod activity;
pub mod course;
pub mod user_data;

pub use activity::{
    AccessSchedule, Announcement, FeedActor, FeedObject, FeedTarget, GradeToDate, Happening,
    Schedule, UpcomingEvent,
};
pub use course::{Course, CourseId, TimeZoneInfo};
pub use user_data::{Profile, UserData};
