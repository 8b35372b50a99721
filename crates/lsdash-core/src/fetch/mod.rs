// ── Resource fetchers ──
//
// One fetcher per slice of `UserData`. Each calls the API, normalizes the
// payload and returns the slice; none of them touch the session, so the
// coordinator decides what gets applied.

pub mod courses;
pub mod events;
pub mod happenings;
pub mod per_course;

pub use courses::{CourseRanges, CourseSlice, TermWindow, fetch_course_list, fetch_courses};
pub use events::{fetch_upcoming_events, group_due_events};
pub use happenings::{fetch_happenings, group_happenings};
pub use per_course::{fetch_announcements, fetch_grades_to_date, fetch_time_zones, unread_since};
