// ── Per-course items ──
//
// Feed items, due items, grades and announcements. Timestamps stay in
// their API string form so that rendering and "is new" checks share one
// parser (`crate::dates`).

use serde::{Deserialize, Serialize};

use super::course::CourseId;

// ── Happenings ───────────────────────────────────────────────────────

/// An activity-feed item ("Prof. Song posted Re: lab in Lab 2").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Happening {
    pub id: Option<String>,
    pub actor: FeedActor,
    pub object: FeedObject,
    pub target: FeedTarget,
    pub posted_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedActor {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedObject {
    pub object_type: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedTarget {
    pub course_id: CourseId,
    pub object_type: Option<String>,
    pub title: Option<String>,
}

// ── Upcoming events ──────────────────────────────────────────────────

/// A due item with its access window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingEvent {
    pub id: Option<String>,
    pub title: String,
    pub title_heading: Option<String>,
    pub event_type: Option<String>,
    pub when: Option<String>,
    pub schedule: Option<Schedule>,
}

impl UpcomingEvent {
    /// Access-window start, if the event carries a schedule with one.
    pub fn access_start(&self) -> Option<&str> {
        self.schedule.as_ref()?.access.start.as_deref()
    }

    pub fn can_access_before_start(&self) -> bool {
        self.schedule
            .as_ref()
            .is_some_and(|s| s.access.can_access_before_start)
    }

    pub fn due_date(&self) -> Option<&str> {
        self.schedule.as_ref()?.due_date.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub due_date: Option<String>,
    pub access: AccessSchedule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSchedule {
    pub start: Option<String>,
    pub end: Option<String>,
    pub can_access_before_start: bool,
    pub can_access_after_end: bool,
}

// ── Grades ───────────────────────────────────────────────────────────

/// Running grade for a course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeToDate {
    pub average: f64,
    pub earned: f64,
    pub possible: f64,
    pub extra_credit: f64,
    pub letter_grade: Option<String>,
}

// ── Announcements ────────────────────────────────────────────────────

/// An unread announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub subject: String,
    pub submitter: String,
    pub start_display_date: Option<String>,
    pub text: String,
}
