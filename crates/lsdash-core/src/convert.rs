// ── API-to-domain type conversions ──
//
// Bridges `lsdash_api::models` wire types into `lsdash_core::model`.
// Infallible shapes use `From`; anything that needs a course id uses
// `TryFrom` so a missing or mistyped id becomes `MalformedResponse`.

use serde_json::Value;

use lsdash_api::models::{
    ApiAccessSchedule, ApiAnnouncement, ApiCourse, ApiGradeToDate, ApiHappening, ApiSchedule,
    ApiTimeZone, ApiUpcomingEvent,
};

use crate::error::CoreError;
use crate::model::{
    AccessSchedule, Announcement, Course, CourseId, FeedActor, FeedObject, FeedTarget,
    GradeToDate, Happening, Schedule, TimeZoneInfo, UpcomingEvent,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Ids arrive as either JSON strings or numbers.
pub(crate) fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Courses ────────────────────────────────────────────────────────

impl From<ApiCourse> for Course {
    fn from(c: ApiCourse) -> Self {
        Self {
            id: CourseId::from(c.id),
            title: c.title,
            code: c.display_course_code,
        }
    }
}

impl From<ApiTimeZone> for TimeZoneInfo {
    fn from(tz: ApiTimeZone) -> Self {
        Self {
            zone_name: tz.zone_name,
        }
    }
}

impl From<ApiGradeToDate> for GradeToDate {
    fn from(g: ApiGradeToDate) -> Self {
        Self {
            average: g.average,
            earned: g.earned,
            possible: g.possible,
            extra_credit: g.extra_credit,
            letter_grade: g.letter_grade.and_then(|l| l.letter_grade),
        }
    }
}

impl TryFrom<ApiAnnouncement> for Announcement {
    type Error = CoreError;

    fn try_from(a: ApiAnnouncement) -> Result<Self, Self::Error> {
        let id = value_to_id(&a.id)
            .ok_or_else(|| CoreError::malformed("announcement without an id"))?;
        Ok(Self {
            id,
            subject: a.subject,
            submitter: a.submitter,
            start_display_date: a.start_display_date,
            text: a.text,
        })
    }
}

// ── Feeds ──────────────────────────────────────────────────────────

impl TryFrom<ApiHappening> for Happening {
    type Error = CoreError;

    fn try_from(h: ApiHappening) -> Result<Self, Self::Error> {
        let course_id = value_to_id(&h.target.course_id)
            .ok_or_else(|| CoreError::malformed("activity item without a target course id"))?;
        Ok(Self {
            id: h.id.as_ref().and_then(value_to_id),
            actor: FeedActor {
                title: h.actor.title,
            },
            object: FeedObject {
                object_type: h.object.object_type,
                title: h.object.title,
            },
            target: FeedTarget {
                course_id: CourseId::from(course_id),
                object_type: h.target.object_type,
                title: h.target.title,
            },
            posted_time: h.posted_time,
        })
    }
}

impl From<&ApiAccessSchedule> for AccessSchedule {
    fn from(a: &ApiAccessSchedule) -> Self {
        Self {
            start: a.start_date_time.clone(),
            end: a.end_date_time.clone(),
            can_access_before_start: a.can_access_before_start_date_time,
            can_access_after_end: a.can_access_after_end_date_time,
        }
    }
}

impl From<&ApiSchedule> for Schedule {
    fn from(s: &ApiSchedule) -> Self {
        Self {
            due_date: s.due_date.clone(),
            access: s
                .access_schedule
                .as_ref()
                .map(AccessSchedule::from)
                .unwrap_or_default(),
        }
    }
}

impl From<&ApiUpcomingEvent> for UpcomingEvent {
    fn from(e: &ApiUpcomingEvent) -> Self {
        Self {
            id: e.id.as_ref().and_then(value_to_id),
            title: e.title.clone(),
            title_heading: e.title_heading.clone(),
            event_type: e.event_type.clone(),
            when: e.when.as_ref().and_then(|w| w.time.clone()),
            schedule: e.schedule().map(Schedule::from),
        }
    }
}
