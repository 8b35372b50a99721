// ── Aggregated model ──
//
// `UserData` is the whole dashboard state for one signed-in user. It is
// created empty (profile only) after authentication and filled slice by
// slice during a sync.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::activity::{Announcement, GradeToDate, Happening, UpcomingEvent};
use super::course::{Course, CourseId, TimeZoneInfo};
use crate::error::CoreError;

/// User profile from `GET /me`, kept as an opaque mapping.
pub type Profile = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub me: Profile,
    pub courses: Vec<Course>,
    pub hidden_courses: Vec<Course>,
    pub happenings: BTreeMap<CourseId, Vec<Happening>>,
    pub upcoming_events: BTreeMap<CourseId, Vec<UpcomingEvent>>,
    pub grades_to_date: BTreeMap<CourseId, GradeToDate>,
    pub announcements: BTreeMap<CourseId, Vec<Announcement>>,
    pub time_zones: BTreeMap<CourseId, TimeZoneInfo>,
}

impl UserData {
    /// A fresh model for a newly authenticated user.
    pub fn new(me: Profile) -> Self {
        Self {
            me,
            ..Self::default()
        }
    }

    /// Display name from the profile, if present.
    pub fn first_name(&self) -> Option<&str> {
        self.me.get("firstName").and_then(Value::as_str)
    }

    pub fn course_ids(&self) -> Vec<CourseId> {
        self.courses.iter().map(|c| c.id.clone()).collect()
    }

    /// Look up an active course.
    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| &c.id == id)
    }

    /// Look up a course in either list.
    pub fn any_course(&self, id: &CourseId) -> Option<&Course> {
        self.course(id)
            .or_else(|| self.hidden_courses.iter().find(|c| &c.id == id))
    }

    pub fn is_hidden(&self, id: &CourseId) -> bool {
        self.hidden_courses.iter().any(|c| &c.id == id)
    }

    // ── Slice access ─────────────────────────────────────────────────
    // An absent key and an empty sequence mean the same thing.

    pub fn happenings_for(&self, id: &CourseId) -> &[Happening] {
        self.happenings.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn upcoming_events_for(&self, id: &CourseId) -> &[UpcomingEvent] {
        self.upcoming_events.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn announcements_for(&self, id: &CourseId) -> &[Announcement] {
        self.announcements.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn time_zone(&self, id: &CourseId) -> Option<&str> {
        self.time_zones.get(id).map(|tz| tz.zone_name.as_str())
    }

    /// Grades are complete only when every active course has one.
    pub fn grades_loaded(&self) -> bool {
        self.grades_to_date.len() == self.courses.len()
    }

    pub fn time_zones_loaded(&self) -> bool {
        self.time_zones.len() == self.courses.len()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Move a course between `courses` and `hidden_courses`, appending it
    /// to the destination. Returns `false` when it is already there.
    pub fn set_course_hidden(&mut self, id: &CourseId, hidden: bool) -> Result<bool, CoreError> {
        let (from, to) = if hidden {
            (&mut self.courses, &mut self.hidden_courses)
        } else {
            (&mut self.hidden_courses, &mut self.courses)
        };

        if let Some(pos) = from.iter().position(|c| &c.id == id) {
            let course = from.remove(pos);
            to.push(course);
            return Ok(true);
        }
        if to.iter().any(|c| &c.id == id) {
            return Ok(false);
        }
        Err(CoreError::CourseNotFound { id: id.to_string() })
    }

    /// Drop an announcement from a course's unread list.
    pub fn remove_announcement(&mut self, course: &CourseId, announcement_id: &str) -> bool {
        let Some(items) = self.announcements.get_mut(course) else {
            return false;
        };
        let before = items.len();
        items.retain(|a| a.id != announcement_id);
        items.len() != before
    }
}
