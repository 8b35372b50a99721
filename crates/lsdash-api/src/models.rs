// LearningStudio wire types
//
// Response shapes as the REST API sends them (camelCase JSON). Fields the
// dashboard never reads are ignored; fields that only some responses carry
// are optional so that a missing value surfaces during normalization rather
// than as a decode failure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Link relation for a course reference on an upcoming event.
pub const REL_COURSE: &str = "https://api.learningstudio.com/rel/course";
/// Link relation for the schedule attached to an upcoming event.
pub const REL_SCHEDULE: &str = "https://api.learningstudio.com/rel/schedule";

// ── Profile / terms / courses ────────────────────────────────────────

/// `GET /me`: the profile is kept as an opaque mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub me: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TermsResponse {
    #[serde(default)]
    pub terms: Vec<ApiTerm>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTerm {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    pub start_date_time: String,
    pub end_date_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoursesResponse {
    #[serde(default)]
    pub courses: Vec<ApiEnrollment>,
}

/// One enrollment; with `expand=course` the course itself rides on a link.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnrollment {
    #[serde(default)]
    pub links: Vec<ApiEnrollmentLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnrollmentLink {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub course: Option<ApiCourse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCourse {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub display_course_code: String,
}

// ── Per-course ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeZoneResponse {
    pub time_zone: ApiTimeZone,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTimeZone {
    pub zone_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeToDateResponse {
    pub course_grade_to_date: ApiGradeToDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGradeToDate {
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub earned: f64,
    #[serde(default)]
    pub possible: f64,
    #[serde(default)]
    pub extra_credit: f64,
    #[serde(default)]
    pub letter_grade: Option<ApiLetterGrade>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLetterGrade {
    #[serde(default)]
    pub letter_grade: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementsResponse {
    #[serde(default)]
    pub announcements: Vec<ApiAnnouncement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAnnouncement {
    pub id: Value,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub submitter: String,
    #[serde(default)]
    pub start_display_date: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "readstatus", default)]
    pub read_status: bool,
}

/// Body for `PUT .../announcements/{id}/readstatus`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStatusRequest {
    pub announcement_read_status: ReadStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStatus {
    pub marked_as_read: bool,
}

// ── Feeds ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsHappeningResponse {
    pub activity_stream: ApiActivityStream,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiActivityStream {
    #[serde(default)]
    pub items: Vec<ApiHappening>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHappening {
    #[serde(default)]
    pub id: Option<Value>,
    pub posted_time: String,
    #[serde(default)]
    pub actor: ApiActor,
    #[serde(default)]
    pub object: ApiFeedObject,
    pub target: ApiFeedTarget,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiActor {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFeedObject {
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFeedTarget {
    pub course_id: Value,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEventsResponse {
    #[serde(default)]
    pub upcoming_events: Vec<ApiUpcomingEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUpcomingEvent {
    #[serde(default)]
    pub id: Option<Value>,
    pub category: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_heading: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub when: Option<ApiWhen>,
    #[serde(default)]
    pub links: Vec<ApiEventLink>,
}

impl ApiUpcomingEvent {
    /// Course id: last path segment of the course-relation link.
    pub fn course_id(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref() == Some(REL_COURSE))
            .and_then(|l| l.href.as_deref())
            .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
    }

    /// Schedule carried on the schedule-relation link.
    pub fn schedule(&self) -> Option<&ApiSchedule> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref() == Some(REL_SCHEDULE))
            .and_then(|l| l.schedule.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiWhen {
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEventLink {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub schedule: Option<ApiSchedule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSchedule {
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub access_schedule: Option<ApiAccessSchedule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAccessSchedule {
    #[serde(default)]
    pub start_date_time: Option<String>,
    #[serde(default)]
    pub end_date_time: Option<String>,
    #[serde(default)]
    pub can_access_before_start_date_time: bool,
    #[serde(default)]
    pub can_access_after_end_date_time: bool,
}
