// Active-term course discovery
//
// Terms bracketing "now" define the query window; the enrollment list is
// unnested and split into visible and hidden courses.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use lsdash_api::ApiClient;
use lsdash_api::models::{ApiEnrollment, ApiTerm};

use crate::dates::{format_short_date, parse_api_timestamp};
use crate::error::CoreError;
use crate::model::Course;

/// Union of all terms that contain "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// `startDatesBetween` / `endDatesBetween` query values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRanges {
    pub start_dates_between: String,
    pub end_dates_between: String,
}

/// Result of the courses fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSlice {
    pub courses: Vec<Course>,
    pub hidden: Vec<Course>,
    pub ranges: CourseRanges,
}

impl TermWindow {
    /// Find the window spanned by every term with `start <= now <= end`.
    pub fn containing(terms: &[ApiTerm], now: DateTime<Utc>) -> Result<Self, CoreError> {
        let mut window: Option<Self> = None;
        for term in terms {
            let (Some(start), Some(end)) = (
                parse_api_timestamp(&term.start_date_time),
                parse_api_timestamp(&term.end_date_time),
            ) else {
                warn!(term = ?term.name, "skipping term with unparseable dates");
                continue;
            };
            if start > now || now > end {
                continue;
            }
            window = Some(match window {
                Some(w) => Self {
                    start: w.start.min(start),
                    end: w.end.max(end),
                },
                None => Self { start, end },
            });
        }
        window.ok_or(CoreError::NoActiveTerm)
    }

    /// Courses that started between the window start and today, and end
    /// between today and the window end.
    pub fn course_ranges(&self, now: DateTime<Utc>) -> CourseRanges {
        let today = format_short_date(now.date_naive());
        CourseRanges {
            start_dates_between: format!(
                "{},{today}",
                format_short_date(self.start.date_naive())
            ),
            end_dates_between: format!("{today},{}", format_short_date(self.end.date_naive())),
        }
    }
}

/// Pull the course record out of each enrollment's links.
pub fn unnest_courses(enrollments: Vec<ApiEnrollment>) -> Result<Vec<Course>, CoreError> {
    enrollments
        .into_iter()
        .map(|enrollment| {
            enrollment
                .links
                .into_iter()
                .find_map(|link| link.course)
                .map(Course::from)
                .ok_or_else(|| CoreError::malformed("enrollment without an expanded course"))
        })
        .collect()
}

/// Split into (visible, hidden), keeping API order within each.
pub fn partition_courses(
    courses: Vec<Course>,
    ignored: &BTreeSet<String>,
) -> (Vec<Course>, Vec<Course>) {
    courses
        .into_iter()
        .partition(|c| !ignored.contains(c.id.as_str()))
}

/// Enrollments for previously computed ranges.
pub async fn fetch_course_list(
    api: &ApiClient,
    ranges: &CourseRanges,
) -> Result<Vec<Course>, CoreError> {
    let enrollments = api
        .list_courses(&ranges.start_dates_between, &ranges.end_dates_between)
        .await?;
    unnest_courses(enrollments)
}

/// Terms → window → courses → partition.
pub async fn fetch_courses(
    api: &ApiClient,
    ignored: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> Result<CourseSlice, CoreError> {
    let terms = api.list_terms().await?;
    let window = TermWindow::containing(&terms, now)?;
    let ranges = window.course_ranges(now);
    debug!(
        start = %ranges.start_dates_between,
        end = %ranges.end_dates_between,
        "active term window"
    );

    let all = fetch_course_list(api, &ranges).await?;
    let (courses, hidden) = partition_courses(all, ignored);
    debug!(visible = courses.len(), hidden = hidden.len(), "courses fetched");
    Ok(CourseSlice {
        courses,
        hidden,
        ranges,
    })
}
