// Upcoming events: due items grouped by course

use std::collections::BTreeMap;

use tracing::debug;

use lsdash_api::ApiClient;
use lsdash_api::models::ApiUpcomingEvent;

use crate::error::CoreError;
use crate::model::{CourseId, UpcomingEvent};
use crate::sync::SearchWindow;

pub const DUE_CATEGORY: &str = "due";
pub const ACCESS_START_CATEGORY: &str = "access_start";

/// Keep `due` items and group them by the course their links point at.
pub fn group_due_events(
    events: Vec<ApiUpcomingEvent>,
) -> Result<BTreeMap<CourseId, Vec<UpcomingEvent>>, CoreError> {
    let mut grouped: BTreeMap<CourseId, Vec<UpcomingEvent>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.category == DUE_CATEGORY) {
        let course_id = event.course_id().ok_or_else(|| {
            CoreError::malformed(format!("upcoming event '{}' has no course link", event.title))
        })?;
        grouped
            .entry(CourseId::from(course_id))
            .or_default()
            .push(UpcomingEvent::from(event));
    }
    Ok(grouped)
}

pub async fn fetch_upcoming_events(
    api: &ApiClient,
    window: &SearchWindow,
) -> Result<BTreeMap<CourseId, Vec<UpcomingEvent>>, CoreError> {
    let events = api.upcoming_events(None, &window.events_until()).await?;
    let total = events.len();
    let grouped = group_due_events(events)?;
    debug!(total, courses = grouped.len(), "upcoming events grouped");
    Ok(grouped)
}
