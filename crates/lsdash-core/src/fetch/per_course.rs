// Per-course fan-out: time zones, grades, announcements
//
// One request per active course, all in flight at once. The first error
// aborts the whole fetch and no partial mapping is returned.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use tracing::debug;

use lsdash_api::ApiClient;
use lsdash_api::models::ApiAnnouncement;

use crate::dates::is_strictly_after;
use crate::error::CoreError;
use crate::events::Resource;
use crate::model::{Announcement, CourseId, GradeToDate, TimeZoneInfo};

async fn fan_out<T, F, Fut>(
    resource: Resource,
    ids: &[CourseId],
    fetch: F,
) -> Result<BTreeMap<CourseId, T>, CoreError>
where
    F: Fn(CourseId) -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let started = Instant::now();
    let calls = ids.iter().map(|id| {
        let call = fetch(id.clone());
        let id = id.clone();
        async move { call.await.map(|value| (id, value)) }
    });
    let results = try_join_all(calls).await?;
    debug!(
        %resource,
        count = results.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "per-course fetch joined"
    );
    Ok(results.into_iter().collect())
}

pub async fn fetch_time_zones(
    api: &ApiClient,
    ids: &[CourseId],
) -> Result<BTreeMap<CourseId, TimeZoneInfo>, CoreError> {
    fan_out(Resource::TimeZones, ids, |id| async move {
        let zone = api.get_time_zone(id.as_str()).await?;
        Ok::<_, CoreError>(TimeZoneInfo::from(zone))
    })
    .await
}

pub async fn fetch_grades_to_date(
    api: &ApiClient,
    ids: &[CourseId],
) -> Result<BTreeMap<CourseId, GradeToDate>, CoreError> {
    fan_out(Resource::GradesToDate, ids, |id| async move {
        let grade = api.get_grade_to_date(id.as_str()).await?;
        Ok::<_, CoreError>(GradeToDate::from(grade))
    })
    .await
}

/// Unread announcements displayed after `since`, for every course. Each
/// course gets an entry, possibly empty.
pub async fn fetch_announcements(
    api: &ApiClient,
    ids: &[CourseId],
    since: DateTime<Utc>,
) -> Result<BTreeMap<CourseId, Vec<Announcement>>, CoreError> {
    fan_out(Resource::Announcements, ids, |id| async move {
        let items = api
            .list_announcements(id.as_str())
            .await
            .map_err(CoreError::from)?;
        unread_since(items, since)
    })
    .await
}

/// Keep unread items whose display date is strictly after `since`.
///
/// The API's own `since` filter drops same-day announcements, so the
/// filtering happens here.
pub fn unread_since(
    items: Vec<ApiAnnouncement>,
    since: DateTime<Utc>,
) -> Result<Vec<Announcement>, CoreError> {
    items
        .into_iter()
        .filter(|a| !a.read_status && is_strictly_after(a.start_display_date.as_deref(), since))
        .map(Announcement::try_from)
        .collect()
}
