// Activity feed grouped by target course

use std::collections::BTreeMap;

use tracing::debug;

use lsdash_api::ApiClient;
use lsdash_api::models::ApiHappening;

use crate::error::CoreError;
use crate::model::{CourseId, Happening};
use crate::sync::SearchWindow;

pub fn group_happenings(
    items: Vec<ApiHappening>,
) -> Result<BTreeMap<CourseId, Vec<Happening>>, CoreError> {
    let mut grouped: BTreeMap<CourseId, Vec<Happening>> = BTreeMap::new();
    for item in items {
        let happening = Happening::try_from(item)?;
        grouped
            .entry(happening.target.course_id.clone())
            .or_default()
            .push(happening);
    }
    Ok(grouped)
}

pub async fn fetch_happenings(
    api: &ApiClient,
    window: &SearchWindow,
) -> Result<BTreeMap<CourseId, Vec<Happening>>, CoreError> {
    let items = api.whats_happening(&window.happenings_after()).await?;
    let total = items.len();
    let grouped = group_happenings(items)?;
    debug!(total, courses = grouped.len(), "happenings grouped");
    Ok(grouped)
}
