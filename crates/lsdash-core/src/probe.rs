// ── Background delta probe ──
//
// A lightweight check for new items since the last activity timestamp,
// run outside a full sync (e.g. from a scheduler). It reads persisted
// state only, never the in-memory model, and advances the baseline only
// when every query succeeds.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use lsdash_api::models::{ApiHappening, ApiUpcomingEvent};
use lsdash_api::{ApiClient, UserCredentials};

use crate::convert::value_to_id;
use crate::dates::{format_short_date, format_timestamp, is_strictly_after, parse_api_timestamp};
use crate::error::CoreError;
use crate::fetch::events::ACCESS_START_CATEGORY;
use crate::fetch::{CourseRanges, fetch_announcements, fetch_course_list};
use crate::model::{CourseId, UpcomingEvent};
use crate::store::{PersistedState, SecretStore, StateStore};
use crate::sync::ViewDays;

/// Minimum spacing between probes that reach the network.
pub const PROBE_COOLDOWN_SECS: i64 = 3600;

/// Whether at least `cooldown_secs` have passed since `last`.
pub fn cooldown_elapsed(last: Option<DateTime<Utc>>, now: DateTime<Utc>, cooldown_secs: i64) -> bool {
    match last {
        None => true,
        Some(last) => (now - last).num_seconds() >= cooldown_secs,
    }
}

/// New-item counts found by one probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub upcoming_events: usize,
    pub happenings: usize,
    pub announcements: usize,
}

impl ProbeResult {
    pub fn total(&self) -> usize {
        self.upcoming_events + self.happenings + self.announcements
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    NewData(ProbeResult),
    NoData,
    /// Within the cooldown; nothing was requested.
    Skipped { next_probe_at: DateTime<Utc> },
    Failed,
}

impl ProbeOutcome {
    pub fn new_items(&self) -> usize {
        match self {
            Self::NewData(result) => result.total(),
            Self::NoData | Self::Skipped { .. } | Self::Failed => 0,
        }
    }
}

/// Runs delta probes against persisted state.
#[derive(Clone)]
pub struct DeltaProber {
    api: ApiClient,
    state: Arc<dyn StateStore>,
    secrets: Arc<dyn SecretStore>,
    default_view_days: ViewDays,
}

impl DeltaProber {
    pub fn new(
        api: ApiClient,
        state: Arc<dyn StateStore>,
        secrets: Arc<dyn SecretStore>,
        default_view_days: ViewDays,
    ) -> Self {
        Self {
            api,
            state,
            secrets,
            default_view_days,
        }
    }

    pub async fn run(&self) -> Result<ProbeOutcome, CoreError> {
        self.run_at(Utc::now()).await
    }

    /// One probe as of `now`.
    ///
    /// Storage errors propagate; API errors become [`ProbeOutcome::Failed`]
    /// and leave the baseline where it was.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ProbeOutcome, CoreError> {
        let state = self.state.load()?;
        if !self.restore_credentials(&state).await? {
            debug!("no stored credentials, nothing to probe");
            return Ok(ProbeOutcome::NoData);
        }

        let Some(since) = state.last_activity_time.as_deref().and_then(parse_api_timestamp) else {
            debug!("no activity baseline, starting one now");
            self.advance(now)?;
            return Ok(ProbeOutcome::NoData);
        };

        if !cooldown_elapsed(Some(since), now, PROBE_COOLDOWN_SECS) {
            let next_probe_at = TimeDelta::try_seconds(PROBE_COOLDOWN_SECS)
                .and_then(|d| since.checked_add_signed(d))
                .unwrap_or(since);
            debug!(%next_probe_at, "probe within cooldown");
            return Ok(ProbeOutcome::Skipped { next_probe_at });
        }

        match self.probe_since(&state, since).await {
            Ok(result) => {
                self.advance(now)?;
                info!(
                    upcoming_events = result.upcoming_events,
                    happenings = result.happenings,
                    announcements = result.announcements,
                    "probe complete"
                );
                Ok(if result.total() > 0 {
                    ProbeOutcome::NewData(result)
                } else {
                    ProbeOutcome::NoData
                })
            }
            Err(e) => {
                warn!(error = %e, "probe failed");
                Ok(ProbeOutcome::Failed)
            }
        }
    }

    fn advance(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        let stamp = format_timestamp(now);
        self.state
            .update(&mut |s| s.last_activity_time = Some(stamp.clone()))
            .map(|_| ())
    }

    async fn restore_credentials(&self, state: &PersistedState) -> Result<bool, CoreError> {
        let tokens = self.api.tokens();
        if tokens.credentials().is_some_and(|c| c.is_complete()) {
            return Ok(true);
        }
        let Some(username) = state.username.as_deref().filter(|u| !u.is_empty()) else {
            return Ok(false);
        };
        let Some(password) = self.secrets.password(username)? else {
            return Ok(false);
        };
        tokens
            .set_credentials(Some(UserCredentials::new(username, password)))
            .await;
        Ok(true)
    }

    /// The three probe queries, run concurrently. Any failure fails the
    /// whole probe.
    pub async fn probe_since(
        &self,
        state: &PersistedState,
        since: DateTime<Utc>,
    ) -> Result<ProbeResult, CoreError> {
        let days = ViewDays::resolve(
            state.past_view_days,
            state.future_view_days,
            self.default_view_days,
        );
        let ignored = &state.ignored_courses;
        let (upcoming_events, happenings, announcements) = tokio::try_join!(
            self.new_access_starts(since, days.future, ignored),
            self.new_happenings(since, ignored),
            self.new_announcements(since, state),
        )?;
        Ok(ProbeResult {
            upcoming_events,
            happenings,
            announcements,
        })
    }

    async fn new_access_starts(
        &self,
        since: DateTime<Utc>,
        future_days: i64,
        ignored: &BTreeSet<String>,
    ) -> Result<usize, CoreError> {
        let horizon = TimeDelta::try_days(future_days.saturating_add(1))
            .and_then(|d| since.checked_add_signed(d))
            .unwrap_or(since);
        let events = self
            .api
            .upcoming_events(
                Some(&format_short_date(since.date_naive())),
                &format_short_date(horizon.date_naive()),
            )
            .await?;
        Ok(events
            .iter()
            .filter(|e| is_new_access_start(e, since, horizon, ignored))
            .count())
    }

    async fn new_happenings(
        &self,
        since: DateTime<Utc>,
        ignored: &BTreeSet<String>,
    ) -> Result<usize, CoreError> {
        let items = self.api.whats_happening(&format_timestamp(since)).await?;
        Ok(items
            .iter()
            .filter(|h| is_new_happening(h, since, ignored))
            .count())
    }

    async fn new_announcements(
        &self,
        since: DateTime<Utc>,
        state: &PersistedState,
    ) -> Result<usize, CoreError> {
        let (Some(start), Some(end)) = (&state.course_start_range, &state.course_end_range) else {
            debug!("no stored course ranges, skipping announcements");
            return Ok(0);
        };
        let ranges = CourseRanges {
            start_dates_between: start.clone(),
            end_dates_between: end.clone(),
        };
        let ids: Vec<CourseId> = fetch_course_list(&self.api, &ranges)
            .await?
            .into_iter()
            .filter(|c| !state.ignored_courses.contains(c.id.as_str()))
            .map(|c| c.id)
            .collect();
        let unread = fetch_announcements(&self.api, &ids, since).await?;
        Ok(unread.values().map(Vec::len).sum())
    }
}

/// An assignment that opens after `since`, cannot be opened early and is
/// due within the horizon.
fn is_new_access_start(
    event: &ApiUpcomingEvent,
    since: DateTime<Utc>,
    horizon: DateTime<Utc>,
    ignored: &BTreeSet<String>,
) -> bool {
    if event.category != ACCESS_START_CATEGORY {
        return false;
    }
    if event.course_id().is_some_and(|id| ignored.contains(id)) {
        return false;
    }
    let event = UpcomingEvent::from(event);
    !event.can_access_before_start()
        && is_strictly_after(event.access_start(), since)
        && event
            .due_date()
            .and_then(parse_api_timestamp)
            .is_some_and(|due| due <= horizon)
}

fn is_new_happening(item: &ApiHappening, since: DateTime<Utc>, ignored: &BTreeSet<String>) -> bool {
    let ignored_course = value_to_id(&item.target.course_id).is_some_and(|id| ignored.contains(&id));
    !ignored_course && is_strictly_after(Some(item.posted_time.as_str()), since)
}
