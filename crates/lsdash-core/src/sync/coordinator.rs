use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{DeltaCounts, SearchWindow, SyncPhase, SyncReport, ViewDays};
use crate::dates::{format_timestamp, parse_api_timestamp};
use crate::error::CoreError;
use crate::events::{Resource, SessionEvent};
use crate::fetch::{
    fetch_announcements, fetch_courses, fetch_grades_to_date, fetch_happenings,
    fetch_time_zones, fetch_upcoming_events,
};
use crate::model::{CourseId, UserData};
use crate::session::Session;

/// Shared failure latch for one sync. Slices arriving after the first
/// failure are dropped.
struct SyncRun<'a> {
    session: &'a Session,
    failed: AtomicBool,
    failure: Mutex<Option<(Resource, CoreError)>>,
}

impl<'a> SyncRun<'a> {
    fn new(session: &'a Session) -> Self {
        Self {
            session,
            failed: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Apply a fetched slice, or record the failure. Returns whether the
    /// slice was applied.
    async fn settle<T>(
        &self,
        resource: Resource,
        result: Result<T, CoreError>,
        apply: impl FnOnce(&mut UserData, T),
    ) -> bool {
        match result {
            Ok(value) => {
                if self.has_failed() {
                    debug!(%resource, "discarding slice after sync failure");
                    return false;
                }
                let applied = self.session.apply(|data| apply(data, value)).await;
                if applied {
                    if let Some(event) = SessionEvent::refreshed(resource) {
                        self.session.emit(event);
                    }
                }
                applied
            }
            Err(e) => {
                if !self.failed.swap(true, Ordering::AcqRel) {
                    *self.failure.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some((resource, e));
                }
                false
            }
        }
    }

    fn into_failure(self) -> Option<(Resource, CoreError)> {
        self.failure
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Session {
    /// Run a full sync.
    ///
    /// Courses load first; then time zones → upcoming events, happenings,
    /// grades and announcements run concurrently. Each slice is applied and
    /// announced as it lands. The first failure tears the session down and
    /// is returned as [`CoreError::SyncFailed`], as is a failure to persist
    /// the course ranges or the load time. Concurrent calls are serialized.
    pub async fn reload_data(&self) -> Result<SyncReport, CoreError> {
        let inner = self.inner();
        let _guard = inner.sync_lock.lock().await;
        let started = Instant::now();
        let now = Utc::now();

        let state = inner.state.load()?;
        let previous_load_time = state.last_load_time.as_deref().and_then(parse_api_timestamp);
        let days = ViewDays::resolve(
            state.past_view_days,
            state.future_view_days,
            inner.config.default_view_days,
        );
        let window = SearchWindow::compute(now, days);
        self.set_baseline(previous_load_time, Some(window));

        if !self.ensure_loaded().await {
            return Err(CoreError::NotAuthenticated);
        }
        info!(
            start = %window.start,
            end = %window.end,
            first_sync = previous_load_time.is_none(),
            "sync started"
        );

        // ── Courses ──────────────────────────────────────────────────
        self.set_phase(SyncPhase::FetchingCourses);
        let slice = match fetch_courses(&inner.api, &state.ignored_courses, now).await {
            Ok(slice) => slice,
            Err(e) => return Err(self.abort(Resource::Courses, e).await),
        };
        let ranges = slice.ranges.clone();
        let saved = inner.state.update(&mut |s| {
            s.course_start_range = Some(ranges.start_dates_between.clone());
            s.course_end_range = Some(ranges.end_dates_between.clone());
        });
        if let Err(e) = saved {
            return Err(self.abort(Resource::Courses, e).await);
        }
        let ids: Vec<CourseId> = slice.courses.iter().map(|c| c.id.clone()).collect();
        self.apply(|data| {
            data.courses = slice.courses;
            data.hidden_courses = slice.hidden;
        })
        .await;
        self.emit(SessionEvent::CoursesRefreshed);

        // ── Details ──────────────────────────────────────────────────
        self.set_phase(SyncPhase::FetchingDetails);
        let run = SyncRun::new(self);
        let api = &inner.api;

        let zones_then_events = async {
            let zones = fetch_time_zones(api, &ids).await;
            let applied = run
                .settle(Resource::TimeZones, zones, |data, zones| data.time_zones = zones)
                .await;
            if applied {
                let events = fetch_upcoming_events(api, &window).await;
                run.settle(Resource::UpcomingEvents, events, |data, events| {
                    data.upcoming_events = events;
                })
                .await;
            }
        };
        let happenings = async {
            let result = fetch_happenings(api, &window).await;
            run.settle(Resource::Happenings, result, |data, h| data.happenings = h)
                .await;
        };
        let grades = async {
            let result = fetch_grades_to_date(api, &ids).await;
            run.settle(Resource::GradesToDate, result, |data, g| {
                data.grades_to_date = g;
            })
            .await;
        };
        let announcements = async {
            let result = fetch_announcements(api, &ids, window.start_instant()).await;
            run.settle(Resource::Announcements, result, |data, a| {
                data.announcements = a;
            })
            .await;
        };
        tokio::join!(zones_then_events, happenings, grades, announcements);

        if let Some((resource, e)) = run.into_failure() {
            return Err(self.abort(resource, e).await);
        }

        // ── Completion ───────────────────────────────────────────────
        let stamp = format_timestamp(now);
        let saved = inner.state.update(&mut |s| {
            s.last_load_time = Some(stamp.clone());
            s.last_activity_time = Some(stamp.clone());
        });
        if let Err(e) = saved {
            return Err(self.abort(Resource::SyncState, e).await);
        }
        inner.snapshots.clear();

        let deltas = match previous_load_time {
            Some(since) => self
                .with_user_data(|data| DeltaCounts::compute(data, since))
                .await
                .unwrap_or_default(),
            None => DeltaCounts::default(),
        };
        for event in deltas.events() {
            self.emit(event);
        }
        self.set_phase(SyncPhase::Done);

        info!(
            courses = ids.len(),
            new_items = deltas.total(),
            elapsed_ms = started.elapsed().as_millis(),
            "sync complete"
        );
        Ok(SyncReport {
            started_at: now,
            previous_load_time,
            deltas,
        })
    }

    async fn abort(&self, resource: Resource, error: CoreError) -> CoreError {
        warn!(%resource, error = %error, "sync failed, clearing session");
        self.emit(SessionEvent::SyncFailed { resource });
        self.set_phase(SyncPhase::Failed { resource });
        if let Err(e) = self.teardown().await {
            warn!(error = %e, "teardown after failed sync was incomplete");
        }
        CoreError::SyncFailed {
            resource,
            source: Box::new(error),
        }
    }
}
