// ── Aggregation coordinator ──
//
// One sync per `Session::reload_data` call: compute the search window,
// fetch courses, then fan out the per-slice fetchers and join them.

mod coordinator;
mod delta;
mod window;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::events::Resource;

pub use delta::{
    DeltaCounts, count_new_announcements, count_new_happenings, count_new_upcoming_events,
};
pub use window::{DEFAULT_FUTURE_DAYS, DEFAULT_PAST_DAYS, MAX_VIEW_DAYS, SearchWindow, ViewDays};

/// Observable progress of the current sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    FetchingCourses,
    /// Time zones → upcoming events, alongside happenings, grades and
    /// announcements.
    FetchingDetails,
    Done,
    Failed { resource: Resource },
}

/// Outcome of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    /// Baseline the deltas were computed against; `None` on a first sync.
    pub previous_load_time: Option<DateTime<Utc>>,
    pub deltas: DeltaCounts,
}
