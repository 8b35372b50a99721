// ── "New since last sync" ──
//
// Counts are taken over active courses only; hidden courses never raise
// a badge.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dates::is_strictly_after;
use crate::events::SessionEvent;
use crate::model::UserData;

/// Per-category counts of items newer than the previous sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaCounts {
    pub upcoming_events: usize,
    pub happenings: usize,
    pub announcements: usize,
    /// Grades carry no timestamp, so this is always zero.
    pub grades: usize,
}

impl DeltaCounts {
    pub fn compute(data: &UserData, since: DateTime<Utc>) -> Self {
        Self {
            upcoming_events: count_new_upcoming_events(data, since),
            happenings: count_new_happenings(data, since),
            announcements: count_new_announcements(data, since),
            grades: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.upcoming_events + self.happenings + self.announcements + self.grades
    }

    /// One event per non-zero category.
    pub fn events(&self) -> Vec<SessionEvent> {
        let candidates = [
            SessionEvent::NewUpcomingEvents {
                count: self.upcoming_events,
            },
            SessionEvent::NewHappenings {
                count: self.happenings,
            },
            SessionEvent::NewAnnouncements {
                count: self.announcements,
            },
            SessionEvent::NewGrades { count: self.grades },
        ];
        candidates
            .into_iter()
            .filter(|e| {
                !matches!(
                    e,
                    SessionEvent::NewUpcomingEvents { count: 0 }
                        | SessionEvent::NewHappenings { count: 0 }
                        | SessionEvent::NewAnnouncements { count: 0 }
                        | SessionEvent::NewGrades { count: 0 }
                )
            })
            .collect()
    }
}

/// Events whose access window opened after `since` and that were not
/// visible before opening.
pub fn count_new_upcoming_events(data: &UserData, since: DateTime<Utc>) -> usize {
    data.courses
        .iter()
        .flat_map(|c| data.upcoming_events_for(&c.id))
        .filter(|e| !e.can_access_before_start() && is_strictly_after(e.access_start(), since))
        .count()
}

pub fn count_new_happenings(data: &UserData, since: DateTime<Utc>) -> usize {
    data.courses
        .iter()
        .flat_map(|c| data.happenings_for(&c.id))
        .filter(|h| is_strictly_after(Some(h.posted_time.as_str()), since))
        .count()
}

pub fn count_new_announcements(data: &UserData, since: DateTime<Utc>) -> usize {
    data.courses
        .iter()
        .flat_map(|c| data.announcements_for(&c.id))
        .filter(|a| is_strictly_after(a.start_display_date.as_deref(), since))
        .count()
}
