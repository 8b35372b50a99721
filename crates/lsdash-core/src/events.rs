// ── Session change events ──
//
// Typed notifications for the view layer, delivered over a broadcast
// channel. Every occurrence is sent once; lagging subscribers see a
// `Lagged` gap from the stream adapter rather than silent loss.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::Serialize;
use strum::{Display, EnumIter};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

pub(crate) const EVENT_CHANNEL_SIZE: usize = 64;

/// One fetchable slice of the aggregated model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    Profile,
    Courses,
    TimeZones,
    UpcomingEvents,
    Happenings,
    GradesToDate,
    Announcements,
    /// Persisted sync bookkeeping (course ranges, load time).
    SyncState,
}

/// Notification emitted by a `Session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    CoursesRefreshed,
    TimeZonesRefreshed,
    UpcomingEventsRefreshed,
    HappeningsRefreshed,
    GradesRefreshed,
    AnnouncementsRefreshed,
    NewUpcomingEvents { count: usize },
    NewHappenings { count: usize },
    NewAnnouncements { count: usize },
    NewGrades { count: usize },
    SyncFailed { resource: Resource },
    SessionCleared,
}

impl SessionEvent {
    /// The "slice refreshed" event for a resource.
    pub fn refreshed(resource: Resource) -> Option<Self> {
        match resource {
            Resource::Profile | Resource::SyncState => None,
            Resource::Courses => Some(Self::CoursesRefreshed),
            Resource::TimeZones => Some(Self::TimeZonesRefreshed),
            Resource::UpcomingEvents => Some(Self::UpcomingEventsRefreshed),
            Resource::Happenings => Some(Self::HappeningsRefreshed),
            Resource::GradesToDate => Some(Self::GradesRefreshed),
            Resource::Announcements => Some(Self::AnnouncementsRefreshed),
        }
    }
}

/// `Stream` of session events, skipping over lag notifications.
pub struct EventStream {
    inner: BroadcastStream<SessionEvent>,
}

impl EventStream {
    pub(crate) fn new(rx: broadcast::Receiver<SessionEvent>) -> Self {
        Self {
            inner: BroadcastStream::new(rx),
        }
    }
}

impl Stream for EventStream {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(n)))) => {
                    tracing::warn!(skipped = n, "event subscriber lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
