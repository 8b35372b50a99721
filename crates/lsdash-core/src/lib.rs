// lsdash-core: Sync engine between lsdash-api and consumers (CLI).

pub mod config;
pub mod convert;
pub mod dates;
pub mod error;
pub mod events;
pub mod fetch;
pub mod model;
pub mod probe;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SessionConfig;
pub use error::{CoreError, ErrorKind};
pub use events::{EventStream, Resource, SessionEvent};
pub use probe::{DeltaProber, ProbeOutcome, ProbeResult};
pub use session::Session;
pub use snapshot::SnapshotStore;
pub use store::{MemorySecretStore, MemoryStateStore, PersistedState, SecretStore, StateStore};
pub use sync::{DeltaCounts, SearchWindow, SyncPhase, SyncReport, ViewDays};

pub use model::{
    AccessSchedule, Announcement, Course, CourseId, GradeToDate, Happening, Profile, Schedule,
    TimeZoneInfo, UpcomingEvent, UserData,
};
