// ── Core error types ──
//
// User-facing errors from lsdash-core. Consumers never see HTTP status
// codes or serde failures directly. The `From<lsdash_api::Error>` impl
// folds transport-layer errors into the four sync failure kinds.

use thiserror::Error;

use crate::events::Resource;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not signed in -- no credentials or session data")]
    NotAuthenticated,

    // ── Sync ─────────────────────────────────────────────────────────
    #[error("No active term contains the current date")]
    NoActiveTerm,

    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Sync failed at {resource}: {source}")]
    SyncFailed {
        resource: Resource,
        source: Box<CoreError>,
    },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Courses have not been loaded")]
    CoursesNotLoaded,

    #[error("Course not found: {id}")]
    CourseNotFound { id: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Snapshot error: {message}")]
    Snapshot { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Coarse classification of a sync failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthenticationFailed,
    NoActiveTerm,
    Network,
    MalformedResponse,
    Other,
}

impl CoreError {
    /// Classify this error, looking through `SyncFailed` wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationFailed { .. } | Self::NotAuthenticated => {
                ErrorKind::AuthenticationFailed
            }
            Self::NoActiveTerm => ErrorKind::NoActiveTerm,
            Self::Network { .. } => ErrorKind::Network,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::SyncFailed { source, .. } => source.kind(),
            _ => ErrorKind::Other,
        }
    }

    /// The resource whose fetch failed, for `SyncFailed` errors.
    pub fn failed_resource(&self) -> Option<Resource> {
        match self {
            Self::SyncFailed { resource, .. } => Some(*resource),
            _ => None,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lsdash_api::Error> for CoreError {
    fn from(err: lsdash_api::Error) -> Self {
        match err {
            lsdash_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            lsdash_api::Error::MissingToken => CoreError::AuthenticationFailed {
                message: "token response did not contain an access token".into(),
            },
            lsdash_api::Error::Transport(e) => CoreError::Network {
                reason: e.to_string(),
            },
            lsdash_api::Error::Api { status, message } => CoreError::Network {
                reason: format!("HTTP {status}: {message}"),
            },
            lsdash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lsdash_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
        }
    }
}
