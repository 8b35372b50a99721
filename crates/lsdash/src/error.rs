//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lsdash_config::ConfigError;
use lsdash_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach LearningStudio: {reason}")]
    #[diagnostic(
        code(lsdash::connection_failed),
        help(
            "Check your network connection and the api_url setting.\n\
             Try: lsdash config show"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(lsdash::auth_failed),
        help("Check your username and password, then run: lsdash login")
    )]
    AuthFailed { message: String },

    #[error("Not signed in")]
    #[diagnostic(code(lsdash::not_logged_in), help("Run: lsdash login"))]
    NotLoggedIn,

    // ── Sync ─────────────────────────────────────────────────────────

    #[error("Sync failed while loading {resource}")]
    #[diagnostic(
        code(lsdash::sync_failed),
        help("Stored credentials were cleared. Run: lsdash login")
    )]
    SyncFailed {
        resource: String,
        #[source]
        source: Box<CliError>,
    },

    #[error("No active term")]
    #[diagnostic(
        code(lsdash::no_active_term),
        help("LearningStudio reports no term that includes today.")
    )]
    NoActiveTerm,

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lsdash::not_found),
        help("Run: lsdash {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Unexpected response from LearningStudio: {message}")]
    #[diagnostic(code(lsdash::malformed_response))]
    MalformedResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lsdash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration incomplete: {reason}")]
    #[diagnostic(
        code(lsdash::no_config),
        help(
            "Create one with: lsdash config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(lsdash::config))]
    Config { message: String },

    #[error("Storage error: {message}")]
    #[diagnostic(code(lsdash::storage))]
    Storage { message: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(lsdash::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotLoggedIn => exit_code::AUTH,
            Self::NotFound { .. } | Self::NoActiveTerm => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            Self::SyncFailed { source, .. } => source.exit_code(),
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::NotAuthenticated => CliError::NotLoggedIn,
            CoreError::NoActiveTerm => CliError::NoActiveTerm,
            CoreError::Network { reason } => CliError::ConnectionFailed { reason },
            CoreError::MalformedResponse { message } => CliError::MalformedResponse { message },
            CoreError::SyncFailed { resource, source } => CliError::SyncFailed {
                resource: resource.to_string().replace('_', " "),
                source: Box::new(CliError::from(*source)),
            },
            CoreError::CourseNotFound { id } => CliError::NotFound {
                resource_type: "course".into(),
                identifier: id,
                list_command: "courses list".into(),
            },
            CoreError::CoursesNotLoaded => CliError::Storage {
                message: "courses are not loaded".into(),
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Snapshot { message } | CoreError::Storage { message } => {
                CliError::Storage { message }
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { .. } => CliError::NoConfig {
                path: lsdash_config::config_path().display().to_string(),
                reason: err.to_string(),
            },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
