//! Shared configuration for the lsdash CLI.
//!
//! TOML config merged with `LSDASH_*` environment variables, the on-disk
//! session state file, keyring-backed password storage, and translation
//! to `lsdash_core::SessionConfig`.

mod secrets;
mod state;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lsdash_core::config::DEFAULT_API_URL;
use lsdash_core::sync::{DEFAULT_FUTURE_DAYS, DEFAULT_PAST_DAYS};
use lsdash_core::{CoreError, SessionConfig, ViewDays};

pub use secrets::{KEYRING_SERVICE, KeyringSecretStore};
pub use state::FileStateStore;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { .. } | ConfigError::Figment(_) => Self::Config {
                message: err.to_string(),
            },
            other => Self::Storage {
                message: other.to_string(),
            },
        }
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// LearningStudio API origin.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Application id issued by LearningStudio.
    pub app_id: Option<String>,

    /// Campus client string (e.g. "gbtestc").
    pub client_string: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_past_days")]
    pub past_view_days: i64,

    #[serde(default = "default_future_days")]
    pub future_view_days: i64,

    /// Override for the state/snapshot directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            app_id: None,
            client_string: None,
            timeout: default_timeout(),
            past_view_days: default_past_days(),
            future_view_days: default_future_days(),
            data_dir: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_past_days() -> i64 {
    DEFAULT_PAST_DAYS
}
fn default_future_days() -> i64 {
    DEFAULT_FUTURE_DAYS
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "lsdash", "lsdash")
}

fn home_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("lsdash");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

impl Config {
    /// Directory holding the state file and the snapshot.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            project_dirs().map_or_else(
                || home_fallback(".local/share"),
                |dirs| dirs.data_dir().to_path_buf(),
            )
        })
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir().join("state.toml")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir().join("snapshot.json")
    }

    pub fn view_days(&self) -> ViewDays {
        ViewDays::resolve(
            Some(self.past_view_days),
            Some(self.future_view_days),
            ViewDays::default(),
        )
    }
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + `LSDASH_*` environment variables. A
/// missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LSDASH_").only(&[
            "api_url",
            "app_id",
            "client_string",
            "timeout",
            "past_view_days",
            "future_view_days",
            "data_dir",
        ]))
        .extract()?;
    Ok(config)
}

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core ─────────────────────────────────────────────

/// Build a `SessionConfig`, checking that the required fields are set.
pub fn session_config(cfg: &Config) -> Result<SessionConfig, ConfigError> {
    let api_url: url::Url = cfg.api_url.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {}", cfg.api_url),
    })?;
    let app_id = required(cfg.app_id.as_deref(), "app_id")?;
    let client_string = required(cfg.client_string.as_deref(), "client_string")?;

    Ok(
        SessionConfig::new(api_url, app_id, client_string, cfg.snapshot_path())
            .with_timeout(Duration::from_secs(cfg.timeout))
            .with_default_view_days(cfg.view_days()),
    )
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Validation {
            field: field.into(),
            reason: format!(
                "not set (run `lsdash config init` or set LSDASH_{})",
                field.to_uppercase()
            ),
        })
}
