// ── Runtime session configuration ──
//
// Describes *how* to reach LearningStudio. Built by the CLI from its config
// file and handed to `Session`; core never reads config files.

use std::path::PathBuf;
use std::time::Duration;

use lsdash_api::{ApiClient, AppCredentials, TransportConfig};
use url::Url;

use crate::error::CoreError;
use crate::sync::ViewDays;

/// Production API origin.
pub const DEFAULT_API_URL: &str = "https://api.learningstudio.com";

/// Configuration for one user session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// API origin (e.g. `https://api.learningstudio.com`).
    pub api_url: Url,
    /// Application id issued by LearningStudio.
    pub app_id: String,
    /// Campus client string, prefixed to every username.
    pub client_string: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Where the memory-pressure snapshot is written.
    pub snapshot_path: PathBuf,
    /// Window used when the user has no stored preference.
    pub default_view_days: ViewDays,
}

impl SessionConfig {
    pub fn new(
        api_url: Url,
        app_id: impl Into<String>,
        client_string: impl Into<String>,
        snapshot_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api_url,
            app_id: app_id.into(),
            client_string: client_string.into(),
            timeout: Duration::from_secs(30),
            snapshot_path: snapshot_path.into(),
            default_view_days: ViewDays::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_view_days(mut self, days: ViewDays) -> Self {
        self.default_view_days = days;
        self
    }

    pub fn app_credentials(&self) -> AppCredentials {
        AppCredentials {
            app_id: self.app_id.clone(),
            client_string: self.client_string.clone(),
        }
    }

    /// Build an API client for this configuration.
    pub fn build_api_client(&self) -> Result<ApiClient, CoreError> {
        let transport = TransportConfig::default().with_timeout(self.timeout);
        Ok(ApiClient::new(
            self.api_url.clone(),
            self.app_credentials(),
            &transport,
        )?)
    }
}
