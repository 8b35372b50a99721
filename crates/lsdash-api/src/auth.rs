// ── Token manager ──
//
// OAuth2 password-grant tokens for LearningStudio. A token is cached with
// its absolute expiry and reused until the wall clock reaches it. The
// cache mutex is held across the token request, so concurrent callers
// share a single refresh.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::client::endpoint_url;
use crate::error::Error;

/// Application registration issued by LearningStudio.
///
/// `client_string` prefixes every username on the token request
/// (`{client_string}\{username}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub client_string: String,
}

/// A student's login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password: SecretString,
}

impl UserCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Both halves present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.expose_secret().is_empty()
    }
}

/// Bearer token plus its absolute expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A token is usable iff `now` is strictly before its expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Value for the `X-Authorization` request header.
    pub(crate) fn header_value(&self) -> String {
        format!("Access_Token access_token={}", self.value.expose_secret())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Issues and caches access tokens for the current credentials.
pub struct TokenManager {
    http: reqwest::Client,
    token_url: Url,
    app: AppCredentials,
    credentials: RwLock<Option<UserCredentials>>,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, base_url: &Url, app: AppCredentials) -> Result<Self, Error> {
        Ok(Self {
            http,
            token_url: endpoint_url(base_url, "/token")?,
            app,
            credentials: RwLock::new(None),
            cached: Mutex::new(None),
        })
    }

    pub fn app(&self) -> &AppCredentials {
        &self.app
    }

    // ── Credentials ──────────────────────────────────────────────────

    /// Replace (or clear) the credentials. Any cached token is dropped.
    pub async fn set_credentials(&self, credentials: Option<UserCredentials>) {
        let mut cached = self.cached.lock().await;
        *cached = None;
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = credentials;
    }

    pub fn credentials(&self) -> Option<UserCredentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn username(&self) -> Option<String> {
        self.credentials().map(|c| c.username)
    }

    // ── Tokens ───────────────────────────────────────────────────────

    /// The cached token, if one exists and has not expired.
    pub async fn current_token(&self) -> Option<AccessToken> {
        self.cached
            .lock()
            .await
            .as_ref()
            .filter(|t| t.is_valid())
            .cloned()
    }

    pub async fn has_valid_token(&self) -> bool {
        self.current_token().await.is_some()
    }

    /// Drop the cached token so the next request re-authenticates.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Return a usable token, requesting a new one if needed.
    pub async fn valid_token(&self) -> Result<AccessToken, Error> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
            return Ok(token.clone());
        }

        let token = self.request_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// `POST /token` with a form-encoded password grant.
    async fn request_token(&self) -> Result<AccessToken, Error> {
        let credentials = self
            .credentials()
            .filter(UserCredentials::is_complete)
            .ok_or_else(|| Error::Authentication {
                message: "credentials are not set".into(),
            })?;

        let requested_at = Utc::now();
        let username = format!("{}\\{}", self.app.client_string, credentials.username);
        let form = [
            ("grant_type", "password"),
            ("client_id", self.app.app_id.as_str()),
            ("username", username.as_str()),
            ("password", credentials.password.expose_secret()),
        ];

        debug!(url = %self.token_url, user = %credentials.username, "requesting access token");
        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status.is_server_error() {
            warn!(status = status.as_u16(), "token endpoint unavailable");
            return Err(Error::Api {
                status: status.as_u16(),
                message: token_error_message(status, &body),
            });
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "token request rejected");
            return Err(Error::Authentication {
                message: token_error_message(status, &body),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        let value = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingToken)?;
        let lifetime = parsed
            .expires_in
            .and_then(Duration::try_seconds)
            .unwrap_or_else(Duration::zero);

        debug!(expires_in = lifetime.num_seconds(), "access token issued");
        Ok(AccessToken::new(
            SecretString::from(value),
            requested_at + lifetime,
        ))
    }
}

fn token_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<TokenErrorResponse>(body)
        .ok()
        .and_then(|e| e.error_description.or(e.error))
        .unwrap_or_else(|| format!("token endpoint returned HTTP {}", status.as_u16()))
}
