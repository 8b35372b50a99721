// LearningStudio resource client
//
// Wraps `reqwest::Client` with URL construction, token injection and
// response decoding. Endpoint methods live in sibling modules (me,
// courses, feed) as inherent impls to keep this file about transport.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{AppCredentials, TokenManager};
use crate::error::Error;
use crate::transport::TransportConfig;

const AUTH_HEADER: &str = "X-Authorization";

/// Error bodies are kept for diagnostics but capped.
const MAX_ERROR_BODY: usize = 512;

/// Join `path` onto the API root without discarding any path prefix the
/// root carries.
pub(crate) fn endpoint_url(base: &Url, path: &str) -> Result<Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

/// Authenticated HTTP client for the LearningStudio REST API.
///
/// Cheap to clone: the HTTP pool and token cache are shared.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<TokenManager>,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        app: AppCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, app)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        app: AppCredentials,
    ) -> Result<Self, Error> {
        let tokens = TokenManager::new(http.clone(), &base_url, app)?;
        Ok(Self {
            http,
            base_url,
            tokens: Arc::new(tokens),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The token manager (credentials + cached access token).
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        endpoint_url(&self.base_url, path)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        self.send::<T, ()>(Method::GET, url, None).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        self.send(Method::PUT, url, Some(body)).await
    }

    /// Acquire a token, send, and decode the JSON payload.
    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T, Error> {
        let token = self.tokens.valid_token().await?;
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, url)
            .header(AUTH_HEADER, token.header_value());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        self.parse_response(resp).await
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        trace!(status = status.as_u16(), len = body.len(), "response received");

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
            return Err(Error::Authentication {
                message: "access token rejected".into(),
            });
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: truncate(&body, MAX_ERROR_BODY),
            });
        }

        // Write endpoints may answer with an empty body.
        let payload = if body.trim().is_empty() {
            "null"
        } else {
            body.as_str()
        };
        serde_json::from_str(payload).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_owned(),
    }
}
