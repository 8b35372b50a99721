// ── Session ──
//
// One signed-in user's view of LearningStudio. Owns the API client (and
// with it the credentials and token cache), the aggregated model, the
// persistence handles and the change-event channel. Constructed on login
// and torn down on logout or an unrecoverable sync failure.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::{RwLock, broadcast, watch};
use tracing::{debug, info, trace, warn};

use lsdash_api::{ApiClient, UserCredentials};

use crate::config::SessionConfig;
use crate::dates::{is_strictly_after, render_in_zone};
use crate::error::CoreError;
use crate::events::{EVENT_CHANNEL_SIZE, EventStream, SessionEvent};
use crate::model::{CourseId, UserData};
use crate::probe::DeltaProber;
use crate::snapshot::SnapshotStore;
use crate::store::{SecretStore, StateStore};
use crate::sync::{SearchWindow, SyncPhase, ViewDays};

/// Per-sync values the views compare against.
#[derive(Debug, Clone, Copy, Default)]
struct Baseline {
    previous_load_time: Option<DateTime<Utc>>,
    window: Option<SearchWindow>,
}

/// Cheaply cloneable handle to a user session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) config: SessionConfig,
    pub(crate) api: ApiClient,
    pub(crate) state: Arc<dyn StateStore>,
    pub(crate) secrets: Arc<dyn SecretStore>,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) model: RwLock<Option<UserData>>,
    pub(crate) sync_lock: tokio::sync::Mutex<()>,
    baseline: Mutex<Baseline>,
    events: broadcast::Sender<SessionEvent>,
    phase: watch::Sender<SyncPhase>,
}

impl Session {
    /// Build a session. Does not touch the network.
    pub fn new(
        config: SessionConfig,
        state: Arc<dyn StateStore>,
        secrets: Arc<dyn SecretStore>,
    ) -> Result<Self, CoreError> {
        let api = config.build_api_client()?;
        Ok(Self::with_api(config, api, state, secrets))
    }

    /// Build a session around an existing API client.
    pub fn with_api(
        config: SessionConfig,
        api: ApiClient,
        state: Arc<dyn StateStore>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (phase, _) = watch::channel(SyncPhase::Idle);
        let snapshots = SnapshotStore::new(config.snapshot_path.clone());
        Self {
            inner: Arc::new(SessionInner {
                config,
                api,
                state,
                secrets,
                snapshots,
                model: RwLock::new(None),
                sync_lock: tokio::sync::Mutex::new(()),
                baseline: Mutex::new(Baseline::default()),
                events,
                phase,
            }),
        }
    }

    pub(crate) fn inner(&self) -> &SessionInner {
        &self.inner
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// A prober sharing this session's client and stores.
    pub fn prober(&self) -> DeltaProber {
        DeltaProber::new(
            self.inner.api.clone(),
            Arc::clone(&self.inner.state),
            Arc::clone(&self.inner.secrets),
            self.inner.config.default_view_days,
        )
    }

    // ── Events ───────────────────────────────────────────────────────

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn events(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn sync_phase(&self) -> watch::Receiver<SyncPhase> {
        self.inner.phase.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        trace!(?event, "emitting session event");
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    pub(crate) fn set_phase(&self, phase: SyncPhase) {
        self.inner.phase.send_replace(phase);
    }

    // ── Credentials ──────────────────────────────────────────────────

    /// Replace the in-memory credentials. Nothing is persisted.
    pub async fn set_credentials(&self, username: &str, password: SecretString) {
        self.inner
            .api
            .tokens()
            .set_credentials(Some(UserCredentials::new(username, password)))
            .await;
    }

    pub fn username(&self) -> Option<String> {
        self.inner.api.tokens().username()
    }

    pub async fn has_valid_token(&self) -> bool {
        self.inner.api.tokens().has_valid_token().await
    }

    /// Reload stored credentials unless a token is already cached.
    /// Returns whether both username and password are now set.
    pub async fn restore_credentials(&self) -> Result<bool, CoreError> {
        let tokens = self.inner.api.tokens();
        if !tokens.has_valid_token().await {
            let state = self.inner.state.load()?;
            if let Some(username) = state.username.filter(|u| !u.is_empty()) {
                if let Some(password) = self.inner.secrets.password(&username)? {
                    debug!(user = %username, "restored stored credentials");
                    tokens
                        .set_credentials(Some(UserCredentials::new(username, password)))
                        .await;
                }
            }
        }
        Ok(tokens
            .credentials()
            .is_some_and(|c| c.is_complete()))
    }

    /// Persist the current credentials: username in plain state, password
    /// in the secure store.
    pub fn save_credentials(&self) -> Result<(), CoreError> {
        let credentials = self
            .inner
            .api
            .tokens()
            .credentials()
            .filter(UserCredentials::is_complete)
            .ok_or(CoreError::NotAuthenticated)?;
        self.inner
            .secrets
            .set_password(&credentials.username, &credentials.password)?;
        self.inner
            .state
            .update(&mut |s| s.username = Some(credentials.username.clone()))?;
        info!(user = %credentials.username, "credentials saved");
        Ok(())
    }

    /// Set credentials, validate them by loading the profile, and persist
    /// them on success. Rejected credentials are dropped from memory.
    pub async fn login(&self, username: &str, password: SecretString) -> Result<(), CoreError> {
        self.set_credentials(username, password).await;
        if let Err(e) = self.load_profile().await {
            warn!(user = %username, error = %e, "login failed");
            self.inner.api.tokens().set_credentials(None).await;
            return Err(e);
        }
        self.save_credentials()
    }

    pub async fn logout(&self) -> Result<(), CoreError> {
        info!("logging out");
        self.teardown().await
    }

    /// Clear credentials, token, model, baseline, stored username,
    /// stored password and any snapshot.
    pub(crate) async fn teardown(&self) -> Result<(), CoreError> {
        let tokens = self.inner.api.tokens();
        let memory_user = tokens.username();
        tokens.set_credentials(None).await;
        *self.inner.model.write().await = None;
        *self.baseline() = Baseline::default();
        self.inner.snapshots.clear();

        let mut stored_user = None;
        let state_result = self.inner.state.update(&mut |s| {
            stored_user = s.username.take();
        });
        let mut secret_result = Ok(());
        for user in [memory_user, stored_user].into_iter().flatten() {
            if let Err(e) = self.inner.secrets.delete_password(&user) {
                secret_result = Err(e);
            }
        }

        self.emit(SessionEvent::SessionCleared);
        info!("session cleared");
        state_result.map(|_| ()).and(secret_result)
    }

    // ── Profile ──────────────────────────────────────────────────────

    /// `GET /me`, then start a fresh empty model for this user.
    pub async fn load_profile(&self) -> Result<(), CoreError> {
        let me = self.inner.api.get_me().await?;
        *self.inner.model.write().await = Some(UserData::new(me));
        info!("profile loaded");
        Ok(())
    }

    // ── Model access ─────────────────────────────────────────────────

    /// The in-memory model. Never reads the snapshot.
    pub async fn user_data(&self) -> Option<UserData> {
        self.inner.model.read().await.clone()
    }

    /// Run `f` against the in-memory model without cloning it.
    pub async fn with_user_data<R>(&self, f: impl FnOnce(&UserData) -> R) -> Option<R> {
        self.inner.model.read().await.as_ref().map(f)
    }

    /// Restore the model from the snapshot if it is absent and one was
    /// saved. Returns whether a model is present afterwards.
    pub async fn ensure_loaded(&self) -> bool {
        let mut model = self.inner.model.write().await;
        if model.is_none() && self.inner.snapshots.is_marked() {
            *model = self.inner.snapshots.load();
        }
        model.is_some()
    }

    pub(crate) async fn apply(&self, f: impl FnOnce(&mut UserData)) -> bool {
        match self.inner.model.write().await.as_mut() {
            Some(data) => {
                f(data);
                true
            }
            None => false,
        }
    }

    fn baseline(&self) -> std::sync::MutexGuard<'_, Baseline> {
        self.inner
            .baseline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_baseline(
        &self,
        previous_load_time: Option<DateTime<Utc>>,
        window: Option<SearchWindow>,
    ) {
        *self.baseline() = Baseline {
            previous_load_time,
            window,
        };
    }

    /// Load time of the sync before the current one: the "new since"
    /// baseline for views.
    pub fn last_load_time(&self) -> Option<DateTime<Utc>> {
        self.baseline().previous_load_time
    }

    /// Search window of the most recent sync.
    pub fn search_window(&self) -> Option<SearchWindow> {
        self.baseline().window
    }

    /// Whether a timestamp is newer than the previous sync.
    pub fn is_new(&self, raw: Option<&str>) -> bool {
        self.last_load_time()
            .is_some_and(|baseline| is_strictly_after(raw, baseline))
    }

    /// Render an API timestamp in the course's time zone.
    pub async fn convert_course_date(&self, course_id: &CourseId, raw: &str, humanize: bool) -> String {
        let zone = self
            .with_user_data(|d| d.time_zone(course_id).map(str::to_owned))
            .await
            .flatten();
        render_in_zone(raw, zone.as_deref(), humanize)
    }

    // ── Preferences ──────────────────────────────────────────────────

    pub fn view_days(&self) -> Result<ViewDays, CoreError> {
        let state = self.inner.state.load()?;
        Ok(ViewDays::resolve(
            state.past_view_days,
            state.future_view_days,
            self.inner.config.default_view_days,
        ))
    }

    /// Store window preferences; values <= 0 revert to the defaults.
    pub fn set_view_days(&self, past: Option<i64>, future: Option<i64>) -> Result<ViewDays, CoreError> {
        self.inner.state.update(&mut |s| {
            if past.is_some() {
                s.past_view_days = past.filter(|d| *d > 0);
            }
            if future.is_some() {
                s.future_view_days = future.filter(|d| *d > 0);
            }
        })?;
        self.view_days()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Move a course between the visible and hidden lists and remember
    /// the choice.
    pub async fn set_course_hidden(&self, course_id: &CourseId, hidden: bool) -> Result<(), CoreError> {
        let changed = {
            let mut model = self.inner.model.write().await;
            let data = model.as_mut().ok_or(CoreError::CoursesNotLoaded)?;
            data.set_course_hidden(course_id, hidden)?
        };

        self.inner.state.update(&mut |s| {
            if hidden {
                s.ignored_courses.insert(course_id.to_string());
            } else {
                s.ignored_courses.remove(course_id.as_str());
            }
        })?;

        if changed {
            info!(%course_id, hidden, "course visibility changed");
            self.emit(SessionEvent::CoursesRefreshed);
        }
        Ok(())
    }

    /// Mark an announcement read on the server, then drop it from the
    /// unread list.
    pub async fn mark_announcement_read(
        &self,
        course_id: &CourseId,
        announcement_id: &str,
    ) -> Result<(), CoreError> {
        self.inner
            .api
            .mark_announcement_read(course_id.as_str(), announcement_id)
            .await?;
        let removed = self
            .inner
            .model
            .write()
            .await
            .as_mut()
            .is_some_and(|d| d.remove_announcement(course_id, announcement_id));
        if removed {
            self.emit(SessionEvent::AnnouncementsRefreshed);
        }
        Ok(())
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// Memory-pressure hook: write the model out and drop it. If the write
    /// fails the model stays in memory.
    pub async fn save_snapshot(&self) -> Result<(), CoreError> {
        let mut model = self.inner.model.write().await;
        let Some(data) = model.as_ref() else {
            debug!("no model to snapshot");
            return Ok(());
        };
        self.inner.snapshots.save(data)?;
        *model = None;
        Ok(())
    }

    pub fn has_snapshot(&self) -> bool {
        self.inner.snapshots.is_marked()
    }
}
