// ── Persistence seams ──
//
// Small state the session keeps between runs (preferences, timestamps,
// ignored courses, the last course query ranges) and the password, which
// lives in a secure store. Core only sees these traits; lsdash-config
// provides the file and keyring implementations.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Everything persisted outside the secure store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub username: Option<String>,
    /// Course ids the user chose to hide.
    pub ignored_courses: BTreeSet<String>,
    /// `startDatesBetween` value of the last course query.
    pub course_start_range: Option<String>,
    /// `endDatesBetween` value of the last course query.
    pub course_end_range: Option<String>,
    pub past_view_days: Option<i64>,
    pub future_view_days: Option<i64>,
    /// Start of the last successful full sync (`yyyy-MM-ddTHH:mm:ssZ`).
    pub last_load_time: Option<String>,
    /// Baseline for the background probe (`yyyy-MM-ddTHH:mm:ssZ`).
    pub last_activity_time: Option<String>,
}

/// Plain (non-secret) persisted state.
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<PersistedState, CoreError>;
    fn save(&self, state: &PersistedState) -> Result<(), CoreError>;

    /// Load, apply `f`, save.
    fn update(&self, f: &mut dyn FnMut(&mut PersistedState)) -> Result<PersistedState, CoreError> {
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)?;
        Ok(state)
    }
}

/// Secure password storage, keyed by username.
pub trait SecretStore: Send + Sync {
    fn password(&self, username: &str) -> Result<Option<SecretString>, CoreError>;
    fn set_password(&self, username: &str, password: &SecretString) -> Result<(), CoreError>;
    fn delete_password(&self, username: &str) -> Result<(), CoreError>;
}

// ── In-memory implementations ────────────────────────────────────────

/// `StateStore` held in memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<PersistedState>,
}

impl MemoryStateStore {
    pub fn new(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<PersistedState, CoreError> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, state: &PersistedState) -> Result<(), CoreError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        Ok(())
    }
}

/// `SecretStore` held in memory.
#[derive(Default)]
pub struct MemorySecretStore {
    passwords: Mutex<HashMap<String, SecretString>>,
}

impl SecretStore for MemorySecretStore {
    fn password(&self, username: &str) -> Result<Option<SecretString>, CoreError> {
        Ok(self
            .passwords
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned())
    }

    fn set_password(&self, username: &str, password: &SecretString) -> Result<(), CoreError> {
        self.passwords
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username.to_owned(), password.clone());
        Ok(())
    }

    fn delete_password(&self, username: &str) -> Result<(), CoreError> {
        self.passwords
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn update_round_trips() {
        let store = MemoryStateStore::default();
        store
            .update(&mut |s| {
                s.ignored_courses.insert("101".into());
                s.past_view_days = Some(5);
            })
            .unwrap();

        let state = store.load().unwrap();
        assert!(state.ignored_courses.contains("101"));
        assert_eq!(state.past_view_days, Some(5));
    }

    #[test]
    fn secrets_by_username() {
        let store = MemorySecretStore::default();
        store
            .set_password("amy", &SecretString::from("pw"))
            .unwrap();
        assert_eq!(
            store.password("amy").unwrap().unwrap().expose_secret(),
            "pw"
        );
        store.delete_password("amy").unwrap();
        assert!(store.password("amy").unwrap().is_none());
    }
}
