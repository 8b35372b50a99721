// ── Keyring password store ──

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use lsdash_core::{CoreError, SecretStore};

use crate::ConfigError;

/// Keyring service name; the account is the username.
pub const KEYRING_SERVICE: &str = "lsdash";

/// `SecretStore` backed by the platform keyring.
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, username: &str) -> Result<keyring::Entry, ConfigError> {
        Ok(keyring::Entry::new(&self.service, username)?)
    }
}

impl SecretStore for KeyringSecretStore {
    fn password(&self, username: &str) -> Result<Option<SecretString>, CoreError> {
        match self.entry(username)?.get_password() {
            Ok(pw) => Ok(Some(SecretString::from(pw))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ConfigError::from(e).into()),
        }
    }

    fn set_password(&self, username: &str, password: &SecretString) -> Result<(), CoreError> {
        self.entry(username)?
            .set_password(password.expose_secret())
            .map_err(ConfigError::from)?;
        debug!(user = username, "password stored in keyring");
        Ok(())
    }

    fn delete_password(&self, username: &str) -> Result<(), CoreError> {
        match self.entry(username)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ConfigError::from(e).into()),
        }
    }
}
