//! Command dispatch: bridges CLI args -> session operations -> output.

pub mod auth;
pub mod config_cmd;
pub mod courses;
pub mod sync;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use lsdash_config::{Config, FileStateStore, KeyringSecretStore};
use lsdash_core::{Session, SyncReport};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Load the config file named by `--config`, or the default one.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let cfg = match &global.config {
        Some(path) => lsdash_config::load_config_from(path)?,
        None => lsdash_config::load_config()?,
    };
    Ok(cfg)
}

/// Build a session over the file state store and the system keyring.
pub fn open_session(cfg: &Config, global: &GlobalOpts) -> Result<Session, CliError> {
    let mut session_cfg = lsdash_config::session_config(cfg)?;
    if let Some(secs) = global.timeout {
        session_cfg = session_cfg.with_timeout(Duration::from_secs(secs));
    }
    let state = Arc::new(FileStateStore::new(cfg.state_path()));
    let secrets = Arc::new(KeyringSecretStore::default());
    Ok(Session::new(session_cfg, state, secrets)?)
}

/// Restore stored credentials and load the profile.
pub async fn signed_in(session: &Session) -> Result<(), CliError> {
    if !session.restore_credentials().await? {
        return Err(CliError::NotLoggedIn);
    }
    session.load_profile().await?;
    Ok(())
}

/// Sign in and run a full sync.
pub async fn synced(session: &Session) -> Result<SyncReport, CliError> {
    signed_in(session).await?;
    Ok(session.reload_data().await?)
}

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(session, args, global).await,
        Command::Logout => auth::logout(session, global).await,
        Command::Sync => sync::handle(session, global).await,
        Command::Probe => sync::probe(session, global).await,
        Command::Courses(args) => courses::handle(session, args, global).await,
        Command::Due => views::due(session, global).await,
        Command::Activity => views::activity(session, global).await,
        Command::Grades => views::grades(session, global).await,
        Command::News => views::news(session, global).await,
        Command::Read {
            course_id,
            announcement_id,
        } => views::read(session, &course_id, &announcement_id, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
