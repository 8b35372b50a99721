//! Login / logout handlers.

use dialoguer::{Input, Password};
use secrecy::SecretString;

use lsdash_core::Session;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub async fn login(session: &Session, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let username = match args.username {
        Some(u) => u,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(prompt_err)?,
    };
    let password = match args.password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(prompt_err)?,
    };

    if username.trim().is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }

    session
        .login(username.trim(), SecretString::from(password))
        .await?;

    let greeting = session
        .with_user_data(|d| d.first_name().map(str::to_owned))
        .await
        .flatten()
        .unwrap_or_else(|| username.trim().to_owned());
    output::status(&format!("Signed in as {greeting}"), global.quiet);
    Ok(())
}

pub async fn logout(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.logout().await?;
    output::status("Signed out", global.quiet);
    Ok(())
}
