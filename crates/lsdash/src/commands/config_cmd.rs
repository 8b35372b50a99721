//! Config subcommand handlers.

use dialoguer::Input;

use lsdash_config::{Config, save_config_to};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn config_file(global: &GlobalOpts) -> std::path::PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(lsdash_config::config_path)
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let path = config_file(global);
            let existing = super::load_config(global).unwrap_or_default();
            eprintln!("lsdash configuration");
            eprintln!("   Config path: {}\n", path.display());

            let api_url: String = Input::new()
                .with_prompt("API URL")
                .default(existing.api_url.clone())
                .interact_text()
                .map_err(prompt_err)?;

            let app_id: String = Input::new()
                .with_prompt("Application id")
                .with_initial_text(existing.app_id.clone().unwrap_or_default())
                .interact_text()
                .map_err(prompt_err)?;

            let client_string: String = Input::new()
                .with_prompt("Campus client string")
                .with_initial_text(existing.client_string.clone().unwrap_or_default())
                .interact_text()
                .map_err(prompt_err)?;

            let cfg = Config {
                api_url,
                app_id: Some(app_id),
                client_string: Some(client_string),
                ..existing
            };
            // Fail before writing if the result is unusable.
            lsdash_config::session_config(&cfg)?;
            save_config_to(&cfg, &path)?;
            output::status(&format!("Saved {}", path.display()), global.quiet);
            output::status("Next: lsdash login", global.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = super::load_config(global)?;
            let out = output::render_single(
                global.output,
                &cfg,
                |c| {
                    let body = toml::to_string_pretty(c).unwrap_or_default();
                    format!(
                        "# {}\n{body}\n# data dir: {}",
                        config_file(global).display(),
                        c.data_dir().display()
                    )
                },
                |c| c.api_url.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set days ────────────────────────────────────────────────
        ConfigCommand::SetDays { past, future } => {
            if past.is_none() && future.is_none() {
                return Err(CliError::Validation {
                    field: "days".into(),
                    reason: "pass --past and/or --future".into(),
                });
            }
            if past.is_some_and(|d| d < 0) || future.is_some_and(|d| d < 0) {
                return Err(CliError::Validation {
                    field: "days".into(),
                    reason: "days cannot be negative".into(),
                });
            }
            let cfg = super::load_config(global)?;
            let session = super::open_session(&cfg, global)?;
            let days = session.set_view_days(past, future)?;
            output::status(
                &format!("Showing {} days back and {} days ahead", days.past, days.future),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config_file(global).display().to_string(), false);
            Ok(())
        }
    }
}
