//! Config subcommand handlers. None of these touch the network.

use std::fmt::Write;
use std::io::IsTerminal;

use dialoguer::{Input, Select};
use secrecy::{ExposeSecret, SecretString};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the password.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "origin = \"{}\"", cfg.origin);
    let _ = writeln!(out, "api_prefix = \"{}\"", cfg.api_prefix);
    let _ = writeln!(out, "csrf_path = \"{}\"", cfg.csrf_path);
    let _ = writeln!(out, "timeout = {}", cfg.timeout);
    let _ = writeln!(out, "insecure = {}", cfg.insecure);
    if let Some(ref ca) = cfg.ca_cert {
        let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
    }
    let _ = writeln!(out, "app_name = \"{}\"", cfg.app_name);
    let _ = writeln!(out, "output = \"{}\"", cfg.output);
    if let Some(ref email) = cfg.email {
        let _ = writeln!(out, "email = \"{email}\"");
    }
    if cfg.password.is_some() {
        let _ = writeln!(out, "password = \"****\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[endpoints]");
    let _ = writeln!(out, "user = \"{}\"", cfg.endpoints.user);
    if let Some(ref permissions) = cfg.endpoints.permissions {
        let _ = writeln!(out, "permissions = \"{permissions}\"");
    }
    let _ = writeln!(out, "login = \"{}\"", cfg.endpoints.login);
    let _ = write!(out, "logout = \"{}\"", cfg.endpoints.logout);
    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn require_terminal(action: &str) -> Result<(), CliError> {
    if std::io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "interactive".into(),
            reason: format!("'{action}' needs an interactive terminal"),
        })
    }
}

fn prompt_email() -> Result<String, CliError> {
    Input::<String>::new()
        .with_prompt("Email")
        .interact_text()
        .map_err(prompt_err)
}

fn prompt_password() -> Result<SecretString, CliError> {
    let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if pass.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(SecretString::from(pass))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            output::print_output(&format_config_redacted(&cfg), global.quiet);
        }

        ConfigCommand::Path => {
            output::print_output(
                &config::effective_path(global).display().to_string(),
                global.quiet,
            );
        }

        ConfigCommand::Init => {
            require_terminal("config init")?;
            let path = config::effective_path(global);
            let mut cfg = Config::default();

            cfg.origin = Input::<String>::new()
                .with_prompt("Dashboard origin")
                .default(cfg.origin.clone())
                .interact_text()
                .map_err(prompt_err)?;
            let email = prompt_email()?;
            let password = prompt_password()?;

            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where should the password be stored?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            if selection == 0 {
                partnerdash_config::store_password(&email, &password)?;
                eprintln!("   ✓ password stored in system keyring");
            } else {
                cfg.password = Some(password.expose_secret().to_owned());
            }
            cfg.email = Some(email);

            partnerdash_config::save_config_to(&cfg, &path)?;
            output::notice(&format!("Config written to {}", path.display()), global.quiet);
        }

        ConfigCommand::SetPassword => {
            require_terminal("config set-password")?;
            let cfg = config::load(global)?;
            let email = match cfg.email {
                Some(email) => email,
                None => prompt_email()?,
            };
            let password = prompt_password()?;
            partnerdash_config::store_password(&email, &password)?;
            output::notice(&format!("Password for {email} stored"), global.quiet);
        }

        ConfigCommand::ForgetPassword => {
            let cfg = config::load(global)?;
            let email = cfg
                .email
                .ok_or(CliError::NoCredentials { email: None })?;
            partnerdash_config::forget_password(&email)?;
            output::notice(&format!("Password for {email} removed"), global.quiet);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_masked() {
        let cfg = Config {
            email: Some("jana@example.com".into()),
            password: Some("hunter2".into()),
            ..Config::default()
        };
        let shown = format_config_redacted(&cfg);
        assert!(shown.contains("password = \"****\""));
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("email = \"jana@example.com\""));
    }
}
