//! Sign-in, sign-out and identity commands.

use std::io::IsTerminal;

use dialoguer::Input;
use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;

use crate::cli::LoginArgs;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::Context;

/// Sign in with configured credentials, prompting when none are
/// configured and stdin is interactive.
pub async fn sign_in(ctx: &Context) -> Result<(String, SecretString), CliError> {
    let (email, password) = match config::credentials(&ctx.config) {
        Ok(creds) => creds,
        Err(CliError::NoCredentials { email }) if std::io::stdin().is_terminal() => {
            prompt_credentials(email)?
        }
        Err(e) => return Err(e),
    };

    debug!(%email, "signing in");
    ctx.dashboard.sign_in(&email, &password).await?;
    Ok((email, password))
}

fn prompt_credentials(email: Option<String>) -> Result<(String, SecretString), CliError> {
    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(|e| CliError::Io(std::io::Error::other(e)))?,
    };
    let password = rpassword::prompt_password(format!("Password for {email}: "))?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok((email, SecretString::from(password)))
}

pub async fn login(ctx: &Context, args: &LoginArgs) -> Result<(), CliError> {
    let (email, password) = sign_in(ctx).await?;
    if args.save {
        partnerdash_config::store_password(&email, &password)?;
        output::notice("Password stored in the system keyring", ctx.quiet);
    }
    output::notice(
        &format!("{} as {email}", output::success("Signed in", ctx.color)),
        ctx.quiet,
    );
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    sign_in(ctx).await?;
    ctx.dashboard.logout().await?;
    output::notice("Signed out", ctx.quiet);
    Ok(())
}

#[derive(Serialize)]
struct WhoAmI {
    id: u64,
    name: String,
    email: String,
    roles: Vec<String>,
    permissions: Vec<String>,
}

pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    sign_in(ctx).await?;
    let session = ctx.dashboard.session().snapshot();
    let identity = session.identity().ok_or_else(|| CliError::AuthFailed {
        message: "no user in session".into(),
    })?;

    let me = WhoAmI {
        id: identity.id,
        name: identity.name.clone(),
        email: identity.email.clone(),
        roles: session.roles().iter().cloned().collect(),
        permissions: session.permissions().iter().cloned().collect(),
    };
    let out = output::render_single(
        ctx.format,
        &me,
        |m| {
            output::detail_lines(&[
                ("ID", m.id.to_string()),
                ("Name", m.name.clone()),
                ("Email", m.email.clone()),
                ("Roles", m.roles.join(", ")),
                ("Permissions", m.permissions.join(", ")),
            ])
        },
        |m| m.email.clone(),
    );
    output::print_output(&out, ctx.quiet);
    Ok(())
}
