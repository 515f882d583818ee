//! Command dispatch for everything that talks to the backend.

pub mod catalog;
pub mod config_cmd;
pub mod navigate;
pub mod products;
pub mod session;
pub mod shops;
mod util;

use partnerdash_core::Dashboard;

use crate::cli::{Command, OutputFormat};
use crate::config::Config;
use crate::error::CliError;

/// Everything a networked command needs.
pub struct Context {
    pub dashboard: Dashboard,
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => session::login(ctx, &args).await,
        Command::Logout => session::logout(ctx).await,
        Command::Whoami => session::whoami(ctx).await,
        Command::Navigate(args) => navigate::handle(ctx, &args).await,
        Command::Products(args) => {
            session::sign_in(ctx).await?;
            products::handle(ctx, args).await
        }
        Command::Shops(args) => {
            session::sign_in(ctx).await?;
            shops::handle(ctx, args).await
        }
        Command::Catalog(args) => {
            session::sign_in(ctx).await?;
            catalog::handle(ctx, args).await
        }
        Command::Routes | Command::Config(_) | Command::Completions(_) => {
            unreachable!("handled before a dashboard is built")
        }
    }
}
