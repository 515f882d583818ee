mod cli;
mod commands;
mod config;
mod error;
mod output;
mod progress;

use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use partnerdash_core::Dashboard;

use crate::cli::{Cli, Command, LogFormat};
use crate::commands::Context;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    let color = output::should_color(global.color);

    match cli.command {
        // Config commands don't need the backend
        Command::Config(args) => commands::config_cmd::handle(args, global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "partnerdash", &mut std::io::stdout());
            Ok(())
        }

        Command::Routes => {
            let cfg = config::load(global)?;
            commands::navigate::list_routes(config::output_format(global, &cfg), global.quiet, color);
            Ok(())
        }

        cmd => {
            let cfg = config::load(global)?;
            let dashboard = Dashboard::new(config::dashboard_config(&cfg)?)?;
            dashboard.start().await;

            let spinner = (!global.quiet && std::io::stderr().is_terminal())
                .then(|| progress::spawn_spinner(dashboard.loading()));

            let ctx = Context {
                format: config::output_format(global, &cfg),
                dashboard,
                config: cfg,
                color,
                quiet: global.quiet,
                yes: global.yes,
            };

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &ctx).await;

            ctx.dashboard.shutdown().await;
            if let Some(handle) = spinner {
                handle.abort();
            }
            result
        }
    }
}
