//! CLI configuration: a thin layer over `partnerdash_config` that applies
//! `GlobalOpts` flag overrides.

use clap::ValueEnum;
use secrecy::SecretString;

use partnerdash_core::DashboardConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use partnerdash_config::{Config, config_path};

/// Load the config file selected by `--config` (or the default path) and
/// apply flag overrides on top.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = match global.config {
        Some(ref path) => partnerdash_config::load_config_from(path)?,
        None => partnerdash_config::load_config()?,
    };

    if let Some(ref origin) = global.origin {
        cfg.origin.clone_from(origin);
    }
    if let Some(ref email) = global.email {
        cfg.email = Some(email.clone());
    }
    if global.insecure {
        cfg.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    Ok(cfg)
}

/// Config file path in effect for this invocation.
pub fn effective_path(global: &GlobalOpts) -> std::path::PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn dashboard_config(cfg: &Config) -> Result<DashboardConfig, CliError> {
    Ok(partnerdash_config::to_dashboard_config(cfg)?)
}

pub fn credentials(cfg: &Config) -> Result<(String, SecretString), CliError> {
    Ok(partnerdash_config::resolve_credentials(cfg, None)?)
}

/// Output format: flag, then config, then table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&cfg.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}
