//! Configuration for the partnerdash CLI.
//!
//! TOML file + environment via figment, credential resolution
//! (env, keyring, plaintext), and translation to
//! `partnerdash_core::DashboardConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use partnerdash_core::partnerdash_api::{DEFAULT_API_PREFIX, DEFAULT_CREDENTIAL_PATH, TlsMode};
use partnerdash_core::{DEFAULT_APP_NAME, DEFAULT_ORIGIN, DashboardConfig, SessionEndpoints};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const KEYRING_SERVICE: &str = "partnerdash";
pub const ENV_PREFIX: &str = "PARTNERDASH_";
pub const PASSWORD_ENV: &str = "PARTNERDASH_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured{}", for_email(.email.as_deref()))]
    NoCredentials { email: Option<String> },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn for_email(email: Option<&str>) -> String {
    email.map(|e| format!(" for {e}")).unwrap_or_default()
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Backend origin (e.g. "http://localhost:8000").
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix resource paths live under.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Endpoint that re-issues the anti-forgery cookie.
    #[serde(default = "default_csrf_path")]
    pub csrf_path: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Suffix of every page title.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Default output format: "table", "json" or "plain".
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Plaintext password. Prefer the keyring or `PARTNERDASH_PASSWORD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            api_prefix: default_api_prefix(),
            csrf_path: default_csrf_path(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            app_name: default_app_name(),
            output: default_output(),
            email: None,
            password: None,
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoints {
    #[serde(default = "default_user_endpoint")]
    pub user: String,

    /// Separate roles/permissions endpoint, if the backend splits them out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,

    #[serde(default = "default_login_endpoint")]
    pub login: String,

    #[serde(default = "default_logout_endpoint")]
    pub logout: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            user: default_user_endpoint(),
            permissions: None,
            login: default_login_endpoint(),
            logout: default_logout_endpoint(),
        }
    }
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.into()
}
fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.into()
}
fn default_csrf_path() -> String {
    DEFAULT_CREDENTIAL_PATH.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_app_name() -> String {
    DEFAULT_APP_NAME.into()
}
fn default_output() -> String {
    "table".into()
}
fn default_user_endpoint() -> String {
    "user".into()
}
fn default_login_endpoint() -> String {
    "login".into()
}
fn default_logout_endpoint() -> String {
    "logout".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("sk", "psiehlavicky", "partnerdash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("partnerdash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(email: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{email}/password"))?)
}

/// Resolve sign-in credentials: email from the config (or `override_email`),
/// password from `PARTNERDASH_PASSWORD`, then the keyring, then plaintext.
pub fn resolve_credentials(
    cfg: &Config,
    override_email: Option<&str>,
) -> Result<(String, SecretString), ConfigError> {
    let email = override_email
        .map(str::to_owned)
        .or_else(|| cfg.email.clone())
        .ok_or(ConfigError::NoCredentials { email: None })?;

    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok((email, SecretString::from(pw)));
    }

    // 2. Keyring
    if let Ok(entry) = keyring_entry(&email) {
        if let Ok(pw) = entry.get_password() {
            return Ok((email, SecretString::from(pw)));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = cfg.password {
        return Ok((email, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials { email: Some(email) })
}

/// Store a password in the system keyring.
pub fn store_password(email: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(email)?.set_password(password.expose_secret())?;
    Ok(())
}

/// Remove a stored password. A missing entry is not an error.
pub fn forget_password(email: &str) -> Result<(), ConfigError> {
    match keyring_entry(email)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DashboardConfig` from the file config.
pub fn to_dashboard_config(cfg: &Config) -> Result<DashboardConfig, ConfigError> {
    let origin: url::Url = cfg.origin.parse().map_err(|_| ConfigError::Validation {
        field: "origin".into(),
        reason: format!("invalid URL: {}", cfg.origin),
    })?;
    if !matches!(origin.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "origin".into(),
            reason: format!("expected an http(s) URL, got {}", cfg.origin),
        });
    }

    let tls = if cfg.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let mut dashboard = DashboardConfig::new(origin);
    dashboard.api_prefix.clone_from(&cfg.api_prefix);
    dashboard.credential_path.clone_from(&cfg.csrf_path);
    dashboard.timeout = Duration::from_secs(cfg.timeout);
    dashboard.tls = tls;
    dashboard.app_name.clone_from(&cfg.app_name);
    dashboard.endpoints = SessionEndpoints {
        user: cfg.endpoints.user.clone(),
        permissions: cfg.endpoints.permissions.clone(),
        login: cfg.endpoints.login.clone(),
        logout: cfg.endpoints.logout.clone(),
    };
    Ok(dashboard)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_backend_layout() {
        let cfg = Config::default();
        assert_eq!(cfg.origin, "http://localhost:8000");
        assert_eq!(cfg.api_prefix, "api/");
        assert_eq!(cfg.csrf_path, "/sanctum/csrf-cookie");
        assert_eq!(cfg.endpoints.user, "user");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
origin = "https://partner.example.com"
timeout = 5
email = "jana@example.com"

[endpoints]
permissions = "user/permissions"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.origin, "https://partner.example.com");
        assert_eq!(cfg.timeout, 5);
        assert_eq!(cfg.email.as_deref(), Some("jana@example.com"));
        assert_eq!(cfg.endpoints.permissions.as_deref(), Some("user/permissions"));
        assert_eq!(cfg.endpoints.login, "login");
        assert_eq!(cfg.api_prefix, "api/");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.app_name, DEFAULT_APP_NAME);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            insecure: true,
            output: "json".into(),
            ..Config::default()
        };

        save_config_to(&cfg, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap().output, "json");
    }

    #[test]
    fn dashboard_config_translation() {
        let cfg = Config {
            insecure: true,
            timeout: 12,
            ..Config::default()
        };
        let dashboard = to_dashboard_config(&cfg).unwrap();
        assert_eq!(dashboard.origin.as_str(), "http://localhost:8000/");
        assert_eq!(dashboard.timeout, Duration::from_secs(12));
        assert!(matches!(dashboard.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(dashboard.app_name, DEFAULT_APP_NAME);
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let cfg = Config {
            origin: "ftp://example.com".into(),
            ..Config::default()
        };
        assert!(matches!(
            to_dashboard_config(&cfg),
            Err(ConfigError::Validation { ref field, .. }) if field == "origin"
        ));
    }

    #[test]
    fn plaintext_password_is_last_resort() {
        let cfg = Config {
            email: Some("nobody-in-keyring@example.invalid".into()),
            password: Some("hunter2".into()),
            ..Config::default()
        };
        if std::env::var(PASSWORD_ENV).is_err() {
            let (email, password) = resolve_credentials(&cfg, None).unwrap();
            assert_eq!(email, "nobody-in-keyring@example.invalid");
            assert_eq!(password.expose_secret(), "hunter2");
        }
    }

    #[test]
    fn missing_email_is_reported() {
        let cfg = Config::default();
        assert!(matches!(
            resolve_credentials(&cfg, None),
            Err(ConfigError::NoCredentials { email: None })
        ));
    }
}
