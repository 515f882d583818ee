//! CLI error types with miette diagnostics.
//!
//! Maps API, core and config errors into user-facing errors with
//! actionable help text and stable exit codes.

use std::collections::BTreeMap;

use miette::Diagnostic;
use thiserror::Error;

use partnerdash_config::ConfigError;
use partnerdash_core::partnerdash_api::Error as ApiError;
use partnerdash_core::{CoreError, NavigationError, SessionError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the dashboard at {url}")]
    #[diagnostic(
        code(partnerdash::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Override the address with --origin or PARTNERDASH_ORIGIN."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(partnerdash::tls_error),
        help("Use --insecure (-k) to accept a self-signed certificate, or set ca_cert in the config.")
    )]
    TlsError { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(partnerdash::timeout),
        help("Increase the timeout with --timeout or check the backend's responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(partnerdash::auth_failed),
        help(
            "Check your email and password.\n\
             Run: partnerdash login"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured{}", for_email(.email.as_deref()))]
    #[diagnostic(
        code(partnerdash::no_credentials),
        help(
            "Set an email with --email or in the config, and a password with\n\
             partnerdash config set-password or PARTNERDASH_PASSWORD."
        )
    )]
    NoCredentials { email: Option<String> },

    #[error("Access denied: {message}")]
    #[diagnostic(
        code(partnerdash::forbidden),
        help("Your account lacks the role or permission this action needs.")
    )]
    Forbidden { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(partnerdash::not_found),
        help("Run: partnerdash {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("No route matches {path}")]
    #[diagnostic(code(partnerdash::route_not_found), help("Run: partnerdash routes"))]
    RouteNotFound { path: String },

    #[error("API error ({status}): {message}")]
    #[diagnostic(code(partnerdash::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(partnerdash::unexpected_response))]
    UnexpectedResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(partnerdash::validation))]
    Validation { field: String, reason: String },

    #[error("The server rejected the input: {message}")]
    #[diagnostic(code(partnerdash::rejected), help("{details}"))]
    Rejected { message: String, details: String },

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(partnerdash::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(code(partnerdash::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(partnerdash::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

fn for_email(email: Option<&str>) -> String {
    email.map(|e| format!(" for {e}")).unwrap_or_default()
}

fn format_fields(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
        .collect::<Vec<_>>()
        .join("\n")
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. }
            | Self::RouteNotFound { .. }
            | Self::ApiError { status: 404, .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::Rejected { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── API error → CliError mapping ─────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthenticated => Self::AuthFailed {
                message: "the server rejected the session".into(),
            },
            ApiError::ExpiredCredential => Self::AuthFailed {
                message: "the anti-forgery token could not be renewed".into(),
            },
            ApiError::Validation { message, fields } => Self::Rejected {
                details: format_fields(&fields),
                message,
            },
            ApiError::Api {
                status: 403,
                message,
            } => Self::Forbidden { message },
            ApiError::Api { status, message } => Self::ApiError { status, message },
            ApiError::Transport(e) => {
                if e.is_timeout() {
                    Self::Timeout
                } else {
                    Self::ConnectionFailed {
                        url: e.url().map(ToString::to_string).unwrap_or_default(),
                        source: Box::new(e),
                    }
                }
            }
            ApiError::InvalidUrl(e) => Self::Validation {
                field: "origin".into(),
                reason: e.to_string(),
            },
            ApiError::Tls(message) => Self::TlsError { message },
            ApiError::Deserialization { message, .. } => Self::UnexpectedResponse { message },
            ApiError::Serialization(reason) => Self::Validation {
                field: "body".into(),
                reason,
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SignIn(ApiError::Validation { message, .. }) => {
                Self::AuthFailed { message }
            }
            SessionError::Identity(e) | SessionError::Permissions(e) | SessionError::SignIn(e) => {
                e.into()
            }
            SessionError::NoIdentity | SessionError::Unavailable | SessionError::Cleared => {
                Self::AuthFailed {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Session(e) => e.into(),
            CoreError::Navigation(NavigationError::NotFound { path }) => {
                Self::RouteNotFound { path }
            }
            CoreError::Api(e) => e.into(),
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { email } => Self::NoCredentials { email },
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_exit_codes() {
        assert_eq!(CliError::from(ApiError::Unauthenticated).exit_code(), exit_code::AUTH);
        let forbidden = ApiError::Api {
            status: 403,
            message: "This action is unauthorized.".into(),
        };
        assert_eq!(CliError::from(forbidden).exit_code(), exit_code::PERMISSION);
        let missing = ApiError::Api {
            status: 404,
            message: "Not Found".into(),
        };
        assert_eq!(CliError::from(missing).exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn rejected_sign_in_is_an_auth_failure() {
        let err = CliError::from(SessionError::SignIn(ApiError::Validation {
            message: "These credentials do not match our records.".into(),
            fields: BTreeMap::new(),
        }));
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn validation_details_list_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_owned(), vec!["The name field is required.".to_owned()]);
        let err = CliError::from(ApiError::Validation {
            message: "The given data was invalid.".into(),
            fields,
        });
        match err {
            CliError::Rejected { ref details, .. } => {
                assert_eq!(details, "name: The name field is required.");
            }
            ref other => panic!("expected Rejected, got {other:?}"),
        }
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn unknown_route_maps_to_not_found() {
        let err = CliError::from(CoreError::from(NavigationError::NotFound {
            path: "/nowhere".into(),
        }));
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }
}
