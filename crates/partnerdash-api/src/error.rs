use std::collections::BTreeMap;

use strum::{Display, EnumString};
use thiserror::Error;

/// Top-level error type for the `partnerdash-api` crate.
///
/// The first three variants mirror the status codes the request pipeline
/// treats specially (422, 401, 419). Everything else is either a plain API
/// failure with its HTTP status or a transport-level problem.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session ─────────────────────────────────────────────────────
    /// No valid session (HTTP 401). The client also emits
    /// `ClientEvent::AuthenticationLost` before returning this.
    #[error("Not authenticated -- sign in required")]
    Unauthenticated,

    /// The anti-forgery credential is stale (HTTP 419). Only surfaces when
    /// the one-shot recovery itself could not fix it.
    #[error("Anti-forgery credential expired (HTTP 419)")]
    ExpiredCredential,

    // ── API ─────────────────────────────────────────────────────────
    /// Field-level validation failure (HTTP 422).
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// Any other non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request body could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification consumed by views and resource wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    ExpiredCredential,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::ExpiredCredential => ErrorKind::ExpiredCredential,
            _ => ErrorKind::Other,
        }
    }

    /// HTTP status behind this error, when there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated => Some(401),
            Self::ExpiredCredential => Some(419),
            Self::Validation { .. } => Some(422),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the caller has lost its session.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Returns `true` for HTTP 403.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// Returns `true` for HTTP 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Field-level messages for a validation failure, empty otherwise.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Self::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}
