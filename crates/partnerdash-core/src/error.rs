// ── Core error types ──
//
// Errors surfaced by session management and navigation. API failures are
// wrapped rather than flattened so callers can still inspect the status
// and validation fields.

use thiserror::Error;

/// Failures while loading or changing the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to load the current user: {0}")]
    Identity(#[source] partnerdash_api::Error),

    #[error("The server returned no user for this session")]
    NoIdentity,

    #[error("Failed to load roles and permissions: {0}")]
    Permissions(#[source] partnerdash_api::Error),

    #[error("Sign-in rejected: {0}")]
    SignIn(#[source] partnerdash_api::Error),

    #[error("Session could not be loaded")]
    Unavailable,

    /// The session was cleared (logout, lost authentication) while the
    /// load was in flight; its result was discarded.
    #[error("Session was cleared while loading")]
    Cleared,
}

impl SessionError {
    /// The underlying API error, if any.
    pub fn api_error(&self) -> Option<&partnerdash_api::Error> {
        match self {
            Self::Identity(e) | Self::Permissions(e) | Self::SignIn(e) => Some(e),
            Self::NoIdentity | Self::Unavailable | Self::Cleared => None,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.api_error()
            .is_some_and(partnerdash_api::Error::is_unauthenticated)
    }
}

/// Failures resolving a navigation target.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("No route matches {path}")]
    NotFound { path: String },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Api(#[from] partnerdash_api::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// The underlying API error, looking through session failures.
    pub fn api_error(&self) -> Option<&partnerdash_api::Error> {
        match self {
            Self::Api(e) => Some(e),
            Self::Session(e) => e.api_error(),
            Self::Navigation(_) | Self::Config { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_exposes_api_cause() {
        let err = SessionError::Identity(partnerdash_api::Error::Unauthenticated);
        assert!(err.is_unauthenticated());
        assert!(!SessionError::NoIdentity.is_unauthenticated());
    }

    #[test]
    fn core_error_looks_through_session() {
        let err = CoreError::from(SessionError::SignIn(partnerdash_api::Error::Api {
            status: 500,
            message: "Server Error".into(),
        }));
        assert_eq!(err.api_error().and_then(partnerdash_api::Error::status), Some(500));
    }
}
