// ── Runtime dashboard configuration ──
//
// Describes which backend to talk to and how the session endpoints are
// laid out. Never touches disk: `partnerdash-config` (or a test) builds
// one and hands it to `Dashboard::new`.

use std::time::Duration;

use partnerdash_api::{DEFAULT_API_PREFIX, DEFAULT_CREDENTIAL_PATH, TlsMode, TransportConfig};
use url::Url;

pub const DEFAULT_APP_NAME: &str = "Psiehlavičky Partner";
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

/// Paths of the session-related endpoints, relative to the API prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEndpoints {
    /// Identity endpoint. Returns `{ user, roles, permissions }` unless
    /// `permissions` is set, in which case only `{ user }` is read from it.
    pub user: String,
    /// Optional separate `{ roles, permissions }` endpoint.
    pub permissions: Option<String>,
    pub login: String,
    pub logout: String,
}

impl Default for SessionEndpoints {
    fn default() -> Self {
        Self {
            user: "user".into(),
            permissions: None,
            login: "login".into(),
            logout: "logout".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend origin, e.g. `http://localhost:8000`.
    pub origin: Url,
    /// Prefix resource paths live under (`api/`).
    pub api_prefix: String,
    /// Endpoint that re-issues the anti-forgery cookie, resolved against the origin.
    pub credential_path: String,
    pub endpoints: SessionEndpoints,
    pub timeout: Duration,
    pub tls: TlsMode,
    /// Suffix of every document title.
    pub app_name: String,
}

impl DashboardConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            api_prefix: DEFAULT_API_PREFIX.into(),
            credential_path: DEFAULT_CREDENTIAL_PATH.into(),
            endpoints: SessionEndpoints::default(),
            timeout: Duration::from_secs(30),
            tls: TlsMode::System,
            app_name: DEFAULT_APP_NAME.into(),
        }
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar()
    }
}
