// ── Navigation guard ──
//
// Runs before every route transition: makes sure the session has been
// loaded (unless heading to sign-in), then checks the route's permission
// and role requirements against it.

use std::fmt;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::routes::RouteDef;
use crate::session::{Session, SessionState};

/// Phases a single navigation attempt passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum GuardPhase {
    Start,
    EnsuringSession,
    Authorizing,
    Allowed,
    Denied,
}

/// Why a route was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    MissingPermission(String),
    MissingRole(String),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPermission(p) => write!(f, "missing permission \"{p}\""),
            Self::MissingRole(r) => write!(f, "missing role \"{r}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Check a route's requirements against a session snapshot.
///
/// The permission is checked before the role.
pub fn authorize(route: &RouteDef, session: &Session) -> Decision {
    if let Some(permission) = route.required_permission() {
        if !session.has_permission(permission) {
            return Decision::Deny(DenyReason::MissingPermission(permission.to_owned()));
        }
    }
    if let Some(role) = route.required_role() {
        if !session.has_role(role) {
            return Decision::Deny(DenyReason::MissingRole(role.to_owned()));
        }
    }
    Decision::Allow
}

pub struct NavigationGuard {
    session: SessionState,
    sign_in: String,
    app_name: String,
    title: watch::Sender<String>,
}

impl NavigationGuard {
    pub fn new(session: SessionState, sign_in: impl Into<String>, app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        let (title, _) = watch::channel(app_name.clone());
        Self {
            session,
            sign_in: sign_in.into(),
            app_name,
            title,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Decide whether `route` may be entered. Sets the title when allowed.
    ///
    /// Session load failures are logged and treated as an empty session.
    pub async fn check(&self, route: &RouteDef) -> Decision {
        let name = route.name();
        debug!(route = name, phase = %GuardPhase::Start, "guard");

        if name != self.sign_in && !self.session.is_loaded() {
            debug!(route = name, phase = %GuardPhase::EnsuringSession, "guard");
            if let Err(e) = self.session.ensure_loaded().await {
                warn!(route = name, error = %e, "session unavailable, authorizing without it");
            }
        }

        debug!(route = name, phase = %GuardPhase::Authorizing, "guard");
        let decision = authorize(route, &self.session.snapshot());
        match decision {
            Decision::Allow => {
                debug!(route = name, phase = %GuardPhase::Allowed, "guard");
                self.apply_title(route);
            }
            Decision::Deny(ref reason) => {
                debug!(route = name, phase = %GuardPhase::Denied, %reason, "guard");
            }
        }
        decision
    }

    /// Set the document title from the route metadata.
    pub fn apply_title(&self, route: &RouteDef) {
        self.title
            .send_replace(format!("{} | {}", route.title(), self.app_name));
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    pub fn subscribe_title(&self) -> watch::Receiver<String> {
        self.title.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_route_is_allowed_for_anyone() {
        let route = RouteDef::new("tables", "/tables", "Tables");
        assert_eq!(authorize(&route, &Session::unloaded()), Decision::Allow);
    }

    #[test]
    fn permission_route_denied_without_session() {
        let route = RouteDef::new("shops.index", "/shops", "Moje e-shopy").permission("view shop");
        assert_eq!(
            authorize(&route, &Session::unloaded()),
            Decision::Deny(DenyReason::MissingPermission("view shop".into()))
        );
    }

    #[test]
    fn role_route_denied_without_role() {
        let route = RouteDef::new("admin", "/admin", "Admin").role("admin");
        let decision = authorize(&route, &Session::unloaded());
        assert!(!decision.is_allowed());
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::MissingRole("admin".into()))
        );
    }

    #[test]
    fn deny_reason_display() {
        assert_eq!(
            DenyReason::MissingPermission("view shop".into()).to_string(),
            "missing permission \"view shop\""
        );
    }
}
