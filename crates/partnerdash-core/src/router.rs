// ── Router ──
//
// Resolves paths, runs the guard, and records where the dashboard is.
// Navigations are serialized: a redirect requested while a guarded
// navigation is in flight applies after it.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use crate::error::NavigationError;
use crate::guard::{Decision, DenyReason, NavigationGuard};
use crate::routes::{Location, RouteTable};

/// Outcome of `Router::push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allowed(Location),
    Denied {
        requested: Location,
        landed: Location,
        reason: DenyReason,
    },
}

impl Navigation {
    /// Where the router ended up.
    pub fn location(&self) -> &Location {
        match self {
            Self::Allowed(location) => location,
            Self::Denied { landed, .. } => landed,
        }
    }
}

#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    routes: RouteTable,
    guard: NavigationGuard,
    current: watch::Sender<Option<Location>>,
    /// Committed paths, oldest first. Also serializes navigations.
    history: Mutex<Vec<String>>,
}

impl Router {
    pub fn new(routes: RouteTable, guard: NavigationGuard) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(RouterInner {
                routes,
                guard,
                current,
                history: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.inner.guard
    }

    /// Navigate to `path`, landing on the forbidden route if the guard refuses.
    pub async fn push(&self, path: &str) -> Result<Navigation, NavigationError> {
        let target = self.inner.routes.resolve(path)?;
        let mut history = self.inner.history.lock().await;

        match self.inner.guard.check(target.route()).await {
            Decision::Allow => {
                info!(path = target.path(), route = target.route().name(), "navigated");
                self.commit(&mut history, target.clone());
                Ok(Navigation::Allowed(target))
            }
            Decision::Deny(reason) => {
                let landed = self.inner.routes.forbidden_location();
                info!(path = target.path(), %reason, "navigation denied");
                self.inner.guard.apply_title(landed.route());
                self.commit(&mut history, landed.clone());
                Ok(Navigation::Denied {
                    requested: target,
                    landed,
                    reason,
                })
            }
        }
    }

    /// Go to the sign-in route. Returns `false` without navigating when
    /// already there.
    pub async fn redirect_to_sign_in(&self) -> bool {
        let mut history = self.inner.history.lock().await;
        if self.is_on_sign_in() {
            debug!("already on sign-in, redirect skipped");
            return false;
        }

        let location = self.inner.routes.sign_in_location();
        info!(path = location.path(), "redirecting to sign-in");
        self.inner.guard.apply_title(location.route());
        self.commit(&mut history, location);
        true
    }

    fn commit(&self, history: &mut Vec<String>, location: Location) {
        history.push(location.path().to_owned());
        self.inner.current.send_replace(Some(location));
    }

    pub fn current(&self) -> Option<Location> {
        self.inner.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Location>> {
        self.inner.current.subscribe()
    }

    pub fn is_on_sign_in(&self) -> bool {
        self.inner
            .current
            .borrow()
            .as_ref()
            .is_some_and(|l| l.route().name() == self.inner.routes.sign_in().name())
    }

    pub async fn history(&self) -> Vec<String> {
        self.inner.history.lock().await.clone()
    }

    pub fn title(&self) -> String {
        self.inner.guard.title()
    }
}
