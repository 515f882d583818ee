// ── Session state ──
//
// Process-wide identity and authorization cache. Populated lazily by the
// navigation guard, observed through a `watch` channel, and mutated only
// by `refresh()` and `clear()` (sign-in and logout are built on those).
// A `clear()` wins over any load still in flight: loads only publish
// while the generation they started in is current.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use partnerdash_api::{PendingRequest, RequestClient};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info, warn};

use crate::config::SessionEndpoints;
use crate::error::SessionError;

const EVENT_CHANNEL_SIZE: usize = 16;

// ── Session snapshot ─────────────────────────────────────────────

/// The authenticated user, as returned by the identity endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// Immutable snapshot of the session.
///
/// An identity is present exactly when the status is `Loaded`; roles and
/// permissions are empty in every other status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    roles: BTreeSet<String>,
    permissions: BTreeSet<String>,
    status: SessionStatus,
}

impl Session {
    pub fn unloaded() -> Self {
        Self::default()
    }

    fn empty(status: SessionStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    fn loaded(identity: Identity, grants: Grants) -> Self {
        Self {
            identity: Some(identity),
            roles: grants.roles,
            permissions: grants.permissions,
            status: SessionStatus::Loaded,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_loaded(&self) -> bool {
        self.status == SessionStatus::Loaded
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

// ── Wire payloads ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct Grants {
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default)]
    permissions: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(default)]
    user: Option<Identity>,
    #[serde(flatten)]
    grants: Grants,
}

/// Grants from the last successful permissions fetch, tagged with the user
/// they belong to.
#[derive(Debug, Default)]
struct GrantCache {
    owner: Option<u64>,
    grants: Grants,
}

impl GrantCache {
    fn for_user(&self, id: u64) -> Grants {
        if self.owner == Some(id) {
            self.grants.clone()
        } else {
            Grants::default()
        }
    }
}

// ── SessionState ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
}

/// Shared handle to the session. Cheaply cloneable.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: RequestClient,
    endpoints: SessionEndpoints,
    state: watch::Sender<Session>,
    /// Held for the duration of a refresh.
    refresh: Mutex<GrantCache>,
    /// Number of refreshes that have settled.
    settled: AtomicU64,
    /// Bumped by every `clear()`.
    generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionState {
    pub fn new(client: RequestClient, endpoints: SessionEndpoints) -> Self {
        let (state, _) = watch::channel(Session::unloaded());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(SessionInner {
                client,
                endpoints,
                state,
                refresh: Mutex::new(GrantCache::default()),
                settled: AtomicU64::new(0),
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    pub fn client(&self) -> &RequestClient {
        &self.inner.client
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.state.borrow().status()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.state.borrow().is_loaded()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.inner.state.borrow().has_role(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.inner.state.borrow().has_permission(permission)
    }

    // ── Loading ──────────────────────────────────────────────────

    /// Fetch identity, roles and permissions.
    ///
    /// Callers arriving while another refresh is in flight wait for it and
    /// share its outcome instead of issuing a second request.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let seen = self.inner.settled.load(Ordering::Acquire);
        let mut cache = self.inner.refresh.lock().await;
        if self.inner.settled.load(Ordering::Acquire) != seen {
            return if self.is_loaded() {
                Ok(())
            } else {
                Err(SessionError::Unavailable)
            };
        }
        self.load(&mut cache).await
    }

    /// Refresh unless the session is already loaded.
    pub async fn ensure_loaded(&self) -> Result<(), SessionError> {
        if self.is_loaded() {
            return Ok(());
        }
        self.refresh().await
    }

    async fn reload(&self) -> Result<(), SessionError> {
        let mut cache = self.inner.refresh.lock().await;
        self.load(&mut cache).await
    }

    async fn load(&self, cache: &mut GrantCache) -> Result<(), SessionError> {
        let result = self.fetch(cache).await;
        self.inner.settled.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn fetch(&self, cache: &mut GrantCache) -> Result<(), SessionError> {
        let endpoints = &self.inner.endpoints;
        let generation = self.inner.generation.load(Ordering::Acquire);
        self.publish(generation, Session::empty(SessionStatus::Loading))?;
        debug!(endpoint = %endpoints.user, "loading session");

        let payload: UserPayload = match self.inner.client.get(&endpoints.user).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to load current user");
                self.publish(generation, Session::empty(SessionStatus::Failed))?;
                return Err(SessionError::Identity(e));
            }
        };
        let Some(identity) = payload.user else {
            warn!("identity endpoint returned no user");
            self.publish(generation, Session::empty(SessionStatus::Failed))?;
            return Err(SessionError::NoIdentity);
        };

        let grants = match endpoints.permissions {
            None => payload.grants,
            Some(ref path) => match self.inner.client.get::<Grants>(path).await {
                Ok(grants) => grants,
                Err(e) => {
                    warn!(error = %e, user = identity.id, "failed to load permissions, keeping last known");
                    let previous = cache.for_user(identity.id);
                    self.publish(generation, Session::loaded(identity, previous))?;
                    return Err(SessionError::Permissions(e));
                }
            },
        };

        let user = identity.email.clone();
        let (roles, permissions) = (grants.roles.len(), grants.permissions.len());
        let (owner, cached) = (identity.id, grants.clone());
        self.publish(generation, Session::loaded(identity, grants))?;
        cache.owner = Some(owner);
        cache.grants = cached;
        info!(user = %user, roles, permissions, "session loaded");
        Ok(())
    }

    /// Replace the session unless it was cleared since `generation`.
    fn publish(&self, generation: u64, session: Session) -> Result<(), SessionError> {
        let current = self.inner.state.send_if_modified(|state| {
            if self.inner.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            *state = session;
            true
        });
        if current {
            Ok(())
        } else {
            debug!("session cleared during load, discarding result");
            Err(SessionError::Cleared)
        }
    }

    // ── Mutation ─────────────────────────────────────────────────

    /// Forget the cached session.
    pub fn clear(&self) {
        debug!("clearing session");
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.state.send_replace(Session::unloaded());
    }

    /// Authenticate with email and password, then load the session.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), SessionError> {
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        self.inner
            .client
            .post_no_response(&self.inner.endpoints.login, &body)
            .await
            .map_err(SessionError::SignIn)?;
        info!(email, "signed in");

        self.reload().await?;
        let _ = self.inner.events.send(SessionEvent::SignedIn);
        Ok(())
    }

    /// End the server session, then clear local state and announce
    /// `SignedOut` whether or not the server call succeeded.
    pub async fn logout(&self) -> Result<(), partnerdash_api::Error> {
        let request = PendingRequest::post(self.inner.endpoints.logout.as_str());
        let result = self.inner.client.call(request).await.map(drop);
        if let Err(ref e) = result {
            warn!(error = %e, "logout request failed, clearing local session anyway");
        }

        self.clear();
        info!("signed out");
        let _ = self.inner.events.send(SessionEvent::SignedOut);
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grants(roles: &[&str], permissions: &[&str]) -> Grants {
        Grants {
            roles: roles.iter().map(|s| (*s).to_owned()).collect(),
            permissions: permissions.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn identity() -> Identity {
        Identity {
            id: 1,
            name: "Jana".into(),
            email: "jana@example.com".into(),
        }
    }

    #[test]
    fn unloaded_session_grants_nothing() {
        let session = Session::unloaded();
        assert!(!session.is_loaded());
        assert!(session.identity().is_none());
        assert!(!session.has_role("admin"));
        assert!(!session.has_permission("view shop"));
    }

    #[test]
    fn loaded_session_answers_predicates() {
        let session = Session::loaded(identity(), grants(&["partner"], &["view shop"]));
        assert_eq!(session.status(), SessionStatus::Loaded);
        assert!(session.has_role("partner"));
        assert!(!session.has_role("admin"));
        assert!(session.has_permission("view shop"));
    }

    #[test]
    fn combined_payload_decodes() {
        let payload: UserPayload = serde_json::from_value(json!({
            "user": { "id": 4, "name": "Jana", "email": "jana@example.com", "created_at": null },
            "roles": ["partner"],
            "permissions": ["view shop", "edit product"]
        }))
        .unwrap();
        assert_eq!(payload.user.unwrap().id, 4);
        assert_eq!(payload.grants, grants(&["partner"], &["edit product", "view shop"]));
    }

    #[test]
    fn payload_without_grants_decodes_empty() {
        let payload: UserPayload =
            serde_json::from_value(json!({ "user": { "id": 4 } })).unwrap();
        assert!(payload.grants.roles.is_empty());
        assert!(payload.grants.permissions.is_empty());
    }

    #[test]
    fn grant_cache_is_per_user() {
        let cache = GrantCache {
            owner: Some(1),
            grants: grants(&["admin"], &[]),
        };
        assert!(cache.for_user(1).roles.contains("admin"));
        assert!(cache.for_user(2).roles.is_empty());
    }

    #[test]
    fn status_display() {
        assert_eq!(SessionStatus::Failed.to_string(), "failed");
    }
}
