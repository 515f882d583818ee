// ── Dashboard ──
//
// Composition root. Owns the loading signal, request client, session,
// guard and router, and runs the task that turns authentication loss and
// sign-out into a redirect to sign-in.

use std::sync::Arc;

use partnerdash_api::resources::{self, ProductDeliveryTime, ProductStockStatus, ProductTag, Shop};
use partnerdash_api::{
    ClientEvent, HttpTransport, LoadingSignal, Products, RequestClient, Resource, Transport,
};
use secrecy::SecretString;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::guard::NavigationGuard;
use crate::router::{Navigation, Router};
use crate::routes::RouteTable;
use crate::session::{SessionEvent, SessionState};

/// The main entry point for consumers. Cheaply cloneable.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    loading: LoadingSignal,
    client: RequestClient,
    session: SessionState,
    router: Router,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Build an HTTP-backed dashboard. Does not start background tasks;
    /// call [`start()`](Self::start).
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let transport =
            HttpTransport::new(&config.origin, &config.api_prefix, &config.transport_config())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a dashboard over an arbitrary transport.
    pub fn with_transport(config: DashboardConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_routes(config, transport, RouteTable::dashboard())
    }

    pub fn with_routes(
        config: DashboardConfig,
        transport: Arc<dyn Transport>,
        routes: RouteTable,
    ) -> Self {
        let loading = LoadingSignal::new();
        let client =
            RequestClient::with_credential_path(transport, loading.clone(), &config.credential_path);
        let session = SessionState::new(client.clone(), config.endpoints.clone());
        let guard = NavigationGuard::new(
            session.clone(),
            routes.sign_in().name(),
            config.app_name.clone(),
        );
        let router = Router::new(routes, guard);

        Self {
            inner: Arc::new(DashboardInner {
                config,
                loading,
                client,
                session,
                router,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn loading(&self) -> &LoadingSignal {
        &self.inner.loading
    }

    pub fn client(&self) -> &RequestClient {
        &self.inner.client
    }

    pub fn session(&self) -> &SessionState {
        &self.inner.session
    }

    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the auth watcher. Calling it again is a no-op.
    pub async fn start(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            return;
        }

        // Subscribe before spawning so no event sent after `start` returns is missed.
        let client_events = self.inner.client.subscribe();
        let session_events = self.inner.session.events();
        handles.push(tokio::spawn(auth_watch_task(
            self.inner.session.clone(),
            self.inner.router.clone(),
            client_events,
            session_events,
            self.inner.cancel.child_token(),
        )));
        debug!("auth watcher started");
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    // ── Operations ───────────────────────────────────────────────

    pub async fn navigate(&self, path: &str) -> Result<Navigation, CoreError> {
        Ok(self.inner.router.push(path).await?)
    }

    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), CoreError> {
        Ok(self.inner.session.sign_in(email, password).await?)
    }

    pub async fn logout(&self) -> Result<(), CoreError> {
        Ok(self.inner.session.logout().await?)
    }

    // ── Resources ────────────────────────────────────────────────

    pub fn products(&self) -> Products {
        Products::new(self.inner.client.clone())
    }

    pub fn shops(&self) -> Resource<Shop> {
        resources::shops(self.inner.client.clone())
    }

    pub fn product_tags(&self) -> Resource<ProductTag> {
        resources::product_tags(self.inner.client.clone())
    }

    pub fn delivery_times(&self) -> Resource<ProductDeliveryTime> {
        resources::delivery_times(self.inner.client.clone())
    }

    pub fn stock_statuses(&self) -> Resource<ProductStockStatus> {
        resources::stock_statuses(self.inner.client.clone())
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Redirect to sign-in when the backend rejects the session or the user
/// signs out.
async fn auth_watch_task(
    session: SessionState,
    router: Router,
    mut client_events: broadcast::Receiver<ClientEvent>,
    mut session_events: broadcast::Receiver<SessionEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = client_events.recv() => match event {
                Ok(ClientEvent::AuthenticationLost { path }) => {
                    warn!(%path, "authentication lost");
                    session.clear();
                    router.redirect_to_sign_in().await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth watcher lagged behind client events");
                }
                Err(RecvError::Closed) => break,
            },
            event = session_events.recv() => match event {
                Ok(SessionEvent::SignedOut) => {
                    router.redirect_to_sign_in().await;
                }
                Ok(SessionEvent::SignedIn) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth watcher lagged behind session events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    info!("auth watcher stopped");
}
