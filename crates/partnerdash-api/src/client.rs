// Request client
//
// Single choke point for every outbound call. Holds one unit of the
// `LoadingSignal` for the whole call (recovery branch included), runs the
// response pipeline, and decodes payloads for the typed verb helpers.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use url::Url;

use crate::error::Error;
use crate::loading::LoadingSignal;
use crate::pipeline::{self, AuthenticationRedirect, CallContext, ClientEvent, CredentialRecovery};
use crate::request::{ApiResponse, PendingRequest};
use crate::transport::{HttpTransport, Transport, TransportConfig};

/// Well-known endpoint that re-issues the `XSRF-TOKEN` cookie.
pub const DEFAULT_CREDENTIAL_PATH: &str = "/sanctum/csrf-cookie";

/// Default prefix all resource paths live under.
pub const DEFAULT_API_PREFIX: &str = "api/";

const EVENT_CHANNEL_SIZE: usize = 16;

/// Async client for the dashboard API.
///
/// Cheaply cloneable; clones share the transport, loading signal and
/// event channel.
#[derive(Clone)]
pub struct RequestClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    loading: LoadingSignal,
    events: broadcast::Sender<ClientEvent>,
    recovery: CredentialRecovery,
    redirect: AuthenticationRedirect,
}

impl RequestClient {
    /// Wrap an existing transport.
    pub fn new(transport: Arc<dyn Transport>, loading: LoadingSignal) -> Self {
        Self::with_credential_path(transport, loading, DEFAULT_CREDENTIAL_PATH)
    }

    /// Wrap an existing transport, renewing credentials at `credential_path`.
    pub fn with_credential_path(
        transport: Arc<dyn Transport>,
        loading: LoadingSignal,
        credential_path: &str,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(ClientInner {
                transport,
                loading,
                redirect: AuthenticationRedirect::new(events.clone()),
                events,
                recovery: CredentialRecovery::new(credential_path),
            }),
        }
    }

    /// Build an HTTP-backed client for `origin` with the default prefix and
    /// credential endpoint.
    pub fn for_origin(
        origin: &Url,
        loading: LoadingSignal,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let transport = HttpTransport::new(origin, DEFAULT_API_PREFIX, config)?;
        Ok(Self::new(Arc::new(transport), loading))
    }

    pub fn loading(&self) -> &LoadingSignal {
        &self.inner.loading
    }

    /// Subscribe to `ClientEvent`s (authentication loss).
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    // ── Pipeline ─────────────────────────────────────────────────────

    /// Execute one call through the full pipeline.
    ///
    /// The loading counter is incremented before the transport is touched
    /// and decremented exactly once when this future completes or is dropped.
    /// The inner renewal and replay calls don't touch it.
    pub async fn call(&self, request: PendingRequest) -> Result<ApiResponse, Error> {
        let _loading = self.inner.loading.begin();
        let transport = self.inner.transport.as_ref();

        let mut ctx = CallContext::new(request);
        let outcome = pipeline::dispatch(transport, ctx.request()).await;
        let outcome = self.inner.recovery.apply(transport, &mut ctx, outcome).await;
        self.inner.redirect.apply(&ctx, outcome)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.call(PendingRequest::get(path)).await?.json()
    }

    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let request = params
            .iter()
            .fold(PendingRequest::get(path), |req, (k, v)| {
                req.with_query(*k, v.clone())
            });
        self.call(request).await?.json()
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let request = PendingRequest::post(path).with_json(body)?;
        self.call(request).await?.json()
    }

    pub async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let request = PendingRequest::post(path).with_json(body)?;
        self.call(request).await.map(drop)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let request = PendingRequest::put(path).with_json(body)?;
        self.call(request).await?.json()
    }

    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        self.call(PendingRequest::delete(path)).await.map(drop)
    }
}
