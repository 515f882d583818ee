// ── Response policies ──
//
// Every call runs the same ordered pipeline around the transport:
//
//   dispatch ─▶ classify ─▶ CredentialRecovery ─▶ AuthenticationRedirect
//
// `classify` turns non-success statuses into typed errors. Each policy
// takes the outcome of the previous stage and returns a new one, so they
// can be tested in isolation against a scripted transport.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::Error;
use crate::request::{ApiResponse, PendingRequest};
use crate::transport::Transport;

/// Result of one pipeline stage.
pub type Outcome = Result<ApiResponse, Error>;

/// Laravel's "page expired" status, used for a stale anti-forgery token.
pub const CREDENTIAL_EXPIRED: u16 = 419;

/// Notifications the client publishes for the composition root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A call came back 401. `path` is the request path that failed.
    AuthenticationLost { path: String },
}

/// Per-call state carried through the pipeline.
#[derive(Debug)]
pub struct CallContext {
    request: PendingRequest,
    replayed: bool,
}

impl CallContext {
    pub fn new(request: PendingRequest) -> Self {
        Self {
            request,
            replayed: false,
        }
    }

    pub fn request(&self) -> &PendingRequest {
        &self.request
    }

    /// Whether the one permitted replay has already been spent.
    pub fn replayed(&self) -> bool {
        self.replayed
    }
}

/// Error body shape shared by 422 and most other failures.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Send through the transport and classify the response.
pub async fn dispatch(transport: &dyn Transport, request: &PendingRequest) -> Outcome {
    transport.send(request).await.and_then(classify)
}

/// Map a raw response onto the error taxonomy. 2xx passes through untouched.
pub fn classify(response: ApiResponse) -> Outcome {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 => Err(Error::Unauthenticated),
        CREDENTIAL_EXPIRED => Err(Error::ExpiredCredential),
        422 => {
            let parsed: Option<ErrorBody> = serde_json::from_slice(response.body()).ok();
            let (message, fields) = parsed.map_or_else(
                || (response.text(), BTreeMap::new()),
                |b| (b.message.unwrap_or_default(), b.errors),
            );
            Err(Error::Validation { message, fields })
        }
        code => Err(Error::Api {
            status: code,
            message: failure_message(status, &response),
        }),
    }
}

fn failure_message(status: StatusCode, response: &ApiResponse) -> String {
    let parsed: Option<ErrorBody> = serde_json::from_slice(response.body()).ok();
    match parsed.and_then(|b| b.message).filter(|m| !m.is_empty()) {
        Some(message) => message,
        None => {
            let body = response.text();
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            } else {
                body.chars().take(200).collect()
            }
        }
    }
}

/// One-shot recovery for an expired anti-forgery credential.
///
/// On 419: renew the credential, then replay the original request once.
/// A failed renewal is returned as-is and the replay is skipped. Whatever
/// the replay produces is final.
#[derive(Debug, Clone)]
pub struct CredentialRecovery {
    refresh: PendingRequest,
}

impl CredentialRecovery {
    /// `path` is resolved against the origin, not the API prefix.
    pub fn new(path: &str) -> Self {
        Self {
            refresh: PendingRequest::get(path).at_origin(),
        }
    }

    pub fn refresh_request(&self) -> &PendingRequest {
        &self.refresh
    }

    pub async fn apply(
        &self,
        transport: &dyn Transport,
        ctx: &mut CallContext,
        outcome: Outcome,
    ) -> Outcome {
        match outcome {
            Err(Error::ExpiredCredential) if !ctx.replayed => {
                debug!(path = ctx.request.path(), "credential expired; renewing");
                dispatch(transport, &self.refresh).await.map_err(|e| {
                    warn!(error = %e, "credential renewal failed");
                    e
                })?;

                ctx.replayed = true;
                debug!(path = ctx.request.path(), "replaying request");
                dispatch(transport, &ctx.request).await
            }
            other => other,
        }
    }
}

/// Publishes `ClientEvent::AuthenticationLost` on 401 and passes the error on.
#[derive(Debug, Clone)]
pub struct AuthenticationRedirect {
    events: broadcast::Sender<ClientEvent>,
}

impl AuthenticationRedirect {
    pub fn new(events: broadcast::Sender<ClientEvent>) -> Self {
        Self { events }
    }

    pub fn apply(&self, ctx: &CallContext, outcome: Outcome) -> Outcome {
        if let Err(Error::Unauthenticated) = outcome {
            debug!(path = ctx.request.path(), "authentication lost");
            // No subscribers is fine: nobody is routing (e.g. one-shot CLI).
            let _ = self.events.send(ClientEvent::AuthenticationLost {
                path: ctx.request.path().to_owned(),
            });
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use bytes::Bytes;
    use futures_util::future::BoxFuture;
    use reqwest::header::HeaderMap;
    use serde_json::json;

    use super::*;

    /// Replays canned statuses in order and records every path it was asked for.
    struct ScriptedTransport {
        script: Mutex<VecDeque<(u16, serde_json::Value)>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(script: &[(u16, serde_json::Value)]) -> Self {
            Self {
                script: Mutex::new(script.iter().cloned().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send<'a>(
            &'a self,
            request: &'a PendingRequest,
        ) -> BoxFuture<'a, Result<ApiResponse, Error>> {
            self.seen.lock().unwrap().push(request.path().to_owned());
            let (status, body) = self.script.lock().unwrap().pop_front().unwrap();
            Box::pin(async move {
                Ok(ApiResponse::new(
                    StatusCode::from_u16(status).unwrap(),
                    HeaderMap::new(),
                    Bytes::from(body.to_string()),
                ))
            })
        }
    }

    async fn run(script: &[(u16, serde_json::Value)]) -> (Outcome, Vec<String>) {
        let transport = ScriptedTransport::new(script);
        let recovery = CredentialRecovery::new("/sanctum/csrf-cookie");
        let mut ctx = CallContext::new(PendingRequest::get("/product/42"));
        let first = dispatch(&transport, ctx.request()).await;
        let outcome = recovery.apply(&transport, &mut ctx, first).await;
        (outcome, transport.seen())
    }

    #[test]
    fn classify_maps_validation_fields() {
        let resp = ApiResponse::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            HeaderMap::new(),
            Bytes::from(
                json!({ "message": "The name field is required.", "errors": { "name": ["required"] } })
                    .to_string(),
            ),
        );
        match classify(resp) {
            Err(Error::Validation { message, fields }) => {
                assert_eq!(message, "The name field is required.");
                assert_eq!(fields["name"], vec!["required".to_owned()]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn classify_uses_reason_for_empty_body() {
        let resp = ApiResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), Bytes::new());
        match classify(resp) {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn expired_credential_refreshes_then_replays_once() {
        let (outcome, seen) = run(&[
            (419, json!({})),
            (204, json!(null)),
            (200, json!({ "id": 42 })),
        ])
        .await;

        assert_eq!(outcome.unwrap().json::<serde_json::Value>().unwrap()["id"], 42);
        assert_eq!(seen, ["/product/42", "/sanctum/csrf-cookie", "/product/42"]);
    }

    #[tokio::test]
    async fn failed_refresh_skips_replay() {
        let (outcome, seen) = run(&[(419, json!({})), (500, json!({ "message": "down" }))]).await;

        assert!(matches!(outcome, Err(Error::Api { status: 500, .. })));
        assert_eq!(seen, ["/product/42", "/sanctum/csrf-cookie"]);
    }

    #[tokio::test]
    async fn replay_failure_is_final() {
        let (outcome, seen) = run(&[(419, json!({})), (204, json!(null)), (419, json!({}))]).await;

        assert!(matches!(outcome, Err(Error::ExpiredCredential)));
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn other_failures_pass_through() {
        let (outcome, seen) = run(&[(500, json!({ "message": "boom" }))]).await;

        assert!(matches!(outcome, Err(Error::Api { status: 500, ref message }) if message == "boom"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn unauthenticated_emits_event_and_propagates() {
        let (tx, mut rx) = broadcast::channel(4);
        let redirect = AuthenticationRedirect::new(tx);
        let ctx = CallContext::new(PendingRequest::get("shop"));

        let outcome = redirect.apply(&ctx, Err(Error::Unauthenticated));

        assert!(matches!(outcome, Err(Error::Unauthenticated)));
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientEvent::AuthenticationLost {
                path: "shop".into()
            }
        );
    }

    #[test]
    fn other_outcomes_emit_nothing() {
        let (tx, mut rx) = broadcast::channel(4);
        let redirect = AuthenticationRedirect::new(tx);
        let ctx = CallContext::new(PendingRequest::get("shop"));

        let _ = redirect.apply(&ctx, Err(Error::ExpiredCredential));
        assert!(rx.try_recv().is_err());
    }
}
