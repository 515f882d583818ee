#![allow(clippy::unwrap_used)]
// Integration tests for the guard and router, driven through `Dashboard`.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use partnerdash_core::{
    Dashboard, DashboardConfig, DenyReason, Navigation, NavigationError, CoreError,
    FORBIDDEN_ROUTE,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    let config = DashboardConfig::new(Url::parse(&server.uri()).unwrap());
    let dashboard = Dashboard::new(config).unwrap();
    (server, dashboard)
}

async fn mount_user(server: &MockServer, permissions: &[&str], expected: u64) {
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 1, "name": "Jana", "email": "jana@example.com" },
            "roles": ["partner"],
            "permissions": permissions
        })))
        .expect(expected)
        .mount(server)
        .await;
}

// ── Guarded routes ──────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_refresh_lands_on_forbidden() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let navigation = dashboard.navigate("/shops").await.unwrap();

    match navigation {
        Navigation::Denied {
            ref requested,
            ref landed,
            ref reason,
        } => {
            assert_eq!(requested.path(), "/shops");
            assert_eq!(landed.path(), "/403");
            assert_eq!(reason, &DenyReason::MissingPermission("view shop".into()));
        }
        Navigation::Allowed(_) => panic!("expected denial, got: {navigation:?}"),
    }
    let router = dashboard.router();
    assert_eq!(router.current().unwrap().route().name(), FORBIDDEN_ROUTE);
    assert_eq!(router.title(), "Forbidden | Psiehlavičky Partner");
    assert_eq!(dashboard.loading().count(), 0);
}

#[tokio::test]
async fn test_missing_permission_is_denied() {
    let (server, dashboard) = setup().await;
    mount_user(&server, &[], 1).await;

    let navigation = dashboard.navigate("/shops").await.unwrap();

    assert_eq!(navigation.location().path(), "/403");
}

#[tokio::test]
async fn test_granted_permission_is_allowed_and_titled() {
    let (server, dashboard) = setup().await;
    mount_user(&server, &["view shop"], 1).await;

    let navigation = dashboard.navigate("/shops").await.unwrap();

    assert!(matches!(navigation, Navigation::Allowed(_)));
    assert_eq!(dashboard.router().title(), "Moje e-shopy | Psiehlavičky Partner");
}

#[tokio::test]
async fn test_session_loaded_once_across_navigations() {
    let (server, dashboard) = setup().await;
    mount_user(&server, &["view shop"], 1).await;

    dashboard.navigate("/").await.unwrap();
    dashboard.navigate("/products").await.unwrap();
    dashboard.navigate("/product/edit/12").await.unwrap();

    let current = dashboard.router().current().unwrap();
    assert_eq!(current.param("id"), Some("12"));
    assert_eq!(
        dashboard.router().history().await,
        vec!["/", "/products", "/product/edit/12"]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_sign_in_route_skips_session_load() {
    let (server, dashboard) = setup().await;
    mount_user(&server, &[], 0).await;

    let navigation = dashboard.navigate("/login").await.unwrap();

    assert!(matches!(navigation, Navigation::Allowed(_)));
    assert_eq!(dashboard.router().title(), "Signin | Psiehlavičky Partner");
    server.verify().await;
}

#[tokio::test]
async fn test_concurrent_navigations_load_session_once() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": { "id": 1 }, "permissions": ["view shop"] }))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (a, b) = tokio::join!(dashboard.navigate("/shops"), dashboard.navigate("/tables"));

    assert!(matches!(a.unwrap(), Navigation::Allowed(_)));
    assert!(matches!(b.unwrap(), Navigation::Allowed(_)));
    assert_eq!(dashboard.router().history().await.len(), 2);
    server.verify().await;
}

#[tokio::test]
async fn test_unknown_path_is_rejected_without_navigation() {
    let (_server, dashboard) = setup().await;

    let err = dashboard.navigate("/nope").await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Navigation(NavigationError::NotFound { .. })
    ));
    assert!(dashboard.router().current().is_none());
}
