#![allow(clippy::unwrap_used)]
// Integration tests for the auth watcher wired up by `Dashboard::start`.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use partnerdash_core::{Dashboard, DashboardConfig, SIGN_IN_ROUTE, SessionStatus};

async fn setup() -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    let config = DashboardConfig::new(Url::parse(&server.uri()).unwrap());
    let dashboard = Dashboard::new(config).unwrap();
    dashboard.start().await;
    (server, dashboard)
}

async fn wait_for_sign_in(dashboard: &Dashboard) {
    let mut rx = dashboard.router().subscribe();
    tokio::time::timeout(
        Duration::from_secs(2),
        rx.wait_for(|loc| loc.as_ref().is_some_and(|l| l.route().name() == SIGN_IN_ROUTE)),
    )
    .await
    .unwrap()
    .unwrap();
}

#[tokio::test]
async fn test_unauthenticated_call_redirects_to_sign_in() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": { "id": 1 } })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/shop"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    dashboard.navigate("/products").await.unwrap();
    assert!(dashboard.session().is_loaded());

    let err = dashboard.shops().list().await.unwrap_err();
    assert!(err.is_unauthenticated());

    wait_for_sign_in(&dashboard).await;
    assert_eq!(dashboard.session().status(), SessionStatus::Unloaded);
    assert_eq!(dashboard.router().history().await, vec!["/products", "/login"]);

    dashboard.shutdown().await;
}

#[tokio::test]
async fn test_repeated_401_on_sign_in_does_not_navigate() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    dashboard.navigate("/login").await.unwrap();
    let _ = dashboard.session().refresh().await;
    let _ = dashboard.session().refresh().await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dashboard.router().history().await, vec!["/login"]);

    dashboard.shutdown().await;
}

#[tokio::test]
async fn test_logout_redirects_to_sign_in() {
    let (server, dashboard) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    dashboard.navigate("/tables").await.unwrap();
    dashboard.logout().await.unwrap();

    wait_for_sign_in(&dashboard).await;
    assert_eq!(dashboard.router().title(), "Signin | Psiehlavičky Partner");

    dashboard.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_redirects() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/shop"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    dashboard.shutdown().await;
    let _ = dashboard.shops().list().await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(dashboard.router().current().is_none());
}
