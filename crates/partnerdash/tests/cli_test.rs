//! Integration tests for the `partnerdash` CLI binary.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the binary with env isolation.
///
/// Clears all `PARTNERDASH_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn partnerdash_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("partnerdash");
    cmd.env("HOME", "/tmp/partnerdash-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/partnerdash-cli-test-nonexistent")
        .env_remove("PARTNERDASH_ORIGIN")
        .env_remove("PARTNERDASH_EMAIL")
        .env_remove("PARTNERDASH_PASSWORD")
        .env_remove("PARTNERDASH_CONFIG")
        .env_remove("PARTNERDASH_OUTPUT")
        .env_remove("PARTNERDASH_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary against `server` on a blocking thread.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let origin = server.uri();
    let args: Vec<String> = args.iter().map(|s| (*s).to_owned()).collect();
    tokio::task::spawn_blocking(move || {
        partnerdash_cmd()
            .env("PARTNERDASH_ORIGIN", origin)
            .env("PARTNERDASH_EMAIL", "jana@example.com")
            .env("PARTNERDASH_PASSWORD", "hunter2")
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

async fn mount_sign_in(server: &MockServer, permissions: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 1, "name": "Jana", "email": "jana@example.com" },
            "roles": ["partner"],
            "permissions": permissions
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = partnerdash_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    partnerdash_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("products")
            .and(predicate::str::contains("navigate"))
            .and(predicate::str::contains("whoami")),
    );
}

#[test]
fn test_completions_bash() {
    partnerdash_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_routes_plain_lists_paths() {
    partnerdash_cmd()
        .args(["routes", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("/shops")
                .and(predicate::str::contains("/product/edit/:id"))
                .and(predicate::str::contains("/403")),
        );
}

#[test]
fn test_config_path_honors_flag() {
    partnerdash_cmd()
        .args(["config", "path", "--config", "/tmp/somewhere/pd.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/somewhere/pd.toml"));
}

#[test]
fn test_config_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "origin = \"https://partner.example.com\"\nemail = \"jana@example.com\"\npassword = \"hunter2\"\n",
    )
    .unwrap();

    partnerdash_cmd()
        .args(["config", "show", "--config"])
        .arg(&file)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://partner.example.com")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_invalid_origin_is_usage_error() {
    let output = partnerdash_cmd()
        .args(["whoami", "--origin", "not a url"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_credentials_exit_code() {
    let output = partnerdash_cmd()
        .args(["whoami", "--origin", "http://127.0.0.1:9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("No credentials"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami_prints_identity() {
    let server = MockServer::start().await;
    mount_sign_in(&server, &["view shop"]).await;

    let output = run_against(&server, &["whoami", "-o", "json"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let me: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(me["email"], "jana@example.com");
    assert_eq!(me["permissions"], json!(["view shop"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "These credentials do not match our records.",
            "errors": { "email": ["These credentials do not match our records."] }
        })))
        .mount(&server)
        .await;

    let output = run_against(&server, &["login"]).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("do not match"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_anonymous_navigation_to_shops_is_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let output = run_against(&server, &["navigate", "/shops", "--anonymous", "-o", "json"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["allowed"], false);
    assert_eq!(report["landed"], "/403");
    assert_eq!(report["title"], "Forbidden | Psiehlavičky Partner");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_products_list_plain() {
    let server = MockServer::start().await;
    mount_sign_in(&server, &[]).await;
    Mock::given(method("GET"))
        .and(path("/api/product"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "id": 3, "name": "Collar" }, { "id": 4, "name": "Leash" } ]
        })))
        .mount(&server)
        .await;

    let output = run_against(&server, &["products", "list", "-o", "plain"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "3\n4");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_product_exit_code() {
    let server = MockServer::start().await;
    mount_sign_in(&server, &[]).await;
    Mock::given(method("GET"))
        .and(path("/api/product/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let output = run_against(&server, &["products", "get", "99"]).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("product '99' not found"));
}
