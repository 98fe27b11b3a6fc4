//! End-to-end login → events → logout against a mock API.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn plie(home: &Path, server: &MockServer) -> Command {
    let mut cmd = cargo_bin_cmd!("plie");
    cmd.env("PLIE_HOME", home)
        .env("PLIE_API_BASE_URL", server.uri())
        .env_remove("PLIE_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn listing() -> Value {
    json!({
        "data": [
            {
                "id": 4,
                "title": "Berlin Sensual Nights",
                "date_range": "29.02.2022 | 21:00 - 04:00",
                "location": "Berlin, Germany",
                "price_range": "€30 - €100",
                "tags": "Party, Bachata",
                "liked": 1
            }
        ]
    })
}

#[tokio::test]
async fn test_login_events_logout() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("email=ana%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"token": "abc", "usr_fname": "Ana"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events-listing"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .mount(&server)
        .await;

    plie(home.path(), &server)
        .args(["login", "--email", "ana@example.com", "--password", "secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Ana"));

    let credentials = home.path().join("credentials.json");
    let stored = fs::read_to_string(&credentials).unwrap();
    assert!(stored.contains("\"authToken\""));
    assert!(!stored.contains("secret"));

    plie(home.path(), &server)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("authenticated"));

    plie(home.path(), &server)
        .arg("events")
        .assert()
        .success()
        .stdout(predicate::str::contains("Berlin Sensual Nights"))
        .stdout(predicate::str::contains("Party, Bachata"));

    let output = plie(home.path(), &server)
        .args(["events", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["id"], "4");
    assert_eq!(parsed[0]["tags"], json!(["Party", "Bachata"]));

    // Home screen restores the session from disk.
    plie(home.path(), &server)
        .assert()
        .success()
        .stdout(predicate::str::contains("Berlin Sensual Nights"));

    plie(home.path(), &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));
    assert!(!credentials.exists());

    plie(home.path(), &server)
        .arg("events")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_debug_log_never_contains_full_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"token": "SUPERSECRETTOKEN123456"}
        })))
        .mount(&server)
        .await;

    plie(home.path(), &server)
        .args(["--log-level", "debug", "login", "--email", "a@b.com", "--password", "pw"])
        .assert()
        .success()
        .stderr(predicate::str::contains("api response"))
        .stderr(predicate::str::contains("SUPERSECRETTOKEN123456").not())
        .stderr(predicate::str::contains("password=pw").not());
}

#[tokio::test]
async fn test_rejected_login_reports_server_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    plie(home.path(), &server)
        .args(["login", "--email", "ana@example.com"])
        .env("PLIE_PASSWORD", "wrong")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));

    assert!(!home.path().join("credentials.json").exists());
}

#[tokio::test]
async fn test_expired_token_returns_to_login() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let credentials = home.path().join("credentials.json");
    fs::write(&credentials, r#"{"authToken":"expired"}"#).unwrap();

    Mock::given(method("POST"))
        .and(path("/events-listing"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    plie(home.path(), &server)
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));

    assert!(!credentials.exists());
}

#[test]
fn test_home_without_session_shows_login_hint() {
    let home = TempDir::new().unwrap();

    cargo_bin_cmd!("plie")
        .env("PLIE_HOME", home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("plie login"));
}
