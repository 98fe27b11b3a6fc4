use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("plie")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("events"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_login_help_shows_credentials_flags() {
    cargo_bin_cmd!("plie")
        .args(["login", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--email"))
        .stdout(predicate::str::contains("--password"))
        .stdout(predicate::str::contains("PLIE_PASSWORD"))
        .stdout(predicate::str::contains("echoes"));
}

#[test]
fn test_invalid_log_level_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("plie")
        .env("PLIE_HOME", dir.path())
        .env_remove("RUST_LOG")
        .args(["--log-level", "plie=loud", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stderr(predicate::str::contains("invalid --log-level"));
}

#[test]
fn test_login_requires_email() {
    cargo_bin_cmd!("plie")
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("plie")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
