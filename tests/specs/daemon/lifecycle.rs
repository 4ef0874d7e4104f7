//! Daemon lifecycle specs

use crate::prelude::*;

#[test]
fn daemon_status_when_not_running() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn daemon_start_status_stop() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon started");
    archive
        .sm()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon already running");

    archive
        .sm()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running")
        .stdout_has(&format!("Version: {}", env!("CARGO_PKG_VERSION")))
        .stdout_has("Uptime:")
        .stdout_has("Sessions: 0");

    archive
        .sm()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon stopped");
    archive
        .sm()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn startup_error_is_surfaced() {
    let archive = Archive::empty();
    archive
        .sm()
        .env("SM_DEFAULT_ADMIN_LOGIN", "")
        .args(&["daemon", "start"])
        .fails()
        .stderr_has("No credentials in store");
}

#[test]
fn daemon_writes_its_log_in_the_state_dir() {
    let archive = Archive::empty();
    archive.sm().args(&["daemon", "start"]).passes();
    let log = std::fs::read_to_string(archive.state_dir().join("daemon.log")).unwrap();
    assert!(log.contains("--- smd: starting (pid: "), "{}", log);
}

#[test]
fn stop_ends_every_session() {
    let archive = Archive::empty();
    archive.login();
    archive.sm().args(&["daemon", "stop"]).passes();

    // The restarted daemon no longer knows the cached token
    archive
        .sm()
        .args(&["whoami"])
        .fails()
        .stderr_has("invalid session");
    archive
        .sm()
        .args(&["whoami"])
        .fails()
        .stderr_has("not logged in");
}
