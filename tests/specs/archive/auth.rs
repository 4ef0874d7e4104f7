//! Login, session and logout specs

use crate::prelude::*;

#[test]
fn login_shows_profile_and_snapshot() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["login", ADMIN_LOGIN, "--password", ADMIN_PASSWORD])
        .passes()
        .stdout_has("Name: Ana Souza")
        .stdout_has("Role: admin")
        .stdout_has("Units: 0 (FOLDER 0, ENVELOPE 0, CABINET 0, BOX 0)")
        .stdout_has("Last movement: none");
}

#[test]
fn login_is_case_insensitive_and_reads_password_from_stdin() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["login", "  ADMIN@Archive.Local "])
        .stdin(&format!("{}\n", ADMIN_PASSWORD))
        .passes()
        .stdout_has(&format!("Login: {}", ADMIN_LOGIN));
}

#[test]
fn login_prefix_matches_a_legacy_identifier() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["login", "admin", "--password", ADMIN_PASSWORD])
        .passes()
        .stdout_has(&format!("Login: {}", ADMIN_LOGIN));
}

#[test]
fn wrong_password_and_unknown_login_look_the_same() {
    let archive = Archive::empty();
    let wrong = archive
        .sm()
        .args(&["login", ADMIN_LOGIN, "--password", "nope"])
        .fails();
    let unknown = archive
        .sm()
        .args(&["login", "ghost", "--password", ADMIN_PASSWORD])
        .fails();
    assert!(wrong.stderr.contains("invalid credentials"), "{}", wrong.stderr);
    similar_asserts::assert_eq!(wrong.stderr, unknown.stderr);
}

#[test]
fn blank_password_is_a_validation_error() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["login", ADMIN_LOGIN, "--password", ""])
        .fails()
        .stderr_has("password is required");
}

#[test]
fn whoami_then_logout() {
    let archive = Archive::empty();
    archive.login();
    archive
        .sm()
        .args(&["whoami"])
        .passes()
        .stdout_has("Name: Ana Souza");

    archive
        .sm()
        .args(&["logout"])
        .passes()
        .stdout_has("Logged out");
    archive
        .sm()
        .args(&["whoami"])
        .fails()
        .stderr_has("not logged in");
}

#[test]
fn whoami_json_never_contains_the_token() {
    let archive = Archive::empty();
    archive.login();
    let token = std::fs::read_to_string(archive.state_dir().join("cli.token")).unwrap();

    let run = archive.sm().args(&["whoami", "--output", "json"]).passes();
    let value = run.json();
    assert_eq!(value["profile"]["name"], "Ana Souza");
    assert_eq!(value["snapshot"]["totalUnits"], 0);
    assert!(!run.stdout.contains(token.trim()));
}

#[test]
fn forged_token_is_rejected_and_forgotten() {
    let archive = Archive::empty();
    archive.login();
    std::fs::write(archive.state_dir().join("cli.token"), "forged\n").unwrap();

    archive
        .sm()
        .args(&["storage", "list"])
        .fails()
        .stderr_has("invalid session");
    assert!(!archive.state_dir().join("cli.token").exists());
}
