//! CLI error handling specs

use crate::prelude::*;

#[test]
fn unknown_command_fails() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["frobnicate"])
        .fails()
        .stderr_has("unrecognized subcommand");
}

#[test]
fn commands_need_a_login_first() {
    let archive = Archive::empty();
    for args in [
        &["whoami"][..],
        &["storage", "list"][..],
        &["movements", "list"][..],
    ] {
        archive.sm().args(args).fails().stderr_has("not logged in");
    }
}

#[test]
fn actor_cannot_be_supplied() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["movements", "record", "archive", "--actor", "Mallory"])
        .fails()
        .stderr_has("--actor");
}
