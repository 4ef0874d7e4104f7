//! Help and version output specs

use crate::prelude::*;

#[test]
fn version_is_printed() {
    let archive = Archive::empty();
    let run = archive.sm().args(&["--version"]).passes();
    similar_asserts::assert_eq!(run.stdout, format!("sm {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_describes_the_tool() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["--help"])
        .passes()
        .stdout_has("storage units and their movement log")
        .stdout_has("--state-dir")
        .stdout_has("--output");
}

#[test]
fn movements_record_help_lists_route_flags() {
    let archive = Archive::empty();
    archive
        .sm()
        .args(&["movements", "record", "--help"])
        .passes()
        .stdout_has("--item")
        .stdout_has("--from")
        .stdout_has("--to")
        .stdout_lacks("--actor");
}
