//! Storage unit and movement specs

use crate::prelude::*;

#[test]
fn register_a_cabinet_and_move_an_item_into_it() {
    let archive = Archive::empty();
    archive.login();

    archive
        .sm()
        .args(&[
            "storage", "create", "Cabinet-01", "--type", "cabinet", "--capacity", "30",
            "--section", "North wing",
        ])
        .passes()
        .stdout_has("Created CABINET Cabinet-01")
        .stdout_has("Units: 1 (FOLDER 0, ENVELOPE 0, CABINET 1, BOX 0)")
        .stdout_has("Movements today: 1")
        .stdout_has("unit registered by Ana Souza");

    archive
        .sm()
        .args(&[
            "movements", "record", "archive", "--item", "Contract 2024/17", "--to", "cabinet-01",
        ])
        .passes()
        .stdout_has("archive by Ana Souza")
        .stdout_has("Movements today: 2");

    archive
        .sm()
        .args(&["storage", "list"])
        .passes()
        .stdout_has("Cabinet-01")
        .stdout_has("North wing")
        .stdout_has("1/30");

    let run = archive
        .sm()
        .args(&["movements", "list", "--output", "json"])
        .passes();
    let movements = run.json();
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0]["action"], "archive");
    assert_eq!(movements[0]["actor"], "Ana Souza");
    assert_eq!(movements[1]["action"], "unit registered");
}

#[test]
fn movement_limit_is_honored() {
    let archive = Archive::empty();
    archive.login();
    for action in ["first", "second", "third"] {
        archive.sm().args(&["movements", "record", action]).passes();
    }

    let run = archive
        .sm()
        .args(&["movements", "list", "--limit", "2", "-o", "json"])
        .passes();
    let value = run.json();
    let actions: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["third", "second"]);
}

#[test]
fn invalid_unit_reports_every_problem() {
    let archive = Archive::empty();
    archive.login();
    archive
        .sm()
        .args(&["storage", "create", " ", "--type", "drawer"])
        .fails()
        .stderr_has("label is required")
        .stderr_has("type must be one of FOLDER, ENVELOPE, CABINET, BOX (got drawer)");
}

#[test]
fn capacity_out_of_range_is_rejected() {
    let archive = Archive::empty();
    archive.login();
    archive
        .sm()
        .args(&["storage", "create", "Box-1", "--type", "BOX", "--capacity", "4294967296"])
        .fails()
        .stderr_has("capacity must be at most 4294967295");
}

#[test]
fn metadata_is_kept_as_given() {
    let archive = Archive::empty();
    archive.login();
    let run = archive
        .sm()
        .args(&[
            "storage", "create", "Env-9", "--type", "ENVELOPE", "--metadata",
            r#"{"color":"red","tags":[1,2]}"#, "-o", "json",
        ])
        .passes();
    let value = run.json();
    assert_eq!(value["unit"]["metadata"]["color"], "red");
    assert_eq!(value["unit"]["metadata"]["tags"][1], 2);
    assert_eq!(value["unit"]["occupancy"], 0);
}

#[test]
fn blank_action_is_rejected() {
    let archive = Archive::empty();
    archive.login();
    archive
        .sm()
        .args(&["movements", "record", "  "])
        .fails()
        .stderr_has("action is required");
}
