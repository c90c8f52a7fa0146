use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn cm() -> Command {
    let mut cmd = Command::cargo_bin("cm").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn builtin_json_is_canonical_and_stable() {
    let first = cm().args(["--builtin", "nl-2023", "--format", "json"]).assert().success();
    let second = cm().args(["--builtin", "nl-2023", "--format", "json"]).assert().success();
    let a = first.get_output().stdout.clone();
    let b = second.get_output().stdout.clone();
    assert_eq!(a, b);

    let doc: serde_json::Value = serde_json::from_slice(&a).unwrap();
    assert!(doc["id"].as_str().unwrap().starts_with("RES:"));
    assert_eq!(doc["label"]["value"], "governable");
    assert_eq!(doc["coalitions"]["viable"]["total"], 59);
    assert_eq!(doc["validation"]["seat_accuracy_pct"], 100.0);
}

#[test]
fn builtin_table_mentions_outcome_and_cabinet() {
    cm().args(["--builtin", "nl-2023", "--top", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tweede Kamer 2023"))
        .stdout(predicate::str::contains("Viable (5 of 59)"))
        .stdout(predicate::str::contains("coalition Schoof cabinet: viable"))
        .stdout(predicate::str::contains("Outcome: governable"));
}

#[test]
fn overrides_change_the_result() {
    let base = cm().args(["--builtin", "nl-2023", "--format", "json"]).assert().success();
    let slm = cm()
        .args(["--builtin", "nl-2023", "--format", "json", "--method", "sainte_lague"])
        .assert()
        .success();
    let base: serde_json::Value = serde_json::from_slice(&base.get_output().stdout).unwrap();
    let slm: serde_json::Value = serde_json::from_slice(&slm.get_output().stdout).unwrap();
    assert_ne!(base["id"], slm["id"]);
    assert_eq!(slm["params"]["method"], "sainte_lague");
}

#[test]
fn validate_only_succeeds_without_output() {
    cm().args(["--builtin", "nl-2023", "--validate-only"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("validate-only: inputs OK"));
}

#[test]
fn bad_override_is_a_validation_error() {
    cm().args(["--builtin", "nl-2023", "--max-size", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("max coalition size"));
}

#[test]
fn conflicting_modes_and_urls_are_rejected() {
    cm().args(["--builtin", "nl-2023", "--catalog", "c.json"]).assert().code(2);
    cm().args(["--scenario", "https://example.org/m.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scheme"));
    cm().args(["--builtin", "atlantis"]).assert().code(2);
    cm().args(["--catalog", "missing.json", "--votes", "missing.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn explicit_files_and_out_dir() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    let votes = dir.path().join("votes.json");
    fs::write(
        &catalog,
        r#"{"dimensions": ["economic"], "parties": [
            {"id": "a", "name": "Alpha", "abbreviation": "A", "ideology": {"economic": -1.0}},
            {"id": "b", "name": "Beta", "abbreviation": "B", "ideology": {"economic": 1.0}},
            {"id": "c", "name": "Gamma", "abbreviation": "C", "ideology": {"economic": 9.0}, "red_lines": ["a"]}
        ]}"#,
    )
    .unwrap();
    fs::write(&votes, r#"{"election": "Toy", "votes": {"a": 40, "b": 35, "c": 25}}"#).unwrap();
    let out = dir.path().join("out");

    cm().arg("--catalog")
        .arg(&catalog)
        .arg("--votes")
        .arg(&votes)
        .args(["--seats", "20", "--quiet"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Toy"));

    let written = fs::read(out.join("result.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&written).unwrap();
    assert_eq!(doc["election"], "Toy");
    assert_eq!(doc["apportionment"]["total_seats"], 20);
    assert_eq!(doc["params"]["total_seats"], 20);
}

#[test]
fn zero_votes_exit_with_validation_code() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    let votes = dir.path().join("votes.json");
    fs::write(
        &catalog,
        r#"{"dimensions": ["economic"], "parties": [
            {"id": "a", "name": "Alpha", "abbreviation": "A", "ideology": {"economic": 0.0}}
        ]}"#,
    )
    .unwrap();
    fs::write(&votes, r#"{"votes": {"a": 0}}"#).unwrap();
    cm().arg("--catalog").arg(&catalog).arg("--votes").arg(&votes).assert().code(2);
}
