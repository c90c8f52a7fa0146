//! Small hand-built scenarios exercising every outcome label and the manifest entry point.

use std::fs;

use cm_algo::CompatibilityModel;
use cm_core::ids::PartyId;
use cm_io::loader::load_scenario_from_strs;
use cm_pipeline::{run_from_manifest_path, run_with_ctx, Label, PipelineCtx, PipelineError};

const TRIO_CATALOG: &str = r#"{
    "dimensions": ["economic", "social"],
    "parties": [
        {"id": "a", "name": "Alpha", "abbreviation": "A", "ideology": {"economic": -4.0, "social": 2.0}, "red_lines": ["b"]},
        {"id": "b", "name": "Beta", "abbreviation": "B", "ideology": {"economic": 5.0, "social": -1.0}},
        {"id": "c", "name": "Gamma", "abbreviation": "C", "ideology": {"economic": 0.0, "social": 0.0}, "red_lines": ["a", "b"]}
    ]
}"#;

fn five_equal_catalog() -> String {
    let parties: Vec<String> = (1..=5)
        .map(|i| {
            format!(
                r#"{{"id": "p{i}", "name": "Party {i}", "abbreviation": "P{i}", "ideology": {{"economic": {}.0}}}}"#,
                i * 2 - 6
            )
        })
        .collect();
    format!(r#"{{"dimensions": ["economic"], "parties": [{}]}}"#, parties.join(","))
}

#[test]
fn every_majority_behind_a_red_line_is_blocked() {
    let s = load_scenario_from_strs(
        TRIO_CATALOG,
        r#"{"votes": {"a": 450, "b": 450, "c": 100}}"#,
        Some(r#"{"total_seats": 100}"#),
        None,
    )
    .unwrap();
    let out = run_with_ctx(PipelineCtx::new(s)).unwrap();
    let a = out.search.analysis().unwrap();

    assert!(a.viable.is_empty());
    assert_eq!(a.blocked.iter().filter(|c| c.viable).count(), 4);
    assert_eq!(a.single_party.len(), 2);
    assert_eq!(out.result.body.label.value, Label::Blocked);
    assert_eq!(out.result.body.label.reason, "majorities_blocked_by_red_lines:4");

    let doc = serde_json::to_value(&out.result).unwrap();
    let ab = &doc["coalitions"]["blocked"]["listed"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["members"] == serde_json::json!(["a", "b"]))
        .cloned()
        .unwrap();
    assert_eq!(ab["red_lines"], serde_json::json!(["A rules out governing with B"]));
}

#[test]
fn small_red_line_pair_is_listed_as_blocked() {
    let catalog = r#"{
        "dimensions": ["economic"],
        "parties": [
            {"id": "a", "name": "Alpha", "abbreviation": "A", "ideology": {"economic": 0.0}},
            {"id": "b", "name": "Beta", "abbreviation": "B", "ideology": {"economic": 1.0}},
            {"id": "x", "name": "Xi", "abbreviation": "X", "ideology": {"economic": -9.0}, "red_lines": ["y"]},
            {"id": "y", "name": "Ypsilon", "abbreviation": "Y", "ideology": {"economic": 9.0}}
        ]
    }"#;
    let s = load_scenario_from_strs(catalog, r#"{"votes": {"a": 450, "b": 450, "x": 50, "y": 50}}"#, None, None)
        .unwrap();
    let out = run_with_ctx(PipelineCtx::new(s)).unwrap();
    let a = out.search.analysis().unwrap();
    assert_eq!(a.minority_floor, 60);

    let xy = a.blocked.iter().find(|c| c.members.len() == 2).expect("x+y reported");
    assert_eq!(xy.total_seats, 14);
    assert!(!xy.viable && !xy.violations.is_empty());
    assert_eq!(a.blocked.len(), 4);

    let doc = serde_json::to_value(&out.result).unwrap();
    assert_eq!(doc["coalitions"]["blocked"]["total"], 4);
    assert!(doc["coalitions"]["blocked"]["listed"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["members"] == serde_json::json!(["x", "y"]) && e["red_lines"] == serde_json::json!(["X rules out governing with Y"])));
    assert_eq!(out.result.body.label.value, Label::Governable);
}

#[test]
fn close_partners_score_high_and_extremes_with_a_red_line_are_blocked() {
    let catalog = r#"{
        "dimensions": ["economic", "social"],
        "parties": [
            {"id": "left", "name": "Far Left", "abbreviation": "FL", "ideology": {"economic": -10.0, "social": -10.0}, "red_lines": ["right"]},
            {"id": "mid1", "name": "Centre One", "abbreviation": "C1", "ideology": {"economic": 1.0, "social": 0.5}},
            {"id": "mid2", "name": "Centre Two", "abbreviation": "C2", "ideology": {"economic": 2.0, "social": 1.0}},
            {"id": "right", "name": "Far Right", "abbreviation": "FR", "ideology": {"economic": 10.0, "social": 10.0}}
        ]
    }"#;
    let s = load_scenario_from_strs(
        catalog,
        r#"{"votes": {"left": 300, "mid1": 200, "mid2": 200, "right": 300}}"#,
        Some(r#"{"total_seats": 100}"#),
        None,
    )
    .unwrap();

    let model = CompatibilityModel::from_params(&s.catalog, &s.params);
    let pid = |s: &str| -> PartyId { s.parse().unwrap() };
    let (mid1, mid2, left, right) = (pid("mid1"), pid("mid2"), pid("left"), pid("right"));
    assert!(model.pair_compatibility(&mid1, &mid2).unwrap() > 0.7);
    assert!(model.pair_compatibility(&left, &right).unwrap() < 1e-9);

    let out = run_with_ctx(PipelineCtx::new(s)).unwrap();
    let a = out.search.analysis().unwrap();
    let extremes = a.blocked.iter().find(|c| c.has_members(&[left.clone(), right.clone()])).unwrap();
    assert!(extremes.compatibility < 1e-9);
    assert!(extremes.viable);
    assert!(a.viable.iter().all(|c| !(c.contains(&left) && c.contains(&right))));
}

#[test]
fn no_reachable_majority_is_unviable() {
    let votes = r#"{"votes": {"p1": 200, "p2": 200, "p3": 200, "p4": 200, "p5": 200}}"#;
    let s = load_scenario_from_strs(
        &five_equal_catalog(),
        votes,
        Some(r#"{"total_seats": 100, "max_coalition_size": 2}"#),
        None,
    )
    .unwrap();
    let out = run_with_ctx(PipelineCtx::new(s)).unwrap();
    let a = out.search.analysis().unwrap();

    assert!(a.viable.is_empty() && a.blocked.is_empty() && a.single_party.is_empty());
    assert_eq!(a.minority.len(), 10);
    assert_eq!(out.result.body.label.value, Label::Unviable);
}

#[test]
fn list_limit_truncates_groups_but_not_totals() {
    let votes = r#"{"votes": {"p1": 200, "p2": 200, "p3": 200, "p4": 200, "p5": 200}}"#;
    let s = load_scenario_from_strs(&five_equal_catalog(), votes, Some(r#"{"total_seats": 100}"#), None).unwrap();
    let mut ctx = PipelineCtx::new(s);
    ctx.list_limit = 2;
    let out = run_with_ctx(ctx).unwrap();
    let c = out.result.body.coalitions.as_ref().unwrap();
    assert_eq!(c.viable.listed.len(), 2);
    assert_eq!(c.viable.total, out.search.analysis().unwrap().viable.len());
    assert!(c.viable.total > 2);
}

#[test]
fn failed_checks_surface_as_validation_errors() {
    let s = load_scenario_from_strs(TRIO_CATALOG, r#"{"votes": {"a": 0, "b": 0}}"#, None, None).unwrap();
    let err = run_with_ctx(PipelineCtx::new(s)).unwrap_err();
    assert!(matches!(err, PipelineError::Validate(ref m) if m.contains("votes.all_zero")), "{err}");
}

#[test]
fn timed_out_search_still_yields_a_result() {
    let parties: Vec<String> = (0..40)
        .map(|i| format!(r#"{{"id": "p{i:02}", "name": "P{i}", "abbreviation": "P{i}", "ideology": {{"x": {}.0}}}}"#, i % 10))
        .collect();
    let catalog = format!(r#"{{"dimensions": ["x"], "parties": [{}]}}"#, parties.join(","));
    let votes: Vec<String> = (0..40).map(|i| format!(r#""p{i:02}": 1000"#)).collect();
    let votes = format!(r#"{{"votes": {{{}}}}}"#, votes.join(","));
    let params = r#"{"total_seats": 400, "max_coalition_size": 10, "minority_floor": 0, "search_timeout_ms": 1}"#;

    let s = load_scenario_from_strs(&catalog, &votes, Some(params), None).unwrap();
    let out = run_with_ctx(PipelineCtx::new(s)).unwrap();
    assert_eq!(out.result.body.label.value, Label::TimedOut);
    assert!(out.result.body.coalitions.is_none());
    assert_eq!(out.result.body.apportionment.total_seats, 400);
}

#[test]
fn manifest_run_matches_in_memory_run() {
    let dir = tempfile::tempdir().unwrap();
    let votes = r#"{"election": "Trio", "votes": {"a": 450, "b": 450, "c": 100}}"#;
    let params = r#"{"total_seats": 100}"#;
    fs::write(dir.path().join("catalog.json"), TRIO_CATALOG).unwrap();
    fs::write(dir.path().join("votes.json"), votes).unwrap();
    fs::write(dir.path().join("params.json"), params).unwrap();
    let manifest = dir.path().join("manifest.json");
    fs::write(
        &manifest,
        r#"{"catalog_path": "catalog.json", "votes_path": "votes.json", "params_path": "params.json"}"#,
    )
    .unwrap();

    let from_disk = run_from_manifest_path(&manifest).unwrap();
    let in_memory = run_with_ctx(PipelineCtx::new(
        load_scenario_from_strs(TRIO_CATALOG, votes, Some(params), None).unwrap(),
    ))
    .unwrap();
    assert_eq!(from_disk.result.body.election, "Trio");
    assert_eq!(from_disk.result.id, in_memory.result.id);
}

#[test]
fn missing_manifest_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("manifest.json");
    fs::write(&manifest, r#"{"catalog_path": "nope.json", "votes_path": "votes.json"}"#).unwrap();
    let err = run_from_manifest_path(&manifest).unwrap_err();
    assert!(matches!(err, PipelineError::Validate(_) | PipelineError::Io(_)), "{err}");
}
