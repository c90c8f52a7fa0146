//! crates/cm_pipeline/src/validate.rs
//! Structural & semantic validation of a loaded scenario before any computation.
//! Deterministic output: issues are reported in a fixed check order.

use cm_io::loader::LoadedScenario;

/// Issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

/// pass = no `Error` issue.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

fn error(code: &'static str, message: String) -> ValidationIssue {
    ValidationIssue { severity: Severity::Error, code, message }
}

fn warning(code: &'static str, message: String) -> ValidationIssue {
    ValidationIssue { severity: Severity::Warning, code, message }
}

/// Top-level entry point.
pub fn validate(scenario: &LoadedScenario) -> ValidationReport {
    let mut issues = Vec::new();

    // A) Params domains
    if let Err(e) = scenario.params.validate() {
        issues.push(error("params.domain", e.to_string()));
    }

    // B) Votes
    if scenario.votes.is_empty() {
        issues.push(error("votes.empty", "vote map is empty".into()));
    } else if scenario.votes.values().all(|&v| v == 0) {
        issues.push(error("votes.all_zero", "all vote counts are zero".into()));
    }
    let silent: Vec<&str> = scenario
        .catalog
        .ids()
        .filter(|id| !scenario.votes.contains_key(*id))
        .map(|id| id.as_str())
        .collect();
    if !silent.is_empty() {
        issues.push(warning("votes.missing_party", format!("no votes for: {}", silent.join(", "))));
    }

    // C) Catalog
    if scenario.catalog.dimensions().is_empty() {
        issues.push(warning("catalog.no_dimensions", "catalog declares no ideology dimensions".into()));
    }

    // D) Reference
    if let Some(r) = &scenario.reference {
        if r.total_seats != scenario.params.total_seats {
            issues.push(warning(
                "reference.chamber_size",
                format!("reference has {} seats, params {}", r.total_seats, scenario.params.total_seats),
            ));
        }
        let sum: u64 = r.seats.values().map(|&s| s as u64).sum();
        if sum != r.total_seats as u64 {
            issues.push(error(
                "reference.seat_sum",
                format!("reference seats sum to {sum}, expected {}", r.total_seats),
            ));
        }
    }

    let pass = !issues.iter().any(|i| i.severity == Severity::Error);
    ValidationReport { pass, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_io::loader::load_scenario_from_strs;

    const CATALOG: &str = r#"{
        "dimensions": ["economic"],
        "parties": [
            {"id": "a", "name": "Alpha", "abbreviation": "A", "ideology": {"economic": -2.0}},
            {"id": "b", "name": "Beta", "abbreviation": "B", "ideology": {"economic": 3.0}}
        ]
    }"#;

    #[test]
    fn clean_scenario_passes() {
        let s = load_scenario_from_strs(CATALOG, r#"{"votes": {"a": 10, "b": 20}}"#, None, None).unwrap();
        let r = validate(&s);
        assert!(r.pass);
        assert!(r.issues.is_empty());
    }

    #[test]
    fn degenerate_votes_and_params_fail() {
        let s = load_scenario_from_strs(CATALOG, r#"{"votes": {"a": 0, "b": 0}}"#, Some(r#"{"max_coalition_size": 1}"#), None)
            .unwrap();
        let r = validate(&s);
        assert!(!r.pass);
        let codes: Vec<&str> = r.errors().map(|i| i.code).collect();
        assert_eq!(codes, vec!["params.domain", "votes.all_zero"]);
    }

    #[test]
    fn missing_votes_are_only_a_warning() {
        let s = load_scenario_from_strs(CATALOG, r#"{"votes": {"a": 10}}"#, None, None).unwrap();
        let r = validate(&s);
        assert!(r.pass);
        assert_eq!(r.warnings().next().map(|i| i.code), Some("votes.missing_party"));
    }

    #[test]
    fn inconsistent_reference_fails() {
        let reference = r#"{"name": "r", "total_seats": 150, "seats": {"a": 100}}"#;
        let s = load_scenario_from_strs(CATALOG, r#"{"votes": {"a": 10, "b": 5}}"#, None, Some(reference)).unwrap();
        let r = validate(&s);
        assert!(!r.pass);
        assert_eq!(r.errors().next().map(|i| i.code), Some("reference.seat_sum"));
    }
}
