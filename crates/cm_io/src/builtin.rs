//! Scenarios compiled into the binary, usable without any input files.

use crate::loader::{load_scenario_from_strs, LoadedScenario};
use crate::{IoError, IoResult};

/// Names accepted by `load_builtin`.
pub const BUILTIN_SCENARIOS: &[&str] = &["nl-2023"];

mod nl_2023 {
    pub const CATALOG: &str = include_str!("../fixtures/nl_2023/catalog.json");
    pub const VOTES: &str = include_str!("../fixtures/nl_2023/votes.json");
    pub const PARAMS: &str = include_str!("../fixtures/nl_2023/params.json");
    pub const REFERENCE: &str = include_str!("../fixtures/nl_2023/reference.json");
}

/// Load a built-in scenario by name.
pub fn load_builtin(name: &str) -> IoResult<LoadedScenario> {
    match name {
        "nl-2023" => load_scenario_from_strs(
            nl_2023::CATALOG,
            nl_2023::VOTES,
            Some(nl_2023::PARAMS),
            Some(nl_2023::REFERENCE),
        ),
        other => Err(IoError::Manifest(format!(
            "unknown built-in scenario `{other}` (available: {})",
            BUILTIN_SCENARIOS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;
    use cm_core::ids::PartyId;
    use serde_json::json;

    #[test]
    fn nl_2023_loads() {
        let s = load_builtin("nl-2023").unwrap();
        assert_eq!(s.label, "Tweede Kamer 2023");
        assert_eq!(s.catalog.len(), 17);
        assert_eq!(s.catalog.dimensions().len(), 4);
        assert_eq!(s.votes.len(), 17);
        assert_eq!(s.params.total_seats, 150);
        assert_eq!(s.params.majority(), 76);

        let r = s.reference.as_ref().unwrap();
        assert_eq!(r.seats.values().sum::<u32>(), 150);
        assert_eq!(r.coalition.as_ref().map(|c| c.members.len()), Some(4));
    }

    #[test]
    fn nl_2023_red_lines_are_symmetric_and_spare_the_cabinet() {
        let s = load_builtin("nl-2023").unwrap();
        let pid = |x: &str| -> PartyId { x.parse().unwrap() };
        assert!(s.catalog.excludes(&pid("pvv"), &pid("gl-pvda")));
        assert!(s.catalog.excludes(&pid("gl-pvda"), &pid("pvv")));
        let cabinet = ["pvv", "vvd", "nsc", "bbb"];
        for a in cabinet {
            for b in cabinet {
                assert!(!s.catalog.excludes(&pid(a), &pid(b)), "{a} / {b}");
            }
        }
    }

    #[test]
    fn digests_are_serialized_with_stable_keys() {
        let s = load_builtin("nl-2023").unwrap();
        let v = serde_json::to_value(&s.digests).unwrap();
        assert_json_include!(actual: v, expected: json!({ "catalog_sha256": s.digests.catalog_sha256 }));
        assert!(v.get("reference_sha256").is_some());
    }

    #[test]
    fn unknown_name() {
        assert!(matches!(load_builtin("de-2021"), Err(IoError::Manifest(_))));
    }
}
