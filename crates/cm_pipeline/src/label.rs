//! LABEL: one-word verdict on the formation landscape.
//!
//! Pure mapping from the search state; the reason string is stable text so
//! that identical inputs hash to identical results.

use cm_algo::AnalysisOutcome;
use serde::{Deserialize, Serialize};

use crate::search::SearchState;

/// Final verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Governable,
    Blocked,
    Unviable,
    TimedOut,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Governable => "governable",
            Label::Blocked => "blocked",
            Label::Unviable => "unviable",
            Label::TimedOut => "timed_out",
        }
    }
}

impl From<AnalysisOutcome> for Label {
    fn from(o: AnalysisOutcome) -> Self {
        match o {
            AnalysisOutcome::Governable => Label::Governable,
            AnalysisOutcome::Blocked => Label::Blocked,
            AnalysisOutcome::Unviable => Label::Unviable,
        }
    }
}

/// Label plus a short machine-stable reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelBlock {
    pub value: Label,
    pub reason: String,
}

pub fn label_outcome(state: &SearchState) -> LabelBlock {
    match state {
        SearchState::TimedOut { budget_ms } => LabelBlock {
            value: Label::TimedOut,
            reason: format!("search_budget_exceeded:{budget_ms}ms"),
        },
        SearchState::Completed(a) => {
            let outcome = a.outcome();
            let reason = match outcome {
                AnalysisOutcome::Governable if a.viable.is_empty() => "single_party_majority".to_string(),
                AnalysisOutcome::Governable => format!("viable_coalitions:{}", a.viable.len()),
                AnalysisOutcome::Blocked => {
                    format!("majorities_blocked_by_red_lines:{}", a.blocked.iter().filter(|c| c.viable).count())
                }
                AnalysisOutcome::Unviable => format!("no_majority_among:{}_parties", a.stats.candidates),
            };
            LabelBlock { value: outcome.into(), reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_algo::coalition::{CoalitionAnalysis, CoalitionCandidate, SearchStats};

    fn candidate(viable: bool) -> CoalitionCandidate {
        CoalitionCandidate {
            members: vec!["a".parse().unwrap(), "b".parse().unwrap()],
            total_seats: if viable { 80 } else { 60 },
            compatibility: 0.5,
            stability: 0.8,
            violations: vec![],
            viable,
        }
    }

    fn analysis() -> CoalitionAnalysis {
        CoalitionAnalysis {
            majority_threshold: 76,
            minority_floor: 60,
            viable: vec![],
            minority: vec![],
            blocked: vec![],
            single_party: vec![],
            most_compatible: None,
            most_stable: None,
            stats: SearchStats { candidates: 4, ..SearchStats::default() },
        }
    }

    #[test]
    fn timed_out_carries_budget() {
        let l = label_outcome(&SearchState::TimedOut { budget_ms: 250 });
        assert_eq!(l.value, Label::TimedOut);
        assert_eq!(l.reason, "search_budget_exceeded:250ms");
        assert_eq!(l.value.as_str(), "timed_out");
    }

    #[test]
    fn outcomes_map_to_labels() {
        let mut a = analysis();
        assert_eq!(label_outcome(&SearchState::Completed(a.clone())).value, Label::Unviable);

        a.viable.push(candidate(true));
        let l = label_outcome(&SearchState::Completed(a));
        assert_eq!(l.value, Label::Governable);
        assert_eq!(l.reason, "viable_coalitions:1");
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Label::TimedOut).unwrap(), "\"timed_out\"");
    }
}
