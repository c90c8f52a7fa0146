//! SEARCH: coalition enumeration under a wall-clock budget.
//!
//! The search runs on a scoped worker thread. The orchestrator waits on a
//! channel for at most `search_timeout_ms`; when the budget runs out it raises
//! the cancel flag and the worker stops at its next poll. A timed-out search
//! yields no partial analysis.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use cm_algo::{ApportionmentResult, CoalitionAnalysis, CoalitionSearch, CompatibilityModel};
use cm_core::{errors::EngineError, variables::Params};
use tracing::{debug, info, warn};

use crate::PipelineError;

/// How the search stage ended.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchState {
    Completed(CoalitionAnalysis),
    TimedOut { budget_ms: u64 },
}

impl SearchState {
    pub fn analysis(&self) -> Option<&CoalitionAnalysis> {
        match self {
            SearchState::Completed(a) => Some(a),
            SearchState::TimedOut { .. } => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, SearchState::TimedOut { .. })
    }
}

pub fn run_search(
    model: CompatibilityModel<'_>,
    params: &Params,
    apportionment: &ApportionmentResult,
) -> Result<SearchState, PipelineError> {
    let search = CoalitionSearch::new(model, params).map_err(|e| PipelineError::Validate(e.to_string()))?;
    let budget_ms = params.search_timeout_ms;
    let cancel = AtomicBool::new(false);
    debug!(
        majority = search.majority_threshold(),
        floor = search.minority_floor(),
        max_size = search.max_coalition_size(),
        budget_ms,
        "starting coalition search"
    );

    let waited = thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        let (search, cancel) = (&search, &cancel);
        scope.spawn(move || {
            // The receiver may be gone after a timeout; nothing left to report then.
            let _ = tx.send(search.analyze_cancellable(apportionment, cancel));
        });
        match rx.recv_timeout(Duration::from_millis(budget_ms)) {
            Ok(r) => Waited::Finished(r),
            Err(RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::Relaxed);
                Waited::OutOfTime
            }
            Err(RecvTimeoutError::Disconnected) => Waited::Lost,
        }
    });

    match waited {
        Waited::Finished(Ok(analysis)) => {
            info!(
                outcome = %analysis.outcome(),
                viable = analysis.viable.len(),
                minority = analysis.minority.len(),
                blocked = analysis.blocked.len(),
                examined = analysis.stats.examined,
                pruned = analysis.stats.pruned,
                "coalition search complete"
            );
            Ok(SearchState::Completed(analysis))
        }
        Waited::Finished(Err(EngineError::SearchAborted { examined })) => {
            warn!(budget_ms, examined, "coalition search aborted");
            Ok(SearchState::TimedOut { budget_ms })
        }
        Waited::OutOfTime => {
            warn!(budget_ms, "coalition search exceeded its time budget");
            Ok(SearchState::TimedOut { budget_ms })
        }
        Waited::Finished(Err(e)) => Err(PipelineError::Search(e.to_string())),
        Waited::Lost => Err(PipelineError::Search("search worker exited without a result".into())),
    }
}

enum Waited {
    Finished(Result<CoalitionAnalysis, EngineError>),
    OutOfTime,
    Lost,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use cm_algo::apportion;
    use cm_core::{
        entities::{IdeologyVector, PoliticalEntity, PoliticalEntityCatalog},
        ids::{DimensionId, PartyId},
    };

    fn catalog(n: usize) -> PoliticalEntityCatalog {
        let dim: DimensionId = "economic".parse().unwrap();
        let parties = (0..n)
            .map(|i| {
                let id: PartyId = format!("p{i:02}").parse().unwrap();
                let pos = (i as f64 / n as f64) * 10.0 - 5.0;
                let ideology = [(dim.clone(), pos)].into_iter().collect::<BTreeMap<_, _>>();
                PoliticalEntity {
                    id,
                    name: format!("Party {i}"),
                    abbreviation: format!("P{i}"),
                    ideology: IdeologyVector::new(ideology).unwrap(),
                    red_lines: Default::default(),
                    family: None,
                    leader: None,
                }
            })
            .collect();
        PoliticalEntityCatalog::new(vec![dim], parties).unwrap()
    }

    #[test]
    fn small_search_completes() {
        let cat = catalog(5);
        let votes: BTreeMap<PartyId, u64> = cat.ids().map(|id| (id.clone(), 100)).collect();
        let params = Params { total_seats: 50, ..Params::default() };
        let app = apportion(&votes, &params).unwrap();
        let state = run_search(CompatibilityModel::from_params(&cat, &params), &params, &app).unwrap();
        let analysis = state.analysis().expect("completed");
        assert!(!analysis.viable.is_empty());
        assert!(!state.is_timed_out());
    }

    #[test]
    fn oversized_search_times_out() {
        // 40 equal parties, no floor, K = 10: far more subsets than 1 ms allows.
        let cat = catalog(40);
        let votes: BTreeMap<PartyId, u64> = cat.ids().map(|id| (id.clone(), 1_000)).collect();
        let params = Params {
            total_seats: 400,
            max_coalition_size: 10,
            minority_floor: Some(0),
            search_timeout_ms: 1,
            ..Params::default()
        };
        let app = apportion(&votes, &params).unwrap();
        let state = run_search(CompatibilityModel::from_params(&cat, &params), &params, &app).unwrap();
        assert_eq!(state, SearchState::TimedOut { budget_ms: 1 });
    }
}
