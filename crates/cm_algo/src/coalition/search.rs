//! Coalition search: enumerate seated-party subsets, score them, and sort
//! them into viable, minority and blocked groups.
//!
//! Pure and synchronous. Callers that need a wall-clock budget run
//! `analyze_cancellable` on a worker and raise the flag; the search polls it
//! every `CANCEL_POLL_INTERVAL` subsets and stops with `SearchAborted`.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use cm_core::{
    determinism::canonical_member_set,
    errors::{EngineError, EngineResult},
    ids::PartyId,
    variables::{Params, StabilityPolicy},
};

use super::candidate::{compare_by_compatibility, compare_by_seats, compare_by_stability, CoalitionCandidate};
use super::stability::stability_factor;
use super::subsets::SubsetGenerator;
use crate::apportionment::ApportionmentResult;
use crate::compatibility::{CompatibilityModel, RedLineViolation};

/// How often (in examined subsets) the cancel flag is read.
pub const CANCEL_POLL_INTERVAL: u64 = 256;

// ---------------- Types -------------------------------------------------------------------------

/// Overall verdict of an analysis. Not an error in any case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalysisOutcome {
    /// At least one unblocked option reaches the majority.
    Governable,
    /// Majorities exist, but every one of them crosses a red line.
    Blocked,
    /// No party set within the size bound reaches the majority.
    Unviable,
}

impl AnalysisOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisOutcome::Governable => "governable",
            AnalysisOutcome::Blocked => "blocked",
            AnalysisOutcome::Unviable => "unviable",
        }
    }
}

impl fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which list of the analysis a candidate was filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CoalitionGroup {
    Viable,
    Minority,
    Blocked,
    SingleParty,
}

impl CoalitionGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            CoalitionGroup::Viable => "viable",
            CoalitionGroup::Minority => "minority",
            CoalitionGroup::Blocked => "blocked",
            CoalitionGroup::SingleParty => "single_party",
        }
    }
}

impl fmt::Display for CoalitionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters of one search run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Parties holding at least one seat.
    pub candidates: usize,
    /// Subsets produced by the generator.
    pub examined: u64,
    /// Sibling loops cut by seat pruning.
    pub pruned: u64,
    /// Subsets filed under viable, minority or blocked.
    pub reported: u64,
}

/// Everything the search found for one apportionment.
///
/// The three coalition groups partition the reported subsets: every subset of
/// size `2..=K` with a red line is `blocked` whatever its seats; otherwise it
/// is `viable` (seats ≥ T) or `minority` (floor ≤ seats < T).
#[derive(Clone, Debug, PartialEq)]
pub struct CoalitionAnalysis {
    pub majority_threshold: u32,
    pub minority_floor: u32,
    /// Most compatible first.
    pub viable: Vec<CoalitionCandidate>,
    /// Most seats first.
    pub minority: Vec<CoalitionCandidate>,
    /// Most seats first.
    pub blocked: Vec<CoalitionCandidate>,
    /// Parties reaching the floor on their own, most seats first.
    pub single_party: Vec<CoalitionCandidate>,
    pub most_compatible: Option<CoalitionCandidate>,
    pub most_stable: Option<CoalitionCandidate>,
    pub stats: SearchStats,
}

impl CoalitionAnalysis {
    pub fn outcome(&self) -> AnalysisOutcome {
        if !self.viable.is_empty() || self.single_party.iter().any(|c| c.viable) {
            AnalysisOutcome::Governable
        } else if self.blocked.iter().any(|c| c.viable) {
            AnalysisOutcome::Blocked
        } else {
            AnalysisOutcome::Unviable
        }
    }

    /// Viable coalitions, most stable first.
    pub fn ranked_by_stability(&self) -> Vec<&CoalitionCandidate> {
        let mut out: Vec<&CoalitionCandidate> = self.viable.iter().collect();
        out.sort_by(|a, b| compare_by_stability(a, b));
        out
    }

    pub fn group(&self, group: CoalitionGroup) -> &[CoalitionCandidate] {
        match group {
            CoalitionGroup::Viable => &self.viable,
            CoalitionGroup::Minority => &self.minority,
            CoalitionGroup::Blocked => &self.blocked,
            CoalitionGroup::SingleParty => &self.single_party,
        }
    }

    /// Locate a member set (any order). Returns its group and 0-based rank there.
    pub fn find<'i, I>(&self, members: I) -> Option<(CoalitionGroup, usize, &CoalitionCandidate)>
    where
        I: IntoIterator<Item = &'i PartyId>,
    {
        let wanted = canonical_member_set(members);
        [CoalitionGroup::Viable, CoalitionGroup::Minority, CoalitionGroup::Blocked, CoalitionGroup::SingleParty]
            .into_iter()
            .find_map(|g| {
                self.group(g)
                    .iter()
                    .position(|c| c.has_members(&wanted))
                    .map(|rank| (g, rank, &self.group(g)[rank]))
            })
    }

    /// Every coalition candidate (not single parties) across the three groups.
    pub fn coalitions(&self) -> impl Iterator<Item = &CoalitionCandidate> {
        self.viable.iter().chain(self.minority.iter()).chain(self.blocked.iter())
    }
}

// ---------------- Engine ------------------------------------------------------------------------

/// Bounded coalition search over one compatibility model.
#[derive(Clone, Debug)]
pub struct CoalitionSearch<'a> {
    model: CompatibilityModel<'a>,
    max_size: usize,
    majority: u32,
    floor: u32,
    policy: StabilityPolicy,
}

impl<'a> CoalitionSearch<'a> {
    /// Fails with `InvalidInput` when `params` are out of domain.
    pub fn new(model: CompatibilityModel<'a>, params: &Params) -> EngineResult<Self> {
        params.validate()?;
        Ok(Self {
            model,
            max_size: params.max_coalition_size,
            majority: params.majority(),
            floor: params.minority_floor(),
            policy: params.stability,
        })
    }

    pub fn majority_threshold(&self) -> u32 {
        self.majority
    }

    pub fn minority_floor(&self) -> u32 {
        self.floor
    }

    pub fn max_coalition_size(&self) -> usize {
        self.max_size
    }

    pub fn model(&self) -> &CompatibilityModel<'a> {
        &self.model
    }

    /// Run to completion.
    pub fn analyze(&self, apportionment: &ApportionmentResult) -> EngineResult<CoalitionAnalysis> {
        let never = AtomicBool::new(false);
        self.analyze_cancellable(apportionment, &never)
    }

    /// Run until done or until `cancel` is observed set.
    pub fn analyze_cancellable(
        &self,
        apportionment: &ApportionmentResult,
        cancel: &AtomicBool,
    ) -> EngineResult<CoalitionAnalysis> {
        if self.majority > apportionment.total_seats {
            return Err(EngineError::InvalidInput(format!(
                "majority threshold {} exceeds the {} seats apportioned",
                self.majority, apportionment.total_seats
            )));
        }
        if cancel.load(Ordering::Relaxed) {
            return Err(EngineError::SearchAborted { examined: 0 });
        }

        // Seated parties, most seats first (ties by id).
        let mut seated: Vec<(&PartyId, u32)> = apportionment.seated().map(|p| (&p.party_id, p.seats)).collect();
        seated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let seat_map: BTreeMap<PartyId, u32> = seated.iter().map(|&(id, s)| (id.clone(), s)).collect();
        let table = self.model.pairwise_table(&seat_map)?;
        let to_table: Vec<usize> = seated
            .iter()
            .map(|&(id, _)| table.index_of(id).ok_or_else(|| EngineError::UnknownEntity(id.to_string())))
            .collect::<EngineResult<_>>()?;
        let sorted_seats: Vec<u32> = seated.iter().map(|&(_, s)| s).collect();

        let single_party: Vec<CoalitionCandidate> = seated
            .iter()
            .filter(|&&(_, s)| s >= self.floor)
            .map(|&(id, s)| self.candidate(vec![id.clone()], s, 1.0, Vec::new()))
            .collect();

        let mut viable = Vec::new();
        let mut minority = Vec::new();
        let mut blocked = Vec::new();

        let conflicts: Vec<(usize, usize)> = (0..seated.len())
            .flat_map(|p| (p + 1..seated.len()).map(move |q| (p, q)))
            .filter(|&(p, q)| {
                let (i, j) = (to_table[p].min(to_table[q]), to_table[p].max(to_table[q]));
                table.has_red_line(&[i, j])
            })
            .collect();

        let mut subsets =
            SubsetGenerator::new(&sorted_seats, self.max_size, self.floor).with_conflicts(conflicts);
        let mut members_idx: Vec<usize> = Vec::with_capacity(self.max_size);
        while let Some(positions) = subsets.next() {
            let examined = subsets.yielded();
            if examined % CANCEL_POLL_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return Err(EngineError::SearchAborted { examined });
            }

            members_idx.clear();
            members_idx.extend(positions.iter().map(|&p| to_table[p]));
            members_idx.sort_unstable();

            let seats = subsets.current_seats();
            if seats < self.floor as u64 && !table.has_red_line(&members_idx) {
                continue;
            }
            let seats = u32::try_from(seats).unwrap_or(u32::MAX);

            let report = table.report(&members_idx);
            let members = members_idx.iter().map(|&i| table.ids()[i].clone()).collect();
            let c = self.candidate(members, seats, report.score, report.violations);

            if c.is_blocked() {
                blocked.push(c);
            } else if c.viable {
                viable.push(c);
            } else {
                minority.push(c);
            }
        }

        viable.sort_by(compare_by_compatibility);
        minority.sort_by(compare_by_seats);
        blocked.sort_by(compare_by_seats);

        let most_compatible = viable.first().cloned();
        let most_stable = viable.iter().min_by(|a, b| compare_by_stability(a, b)).cloned();

        let stats = SearchStats {
            candidates: seated.len(),
            examined: subsets.yielded(),
            pruned: subsets.pruned(),
            reported: (viable.len() + minority.len() + blocked.len()) as u64,
        };

        Ok(CoalitionAnalysis {
            majority_threshold: self.majority,
            minority_floor: self.floor,
            viable,
            minority,
            blocked,
            single_party,
            most_compatible,
            most_stable,
            stats,
        })
    }

    fn candidate(
        &self,
        members: Vec<PartyId>,
        seats: u32,
        compatibility: f64,
        violations: Vec<RedLineViolation>,
    ) -> CoalitionCandidate {
        CoalitionCandidate {
            stability: stability_factor(&self.policy, members.len(), seats, self.majority),
            members,
            total_seats: seats,
            compatibility,
            violations,
            viable: seats >= self.majority,
        }
    }
}
