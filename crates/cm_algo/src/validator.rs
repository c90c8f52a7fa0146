//! crates/cm_algo/src/validator.rs
//! Historical validation: compare computed seats and coalitions with a known
//! real outcome. Read-only with respect to the search; nothing here feeds back.

use std::collections::BTreeSet;

use cm_core::{
    determinism::canonical_member_set,
    entities::{HistoricalCoalition, ReferenceElection},
    ids::PartyId,
};

use crate::apportionment::ApportionmentResult;
use crate::coalition::{CoalitionAnalysis, CoalitionGroup};

// ---------------- Seats -------------------------------------------------------------------------

/// Expected vs computed seats of one party.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatComparison {
    pub party_id: PartyId,
    pub expected: u32,
    pub actual: u32,
}

impl SeatComparison {
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.expected == self.actual
    }

    #[inline]
    pub fn abs_error(&self) -> u32 {
        self.expected.abs_diff(self.actual)
    }
}

/// Seat-level agreement with a reference election.
#[derive(Clone, Debug, PartialEq)]
pub struct SeatAccuracy {
    /// Union of parties seated in either, canonical order.
    pub lines: Vec<SeatComparison>,
    pub exact_matches: usize,
    /// `100 · exact / lines` (100 when both sides are empty).
    pub accuracy_pct: f64,
    pub total_abs_error: u64,
    /// Reference and computation use the same chamber size.
    pub chamber_matches: bool,
}

impl SeatAccuracy {
    pub fn is_exact(&self) -> bool {
        self.chamber_matches && self.exact_matches == self.lines.len()
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &SeatComparison> {
        self.lines.iter().filter(|l| !l.is_exact())
    }
}

pub fn compare_seats(apportionment: &ApportionmentResult, reference: &ReferenceElection) -> SeatAccuracy {
    let mut ids: BTreeSet<&PartyId> = apportionment.seated().map(|p| &p.party_id).collect();
    ids.extend(reference.seats.iter().filter(|&(_, &s)| s > 0).map(|(id, _)| id));

    let lines: Vec<SeatComparison> = ids
        .into_iter()
        .map(|id| SeatComparison {
            party_id: id.clone(),
            expected: reference.seats.get(id).copied().unwrap_or(0),
            actual: apportionment.seats_of(id),
        })
        .collect();

    let exact_matches = lines.iter().filter(|l| l.is_exact()).count();
    let accuracy_pct = if lines.is_empty() { 100.0 } else { 100.0 * exact_matches as f64 / lines.len() as f64 };
    let total_abs_error = lines.iter().map(|l| l.abs_error() as u64).sum();

    SeatAccuracy {
        lines,
        exact_matches,
        accuracy_pct,
        total_abs_error,
        chamber_matches: apportionment.total_seats == reference.total_seats,
    }
}

// ---------------- Coalition ---------------------------------------------------------------------

/// How the coalition that actually governed shows up in the analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct CoalitionMatch {
    pub name: String,
    pub members: Vec<PartyId>,
    /// Group the exact member set was filed under, if examined at all.
    pub group: Option<CoalitionGroup>,
    pub total_seats: Option<u32>,
    /// 1-based rank among viable coalitions by compatibility.
    pub compatibility_rank: Option<usize>,
    /// 1-based rank among viable coalitions by stability.
    pub stability_rank: Option<usize>,
    /// Best Jaccard overlap with any viable coalition, `[0, 1]`.
    pub best_overlap: f64,
    pub best_overlap_members: Vec<PartyId>,
    /// 100 on an exact viable match, otherwise `100 · best_overlap`.
    pub accuracy_pct: f64,
}

pub fn match_coalition(analysis: &CoalitionAnalysis, coalition: &HistoricalCoalition) -> CoalitionMatch {
    let members = canonical_member_set(&coalition.members);
    let found = analysis.find(&members);

    let compatibility_rank = analysis.viable.iter().position(|c| c.has_members(&members)).map(|r| r + 1);
    let stability_rank = analysis
        .ranked_by_stability()
        .iter()
        .position(|c| c.has_members(&members))
        .map(|r| r + 1);

    let wanted: BTreeSet<&PartyId> = members.iter().collect();
    let mut best_overlap = 0.0;
    let mut best_overlap_members = Vec::new();
    for c in &analysis.viable {
        let have: BTreeSet<&PartyId> = c.members.iter().collect();
        let union = wanted.union(&have).count();
        if union == 0 {
            continue;
        }
        let j = wanted.intersection(&have).count() as f64 / union as f64;
        // viable is compatibility-ordered; keep the first best
        if j > best_overlap {
            best_overlap = j;
            best_overlap_members = c.members.clone();
        }
    }

    let accuracy_pct = if compatibility_rank.is_some() { 100.0 } else { 100.0 * best_overlap };

    CoalitionMatch {
        name: coalition.name.clone(),
        group: found.map(|(g, _, _)| g),
        total_seats: found.map(|(_, _, c)| c.total_seats),
        members,
        compatibility_rank,
        stability_rank,
        best_overlap,
        best_overlap_members,
        accuracy_pct,
    }
}

// ---------------- Report ------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationReport {
    pub reference: String,
    pub seats: SeatAccuracy,
    /// Absent when the reference names no coalition or no analysis ran.
    pub coalition: Option<CoalitionMatch>,
    /// Mean of the accuracy percentages present.
    pub overall_accuracy_pct: f64,
}

/// Compare an apportionment (and, when available, its coalition analysis)
/// with a reference election.
pub fn validate(
    apportionment: &ApportionmentResult,
    analysis: Option<&CoalitionAnalysis>,
    reference: &ReferenceElection,
) -> ValidationReport {
    let seats = compare_seats(apportionment, reference);
    let coalition = match (analysis, &reference.coalition) {
        (Some(a), Some(c)) => Some(match_coalition(a, c)),
        _ => None,
    };
    let overall_accuracy_pct = match &coalition {
        Some(c) => (seats.accuracy_pct + c.accuracy_pct) / 2.0,
        None => seats.accuracy_pct,
    };
    ValidationReport { reference: reference.name.clone(), seats, coalition, overall_accuracy_pct }
}
