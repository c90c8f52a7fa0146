//! BUILD_RESULT: compose the Result artifact from prior pipeline stages.
//!
//! Deterministic assembly: every list is emitted in a fixed order and every
//! float is rounded to `ENGINE_PRECISION` before it reaches JSON. The `id`
//! is `RES:` + SHA-256 of the canonical bytes of the id-less body.

use cm_algo::{
    coalition::{CoalitionAnalysis, CoalitionCandidate, CoalitionGroup, SearchStats},
    validator::{CoalitionMatch, ValidationReport},
    ApportionmentResult,
};
use cm_core::{
    entities::PoliticalEntityCatalog,
    ids::{PartyId, ResultId},
    variables::{ApportionmentMethod, Params},
};
use cm_io::{hasher, loader::ScenarioDigests};
use serde::Serialize;

use crate::label::LabelBlock;
use crate::search::SearchState;
use crate::{EngineMeta, PipelineError};

/// Decimal places kept for shares, scores and accuracies.
const ENGINE_PRECISION: f64 = 1e6;

#[inline]
fn round6(x: f64) -> f64 {
    (x * ENGINE_PRECISION).round() / ENGINE_PRECISION
}

// ---------- Wire types ----------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDoc {
    pub id: ResultId,
    #[serde(flatten)]
    pub body: ResultBody,
}

/// Everything that is hashed into the result id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBody {
    pub engine: EngineMeta,
    pub election: String,
    pub params: Params,
    pub apportionment: ApportionmentBlock,
    /// Absent when the search ran out of time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coalitions: Option<CoalitionsBlock>,
    pub label: LabelBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationBlock>,
    pub inputs: ScenarioDigests,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApportionmentBlock {
    pub method: ApportionmentMethod,
    pub total_seats: u32,
    pub total_votes: u64,
    /// Seats desc, then votes desc, then id.
    pub parties: Vec<PartyLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyLine {
    pub id: PartyId,
    pub name: String,
    pub abbreviation: String,
    pub votes: u64,
    pub seats: u32,
    pub vote_share_pct: f64,
    pub seat_share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoalitionsBlock {
    pub majority_threshold: u32,
    pub minority_floor: u32,
    pub max_coalition_size: usize,
    pub viable: GroupBlock,
    pub minority: GroupBlock,
    pub blocked: GroupBlock,
    pub single_party: GroupBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_compatible: Option<CoalitionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_stable: Option<CoalitionEntry>,
    pub stats: StatsBlock,
}

/// One coalition group: its full size and the leading `listed` entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBlock {
    pub total: usize,
    pub listed: Vec<CoalitionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoalitionEntry {
    pub members: Vec<PartyId>,
    /// Abbreviations, same order as `members`.
    pub names: Vec<String>,
    pub seats: u32,
    pub compatibility: f64,
    pub stability: f64,
    pub viable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub red_lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsBlock {
    pub candidates: usize,
    pub examined: u64,
    pub pruned: u64,
    pub reported: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationBlock {
    pub reference: String,
    pub seat_accuracy_pct: f64,
    pub exact_matches: usize,
    pub compared: usize,
    pub total_abs_error: u64,
    pub chamber_matches: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<SeatMismatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coalition: Option<CoalitionMatchBlock>,
    pub overall_accuracy_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatMismatch {
    pub party: PartyId,
    pub expected: u32,
    pub actual: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoalitionMatchBlock {
    pub name: String,
    pub members: Vec<PartyId>,
    /// Group the historical coalition landed in; absent when it was never enumerated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability_rank: Option<usize>,
    pub best_overlap: f64,
    pub best_overlap_members: Vec<PartyId>,
    pub accuracy_pct: f64,
}

// ---------- Inputs ----------

/// Borrowed outputs of the earlier stages.
pub struct BuildInputs<'a> {
    pub engine: &'a EngineMeta,
    pub election: &'a str,
    pub params: &'a Params,
    pub catalog: &'a PoliticalEntityCatalog,
    pub apportionment: &'a ApportionmentResult,
    pub search: &'a SearchState,
    pub label: &'a LabelBlock,
    pub validation: Option<&'a ValidationReport>,
    pub digests: &'a ScenarioDigests,
    /// Entries listed per coalition group.
    pub list_limit: usize,
}

// ---------- Public surface ----------

pub fn build_result(inputs: BuildInputs<'_>) -> Result<ResultDoc, PipelineError> {
    let body = ResultBody {
        engine: inputs.engine.clone(),
        election: inputs.election.to_string(),
        params: inputs.params.clone(),
        apportionment: write_apportionment(inputs.catalog, inputs.apportionment),
        coalitions: inputs
            .search
            .analysis()
            .map(|a| write_coalitions(inputs.catalog, a, inputs.params.max_coalition_size, inputs.list_limit)),
        label: inputs.label.clone(),
        validation: inputs.validation.map(write_validation),
        inputs: inputs.digests.clone(),
    };
    let id = hasher::res_id_from_canonical(&body)?;
    Ok(ResultDoc { id, body })
}

// ---------- Conversion helpers ----------

pub fn write_apportionment(catalog: &PoliticalEntityCatalog, app: &ApportionmentResult) -> ApportionmentBlock {
    let parties = app
        .ranked()
        .into_iter()
        .map(|p| {
            let (name, abbreviation) = match catalog.get(&p.party_id) {
                Ok(e) => (e.name.clone(), e.abbreviation.clone()),
                Err(_) => (p.party_id.to_string(), p.party_id.to_string()),
            };
            PartyLine {
                id: p.party_id.clone(),
                name,
                abbreviation,
                votes: p.votes,
                seats: p.seats,
                vote_share_pct: round6(p.vote_share.to_percent()),
                seat_share_pct: round6(p.seat_share.to_percent()),
            }
        })
        .collect();
    ApportionmentBlock {
        method: app.method,
        total_seats: app.total_seats,
        total_votes: app.total_votes,
        parties,
    }
}

pub fn write_coalitions(
    catalog: &PoliticalEntityCatalog,
    a: &CoalitionAnalysis,
    max_coalition_size: usize,
    list_limit: usize,
) -> CoalitionsBlock {
    let group = |g: CoalitionGroup| {
        let all = a.group(g);
        GroupBlock {
            total: all.len(),
            listed: all.iter().take(list_limit).map(|c| write_entry(catalog, c)).collect(),
        }
    };
    CoalitionsBlock {
        majority_threshold: a.majority_threshold,
        minority_floor: a.minority_floor,
        max_coalition_size,
        viable: group(CoalitionGroup::Viable),
        minority: group(CoalitionGroup::Minority),
        blocked: group(CoalitionGroup::Blocked),
        single_party: group(CoalitionGroup::SingleParty),
        most_compatible: a.most_compatible.as_ref().map(|c| write_entry(catalog, c)),
        most_stable: a.most_stable.as_ref().map(|c| write_entry(catalog, c)),
        stats: write_stats(&a.stats),
    }
}

pub fn write_entry(catalog: &PoliticalEntityCatalog, c: &CoalitionCandidate) -> CoalitionEntry {
    let names = c
        .members
        .iter()
        .map(|id| catalog.get(id).map(|e| e.abbreviation.clone()).unwrap_or_else(|_| id.to_string()))
        .collect();
    CoalitionEntry {
        members: c.members.clone(),
        names,
        seats: c.total_seats,
        compatibility: round6(c.compatibility),
        stability: round6(c.stability),
        viable: c.viable,
        red_lines: c.violations.iter().map(|v| v.description.clone()).collect(),
    }
}

fn write_stats(s: &SearchStats) -> StatsBlock {
    StatsBlock { candidates: s.candidates, examined: s.examined, pruned: s.pruned, reported: s.reported }
}

pub fn write_validation(v: &ValidationReport) -> ValidationBlock {
    ValidationBlock {
        reference: v.reference.clone(),
        seat_accuracy_pct: round6(v.seats.accuracy_pct),
        exact_matches: v.seats.exact_matches,
        compared: v.seats.lines.len(),
        total_abs_error: v.seats.total_abs_error,
        chamber_matches: v.seats.chamber_matches,
        mismatches: v
            .seats
            .mismatches()
            .map(|l| SeatMismatch { party: l.party_id.clone(), expected: l.expected, actual: l.actual })
            .collect(),
        coalition: v.coalition.as_ref().map(write_coalition_match),
        overall_accuracy_pct: round6(v.overall_accuracy_pct),
    }
}

fn write_coalition_match(m: &CoalitionMatch) -> CoalitionMatchBlock {
    CoalitionMatchBlock {
        name: m.name.clone(),
        members: m.members.clone(),
        group: m.group.map(|g| g.as_str().to_string()),
        seats: m.total_seats,
        compatibility_rank: m.compatibility_rank,
        stability_rank: m.stability_rank,
        best_overlap: round6(m.best_overlap),
        best_overlap_members: m.best_overlap_members.clone(),
        accuracy_pct: round6(m.accuracy_pct),
    }
}
