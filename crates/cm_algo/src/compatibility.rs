//! crates/cm_algo/src/compatibility.rs
//! Ideological compatibility of a party set, plus red-line detection.
//!
//! - Pair compatibility is `1 − normalized distance` under a `DistanceMetric`.
//! - Pairs combine into one score under an `AggregationStrategy`.
//! - Red lines are reported as violations; they never change the score.
//!
//! Member sets are canonicalized (sorted, de-duplicated) before any float is
//! touched, and pairs are always visited in canonical id order, so `{A,B}` and
//! `{B,A}` produce bit-identical scores.

use std::collections::BTreeMap;

use cm_core::{
    determinism::canonical_member_set,
    entities::{PoliticalEntity, PoliticalEntityCatalog, RedLineDirection, IDEOLOGY_RANGE},
    errors::EngineResult,
    ids::{DimensionId, PartyId},
    variables::{AggregationStrategy, DistanceMetric, Params},
};

// ---------------- Types -------------------------------------------------------------------------

/// One pair of a party set that cannot govern together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedLineViolation {
    /// Canonically smaller id of the pair.
    pub a: PartyId,
    pub b: PartyId,
    pub direction: RedLineDirection,
    pub description: String,
}

/// Score and red-line findings for one party set.
#[derive(Clone, Debug, PartialEq)]
pub struct CompatibilityReport {
    /// Aggregated compatibility in `[0, 1]`.
    pub score: f64,
    pub violations: Vec<RedLineViolation>,
}

impl CompatibilityReport {
    #[inline]
    pub fn is_blocked(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Scores ideological proximity of party sets against one immutable catalog.
#[derive(Clone, Copy, Debug)]
pub struct CompatibilityModel<'a> {
    catalog: &'a PoliticalEntityCatalog,
    metric: DistanceMetric,
    aggregation: AggregationStrategy,
}

impl<'a> CompatibilityModel<'a> {
    /// Model with the default metric (mean absolute) and aggregation (arithmetic mean).
    pub fn new(catalog: &'a PoliticalEntityCatalog) -> Self {
        Self {
            catalog,
            metric: DistanceMetric::default(),
            aggregation: AggregationStrategy::default(),
        }
    }

    /// Model configured from `params.metric` and `params.aggregation`.
    pub fn from_params(catalog: &'a PoliticalEntityCatalog, params: &Params) -> Self {
        Self::new(catalog).with_metric(params.metric).with_aggregation(params.aggregation)
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationStrategy) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn catalog(&self) -> &'a PoliticalEntityCatalog {
        self.catalog
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn aggregation(&self) -> AggregationStrategy {
        self.aggregation
    }

    /// Compatibility of one pair in `[0, 1]`.
    pub fn pair_compatibility(&self, a: &PartyId, b: &PartyId) -> EngineResult<f64> {
        let ea = self.catalog.get(a)?;
        let eb = self.catalog.get(b)?;
        Ok(self.compat_of(ea, eb))
    }

    /// Score a party set without seat weights.
    ///
    /// With `SeatWeightedMean` this degrades to the arithmetic mean.
    pub fn evaluate<'i, I>(&self, ids: I) -> EngineResult<CompatibilityReport>
    where
        I: IntoIterator<Item = &'i PartyId>,
    {
        self.evaluate_inner(ids, None)
    }

    /// Score a party set, weighting pairs by the product of member seats.
    /// Parties missing from `seats` weigh 0.
    pub fn evaluate_weighted<'i, I>(&self, ids: I, seats: &BTreeMap<PartyId, u32>) -> EngineResult<CompatibilityReport>
    where
        I: IntoIterator<Item = &'i PartyId>,
    {
        self.evaluate_inner(ids, Some(seats))
    }

    /// Every red line inside the set, once per pair, in canonical pair order.
    pub fn violations<'i, I>(&self, ids: I) -> EngineResult<Vec<RedLineViolation>>
    where
        I: IntoIterator<Item = &'i PartyId>,
    {
        let members = canonical_member_set(ids);
        for id in &members {
            self.catalog.get(id)?;
        }
        let mut out = Vec::new();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                if let Some(v) = self.violation_of(a, b) {
                    out.push(v);
                }
            }
        }
        Ok(out)
    }

    /// Precompute every pair among the keys of `seats` for repeated scoring.
    pub fn pairwise_table(&self, seats: &BTreeMap<PartyId, u32>) -> EngineResult<PairwiseTable> {
        let entities: Vec<&PoliticalEntity> =
            seats.keys().map(|id| self.catalog.get(id)).collect::<EngineResult<_>>()?;
        let n = entities.len();

        let mut scores = vec![1.0; n * n];
        let mut red_lines = BTreeMap::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let c = self.compat_of(entities[i], entities[j]);
                scores[i * n + j] = c;
                scores[j * n + i] = c;
                if let Some(v) = self.violation_of(&entities[i].id, &entities[j].id) {
                    red_lines.insert((i, j), v);
                }
            }
        }

        Ok(PairwiseTable {
            aggregation: self.aggregation,
            ids: seats.keys().cloned().collect(),
            seats: seats.values().copied().collect(),
            scores,
            red_lines,
        })
    }

    // ---------------- internals -----------------------------------------------------------------

    fn evaluate_inner<'i, I>(&self, ids: I, seats: Option<&BTreeMap<PartyId, u32>>) -> EngineResult<CompatibilityReport>
    where
        I: IntoIterator<Item = &'i PartyId>,
    {
        let members = canonical_member_set(ids);
        let entities: Vec<&PoliticalEntity> =
            members.iter().map(|id| self.catalog.get(id)).collect::<EngineResult<_>>()?;

        let weight_of = |id: &PartyId| -> u32 { seats.and_then(|m| m.get(id).copied()).unwrap_or(0) };

        let mut acc = PairAccumulator::default();
        let mut violations = Vec::new();
        for i in 0..entities.len() {
            for j in (i + 1)..entities.len() {
                let (a, b) = (entities[i], entities[j]);
                acc.push(self.compat_of(a, b), pair_weight(weight_of(&a.id), weight_of(&b.id)));
                if let Some(v) = self.violation_of(&a.id, &b.id) {
                    violations.push(v);
                }
            }
        }

        Ok(CompatibilityReport { score: acc.finish(self.aggregation), violations })
    }

    fn compat_of(&self, a: &PoliticalEntity, b: &PoliticalEntity) -> f64 {
        let dims = self.catalog.dimensions();
        if dims.is_empty() {
            return 1.0;
        }
        let n = dims.len() as f64;
        let delta = |d: &DimensionId| a.ideology.get(d).unwrap_or(0.0) - b.ideology.get(d).unwrap_or(0.0);

        let distance = match self.metric {
            DistanceMetric::MeanAbsolute => {
                let mut acc = 0.0;
                for d in dims {
                    acc += delta(d).abs() / IDEOLOGY_RANGE;
                }
                acc / n
            }
            DistanceMetric::Euclidean => {
                let mut acc = 0.0;
                for d in dims {
                    let t = delta(d);
                    acc += t * t;
                }
                acc.sqrt() / (IDEOLOGY_RANGE * n.sqrt())
            }
        };
        (1.0 - distance).clamp(0.0, 1.0)
    }

    /// `a < b` canonically.
    fn violation_of(&self, a: &PartyId, b: &PartyId) -> Option<RedLineViolation> {
        let direction = self.catalog.red_line(a, b)?;
        let (na, nb) = (self.catalog.display_name(a), self.catalog.display_name(b));
        let description = match direction {
            RedLineDirection::First => format!("{na} rules out governing with {nb}"),
            RedLineDirection::Second => format!("{nb} rules out governing with {na}"),
            RedLineDirection::Mutual => format!("{na} and {nb} rule each other out"),
        };
        Some(RedLineViolation { a: a.clone(), b: b.clone(), direction, description })
    }
}

// ---------------- Pairwise table ----------------------------------------------------------------

/// Pair matrix over a fixed party list (canonical id order), used by the
/// coalition search to avoid recomputing distances per subset.
///
/// Scores produced here equal `CompatibilityModel::evaluate_weighted` on the
/// same members and seats, bit for bit.
#[derive(Clone, Debug)]
pub struct PairwiseTable {
    aggregation: AggregationStrategy,
    ids: Vec<PartyId>,
    seats: Vec<u32>,
    scores: Vec<f64>,
    red_lines: BTreeMap<(usize, usize), RedLineViolation>,
}

impl PairwiseTable {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Party ids in table (canonical) order.
    pub fn ids(&self) -> &[PartyId] {
        &self.ids
    }

    pub fn index_of(&self, id: &PartyId) -> Option<usize> {
        self.ids.binary_search(id).ok()
    }

    /// Compatibility of the pair `(i, j)`.
    #[inline]
    pub fn pair(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.ids.len() + j]
    }

    /// Aggregated score for `members`, given as strictly ascending table indices.
    pub fn score(&self, members: &[usize]) -> f64 {
        debug_assert!(members.windows(2).all(|w| w[0] < w[1]), "members must be ascending");
        let mut acc = PairAccumulator::default();
        for (x, &i) in members.iter().enumerate() {
            for &j in &members[x + 1..] {
                acc.push(self.pair(i, j), pair_weight(self.seats[i], self.seats[j]));
            }
        }
        acc.finish(self.aggregation)
    }

    /// Red-line violations inside `members` (ascending table indices).
    pub fn violations(&self, members: &[usize]) -> Vec<RedLineViolation> {
        let mut out = Vec::new();
        for (x, &i) in members.iter().enumerate() {
            for &j in &members[x + 1..] {
                if let Some(v) = self.red_lines.get(&(i, j)) {
                    out.push(v.clone());
                }
            }
        }
        out
    }

    /// Whether any pair inside `members` is excluded.
    pub fn has_red_line(&self, members: &[usize]) -> bool {
        members
            .iter()
            .enumerate()
            .any(|(x, &i)| members[x + 1..].iter().any(|&j| self.red_lines.contains_key(&(i, j))))
    }

    pub fn report(&self, members: &[usize]) -> CompatibilityReport {
        CompatibilityReport { score: self.score(members), violations: self.violations(members) }
    }
}

// ---------------- Aggregation -------------------------------------------------------------------

#[inline]
fn pair_weight(a: u32, b: u32) -> f64 {
    a as f64 * b as f64
}

/// Running sums for every aggregation strategy; pairs must arrive in canonical order.
#[derive(Debug)]
struct PairAccumulator {
    count: usize,
    sum: f64,
    weighted_sum: f64,
    weight_total: f64,
    min: f64,
}

impl Default for PairAccumulator {
    fn default() -> Self {
        Self { count: 0, sum: 0.0, weighted_sum: 0.0, weight_total: 0.0, min: f64::INFINITY }
    }
}

impl PairAccumulator {
    fn push(&mut self, compat: f64, weight: f64) {
        self.count += 1;
        self.sum += compat;
        self.weighted_sum += compat * weight;
        self.weight_total += weight;
        self.min = self.min.min(compat);
    }

    fn finish(&self, strategy: AggregationStrategy) -> f64 {
        if self.count == 0 {
            return 1.0;
        }
        let mean = self.sum / self.count as f64;
        match strategy {
            AggregationStrategy::ArithmeticMean => mean,
            AggregationStrategy::SeatWeightedMean if self.weight_total > 0.0 => self.weighted_sum / self.weight_total,
            AggregationStrategy::SeatWeightedMean => mean,
            AggregationStrategy::MinimumPair => self.min,
        }
    }
}
