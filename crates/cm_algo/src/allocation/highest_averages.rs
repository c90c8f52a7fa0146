//! Highest-averages kernel shared by the divisor methods.
//!
//! Contract:
//! - Apply the entry threshold (basis points of the total vote) first.
//! - Allocate `seats` sequentially: each round the largest `v / d(s)` wins,
//!   where `s` is the seats already awarded and `d` the method's divisor.
//! - Ties: larger raw vote total, then lexicographically smaller party id.
//! - Pure integers; no division in comparisons (cross-multiply in u128).
//!
//! Determinism:
//! - Scans run in canonical `PartyId` order (`BTreeMap` iteration).
//! - The tie-break is a total order, so no RNG is ever needed.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use cm_core::{
    errors::{EngineError, EngineResult},
    ids::PartyId,
};

/// Divisor for a party that already holds `s` seats.
pub type Divisor = fn(u32) -> u128;

/// Allocate `seats` by highest averages with the given divisor sequence.
///
/// Every party of `votes` appears in the output (possibly with 0 seats).
pub fn allocate_highest_averages(
    seats: u32,
    votes: &BTreeMap<PartyId, u64>,
    threshold_bp: u32,
    divisor: Divisor,
) -> EngineResult<BTreeMap<PartyId, u32>> {
    if seats == 0 {
        return Err(EngineError::InvalidInput("total seat count must be positive".into()));
    }
    if votes.is_empty() {
        return Err(EngineError::InvalidInput("vote map is empty".into()));
    }
    let total: u128 = votes.values().map(|&v| v as u128).sum();
    if total == 0 {
        return Err(EngineError::InvalidInput("all vote counts are zero".into()));
    }

    // 1) Threshold on natural totals; zero-vote parties never compete.
    let eligible: Vec<(&PartyId, u64)> = votes
        .iter()
        .filter(|&(_, &v)| v > 0 && passes_threshold(v, total, threshold_bp))
        .map(|(id, &v)| (id, v))
        .collect();
    if eligible.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "no party passes the entry threshold of {threshold_bp} bp"
        )));
    }

    // 2) Seat vector for every input party (canonical order).
    let mut alloc: BTreeMap<PartyId, u32> = votes.keys().cloned().map(|id| (id, 0)).collect();
    let mut awarded: Vec<u32> = vec![0; eligible.len()];

    // 3) Sequentially award seats.
    for _round in 0..seats {
        let winner = next_award(&eligible, &awarded, divisor);
        awarded[winner] += 1;
    }
    for ((id, _), s) in eligible.iter().zip(awarded.iter()) {
        if let Some(slot) = alloc.get_mut(*id) {
            *slot = *s;
        }
    }

    // 4) Integrity: never auto-corrected.
    let allocated: u64 = alloc.values().map(|&s| s as u64).sum();
    debug_assert_eq!(allocated, seats as u64, "highest averages must allocate every seat");
    if allocated != seats as u64 {
        return Err(EngineError::ApportionmentIntegrity { allocated, expected: seats });
    }

    Ok(alloc)
}

/// Keep if `10_000 * v >= threshold_bp * total` (integer math only).
#[inline]
fn passes_threshold(v: u64, total: u128, threshold_bp: u32) -> bool {
    if threshold_bp == 0 {
        return true;
    }
    (v as u128) * 10_000 >= (threshold_bp as u128) * total
}

/// Index of the party that receives the next seat.
fn next_award(eligible: &[(&PartyId, u64)], awarded: &[u32], divisor: Divisor) -> usize {
    let mut best = 0usize;
    for i in 1..eligible.len() {
        let (id_i, v_i) = eligible[i];
        let (id_b, v_b) = eligible[best];
        let ord = cmp_quotients(v_i, divisor(awarded[i]), v_b, divisor(awarded[best]))
            .then_with(|| v_i.cmp(&v_b))
            .then_with(|| id_b.cmp(id_i));
        if ord == Ordering::Greater {
            best = i;
        }
    }
    best
}

/// Compare quotients `v_a / d_a` vs `v_b / d_b` without floats.
/// Returns `Ordering::Greater` if a's quotient is larger.
#[inline]
pub fn cmp_quotients(v_a: u64, d_a: u128, v_b: u64, d_b: u128) -> Ordering {
    let lhs = (v_a as u128) * d_b;
    let rhs = (v_b as u128) * d_a;
    lhs.cmp(&rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PartyId { s.parse().unwrap() }

    fn plain(s: u32) -> u128 { s as u128 + 1 }

    #[test]
    fn degenerate_inputs_are_invalid() {
        let empty = BTreeMap::new();
        assert!(matches!(allocate_highest_averages(10, &empty, 0, plain), Err(EngineError::InvalidInput(_))));

        let zeros: BTreeMap<PartyId, u64> = [(pid("a"), 0), (pid("b"), 0)].into_iter().collect();
        assert!(matches!(allocate_highest_averages(10, &zeros, 0, plain), Err(EngineError::InvalidInput(_))));

        let some: BTreeMap<PartyId, u64> = [(pid("a"), 10)].into_iter().collect();
        assert!(matches!(allocate_highest_averages(0, &some, 0, plain), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn threshold_excludes_small_parties() {
        let votes: BTreeMap<PartyId, u64> =
            [(pid("big"), 9_000), (pid("mid"), 800), (pid("tiny"), 200)].into_iter().collect();
        // 5% threshold: tiny has 2%
        let out = allocate_highest_averages(20, &votes, 500, plain).unwrap();
        assert_eq!(out[&pid("tiny")], 0);
        assert_eq!(out.values().sum::<u32>(), 20);

        // 95% threshold: no party qualifies
        assert!(allocate_highest_averages(20, &votes, 9_500, plain).is_err());
    }

    #[test]
    fn zero_vote_party_is_reported_with_zero_seats() {
        let votes: BTreeMap<PartyId, u64> = [(pid("a"), 10), (pid("z"), 0)].into_iter().collect();
        let out = allocate_highest_averages(3, &votes, 0, plain).unwrap();
        assert_eq!(out[&pid("a")], 3);
        assert_eq!(out[&pid("z")], 0);
    }

    #[test]
    fn quotient_comparison_is_exact() {
        assert_eq!(cmp_quotients(100, 2, 50, 1), Ordering::Equal);
        assert_eq!(cmp_quotients(101, 2, 50, 1), Ordering::Greater);
        assert_eq!(cmp_quotients(u64::MAX, 3, u64::MAX - 1, 3), Ordering::Greater);
    }
}
