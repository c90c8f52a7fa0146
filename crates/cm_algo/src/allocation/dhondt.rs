//! D’Hondt (highest averages, divisors 1, 2, 3, …) seat allocation.
//!
//! Contract:
//! - Allocate `seats` sequentially by picking the max of `v / (s + 1)`.
//! - Ties: larger raw vote total, then lexicographically smaller `PartyId`.
//! - Output seats sum to `seats` exactly; any mismatch is an integrity error.
//! - Monotonic: raising one party's votes (others fixed) never lowers its seats.

use std::collections::BTreeMap;

use cm_core::{errors::EngineResult, ids::PartyId};

use super::highest_averages::allocate_highest_averages;

/// D’Hondt divisor for a party already holding `s` seats.
#[inline]
pub fn dhondt_divisor(s: u32) -> u128 {
    s as u128 + 1
}

/// Allocate seats using the D’Hondt method.
///
/// `threshold_bp` is the entry threshold in basis points of the total vote
/// (0 disables it).
pub fn allocate_dhondt(
    seats: u32,
    votes: &BTreeMap<PartyId, u64>,
    threshold_bp: u32,
) -> EngineResult<BTreeMap<PartyId, u32>> {
    allocate_highest_averages(seats, votes, threshold_bp, dhondt_divisor)
}
