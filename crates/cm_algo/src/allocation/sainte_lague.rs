//! Sainte-Laguë (highest averages, divisors 1, 3, 5, …) seat allocation.
//!
//! Same contract, tie-break and integrity guarantees as D’Hondt; only the
//! divisor sequence differs, which treats small parties more evenly.

use std::collections::BTreeMap;

use cm_core::{errors::EngineResult, ids::PartyId};

use super::highest_averages::allocate_highest_averages;

/// Sainte-Laguë divisor for a party already holding `s` seats.
#[inline]
pub fn sainte_lague_divisor(s: u32) -> u128 {
    2 * (s as u128) + 1
}

/// Allocate seats using the Sainte-Laguë method.
pub fn allocate_sainte_lague(
    seats: u32,
    votes: &BTreeMap<PartyId, u64>,
    threshold_bp: u32,
) -> EngineResult<BTreeMap<PartyId, u32>> {
    allocate_highest_averages(seats, votes, threshold_bp, sainte_lague_divisor)
}
