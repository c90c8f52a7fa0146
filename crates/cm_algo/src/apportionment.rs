//! crates/cm_algo/src/apportionment.rs
//! Votes → seats for a whole chamber, with exact vote/seat shares.
//!
//! Dispatches on `Params::method` to the divisor kernels under `allocation`
//! and keeps every input party in the result (zero-seat parties included).

use std::collections::BTreeMap;

use cm_core::{
    errors::EngineResult,
    ids::PartyId,
    rounding::{share, Ratio},
    variables::{ApportionmentMethod, Params},
};

use crate::allocation::{dhondt::allocate_dhondt, sainte_lague::allocate_sainte_lague};

// ---------------- Types -------------------------------------------------------------------------

/// One party's line in the apportionment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartySeats {
    pub party_id: PartyId,
    pub votes: u64,
    pub seats: u32,
    pub vote_share: Ratio,
    pub seat_share: Ratio,
}

/// Seats for every party of the input vote map.
///
/// Invariant: `parties.values().map(|p| p.seats).sum() == total_seats`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApportionmentResult {
    pub method: ApportionmentMethod,
    pub total_seats: u32,
    pub total_votes: u64,
    pub parties: BTreeMap<PartyId, PartySeats>,
}

impl ApportionmentResult {
    /// Seats of `id`, 0 when the party is not in the result.
    pub fn seats_of(&self, id: &PartyId) -> u32 {
        self.parties.get(id).map(|p| p.seats).unwrap_or(0)
    }

    /// Plain `id → seats` view in canonical order.
    pub fn seat_map(&self) -> BTreeMap<PartyId, u32> {
        self.parties.iter().map(|(k, p)| (k.clone(), p.seats)).collect()
    }

    /// Parties holding at least one seat, canonical order.
    pub fn seated(&self) -> impl Iterator<Item = &PartySeats> {
        self.parties.values().filter(|p| p.seats > 0)
    }

    /// All parties by seats desc, then votes desc, then id.
    pub fn ranked(&self) -> Vec<&PartySeats> {
        let mut out: Vec<&PartySeats> = self.parties.values().collect();
        out.sort_by(|a, b| {
            b.seats
                .cmp(&a.seats)
                .then_with(|| b.votes.cmp(&a.votes))
                .then_with(|| a.party_id.cmp(&b.party_id))
        });
        out
    }
}

// ---------------- Entry point -------------------------------------------------------------------

/// Apportion `params.total_seats` among `votes` with the configured method
/// and entry threshold.
pub fn apportion(votes: &BTreeMap<PartyId, u64>, params: &Params) -> EngineResult<ApportionmentResult> {
    let seats = params.total_seats;
    let alloc = match params.method {
        ApportionmentMethod::DHondt => allocate_dhondt(seats, votes, params.entry_threshold_bp)?,
        ApportionmentMethod::SainteLague => allocate_sainte_lague(seats, votes, params.entry_threshold_bp)?,
    };

    let total_votes: u64 = votes.values().copied().fold(0u64, u64::saturating_add);
    let parties = votes
        .iter()
        .map(|(id, &v)| {
            let s = alloc.get(id).copied().unwrap_or(0);
            let line = PartySeats {
                party_id: id.clone(),
                votes: v,
                seats: s,
                vote_share: share(v, total_votes),
                seat_share: share(s as u64, seats as u64),
            };
            (id.clone(), line)
        })
        .collect();

    Ok(ApportionmentResult { method: params.method, total_seats: seats, total_votes, parties })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_core::errors::EngineError;
    use proptest::prelude::*;

    fn pid(s: &str) -> PartyId { s.parse().unwrap() }

    fn params(seats: u32, method: ApportionmentMethod) -> Params {
        Params { total_seats: seats, method, ..Params::default() }
    }

    fn vote_map(xs: &[u64]) -> BTreeMap<PartyId, u64> {
        xs.iter().enumerate().map(|(i, v)| (pid(&format!("p{i:02}")), *v)).collect()
    }

    #[test]
    fn shares_and_ranking() {
        let votes: BTreeMap<PartyId, u64> = [(pid("a"), 600), (pid("b"), 300), (pid("c"), 100)].into_iter().collect();
        let r = apportion(&votes, &params(10, ApportionmentMethod::DHondt)).unwrap();
        assert_eq!(r.total_votes, 1_000);
        assert_eq!(r.seats_of(&pid("a")), 6);
        assert_eq!(r.seats_of(&pid("b")), 3);
        assert_eq!(r.seats_of(&pid("c")), 1);
        assert_eq!(r.seats_of(&pid("zz")), 0);
        assert_eq!(r.parties[&pid("b")].vote_share, share(3, 10));
        assert_eq!(r.parties[&pid("a")].seat_share, share(3, 5));

        let order: Vec<&str> = r.ranked().iter().map(|p| p.party_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(r.seated().count(), 3);
    }

    #[test]
    fn method_dispatch() {
        let votes: BTreeMap<PartyId, u64> =
            [(pid("a"), 100_000), (pid("b"), 80_000), (pid("c"), 30_000), (pid("d"), 20_000)].into_iter().collect();
        let dh = apportion(&votes, &params(8, ApportionmentMethod::DHondt)).unwrap();
        let sl = apportion(&votes, &params(8, ApportionmentMethod::SainteLague)).unwrap();
        assert_eq!(dh.seats_of(&pid("d")), 0);
        assert_eq!(sl.seats_of(&pid("d")), 1);
        assert_eq!(sl.method, ApportionmentMethod::SainteLague);
    }

    #[test]
    fn zero_seat_chamber_is_rejected() {
        let votes = vote_map(&[10, 20]);
        assert!(matches!(
            apportion(&votes, &params(0, ApportionmentMethod::DHondt)),
            Err(EngineError::InvalidInput(_))
        ));
    }

    fn methods() -> impl Strategy<Value = ApportionmentMethod> {
        prop_oneof![Just(ApportionmentMethod::DHondt), Just(ApportionmentMethod::SainteLague)]
    }

    proptest! {
        #[test]
        fn seats_always_sum_to_chamber_size(
            votes in prop::collection::vec(0u64..5_000_000, 1..20),
            seats in 1u32..300,
            method in methods(),
        ) {
            prop_assume!(votes.iter().any(|&v| v > 0));
            let r = apportion(&vote_map(&votes), &params(seats, method)).unwrap();
            let sum: u32 = r.parties.values().map(|p| p.seats).sum();
            prop_assert_eq!(sum, seats);
            prop_assert_eq!(r.parties.len(), votes.len());
        }

        #[test]
        fn more_votes_never_cost_seats(
            votes in prop::collection::vec(1u64..1_000_000, 2..12),
            bump in 1u64..500_000,
            idx in any::<prop::sample::Index>(),
            seats in 1u32..200,
            method in methods(),
        ) {
            let i = idx.index(votes.len());
            let p = params(seats, method);
            let before = apportion(&vote_map(&votes), &p).unwrap();

            let mut raised = votes.clone();
            raised[i] += bump;
            let after = apportion(&vote_map(&raised), &p).unwrap();

            let id = pid(&format!("p{i:02}"));
            prop_assert!(after.seats_of(&id) >= before.seats_of(&id));
        }
    }
}
