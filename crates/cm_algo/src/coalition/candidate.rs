//! A scored coalition and the total orders used to rank them.

use core::cmp::Ordering;

use cm_core::{
    determinism::{cmp_score_desc, StableOrd},
    ids::PartyId,
};

use crate::compatibility::RedLineViolation;

/// One party set considered by the search.
#[derive(Clone, Debug, PartialEq)]
pub struct CoalitionCandidate {
    /// Canonical id order, no duplicates.
    pub members: Vec<PartyId>,
    pub total_seats: u32,
    /// `[0, 1]`
    pub compatibility: f64,
    /// `[0, 1]`
    pub stability: f64,
    pub violations: Vec<RedLineViolation>,
    /// `total_seats` reaches the majority threshold.
    pub viable: bool,
}

impl CoalitionCandidate {
    #[inline]
    pub fn party_count(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn contains(&self, id: &PartyId) -> bool {
        self.members.binary_search(id).is_ok()
    }

    /// Same member set as `ids` (which must be canonical).
    pub fn has_members(&self, ids: &[PartyId]) -> bool {
        self.members.as_slice() == ids
    }
}

/// Shared tail of every ranking: fewer parties, then more seats, then member ids.
fn cmp_tail(a: &CoalitionCandidate, b: &CoalitionCandidate) -> Ordering {
    a.party_count()
        .cmp(&b.party_count())
        .then_with(|| b.total_seats.cmp(&a.total_seats))
        .then_with(|| a.members.as_slice().stable_cmp(b.members.as_slice()))
}

/// Highest compatibility first.
pub fn compare_by_compatibility(a: &CoalitionCandidate, b: &CoalitionCandidate) -> Ordering {
    cmp_score_desc(a.compatibility, b.compatibility).then_with(|| cmp_tail(a, b))
}

/// Highest stability first.
pub fn compare_by_stability(a: &CoalitionCandidate, b: &CoalitionCandidate) -> Ordering {
    cmp_score_desc(a.stability, b.stability).then_with(|| cmp_tail(a, b))
}

/// Largest seat total first (minority and blocked listings).
pub fn compare_by_seats(a: &CoalitionCandidate, b: &CoalitionCandidate) -> Ordering {
    b.total_seats
        .cmp(&a.total_seats)
        .then_with(|| a.party_count().cmp(&b.party_count()))
        .then_with(|| a.members.as_slice().stable_cmp(b.members.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(members: &[&str], seats: u32, compat: f64, stab: f64) -> CoalitionCandidate {
        CoalitionCandidate {
            members: members.iter().map(|s| s.parse().unwrap()).collect(),
            total_seats: seats,
            compatibility: compat,
            stability: stab,
            violations: Vec::new(),
            viable: true,
        }
    }

    #[test]
    fn ties_prefer_fewer_parties_then_more_seats_then_ids() {
        let mut xs = vec![
            cand(&["a", "b", "c"], 90, 0.8, 0.5),
            cand(&["b", "d"], 80, 0.8, 0.5),
            cand(&["a", "d"], 80, 0.8, 0.5),
            cand(&["a", "c"], 85, 0.8, 0.5),
            cand(&["c", "d"], 77, 0.9, 0.1),
        ];
        xs.sort_by(compare_by_compatibility);
        let got: Vec<String> = xs.iter().map(|c| c.members.iter().map(|m| m.as_str()).collect::<Vec<_>>().join("+")).collect();
        assert_eq!(got, vec!["c+d", "a+c", "a+d", "b+d", "a+b+c"]);

        xs.sort_by(compare_by_stability);
        assert_eq!(xs.last().map(|c| c.total_seats), Some(77));
    }

    #[test]
    fn seat_order() {
        let mut xs = vec![cand(&["a", "b"], 60, 0.5, 0.5), cand(&["c", "d", "e"], 70, 0.9, 0.9)];
        xs.sort_by(compare_by_seats);
        assert_eq!(xs[0].total_seats, 70);
        assert!(xs[0].contains(&"d".parse().unwrap()));
    }
}
