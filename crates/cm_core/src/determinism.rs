//! Determinism utilities: stable ordering & canonical member sets.
//!
//! This module is **I/O-free**. It provides:
//! - Stable total orders for core tokens
//! - Canonical in-place sort helpers
//! - Canonical (sorted, duplicate-free) member sets
//! - A total order for scores so ranking never depends on NaN handling

use core::cmp::Ordering;

use crate::ids::PartyId;

/* -------------------------------------------------------------------------- */
/*                               Stable Ordering                              */
/* -------------------------------------------------------------------------- */

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for PartyId {
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl<T: StableOrd> StableOrd for [T] {
    /// Lexicographic over elements, shorter prefix first.
    fn stable_cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.iter().zip(other.iter()) {
            match a.stable_cmp(b) {
                Ordering::Equal => continue,
                o => return o,
            }
        }
        self.len().cmp(&other.len())
    }
}

/* -------------------------------------------------------------------------- */
/*                            Canonical sort helpers                           */
/* -------------------------------------------------------------------------- */

/// Sort party ids **in place** (lexicographic).
#[inline]
pub fn sort_parties_canonical(xs: &mut [PartyId]) {
    xs.sort_by(|a, b| a.stable_cmp(b));
}

/// Sorted, duplicate-free copy of `ids`. Input order never matters downstream.
pub fn canonical_member_set<'a, I>(ids: I) -> Vec<PartyId>
where
    I: IntoIterator<Item = &'a PartyId>,
{
    let mut out: Vec<PartyId> = ids.into_iter().cloned().collect();
    sort_parties_canonical(&mut out);
    out.dedup();
    out
}

/// Compare scores **descending** with a total order (NaN sorts last).
#[inline]
pub fn cmp_score_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/* ---------------------------------- Tests --------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PartyId { s.parse().unwrap() }

    #[test]
    fn member_set_is_sorted_and_deduped() {
        let v = vec![pid("vvd"), pid("cda"), pid("vvd"), pid("bbb")];
        let got = canonical_member_set(&v);
        let names: Vec<&str> = got.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["bbb", "cda", "vvd"]);
    }

    #[test]
    fn slice_order_is_lexicographic_then_length() {
        let a = vec![pid("a"), pid("b")];
        let b = vec![pid("a"), pid("c")];
        let c = vec![pid("a")];
        assert_eq!(a.as_slice().stable_cmp(b.as_slice()), Ordering::Less);
        assert_eq!(c.as_slice().stable_cmp(a.as_slice()), Ordering::Less);
        assert_eq!(a.as_slice().stable_cmp(a.as_slice()), Ordering::Equal);
    }

    #[test]
    fn scores_sort_descending_nan_last() {
        let mut xs = vec![0.2, f64::NAN, 0.9, 0.5];
        xs.sort_by(|a, b| cmp_score_desc(*a, *b));
        assert_eq!(&xs[..3], &[0.9, 0.5, 0.2]);
        assert!(xs[3].is_nan());
    }
}
