//! Integer-first ratio type and helpers.
//!
//! Vote and seat shares are kept exact; conversion to `f64` happens only at
//! the reporting edge.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Exact ratio with normalized sign and positive denominator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    pub num: i128,
    pub den: i128,
}

#[inline]
fn abs_i128(x: i128) -> i128 { if x < 0 { -x } else { x } }

fn gcd_i128(mut a: i128, mut b: i128) -> i128 {
    a = abs_i128(a);
    b = abs_i128(b);
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    if a == 0 { 1 } else { a }
}

/// Construct a ratio, ensuring `den > 0` and reducing by GCD.
pub fn new_ratio_checked(num: i128, den: i128) -> Result<Ratio, CoreError> {
    if den == 0 { return Err(CoreError::InvalidRatio); }
    let (mut n, mut d) = (num, den);
    if d < 0 {
        n = -n;
        d = -d;
    }
    let g = gcd_i128(n, d);
    Ok(Ratio { num: n / g, den: d / g })
}

/// Share of `part` in `whole`; an empty whole yields `0/1`.
pub fn share(part: u64, whole: u64) -> Ratio {
    if whole == 0 {
        return Ratio::ZERO;
    }
    new_ratio_checked(part as i128, whole as i128).unwrap_or(Ratio::ZERO)
}

impl Ratio {
    pub const ZERO: Ratio = Ratio { num: 0, den: 1 };

    /// Lossy conversion for reporting.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Percentage (0..=100) for reporting.
    #[inline]
    pub fn to_percent(self) -> f64 {
        self.to_f64() * 100.0
    }
}

/// Compare two ratios exactly (cross-multiply).
///
/// Falls back to `f64` only if the cross products overflow `i128`.
pub fn compare_ratio(a: &Ratio, b: &Ratio) -> Ordering {
    let g1 = gcd_i128(a.num, b.num);
    let g2 = gcd_i128(a.den, b.den);
    let an = a.num / g1;
    let bn = b.num / g1;
    let ad = a.den / g2;
    let bd = b.den / g2;

    if let (Some(l), Some(r)) = (an.checked_mul(bd), bn.checked_mul(ad)) {
        l.cmp(&r)
    } else {
        a.to_f64().partial_cmp(&b.to_f64()).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ratio(self, other)
    }
}
