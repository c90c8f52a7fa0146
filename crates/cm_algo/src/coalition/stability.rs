//! Stability factor of a coalition: fewer parties and a larger seat margin
//! make a government likelier to last.

use cm_core::variables::StabilityPolicy;

/// `clamp01(base − party_penalty·max(0, n − free_parties) + clamp(surplus_weight·(seats − T), ±surplus_cap))`
pub fn stability_factor(policy: &StabilityPolicy, party_count: usize, seats: u32, majority: u32) -> f64 {
    let extra_parties = party_count.saturating_sub(policy.free_parties) as f64;
    let surplus = (seats as f64 - majority as f64) * policy.surplus_weight;
    let surplus = surplus.clamp(-policy.surplus_cap, policy.surplus_cap);
    (policy.base - policy.party_penalty * extra_parties + surplus).clamp(0.0, 1.0)
}
