//! variables.rs: Canonical parameter types, enums, and `Params` with safe defaults.
//!
//! Every tunable policy of the engine lives here so that no coefficient is a
//! hidden constant: seat totals, majority threshold, search bounds, the
//! compatibility metric and aggregation strategy, and the stability policy.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

/// Hard upper bound on the coalition size a caller may request.
pub const MAX_COALITION_SIZE_LIMIT: usize = 10;

/// ------------ Macros ------------

/// Define a serde’d enum with explicit wire tokens (also parsed from CLI flags).
macro_rules! serde_enum {
    ($(#[$m:meta])* $name:ident => { $($(#[$vm:meta])* $variant:ident = $token:expr),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vm])*
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// Wire token of this variant.
            pub fn as_token(self) -> &'static str {
                match self { $($name::$variant => $token,)+ }
            }

            /// All wire tokens, in declaration order.
            pub const TOKENS: &'static [&'static str] = &[$($token),+];
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_token()) }
        }

        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} `{other}` (expected one of: {})",
                        stringify!($name),
                        Self::TOKENS.join(", ")
                    )),
                }
            }
        }
    };
}

/// ------------ Canonical enums (wire tokens explicit) ------------

serde_enum!(
    /// Divisor method used to turn votes into seats.
    ApportionmentMethod => {
        /// Divisors 1, 2, 3, … (favors larger parties).
        DHondt = "dhondt",
        /// Divisors 1, 3, 5, … (neutral).
        SainteLague = "sainte_lague",
    }
);

serde_enum!(
    /// Per-pair ideological distance, normalized to `[0, 1]`.
    DistanceMetric => {
        /// Mean absolute difference per dimension divided by the axis width.
        MeanAbsolute = "mean_absolute",
        /// Euclidean distance divided by its maximum (`width · sqrt(n)`).
        Euclidean = "euclidean",
    }
);

serde_enum!(
    /// How pairwise compatibilities combine into one coalition-wide score.
    ///
    /// The default is the arithmetic mean over all unordered pairs.
    AggregationStrategy => {
        ArithmeticMean = "arithmetic_mean",
        /// Pairs weighted by the product of both members' seats.
        SeatWeightedMean = "seat_weighted_mean",
        /// The weakest pair decides.
        MinimumPair = "minimum_pair",
    }
);

impl Default for ApportionmentMethod {
    fn default() -> Self { ApportionmentMethod::DHondt }
}

impl Default for DistanceMetric {
    fn default() -> Self { DistanceMetric::MeanAbsolute }
}

impl Default for AggregationStrategy {
    fn default() -> Self { AggregationStrategy::ArithmeticMean }
}

/// ------------ Stability policy ------------

/// Coefficients of the stability factor:
/// `clamp01(base − party_penalty·max(0, n − free_parties) + clamp(surplus_weight·(seats − T), ±surplus_cap))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StabilityPolicy {
    pub base: f64,
    /// Number of parties a coalition may have before the count penalty applies.
    pub free_parties: usize,
    pub party_penalty: f64,
    /// Bonus per seat above the majority threshold (malus per seat below it).
    pub surplus_weight: f64,
    pub surplus_cap: f64,
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            base: 0.8,
            free_parties: 2,
            party_penalty: 0.1,
            surplus_weight: 0.01,
            surplus_cap: 0.2,
        }
    }
}

/// ------------ Params ------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Seats in the chamber (`S`).
    pub total_seats: u32,
    /// Seats needed to govern (`T`); defaults to a strict majority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub majority_threshold: Option<u32>,
    /// Largest coalition the search enumerates (`K`).
    pub max_coalition_size: usize,
    /// Minority options below this seat count are not reported; defaults to 40% of `S`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minority_floor: Option<u32>,
    /// Entry threshold in basis points of the total vote (0 = none).
    pub entry_threshold_bp: u32,
    pub method: ApportionmentMethod,
    pub metric: DistanceMetric,
    pub aggregation: AggregationStrategy,
    pub stability: StabilityPolicy,
    /// Wall-clock budget for the coalition search when run on a worker thread.
    pub search_timeout_ms: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            total_seats: 150,
            majority_threshold: None,
            max_coalition_size: 6,
            minority_floor: None,
            entry_threshold_bp: 0,
            method: ApportionmentMethod::DHondt,
            metric: DistanceMetric::MeanAbsolute,
            aggregation: AggregationStrategy::ArithmeticMean,
            stability: StabilityPolicy::default(),
            search_timeout_ms: 5_000,
        }
    }
}

impl Params {
    /// Effective majority threshold `T`.
    pub fn majority(&self) -> u32 {
        self.majority_threshold.unwrap_or(self.total_seats / 2 + 1)
    }

    /// Effective reporting floor for minority options (never above `T`).
    pub fn minority_floor(&self) -> u32 {
        self.minority_floor
            .unwrap_or(self.total_seats * 2 / 5)
            .min(self.majority())
    }

    /// Validate numeric domains and cross-field consistency.
    pub fn validate(&self) -> EngineResult<()> {
        if self.total_seats == 0 {
            return Err(EngineError::InvalidInput("total seat count must be positive".into()));
        }
        let t = self.majority();
        if t == 0 || t > self.total_seats {
            return Err(EngineError::InvalidInput(format!(
                "majority threshold {t} must be within 1..={}",
                self.total_seats
            )));
        }
        if !(2..=MAX_COALITION_SIZE_LIMIT).contains(&self.max_coalition_size) {
            return Err(EngineError::InvalidInput(format!(
                "max coalition size {} must be within 2..={MAX_COALITION_SIZE_LIMIT}",
                self.max_coalition_size
            )));
        }
        if let Some(floor) = self.minority_floor {
            if floor > t {
                return Err(EngineError::InvalidInput(format!(
                    "minority floor {floor} exceeds majority threshold {t}"
                )));
            }
        }
        if self.entry_threshold_bp > 10_000 {
            return Err(EngineError::InvalidInput(format!(
                "entry threshold {} bp exceeds 100%",
                self.entry_threshold_bp
            )));
        }
        if self.search_timeout_ms == 0 {
            return Err(EngineError::InvalidInput("search timeout must be positive".into()));
        }
        self.stability.validate()
    }
}

impl StabilityPolicy {
    pub fn validate(&self) -> EngineResult<()> {
        let coeffs = [
            ("base", self.base),
            ("party_penalty", self.party_penalty),
            ("surplus_weight", self.surplus_weight),
            ("surplus_cap", self.surplus_cap),
        ];
        for (k, v) in coeffs {
            if !v.is_finite() || v < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "stability.{k} must be finite and non-negative, got {v}"
                )));
            }
        }
        if self.base > 1.0 {
            return Err(EngineError::InvalidInput(format!("stability.base must be <= 1, got {}", self.base)));
        }
        Ok(())
    }
}

/* ---------------------------------- Tests --------------------------------- */
