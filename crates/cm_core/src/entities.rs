//! crates/cm_core/src/entities.rs
//! Political entities, the immutable catalog they live in, and reference
//! datasets used for historical validation.
//!
//! The catalog is built once from static configuration and never mutated.
//! Red lines are declared per entity but looked up symmetrically.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, EngineError, EngineResult};
use crate::ids::{DimensionId, PartyId};

/// Lower bound of every ideology dimension.
pub const IDEOLOGY_MIN: f64 = -10.0;
/// Upper bound of every ideology dimension.
pub const IDEOLOGY_MAX: f64 = 10.0;
/// Width of one ideology axis; the largest possible per-dimension distance.
pub const IDEOLOGY_RANGE: f64 = IDEOLOGY_MAX - IDEOLOGY_MIN;

/* -------------------------------------------------------------------------- */
/*                               Ideology vector                              */
/* -------------------------------------------------------------------------- */

/// Named scalar positions, one per dimension, each within `[IDEOLOGY_MIN, IDEOLOGY_MAX]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<DimensionId, f64>", into = "BTreeMap<DimensionId, f64>")]
pub struct IdeologyVector(BTreeMap<DimensionId, f64>);

impl IdeologyVector {
    pub fn new(values: BTreeMap<DimensionId, f64>) -> Result<Self, CoreError> {
        for (dim, v) in &values {
            if !v.is_finite() || *v < IDEOLOGY_MIN || *v > IDEOLOGY_MAX {
                return Err(CoreError::DomainOutOfRange(format!(
                    "ideology dimension {dim} = {v} (expected {IDEOLOGY_MIN}..={IDEOLOGY_MAX})"
                )));
            }
        }
        Ok(Self(values))
    }

    #[inline]
    pub fn get(&self, dim: &DimensionId) -> Option<f64> {
        self.0.get(dim).copied()
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &DimensionId> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<DimensionId, f64>> for IdeologyVector {
    type Error = CoreError;
    fn try_from(values: BTreeMap<DimensionId, f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<IdeologyVector> for BTreeMap<DimensionId, f64> {
    fn from(v: IdeologyVector) -> Self {
        v.0
    }
}

/* -------------------------------------------------------------------------- */
/*                              Political entity                              */
/* -------------------------------------------------------------------------- */

/// One party as declared in static configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoliticalEntity {
    pub id: PartyId,
    pub name: String,
    pub abbreviation: String,
    pub ideology: IdeologyVector,
    /// Parties this entity refuses to govern with.
    #[serde(default)]
    pub red_lines: BTreeSet<PartyId>,
    /// Political family (informational).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Party leader at the time of the election (informational).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
}

/// Which side of a pair declared the red line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RedLineDirection {
    /// Only the first party of the pair declared it.
    First,
    /// Only the second party of the pair declared it.
    Second,
    /// Both parties exclude each other.
    Mutual,
}

/* -------------------------------------------------------------------------- */
/*                                   Catalog                                  */
/* -------------------------------------------------------------------------- */

/// Wire shape of a catalog file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDoc {
    pub dimensions: Vec<DimensionId>,
    pub parties: Vec<PoliticalEntity>,
}

/// Immutable set of political entities sharing one ideology space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDoc", into = "CatalogDoc")]
pub struct PoliticalEntityCatalog {
    dimensions: Vec<DimensionId>,
    entities: BTreeMap<PartyId, PoliticalEntity>,
}

impl PoliticalEntityCatalog {
    /// Validate and freeze a catalog.
    ///
    /// Fails with `InvalidInput` on duplicate ids/dimensions, mismatching
    /// ideology dimensions or self-referencing red lines, and with
    /// `UnknownEntity` when a red line targets an id that is not declared.
    pub fn new(dimensions: Vec<DimensionId>, parties: Vec<PoliticalEntity>) -> EngineResult<Self> {
        let dim_set: BTreeSet<&DimensionId> = dimensions.iter().collect();
        if dim_set.len() != dimensions.len() {
            return Err(EngineError::InvalidInput("duplicate ideology dimension".into()));
        }

        let mut entities = BTreeMap::new();
        for p in parties {
            let declared: BTreeSet<&DimensionId> = p.ideology.dimensions().collect();
            if declared != dim_set {
                return Err(EngineError::InvalidInput(format!(
                    "party {} does not declare exactly the catalog dimensions",
                    p.id
                )));
            }
            if p.red_lines.contains(&p.id) {
                return Err(EngineError::InvalidInput(format!("party {} declares a red line against itself", p.id)));
            }
            if entities.contains_key(&p.id) {
                return Err(EngineError::InvalidInput(format!("duplicate party id {}", p.id)));
            }
            entities.insert(p.id.clone(), p);
        }

        for p in entities.values() {
            if let Some(missing) = p.red_lines.iter().find(|t| !entities.contains_key(*t)) {
                return Err(EngineError::UnknownEntity(format!(
                    "{missing} (red line declared by {})",
                    p.id
                )));
            }
        }

        Ok(Self { dimensions, entities })
    }

    /// Look up an entity; unknown ids are an error, never a default.
    pub fn get(&self, id: &PartyId) -> EngineResult<&PoliticalEntity> {
        self.entities
            .get(id)
            .ok_or_else(|| EngineError::UnknownEntity(id.to_string()))
    }

    #[inline]
    pub fn contains(&self, id: &PartyId) -> bool {
        self.entities.contains_key(id)
    }

    /// Declared dimensions in declaration order.
    pub fn dimensions(&self) -> &[DimensionId] {
        &self.dimensions
    }

    /// Entities in canonical id order.
    pub fn iter(&self) -> impl Iterator<Item = &PoliticalEntity> {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PartyId> {
        self.entities.keys()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Short label for reports: the abbreviation, or the id if unknown.
    pub fn display_name<'a>(&'a self, id: &'a PartyId) -> &'a str {
        self.entities
            .get(id)
            .map(|p| p.abbreviation.as_str())
            .unwrap_or(id.as_str())
    }

    /// Red-line relation between `a` and `b`, if any. Symmetric in effect:
    /// `excludes(a, b) == excludes(b, a)`.
    pub fn red_line(&self, a: &PartyId, b: &PartyId) -> Option<RedLineDirection> {
        let ab = self.entities.get(a).is_some_and(|p| p.red_lines.contains(b));
        let ba = self.entities.get(b).is_some_and(|p| p.red_lines.contains(a));
        match (ab, ba) {
            (true, true) => Some(RedLineDirection::Mutual),
            (true, false) => Some(RedLineDirection::First),
            (false, true) => Some(RedLineDirection::Second),
            (false, false) => None,
        }
    }

    #[inline]
    pub fn excludes(&self, a: &PartyId, b: &PartyId) -> bool {
        self.red_line(a, b).is_some()
    }

    /// Every red-line pair once, as `(smaller_id, larger_id)`, in canonical order.
    pub fn red_line_pairs(&self) -> Vec<(PartyId, PartyId)> {
        let mut out = BTreeSet::new();
        for p in self.entities.values() {
            for t in &p.red_lines {
                let pair = if p.id < *t { (p.id.clone(), t.clone()) } else { (t.clone(), p.id.clone()) };
                out.insert(pair);
            }
        }
        out.into_iter().collect()
    }
}

impl TryFrom<CatalogDoc> for PoliticalEntityCatalog {
    type Error = EngineError;
    fn try_from(doc: CatalogDoc) -> Result<Self, Self::Error> {
        Self::new(doc.dimensions, doc.parties)
    }
}

impl From<PoliticalEntityCatalog> for CatalogDoc {
    fn from(c: PoliticalEntityCatalog) -> Self {
        CatalogDoc {
            dimensions: c.dimensions,
            parties: c.entities.into_values().collect(),
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                              Reference datasets                            */
/* -------------------------------------------------------------------------- */

/// A coalition that actually governed after a reference election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoricalCoalition {
    pub name: String,
    pub members: BTreeSet<PartyId>,
}

/// Known real outcome of a past election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceElection {
    pub name: String,
    pub total_seats: u32,
    /// Real seat counts; parties absent from the map won no seats.
    pub seats: BTreeMap<PartyId, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coalition: Option<HistoricalCoalition>,
}

impl ReferenceElection {
    /// Every party id the reference mentions (seats and coalition members).
    pub fn referenced_ids(&self) -> BTreeSet<&PartyId> {
        let mut ids: BTreeSet<&PartyId> = self.seats.keys().collect();
        if let Some(c) = &self.coalition {
            ids.extend(c.members.iter());
        }
        ids
    }
}

/* ---------------------------------- Tests --------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PartyId { s.parse().unwrap() }
    fn did(s: &str) -> DimensionId { s.parse().unwrap() }

    fn entity(id: &str, econ: f64, red: &[&str]) -> PoliticalEntity {
        PoliticalEntity {
            id: pid(id),
            name: id.to_uppercase(),
            abbreviation: id.to_uppercase(),
            ideology: IdeologyVector::new([(did("economic"), econ)].into_iter().collect()).unwrap(),
            red_lines: red.iter().map(|s| pid(s)).collect(),
            family: None,
            leader: None,
        }
    }

    #[test]
    fn ideology_rejects_out_of_range() {
        let bad: BTreeMap<DimensionId, f64> = [(did("economic"), 10.5)].into_iter().collect();
        assert!(IdeologyVector::new(bad).is_err());
        let nan: BTreeMap<DimensionId, f64> = [(did("economic"), f64::NAN)].into_iter().collect();
        assert!(IdeologyVector::new(nan).is_err());
    }

    #[test]
    fn red_lines_are_symmetric() {
        let cat = PoliticalEntityCatalog::new(
            vec![did("economic")],
            vec![entity("a", 1.0, &["b"]), entity("b", 2.0, &[]), entity("c", 3.0, &[])],
        )
        .unwrap();
        assert!(cat.excludes(&pid("a"), &pid("b")));
        assert!(cat.excludes(&pid("b"), &pid("a")));
        assert_eq!(cat.red_line(&pid("b"), &pid("a")), Some(RedLineDirection::Second));
        assert!(!cat.excludes(&pid("a"), &pid("c")));
        assert_eq!(cat.red_line_pairs(), vec![(pid("a"), pid("b"))]);
    }

    #[test]
    fn unknown_red_line_target_is_rejected() {
        let err = PoliticalEntityCatalog::new(vec![did("economic")], vec![entity("a", 0.0, &["zz"])]).unwrap_err();
        assert!(matches!(err, EngineError::UnknownEntity(_)));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let err = PoliticalEntityCatalog::new(vec![did("economic"), did("social")], vec![entity("a", 0.0, &[])])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn duplicate_and_self_red_line_rejected() {
        assert!(PoliticalEntityCatalog::new(vec![did("economic")], vec![entity("a", 0.0, &[]), entity("a", 1.0, &[])]).is_err());
        assert!(PoliticalEntityCatalog::new(vec![did("economic")], vec![entity("a", 0.0, &["a"])]).is_err());
    }

    #[test]
    fn get_unknown_is_error() {
        let cat = PoliticalEntityCatalog::new(vec![did("economic")], vec![entity("a", 0.0, &[])]).unwrap();
        assert!(cat.get(&pid("a")).is_ok());
        assert_eq!(cat.get(&pid("q")).unwrap_err(), EngineError::UnknownEntity("q".into()));
        assert_eq!(cat.display_name(&pid("a")), "A");
    }

    #[test]
    fn catalog_json_roundtrip_validates() {
        let src = r#"{
            "dimensions": ["economic"],
            "parties": [
                {"id": "a", "name": "Alpha", "abbreviation": "A", "ideology": {"economic": -3.0}, "red_lines": ["b"]},
                {"id": "b", "name": "Beta", "abbreviation": "B", "ideology": {"economic": 4.5}}
            ]
        }"#;
        let cat: PoliticalEntityCatalog = serde_json::from_str(src).unwrap();
        assert_eq!(cat.len(), 2);
        assert!(cat.excludes(&pid("b"), &pid("a")));

        let bad = src.replace("\"red_lines\": [\"b\"]", "\"red_lines\": [\"x\"]");
        assert!(serde_json::from_str::<PoliticalEntityCatalog>(&bad).is_err());
    }
}
