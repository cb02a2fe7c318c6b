//! Conversion factor types
//!
//! A resolved factor table maps every unit usable with a product to the
//! factor relating it to the table's reference unit.

use std::collections::HashMap;

use serde::Serialize;

/// Numeric form of [`UnitFactor::Identity`] in legacy/serialized output
pub const IDENTITY_SENTINEL: f64 = -1.0;

/// Which of the product's units a factor table is expressed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceUnit {
    #[default]
    Stock,
    Purchase,
}

impl ReferenceUnit {
    pub fn from_stock_flag(relative_to_stock: bool) -> Self {
        if relative_to_stock {
            ReferenceUnit::Stock
        } else {
            ReferenceUnit::Purchase
        }
    }

    /// The opposite fixed unit
    pub fn flipped(&self) -> Self {
        match self {
            ReferenceUnit::Stock => ReferenceUnit::Purchase,
            ReferenceUnit::Purchase => ReferenceUnit::Stock,
        }
    }
}

/// Factor of one unit relative to the reference unit.
///
/// The two non-identity variants follow different conventions:
/// `FixedProduct` is the product's purchase-to-stock factor (stock units per
/// purchase unit), `Rule` is a rule's direct multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "factor", rename_all = "snake_case")]
pub enum UnitFactor {
    /// The reference unit itself; no conversion
    Identity,
    FixedProduct(f64),
    Rule(f64),
}

impl UnitFactor {
    /// Legacy numeric value, `-1` for identity
    pub fn raw(&self) -> f64 {
        match self {
            UnitFactor::Identity => IDENTITY_SENTINEL,
            UnitFactor::FixedProduct(f) | UnitFactor::Rule(f) => *f,
        }
    }

    /// Multiplier, or `None` for identity
    pub fn value(&self) -> Option<f64> {
        match self {
            UnitFactor::Identity => None,
            UnitFactor::FixedProduct(f) | UnitFactor::Rule(f) => Some(*f),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, UnitFactor::Identity)
    }
}

/// Resolved factor table for one product. At most one factor per unit; the
/// first insert for a unit wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFactors {
    reference_unit_id: i64,
    factors: HashMap<i64, UnitFactor>,
}

impl UnitFactors {
    /// Table seeded with the reference unit's identity entry
    pub fn new(reference_unit_id: i64) -> Self {
        let mut factors = HashMap::new();
        factors.insert(reference_unit_id, UnitFactor::Identity);
        Self {
            reference_unit_id,
            factors,
        }
    }

    pub fn reference_unit_id(&self) -> i64 {
        self.reference_unit_id
    }

    /// Insert unless the unit already has a factor. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, unit_id: i64, factor: UnitFactor) -> bool {
        if self.factors.contains_key(&unit_id) {
            return false;
        }
        self.factors.insert(unit_id, factor);
        true
    }

    pub fn get(&self, unit_id: i64) -> Option<UnitFactor> {
        self.factors.get(&unit_id).copied()
    }

    pub fn contains(&self, unit_id: i64) -> bool {
        self.factors.contains_key(&unit_id)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Unit ids in ascending order
    pub fn unit_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.factors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, UnitFactor)> + '_ {
        self.factors.iter().map(|(id, f)| (*id, *f))
    }

    /// Legacy `unit id -> factor` map with `-1` for identity
    pub fn to_raw_map(&self) -> HashMap<i64, f64> {
        self.iter().map(|(id, f)| (id, f.raw())).collect()
    }
}
