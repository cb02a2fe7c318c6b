//! Unit factor resolution
//!
//! Builds a product's factor table from its stock/purchase relationship and
//! the conversion rules known to the system.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::catalog::UnitCatalog;
use super::factor::{ReferenceUnit, UnitFactor, UnitFactors};
use crate::models::{Product, UnitConversionRule};

/// Which of the product's units a lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitRole {
    Reference,
    Stock,
    Purchase,
}

impl fmt::Display for UnitRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitRole::Reference => write!(f, "reference"),
            UnitRole::Stock => write!(f, "stock"),
            UnitRole::Purchase => write!(f, "purchase"),
        }
    }
}

/// The catalog and the product disagree. Callers should show this to the
/// user instead of substituting a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Could not load quantity units: {role} unit {unit_id} of product {product_id} is not in the catalog")]
    MissingUnit {
        role: UnitRole,
        unit_id: i64,
        product_id: i64,
    },
}

/// Resolve the factor table of `product` against its stock or purchase unit.
///
/// Order of insertion, first insert per unit wins:
/// 1. reference unit as identity
/// 2. the other fixed unit with the product's purchase-to-stock factor
/// 3. rules scoped to this product, any from-unit
/// 4. generic rules whose from-unit is the reference unit
///
/// Rules pointing at units missing from the catalog are skipped.
pub fn resolve_factors(
    catalog: &UnitCatalog,
    all_rules: &[UnitConversionRule],
    product: &Product,
    reference: ReferenceUnit,
) -> Result<UnitFactors, LookupError> {
    let missing = |role, unit_id| LookupError::MissingUnit {
        role,
        unit_id,
        product_id: product.id,
    };

    let reference_id = match reference {
        ReferenceUnit::Stock => product.stock_unit_id,
        ReferenceUnit::Purchase => product.purchase_unit_id,
    };
    let reference_unit = catalog
        .get(reference_id)
        .ok_or_else(|| missing(UnitRole::Reference, reference_id))?;
    let stock_unit = catalog
        .get(product.stock_unit_id)
        .ok_or_else(|| missing(UnitRole::Stock, product.stock_unit_id))?;
    let purchase_unit = catalog
        .get(product.purchase_unit_id)
        .ok_or_else(|| missing(UnitRole::Purchase, product.purchase_unit_id))?;

    let mut factors = UnitFactors::new(reference_unit.id);

    let other_fixed = match reference {
        ReferenceUnit::Stock => purchase_unit,
        ReferenceUnit::Purchase => stock_unit,
    };
    factors.insert_if_absent(
        other_fixed.id,
        UnitFactor::FixedProduct(product.purchase_to_stock_factor),
    );

    // Product overrides go first so they win over the generic rules below
    for rule in all_rules.iter().filter(|r| r.applies_only_to(product.id)) {
        insert_rule(catalog, &mut factors, rule);
    }

    for rule in all_rules
        .iter()
        .filter(|r| r.is_generic() && r.from_unit_id == reference_unit.id)
    {
        insert_rule(catalog, &mut factors, rule);
    }

    Ok(factors)
}

/// [`resolve_factors`] against the stock unit
pub fn resolve_stock_factors(
    catalog: &UnitCatalog,
    all_rules: &[UnitConversionRule],
    product: &Product,
) -> Result<UnitFactors, LookupError> {
    resolve_factors(catalog, all_rules, product, ReferenceUnit::Stock)
}

fn insert_rule(catalog: &UnitCatalog, factors: &mut UnitFactors, rule: &UnitConversionRule) {
    if !catalog.contains(rule.to_unit_id) {
        tracing::debug!(
            "Skipping conversion {}: target unit {} not in catalog",
            rule.id,
            rule.to_unit_id
        );
        return;
    }
    factors.insert_if_absent(rule.to_unit_id, UnitFactor::Rule(rule.factor));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuantityUnit;

    const PIECE: i64 = 1;
    const PACK: i64 = 2;
    const GRAM: i64 = 3;
    const BOX: i64 = 4;

    fn catalog() -> UnitCatalog {
        UnitCatalog::from_units(vec![
            QuantityUnit::new(PIECE, "Piece"),
            QuantityUnit::new(PACK, "Pack"),
            QuantityUnit::new(GRAM, "Gram"),
            QuantityUnit::new(BOX, "Box"),
        ])
    }

    fn eggs() -> Product {
        Product::new(10, PIECE, PACK, 6.0)
    }

    #[test]
    fn test_same_stock_and_purchase_unit_only_identity() {
        let product = Product::new(10, PIECE, PIECE, 1.0);
        let factors = resolve_stock_factors(&catalog(), &[], &product).unwrap();
        assert_eq!(factors.len(), 1);
        assert_eq!(factors.get(PIECE), Some(UnitFactor::Identity));
    }

    #[test]
    fn test_distinct_units_without_rules() {
        let factors = resolve_stock_factors(&catalog(), &[], &eggs()).unwrap();
        assert_eq!(factors.len(), 2);
        assert_eq!(factors.reference_unit_id(), PIECE);
        assert_eq!(factors.get(PIECE), Some(UnitFactor::Identity));
        assert_eq!(factors.get(PACK), Some(UnitFactor::FixedProduct(6.0)));
        assert_eq!(factors.to_raw_map().get(&PIECE), Some(&-1.0));
        assert_eq!(factors.to_raw_map().get(&PACK), Some(&6.0));
    }

    #[test]
    fn test_purchase_reference() {
        let factors = resolve_factors(&catalog(), &[], &eggs(), ReferenceUnit::Purchase).unwrap();
        assert_eq!(factors.reference_unit_id(), PACK);
        assert_eq!(factors.get(PACK), Some(UnitFactor::Identity));
        assert_eq!(factors.get(PIECE), Some(UnitFactor::FixedProduct(6.0)));
    }

    #[test]
    fn test_product_rule_beats_generic_in_any_order() {
        let generic = UnitConversionRule::generic(PIECE, GRAM, 50.0);
        let specific = UnitConversionRule::for_product(10, PIECE, GRAM, 62.5);

        for rules in [
            vec![generic.clone(), specific.clone()],
            vec![specific.clone(), generic.clone()],
        ] {
            let factors = resolve_stock_factors(&catalog(), &rules, &eggs()).unwrap();
            assert_eq!(factors.get(GRAM), Some(UnitFactor::Rule(62.5)));
        }
    }

    #[test]
    fn test_product_rules_ignore_from_unit() {
        // Scoped rule from pack to box still lands in a piece-relative table
        let rules = vec![UnitConversionRule::for_product(10, PACK, BOX, 0.1)];
        let factors = resolve_stock_factors(&catalog(), &rules, &eggs()).unwrap();
        assert_eq!(factors.get(BOX), Some(UnitFactor::Rule(0.1)));
    }

    #[test]
    fn test_generic_rules_need_reference_from_unit() {
        let rules = vec![
            UnitConversionRule::generic(PACK, BOX, 0.25),
            UnitConversionRule::generic(PIECE, GRAM, 50.0),
        ];
        let factors = resolve_stock_factors(&catalog(), &rules, &eggs()).unwrap();
        assert!(!factors.contains(BOX));
        assert_eq!(factors.get(GRAM), Some(UnitFactor::Rule(50.0)));
    }

    #[test]
    fn test_rules_never_override_fixed_units() {
        let rules = vec![
            UnitConversionRule::for_product(10, PIECE, PACK, 99.0),
            UnitConversionRule::for_product(10, PACK, PIECE, 99.0),
            UnitConversionRule::generic(PIECE, PACK, 42.0),
        ];
        let factors = resolve_stock_factors(&catalog(), &rules, &eggs()).unwrap();
        assert_eq!(factors.get(PIECE), Some(UnitFactor::Identity));
        assert_eq!(factors.get(PACK), Some(UnitFactor::FixedProduct(6.0)));
    }

    #[test]
    fn test_other_products_rules_ignored() {
        let rules = vec![UnitConversionRule::for_product(11, PIECE, GRAM, 50.0)];
        let factors = resolve_stock_factors(&catalog(), &rules, &eggs()).unwrap();
        assert!(!factors.contains(GRAM));
    }

    #[test]
    fn test_rule_to_unknown_unit_skipped() {
        let rules = vec![
            UnitConversionRule::for_product(10, PIECE, 77, 3.0),
            UnitConversionRule::generic(PIECE, 78, 3.0),
        ];
        let factors = resolve_stock_factors(&catalog(), &rules, &eggs()).unwrap();
        assert_eq!(factors.len(), 2);
    }

    #[test]
    fn test_missing_units_are_lookup_errors() {
        let product = Product::new(10, 55, PACK, 6.0);
        let err = resolve_stock_factors(&catalog(), &[], &product).unwrap_err();
        assert_eq!(
            err,
            LookupError::MissingUnit {
                role: UnitRole::Reference,
                unit_id: 55,
                product_id: 10
            }
        );

        let product = Product::new(10, PIECE, 56, 6.0);
        let err = resolve_stock_factors(&catalog(), &[], &product).unwrap_err();
        assert!(matches!(
            err,
            LookupError::MissingUnit { role: UnitRole::Purchase, unit_id: 56, .. }
        ));

        let err = resolve_factors(&catalog(), &[], &product, ReferenceUnit::Purchase).unwrap_err();
        assert!(matches!(err, LookupError::MissingUnit { role: UnitRole::Reference, .. }));
        assert!(err.to_string().contains("reference unit 56 of product 10"));
    }

    #[test]
    fn test_inputs_untouched() {
        let rules = vec![UnitConversionRule::generic(PIECE, GRAM, 50.0)];
        let before = rules.clone();
        let first = resolve_stock_factors(&catalog(), &rules, &eggs()).unwrap();
        let second = resolve_stock_factors(&catalog(), &rules, &eggs()).unwrap();
        assert_eq!(rules, before);
        assert_eq!(first, second);
    }
}
