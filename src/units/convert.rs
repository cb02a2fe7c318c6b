//! Amount conversion with a resolved factor table
//!
//! Direction convention: [`convert`] takes an amount in the table's
//! reference unit and expresses it in `unit` (18 pieces in stock -> 3 packs).
//! The purchase unit's factor is "reference units per purchase unit" and is
//! divided by; every other factor is multiplied by. The branch is keyed on
//! the unit id, not on the factor kind.

use super::catalog::{ConversionIndex, ProductIndex, UnitCatalog};
use super::factor::{UnitFactor, UnitFactors};
use super::resolver::resolve_stock_factors;
use crate::models::{Product, ShoppingListItem};

/// Express `amount` (in the reference unit) in `unit`.
///
/// Lenient: `None`, unknown units and the reference unit itself return the
/// amount unchanged.
pub fn convert(factors: &UnitFactors, product: &Product, unit: Option<i64>, amount: f64) -> f64 {
    let Some(unit_id) = unit else {
        return amount;
    };
    let Some(factor) = factors.get(unit_id) else {
        return amount;
    };

    match factor {
        UnitFactor::Identity => amount,
        UnitFactor::FixedProduct(f) | UnitFactor::Rule(f) => {
            if unit_id == product.purchase_unit_id {
                amount / f
            } else {
                amount * f
            }
        }
    }
}

/// Inverse of [`convert`] for a stock-relative table: `amount` typed in
/// `unit`, expressed in the product's stock unit.
///
/// `None` when `unit` is already the stock unit or has no factor.
pub fn amount_in_stock_unit(
    factors: &UnitFactors,
    product: &Product,
    unit: i64,
    amount: f64,
) -> Option<f64> {
    if unit == product.stock_unit_id {
        return None;
    }

    match factors.get(unit)? {
        UnitFactor::Identity => Some(amount),
        UnitFactor::FixedProduct(f) | UnitFactor::Rule(f) => {
            if unit == product.purchase_unit_id {
                Some(amount * f)
            } else {
                Some(amount / f)
            }
        }
    }
}

/// Display amount of a shopping list item in the item's own unit.
///
/// `None` means "show the stored amount as is": the item has no product,
/// the product or its units are unknown, the item's unit has no factor, or
/// the item's unit is the stock unit.
///
/// The factors come from [`resolve_stock_factors`], so generic rules count
/// and the first factor per unit wins. Grocy's own shopping list instead lets
/// the last product rule for a unit win, even over the purchase unit's fixed
/// factor; this departs from that on purpose so the shopping list agrees
/// with every other conversion.
pub fn shopping_list_item_amount(
    item: &ShoppingListItem,
    products: &ProductIndex,
    catalog: &UnitCatalog,
    conversions: &ConversionIndex,
) -> Option<f64> {
    let product = products.get(item.product_id?)?;
    let unit_id = item.unit_id?;

    let rules = conversions.rules_for(product.id);
    let factors = match resolve_stock_factors(catalog, &rules, product) {
        Ok(factors) => factors,
        Err(e) => {
            tracing::debug!("No amount for shopping list item {}: {}", item.id, e);
            return None;
        }
    };

    match factors.get(unit_id)? {
        UnitFactor::Identity => None,
        _ => Some(convert(&factors, product, Some(unit_id), item.amount)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuantityUnit, UnitConversionRule};
    use crate::units::factor::ReferenceUnit;
    use crate::units::resolver::resolve_factors;

    const PIECE: i64 = 1;
    const PACK: i64 = 2;
    const GRAM: i64 = 3;
    const EPSILON: f64 = 1e-9;

    fn catalog() -> UnitCatalog {
        UnitCatalog::from_units(vec![
            QuantityUnit::new(PIECE, "Piece"),
            QuantityUnit::new(PACK, "Pack"),
            QuantityUnit::new(GRAM, "Gram"),
        ])
    }

    fn eggs() -> Product {
        Product::new(10, PIECE, PACK, 6.0)
    }

    fn stock_table(rules: &[UnitConversionRule]) -> UnitFactors {
        resolve_stock_factors(&catalog(), rules, &eggs()).unwrap()
    }

    #[test]
    fn test_reference_unit_unchanged() {
        let factors = stock_table(&[]);
        for amount in [0.0, 1.0, 3.5, -2.0, 1e12] {
            assert_eq!(convert(&factors, &eggs(), Some(PIECE), amount), amount);
        }
    }

    #[test]
    fn test_unknown_or_missing_unit_unchanged() {
        let factors = stock_table(&[]);
        assert_eq!(convert(&factors, &eggs(), None, 4.0), 4.0);
        assert_eq!(convert(&factors, &eggs(), Some(GRAM), 4.0), 4.0);
        assert_eq!(convert(&factors, &eggs(), Some(999), 4.0), 4.0);
    }

    #[test]
    fn test_purchase_unit_divides() {
        let factors = stock_table(&[]);
        // 3 pieces are half a pack; 18 pieces are 3 packs
        assert!((convert(&factors, &eggs(), Some(PACK), 3.0) - 0.5).abs() < EPSILON);
        assert!((convert(&factors, &eggs(), Some(PACK), 18.0) - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_rule_unit_multiplies() {
        let factors = stock_table(&[UnitConversionRule::generic(PIECE, GRAM, 50.0)]);
        assert!((convert(&factors, &eggs(), Some(GRAM), 3.0) - 150.0).abs() < EPSILON);
    }

    #[test]
    fn test_amount_in_stock_unit() {
        let factors = stock_table(&[UnitConversionRule::generic(PIECE, GRAM, 50.0)]);
        // 3 packs are 18 pieces
        assert_eq!(amount_in_stock_unit(&factors, &eggs(), PACK, 3.0), Some(18.0));
        assert_eq!(amount_in_stock_unit(&factors, &eggs(), GRAM, 100.0), Some(2.0));
        assert_eq!(amount_in_stock_unit(&factors, &eggs(), PIECE, 3.0), None);
        assert_eq!(amount_in_stock_unit(&factors, &eggs(), 999, 3.0), None);
    }

    #[test]
    fn test_amount_in_stock_unit_inverts_convert() {
        let factors = stock_table(&[UnitConversionRule::generic(PIECE, GRAM, 50.0)]);
        for unit in [PACK, GRAM] {
            let shown = convert(&factors, &eggs(), Some(unit), 7.25);
            let back = amount_in_stock_unit(&factors, &eggs(), unit, shown).unwrap();
            assert!((back - 7.25).abs() < EPSILON);
        }
    }

    #[test]
    fn test_round_trip_through_flipped_table() {
        let product = eggs();
        let stock_relative = stock_table(&[]);
        let purchase_relative =
            resolve_factors(&catalog(), &[], &product, ReferenceUnit::Stock.flipped()).unwrap();

        for amount in [1.0, 3.0, 0.1, 123.456] {
            let packs = convert(&stock_relative, &product, Some(PACK), amount);
            let pieces = convert(&purchase_relative, &product, Some(PIECE), packs);
            assert!((pieces - amount).abs() < EPSILON, "{} -> {} -> {}", amount, packs, pieces);
        }
    }

    fn shopping_fixture() -> (ProductIndex, UnitCatalog, ConversionIndex) {
        (
            ProductIndex::from_products(vec![eggs()]),
            catalog(),
            ConversionIndex::from_rules(vec![
                UnitConversionRule::generic(PIECE, GRAM, 50.0),
                UnitConversionRule::for_product(10, PIECE, GRAM, 60.0),
            ]),
        )
    }

    fn item(product_id: Option<i64>, unit_id: Option<i64>, amount: f64) -> ShoppingListItem {
        ShoppingListItem {
            id: 1,
            product_id,
            amount,
            unit_id,
            note: None,
        }
    }

    #[test]
    fn test_shopping_list_item_amount() {
        let (products, catalog, conversions) = shopping_fixture();
        let amount = |i: &ShoppingListItem| shopping_list_item_amount(i, &products, &catalog, &conversions);

        assert_eq!(amount(&item(Some(10), Some(PACK), 12.0)), Some(2.0));
        // product rule wins over the generic one
        assert_eq!(amount(&item(Some(10), Some(GRAM), 2.0)), Some(120.0));
        // already in stock unit
        assert_eq!(amount(&item(Some(10), Some(PIECE), 12.0)), None);
    }

    #[test]
    fn test_shopping_list_keeps_fixed_purchase_factor() {
        let products = ProductIndex::from_products(vec![eggs()]);
        let conversions = ConversionIndex::from_rules(vec![UnitConversionRule::for_product(10, PIECE, PACK, 0.1)]);
        let amount = shopping_list_item_amount(&item(Some(10), Some(PACK), 12.0), &products, &catalog(), &conversions);
        assert_eq!(amount, Some(2.0));
    }

    #[test]
    fn test_shopping_list_item_without_usable_product() {
        let (products, catalog, conversions) = shopping_fixture();
        let amount = |i: &ShoppingListItem| shopping_list_item_amount(i, &products, &catalog, &conversions);

        assert_eq!(amount(&item(None, Some(PACK), 1.0)), None);
        assert_eq!(amount(&item(Some(99), Some(PACK), 1.0)), None);
        assert_eq!(amount(&item(Some(10), None, 1.0)), None);
        assert_eq!(amount(&item(Some(10), Some(999), 1.0)), None);

        let broken = ProductIndex::from_products(vec![Product::new(10, PIECE, 42, 6.0)]);
        assert_eq!(
            shopping_list_item_amount(&item(Some(10), Some(PIECE), 1.0), &broken, &catalog, &conversions),
            None
        );
    }
}
