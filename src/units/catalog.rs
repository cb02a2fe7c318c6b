//! In-memory lookups over the reference data
//!
//! Built once per request from the snapshot store (or from plain vectors)
//! and only read afterwards.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::db::DbResult;
use crate::models::{Product, QuantityUnit, UnitConversionRule};

/// Quantity units by id
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    units: HashMap<i64, QuantityUnit>,
}

impl UnitCatalog {
    pub fn from_units(units: impl IntoIterator<Item = QuantityUnit>) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    pub fn load(conn: &Connection) -> DbResult<Self> {
        Ok(Self::from_units(QuantityUnit::list(conn)?))
    }

    pub fn get(&self, id: i64) -> Option<&QuantityUnit> {
        self.units.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.units.contains_key(&id)
    }

    /// Unit name, or `#<id>` for unknown units
    pub fn name_of(&self, id: i64) -> String {
        self.get(id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Conversion rules grouped by the product they are scoped to
#[derive(Debug, Clone, Default)]
pub struct ConversionIndex {
    by_product: HashMap<i64, Vec<UnitConversionRule>>,
    generic: Vec<UnitConversionRule>,
}

impl ConversionIndex {
    pub fn from_rules(rules: impl IntoIterator<Item = UnitConversionRule>) -> Self {
        let mut index = Self::default();
        for rule in rules {
            match rule.product_id {
                Some(product_id) => index.by_product.entry(product_id).or_default().push(rule),
                None => index.generic.push(rule),
            }
        }
        index
    }

    pub fn load(conn: &Connection) -> DbResult<Self> {
        Ok(Self::from_rules(UnitConversionRule::list_all(conn)?))
    }

    /// Rules scoped to `product_id` only
    pub fn product_rules(&self, product_id: i64) -> &[UnitConversionRule] {
        self.by_product
            .get(&product_id)
            .map(|rules| rules.as_slice())
            .unwrap_or(&[])
    }

    pub fn generic_rules(&self) -> &[UnitConversionRule] {
        &self.generic
    }

    /// The product's own rules followed by every generic rule
    pub fn rules_for(&self, product_id: i64) -> Vec<UnitConversionRule> {
        self.product_rules(product_id)
            .iter()
            .chain(self.generic.iter())
            .cloned()
            .collect()
    }
}

/// Products by id
#[derive(Debug, Clone, Default)]
pub struct ProductIndex {
    products: HashMap<i64, Product>,
}

impl ProductIndex {
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn load(conn: &Connection) -> DbResult<Self> {
        Ok(Self::from_products(Product::list_all(conn)?))
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.products.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_index_groups_by_product() {
        let index = ConversionIndex::from_rules(vec![
            UnitConversionRule::generic(1, 2, 0.5),
            UnitConversionRule::for_product(10, 2, 3, 4.0),
            UnitConversionRule::for_product(11, 2, 3, 8.0),
        ]);

        assert_eq!(index.product_rules(10).len(), 1);
        assert_eq!(index.product_rules(10)[0].factor, 4.0);
        assert!(index.product_rules(99).is_empty());
        assert_eq!(index.generic_rules().len(), 1);

        let rules = index.rules_for(11);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].product_id, Some(11));
        assert!(rules[1].is_generic());
    }

    #[test]
    fn test_catalog_name_of_unknown() {
        let catalog = UnitCatalog::from_units(vec![QuantityUnit::new(1, "Piece")]);
        assert_eq!(catalog.name_of(1), "Piece");
        assert_eq!(catalog.name_of(7), "#7");
        assert!(catalog.contains(1));
    }
}
