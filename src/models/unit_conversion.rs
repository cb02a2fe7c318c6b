//! Quantity unit conversion rules
//!
//! `factor` converts one `from_unit_id` into `to_unit_id`. A rule with a
//! `product_id` only applies to that product and overrides generic rules.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversionRule {
    #[serde(default, deserialize_with = "super::de::id")]
    pub id: i64,
    #[serde(rename = "from_qu_id", deserialize_with = "super::de::id")]
    pub from_unit_id: i64,
    #[serde(rename = "to_qu_id", deserialize_with = "super::de::id")]
    pub to_unit_id: i64,
    #[serde(deserialize_with = "super::de::number")]
    pub factor: f64,
    #[serde(default, deserialize_with = "super::de::optional_id")]
    pub product_id: Option<i64>,
}

impl UnitConversionRule {
    /// Rule valid for every product
    pub fn generic(from_unit_id: i64, to_unit_id: i64, factor: f64) -> Self {
        Self {
            id: 0,
            from_unit_id,
            to_unit_id,
            factor,
            product_id: None,
        }
    }

    /// Rule scoped to a single product
    pub fn for_product(product_id: i64, from_unit_id: i64, to_unit_id: i64, factor: f64) -> Self {
        Self {
            product_id: Some(product_id),
            ..Self::generic(from_unit_id, to_unit_id, factor)
        }
    }

    pub fn is_generic(&self) -> bool {
        self.product_id.is_none()
    }

    pub fn applies_only_to(&self, product_id: i64) -> bool {
        self.product_id == Some(product_id)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            from_unit_id: row.get("from_qu_id")?,
            to_unit_id: row.get("to_qu_id")?,
            factor: row.get("factor")?,
            product_id: row.get("product_id")?,
        })
    }

    pub(crate) fn insert(conn: &Connection, rule: &UnitConversionRule) -> DbResult<()> {
        // id 0 means "not from the server": let SQLite assign one
        let id = if rule.id > 0 { Some(rule.id) } else { None };
        conn.execute(
            r#"
            INSERT INTO quantity_unit_conversions (id, from_qu_id, to_qu_id, factor, product_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![id, rule.from_unit_id, rule.to_unit_id, rule.factor, rule.product_id],
        )?;
        Ok(())
    }

    /// Every rule, generic and product specific, in server order
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM quantity_unit_conversions ORDER BY id")?;
        let rules = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Rules relevant to one product: its own overrides plus all generic rules
    pub fn list_for_product(conn: &Connection, product_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM quantity_unit_conversions
            WHERE product_id = ?1 OR product_id IS NULL
            ORDER BY id
            "#,
        )?;
        let rules = stmt
            .query_map([product_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }
}
