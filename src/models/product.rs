//! Product model
//!
//! The slice of a Grocy product that unit conversion needs.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A product with its stock/purchase unit relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "super::de::id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Unit the on-hand quantity is tracked in
    #[serde(rename = "qu_id_stock", deserialize_with = "super::de::id")]
    pub stock_unit_id: i64,
    /// Unit the product is usually bought in
    #[serde(rename = "qu_id_purchase", deserialize_with = "super::de::id")]
    pub purchase_unit_id: i64,
    /// Stock units per purchase unit
    #[serde(rename = "qu_factor_purchase_to_stock", default = "default_factor", deserialize_with = "super::de::factor_or_one")]
    pub purchase_to_stock_factor: f64,
    #[serde(default, deserialize_with = "super::de::flag")]
    pub no_own_stock: bool,
}

fn default_factor() -> f64 {
    1.0
}

impl Product {
    pub fn new(id: i64, stock_unit_id: i64, purchase_unit_id: i64, purchase_to_stock_factor: f64) -> Self {
        Self {
            id,
            name: String::new(),
            stock_unit_id,
            purchase_unit_id,
            purchase_to_stock_factor,
            no_own_stock: false,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            stock_unit_id: row.get("qu_id_stock")?,
            purchase_unit_id: row.get("qu_id_purchase")?,
            purchase_to_stock_factor: row.get("qu_factor_purchase_to_stock")?,
            no_own_stock: row.get("no_own_stock")?,
        })
    }

    pub(crate) fn insert(conn: &Connection, product: &Product) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO products (id, name, qu_id_stock, qu_id_purchase, qu_factor_purchase_to_stock, no_own_stock)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                product.id,
                product.name,
                product.stock_unit_id,
                product.purchase_unit_id,
                product.purchase_to_stock_factor,
                product.no_own_stock,
            ],
        )?;
        Ok(())
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Products whose name contains `query` (all products for an empty query)
    pub fn search(conn: &Connection, query: &str, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query.trim());
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM products
            WHERE name LIKE ?1
            ORDER BY name COLLATE NOCASE ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let products = stmt
            .query_map(params![pattern, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }

    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products ORDER BY id")?;
        let products = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?)
    }
}
