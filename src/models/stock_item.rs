//! Stock item model
//!
//! Current stock of a product, in its stock unit. Aggregated amounts include
//! sub-products of a parent product.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    #[serde(deserialize_with = "super::de::id")]
    pub product_id: i64,
    #[serde(default, deserialize_with = "super::de::amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "super::de::amount")]
    pub amount_opened: f64,
    #[serde(default, deserialize_with = "super::de::amount")]
    pub amount_aggregated: f64,
    #[serde(default, deserialize_with = "super::de::amount")]
    pub amount_opened_aggregated: f64,
    #[serde(default, deserialize_with = "super::de::flag")]
    pub is_aggregated_amount: bool,
}

impl StockItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            product_id: row.get("product_id")?,
            amount: row.get("amount")?,
            amount_opened: row.get("amount_opened")?,
            amount_aggregated: row.get("amount_aggregated")?,
            amount_opened_aggregated: row.get("amount_opened_aggregated")?,
            is_aggregated_amount: row.get("is_aggregated_amount")?,
        })
    }

    pub(crate) fn insert(conn: &Connection, item: &StockItem) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO stock (
                product_id, amount, amount_opened,
                amount_aggregated, amount_opened_aggregated, is_aggregated_amount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                item.product_id,
                item.amount,
                item.amount_opened,
                item.amount_aggregated,
                item.amount_opened_aggregated,
                item.is_aggregated_amount,
            ],
        )?;
        Ok(())
    }

    pub fn get_for_product(conn: &Connection, product_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM stock WHERE product_id = ?1")?;

        match stmt.query_row([product_id], Self::from_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
