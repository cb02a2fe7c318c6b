//! Shopping list item model

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A shopping list entry. `amount` is always in the product's stock unit;
/// `unit_id` is the unit the user wants to see it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    #[serde(deserialize_with = "super::de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "super::de::optional_id")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "super::de::amount")]
    pub amount: f64,
    #[serde(rename = "qu_id", default, deserialize_with = "super::de::optional_id")]
    pub unit_id: Option<i64>,
    #[serde(default, deserialize_with = "super::de::empty_string_as_none")]
    pub note: Option<String>,
}

impl ShoppingListItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            product_id: row.get("product_id")?,
            amount: row.get("amount")?,
            unit_id: row.get("qu_id")?,
            note: row.get("note")?,
        })
    }

    pub(crate) fn insert(conn: &Connection, item: &ShoppingListItem) -> DbResult<()> {
        conn.execute(
            "INSERT INTO shopping_list (id, product_id, amount, qu_id, note) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![item.id, item.product_id, item.amount, item.unit_id, item.note],
        )?;
        Ok(())
    }

    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM shopping_list ORDER BY id")?;
        let items = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}
