//! Quantity Unit model
//!
//! Units of measure from the Grocy master data (piece, pack, gram, ...).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A quantity unit. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityUnit {
    #[serde(deserialize_with = "super::de::id")]
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "super::de::empty_string_as_none")]
    pub name_plural: Option<String>,
    #[serde(default, deserialize_with = "super::de::empty_string_as_none")]
    pub description: Option<String>,
}

impl QuantityUnit {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            name_plural: None,
            description: None,
        }
    }

    /// Builder-style plural name
    pub fn with_plural(mut self, name_plural: &str) -> Self {
        self.name_plural = Some(name_plural.to_string());
        self
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            name_plural: row.get("name_plural")?,
            description: row.get("description")?,
        })
    }

    pub(crate) fn insert(conn: &Connection, unit: &QuantityUnit) -> DbResult<()> {
        conn.execute(
            "INSERT INTO quantity_units (id, name, name_plural, description) VALUES (?1, ?2, ?3, ?4)",
            params![unit.id, unit.name, unit.name_plural, unit.description],
        )?;
        Ok(())
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM quantity_units WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(unit) => Ok(Some(unit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All units, ordered by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM quantity_units ORDER BY name COLLATE NOCASE")?;
        let units = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(units)
    }
}
