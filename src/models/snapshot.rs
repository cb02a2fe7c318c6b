//! Synced snapshots
//!
//! The reference data arrives as one JSON document produced by an external
//! sync. Importing it replaces every reference table in a single
//! transaction; nothing is updated in place.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError, DbResult};
use super::{Product, QuantityUnit, ShoppingListItem, StockItem, UnitConversionRule};

/// Format of Grocy's `db_changed_time`
pub const DB_CHANGED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Could not read snapshot file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid db_changed_time '{0}', expected YYYY-MM-DD HH:MM:SS")]
    InvalidChangedTime(String),

    #[error("Duplicate {entity} id {id} in snapshot")]
    DuplicateId { entity: &'static str, id: i64 },

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Full reference data set, as served by the sync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub db_changed_time: String,
    #[serde(default)]
    pub quantity_units: Vec<QuantityUnit>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub quantity_unit_conversions: Vec<UnitConversionRule>,
    #[serde(default)]
    pub shopping_list: Vec<ShoppingListItem>,
    #[serde(default)]
    pub stock: Vec<StockItem>,
}

/// Outcome of an import
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Same `db_changed_time` as the stored snapshot; nothing was written
    pub skipped: bool,
    pub db_changed_time: String,
    pub quantity_units: usize,
    pub products: usize,
    pub conversions: usize,
    pub shopping_list_items: usize,
    pub stock_items: usize,
    /// Product/rule references to units the snapshot does not define
    pub dangling_unit_refs: usize,
}

/// The last imported snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncState {
    pub db_changed_time: String,
    pub imported_at: String,
}

impl SyncState {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            db_changed_time: row.get("db_changed_time")?,
            imported_at: row.get("imported_at")?,
        })
    }

    pub fn get(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM sync_state WHERE id = 1")?;

        match stmt.query_row([], Self::from_row) {
            Ok(state) => Ok(Some(state)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(conn: &Connection, db_changed_time: &str) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO sync_state (id, db_changed_time)
            VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET
                db_changed_time = excluded.db_changed_time,
                imported_at = datetime('now')
            "#,
            params![db_changed_time],
        )?;
        Ok(())
    }
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn changed_at(&self) -> Result<NaiveDateTime, SnapshotError> {
        NaiveDateTime::parse_from_str(self.db_changed_time.trim(), DB_CHANGED_TIME_FORMAT)
            .map_err(|_| SnapshotError::InvalidChangedTime(self.db_changed_time.clone()))
    }

    /// Reject snapshots that cannot be stored as-is
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.changed_at()?;
        check_unique("quantity unit", self.quantity_units.iter().map(|u| u.id))?;
        check_unique("product", self.products.iter().map(|p| p.id))?;
        check_unique(
            "conversion",
            self.quantity_unit_conversions.iter().map(|c| c.id).filter(|id| *id > 0),
        )?;
        check_unique("shopping list item", self.shopping_list.iter().map(|i| i.id))?;
        check_unique("stock product", self.stock.iter().map(|s| s.product_id))?;
        Ok(())
    }

    /// Count (and log) unit ids referenced by products or rules but not defined.
    /// These are accepted; resolution reports them when they matter.
    pub fn dangling_unit_refs(&self) -> usize {
        let known: HashSet<i64> = self.quantity_units.iter().map(|u| u.id).collect();
        let mut dangling = 0;

        for product in &self.products {
            for unit_id in [product.stock_unit_id, product.purchase_unit_id] {
                if !known.contains(&unit_id) {
                    tracing::warn!("Product {} references unknown quantity unit {}", product.id, unit_id);
                    dangling += 1;
                }
            }
        }
        for rule in &self.quantity_unit_conversions {
            for unit_id in [rule.from_unit_id, rule.to_unit_id] {
                if !known.contains(&unit_id) {
                    tracing::warn!("Conversion {} references unknown quantity unit {}", rule.id, unit_id);
                    dangling += 1;
                }
            }
        }
        dangling
    }

    /// Delete every reference row and insert this snapshot's rows.
    /// Run inside a transaction.
    pub fn replace_all(&self, conn: &Connection) -> DbResult<()> {
        conn.execute_batch(
            "DELETE FROM quantity_units;
             DELETE FROM products;
             DELETE FROM quantity_unit_conversions;
             DELETE FROM shopping_list;
             DELETE FROM stock;",
        )?;

        for unit in &self.quantity_units {
            QuantityUnit::insert(conn, unit)?;
        }
        for product in &self.products {
            Product::insert(conn, product)?;
        }
        for rule in &self.quantity_unit_conversions {
            UnitConversionRule::insert(conn, rule)?;
        }
        for item in &self.shopping_list {
            ShoppingListItem::insert(conn, item)?;
        }
        for item in &self.stock {
            StockItem::insert(conn, item)?;
        }

        SyncState::set(conn, self.db_changed_time.trim())
    }

    /// Validate and store the snapshot. Unless `force` is set, a snapshot
    /// with the stored `db_changed_time` is skipped.
    pub fn import(&self, db: &Database, force: bool) -> Result<ImportSummary, SnapshotError> {
        self.validate()?;

        let mut summary = ImportSummary {
            skipped: false,
            db_changed_time: self.db_changed_time.trim().to_string(),
            quantity_units: self.quantity_units.len(),
            products: self.products.len(),
            conversions: self.quantity_unit_conversions.len(),
            shopping_list_items: self.shopping_list.len(),
            stock_items: self.stock.len(),
            dangling_unit_refs: 0,
        };

        let current = db.with_conn(SyncState::get)?;
        if !force {
            if let Some(state) = current {
                if state.db_changed_time == summary.db_changed_time {
                    tracing::info!(
                        "Snapshot {} already imported, skipping",
                        summary.db_changed_time
                    );
                    summary.skipped = true;
                    return Ok(summary);
                }
            }
        }

        summary.dangling_unit_refs = self.dangling_unit_refs();
        db.with_transaction(|tx| self.replace_all(tx))?;

        tracing::info!(
            "Imported snapshot {}: {} units, {} products, {} conversions",
            summary.db_changed_time,
            summary.quantity_units,
            summary.products,
            summary.conversions
        );
        Ok(summary)
    }
}

fn check_unique(entity: &'static str, ids: impl Iterator<Item = i64>) -> Result<(), SnapshotError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SnapshotError::DuplicateId { entity, id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    const SNAPSHOT: &str = r#"{
        "db_changed_time": "2024-03-01 10:00:00",
        "quantity_units": [
            {"id": 1, "name": "Piece", "name_plural": "Pieces"},
            {"id": 2, "name": "Pack", "name_plural": "Packs", "description": ""}
        ],
        "products": [
            {"id": 10, "name": "Eggs", "qu_id_stock": "1", "qu_id_purchase": "2",
             "qu_factor_purchase_to_stock": "6", "no_own_stock": "0"}
        ],
        "quantity_unit_conversions": [
            {"id": 1, "from_qu_id": 2, "to_qu_id": 1, "factor": 6, "product_id": ""},
            {"id": 2, "from_qu_id": 1, "to_qu_id": 3, "factor": 0.5, "product_id": "10"}
        ],
        "shopping_list": [
            {"id": 1, "product_id": 10, "amount": 12, "qu_id": 2},
            {"id": 2, "product_id": null, "amount": 1, "note": "Bread"}
        ],
        "stock": [
            {"product_id": 10, "amount": "18", "amount_opened": "2"}
        ]
    }"#;

    fn database() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();
        db
    }

    #[test]
    fn test_parse_grocy_json() {
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.products[0].purchase_to_stock_factor, 6.0);
        assert_eq!(snapshot.quantity_units[1].description, None);
        assert!(snapshot.quantity_unit_conversions[0].is_generic());
        assert!(snapshot.quantity_unit_conversions[1].applies_only_to(10));
        assert_eq!(snapshot.shopping_list[1].product_id, None);
        assert_eq!(snapshot.stock[0].amount_opened, 2.0);
    }

    #[test]
    fn test_parse_string_ids_and_null_amounts() {
        let snapshot = Snapshot::from_json(
            r#"{
                "db_changed_time": "2024-03-01 10:00:00",
                "quantity_units": [{"id": "1", "name": "Piece"}, {"id": "2", "name": "Pack"}],
                "products": [{"id": "10", "name": "Eggs", "qu_id_stock": "1", "qu_id_purchase": "2",
                              "qu_factor_purchase_to_stock": null}],
                "shopping_list": [{"id": "3", "product_id": "10", "amount": null, "qu_id": "2"}],
                "stock": [{"product_id": "10", "amount": null, "amount_opened": "1"}]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.quantity_units[0].id, 1);
        assert_eq!(snapshot.products[0].id, 10);
        assert_eq!(snapshot.products[0].purchase_to_stock_factor, 1.0);
        assert_eq!(snapshot.shopping_list[0].amount, 0.0);
        assert_eq!(snapshot.stock[0].amount, 0.0);
        assert_eq!(snapshot.stock[0].amount_opened, 1.0);

        let db = database();
        assert!(!snapshot.import(&db, false).unwrap().skipped);
        db.with_conn(|conn| {
            assert_eq!(Product::get_by_id(conn, 10)?.map(|p| p.stock_unit_id), Some(1));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_import_and_skip_unchanged() {
        let db = database();
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();

        let summary = snapshot.import(&db, false).unwrap();
        assert!(!summary.skipped);
        assert_eq!(summary.products, 1);
        // rule 2 targets unit 3, which the snapshot does not define
        assert_eq!(summary.dangling_unit_refs, 1);

        let again = snapshot.import(&db, false).unwrap();
        assert!(again.skipped);

        let forced = snapshot.import(&db, true).unwrap();
        assert!(!forced.skipped);
    }

    #[test]
    fn test_import_replaces_previous_rows() {
        let db = database();
        Snapshot::from_json(SNAPSHOT).unwrap().import(&db, false).unwrap();

        let next = Snapshot {
            db_changed_time: "2024-03-02 08:00:00".to_string(),
            quantity_units: vec![QuantityUnit::new(5, "Gram")],
            ..Default::default()
        };
        next.import(&db, false).unwrap();

        db.with_conn(|conn| {
            assert_eq!(QuantityUnit::list(conn)?.len(), 1);
            assert_eq!(Product::count(conn)?, 0);
            assert!(UnitConversionRule::list_all(conn)?.is_empty());
            assert!(ShoppingListItem::list(conn)?.is_empty());
            let state = SyncState::get(conn)?.unwrap();
            assert_eq!(state.db_changed_time, "2024-03-02 08:00:00");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_rejects_bad_changed_time_and_duplicates() {
        let mut snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        snapshot.db_changed_time = "yesterday".to_string();
        assert!(matches!(snapshot.validate(), Err(SnapshotError::InvalidChangedTime(_))));

        let mut snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        snapshot.quantity_units.push(QuantityUnit::new(1, "Duplicate"));
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::DuplicateId { entity: "quantity unit", id: 1 })
        ));
    }
}
