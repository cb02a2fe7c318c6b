//! Snapshot tools
//!
//! Import a synced snapshot file and report what is currently stored.

use std::path::Path;

use serde::Serialize;

use crate::db::Database;
use crate::models::{ImportSummary, Product, Snapshot, SyncState};

/// Response for sync_state
#[derive(Debug, Serialize)]
pub struct SyncStateResponse {
    /// False until the first snapshot has been imported
    pub imported: bool,
    pub db_changed_time: Option<String>,
    pub imported_at: Option<String>,
    pub quantity_units: i64,
    pub products: i64,
    pub conversions: i64,
}

/// Read, validate and import a snapshot file
pub fn import_snapshot(db: &Database, path: &Path, force: bool) -> Result<ImportSummary, String> {
    let snapshot = Snapshot::from_file(path).map_err(|e| e.to_string())?;
    snapshot
        .import(db, force)
        .map_err(|e| format!("Import failed: {}", e))
}

pub fn sync_state(db: &Database) -> Result<SyncStateResponse, String> {
    db.with_conn(|conn| {
        let state = SyncState::get(conn)?;
        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        };

        Ok(SyncStateResponse {
            imported: state.is_some(),
            db_changed_time: state.as_ref().map(|s| s.db_changed_time.clone()),
            imported_at: state.map(|s| s.imported_at),
            quantity_units: count("quantity_units")?,
            products: Product::count(conn)?,
            conversions: count("quantity_unit_conversions")?,
        })
    })
    .map_err(|e| format!("Failed to read sync state: {}", e))
}
