//! Database migrations
//!
//! Schema creation for the snapshot store.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Highest applied migration, 0 for a fresh database
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- REFERENCE DATA
        -- Replaced wholesale by every snapshot import
        -- ============================================
        CREATE TABLE quantity_units (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            name_plural TEXT,
            description TEXT
        );

        CREATE TABLE products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            qu_id_stock INTEGER NOT NULL,        -- no FK: dangling ids surface as lookup errors
            qu_id_purchase INTEGER NOT NULL,
            qu_factor_purchase_to_stock REAL NOT NULL DEFAULT 1.0,
            no_own_stock INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_products_name ON products(name);

        CREATE TABLE quantity_unit_conversions (
            id INTEGER PRIMARY KEY,
            from_qu_id INTEGER NOT NULL,
            to_qu_id INTEGER NOT NULL,
            factor REAL NOT NULL,
            product_id INTEGER                   -- NULL: generic rule
        );

        CREATE INDEX idx_qu_conversions_product ON quantity_unit_conversions(product_id);

        CREATE TABLE shopping_list (
            id INTEGER PRIMARY KEY,
            product_id INTEGER,
            amount REAL NOT NULL DEFAULT 0,      -- in the product's stock unit
            qu_id INTEGER,                       -- display unit
            note TEXT
        );

        CREATE TABLE stock (
            product_id INTEGER PRIMARY KEY,
            amount REAL NOT NULL DEFAULT 0,
            amount_opened REAL NOT NULL DEFAULT 0,
            amount_aggregated REAL NOT NULL DEFAULT 0,
            amount_opened_aggregated REAL NOT NULL DEFAULT 0,
            is_aggregated_amount INTEGER NOT NULL DEFAULT 0
        );

        -- ============================================
        -- SYNC STATE
        -- Single row describing the last imported snapshot
        -- ============================================
        CREATE TABLE sync_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            db_changed_time TEXT NOT NULL,
            imported_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- PREFERENCES
        -- Persisted user settings, key/value
        -- ============================================
        CREATE TABLE preferences (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}
