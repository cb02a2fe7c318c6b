//! Database module
//!
//! Local SQLite store for synced Grocy snapshots: pooled connections and
//! schema migrations.

use std::path::PathBuf;

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

/// Environment variable overriding the database location
pub const DATABASE_PATH_ENV: &str = "GROCY_UNITS_DATABASE_PATH";

/// Database path from `GROCY_UNITS_DATABASE_PATH`, or `data/grocy_units.db`
/// under the project root
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // target/{debug,release} -> project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(root) = path.parent().and_then(|p| p.parent()) {
                    path = root.to_path_buf();
                }
            }

            path.push("data");
            path.push("grocy_units.db");
            path
        })
}

/// Open the database at `path`, creating its directory, and migrate it
pub fn open(path: &std::path::Path) -> Result<Database, Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(path)?;
    let version = database.with_conn(|conn| {
        migrations::run_migrations(conn)?;
        migrations::get_schema_version(conn)
    })?;
    tracing::info!("Database {} at schema version {}", path.display(), version);

    Ok(database)
}
