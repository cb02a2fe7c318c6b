//! Import a Grocy snapshot file into the local database
//!
//! Usage: import_snapshot [--force] <snapshot.json>

use std::path::PathBuf;

use grocy_units::db;
use grocy_units::models::Snapshot;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("grocy_units=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut force = false;
    let mut file = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--force" | "-f" => force = true,
            _ => file = Some(PathBuf::from(arg)),
        }
    }
    let Some(file) = file else {
        eprintln!("Usage: import_snapshot [--force] <snapshot.json>");
        std::process::exit(2);
    };

    let db_path = db::database_path();
    println!("Database path: {}", db_path.display());
    let database = db::open(&db_path)?;

    let snapshot = Snapshot::from_file(&file)?;
    let summary = snapshot.import(&database, force)?;

    if summary.skipped {
        println!("Snapshot {} already imported (use --force to reimport)", summary.db_changed_time);
        return Ok(());
    }

    println!("Imported snapshot {}:", summary.db_changed_time);
    println!("  Quantity units: {}", summary.quantity_units);
    println!("  Products: {}", summary.products);
    println!("  Conversions: {}", summary.conversions);
    println!("  Shopping list items: {}", summary.shopping_list_items);
    println!("  Stock items: {}", summary.stock_items);
    if summary.dangling_unit_refs > 0 {
        println!("  Unknown unit references: {}", summary.dangling_unit_refs);
    }

    Ok(())
}
