//! Status Tool
//!
//! Runtime status of the service and usage notes for the unit tools.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::SyncState;

/// Usage notes for assistants driving the unit tools
pub const UNIT_INSTRUCTIONS: &str = r#"
# Grocy Unit Conversion Instructions

Products are tracked in a **stock unit** and usually bought in a **purchase
unit**. `qu_factor_purchase_to_stock` says how many stock units one purchase
unit holds (a pack of 6 eggs: stock unit Piece, purchase unit Pack, factor 6).

---

## Loading Data

The store is filled from a Grocy snapshot JSON file:

1. Call `sync_state` to see whether a snapshot is loaded and how old it is
2. Call `import_snapshot` with the file path
3. An unchanged `db_changed_time` is skipped; pass `force: true` to reimport

Every import replaces all units, products, conversions, shopping list items
and stock rows.

---

## Factor Tables

`get_unit_factors` lists every unit usable with a product and its factor
relative to the **reference unit** (the stock unit by default, the purchase
unit with `relative_to_stock: false`).

| kind | Meaning |
|------|---------|
| identity | The reference unit itself. `raw_factor` is -1 |
| fixed_product | The other fixed unit; the product's purchase-to-stock factor |
| rule | A conversion rule; product-specific rules win over generic ones |

Rules are only used when their target unit exists. Generic rules only count
when they start from the reference unit.

If a product's stock or purchase unit is missing the tools return an error
("Could not load quantity units ..."). Do not guess a unit in that case;
tell the user the product data is inconsistent.

---

## Converting Amounts

- `convert_amount`: amount **in the reference unit** -> amount in `unit_id`
  - 18 Pieces of eggs as Packs -> 3
  - The purchase unit divides by its factor; rule units multiply
  - Unknown units and the reference unit return the amount unchanged
    (`conversion_applied: false`)
- `amount_in_stock_unit`: amount **typed in `unit_id`** -> stock units
  - 3 Packs of eggs -> 18 Pieces
  - Returns null when `unit_id` is already the stock unit

Use `amount_in_stock_unit` when the user says "I bought 3 packs"; use
`convert_amount` to show a stock amount in another unit.

---

## Shopping List and Stock

- `shopping_list_amounts`: every item with its amount shown in the item's
  own unit (items are stored in stock units)
- `stock_amount_info`: the stock line of one product, e.g.
  `18 Pieces 2 opened`

Displayed numbers use `stock_decimal_places_amount` from `get_settings`.
"#;

/// Runtime status of the service
#[derive(Debug, Clone, Serialize)]
pub struct UnitsStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub snapshot: Option<SyncState>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> UnitsStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let snapshot = match db.with_conn(SyncState::get) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Could not read sync state: {}", e);
                None
            }
        };

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        UnitsStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            snapshot,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
