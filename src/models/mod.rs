//! Data models
//!
//! Grocy reference data as stored in the local snapshot store.

mod de;
mod field_states;
mod product;
mod quantity_unit;
mod settings;
mod shopping_list_item;
mod snapshot;
mod stock_item;
mod unit_conversion;

pub use field_states::{FieldState, FieldStates, MULTI_SEPARATOR, RECIPE_FIELDS, VALUE_SEPARATOR};
pub use product::Product;
pub use quantity_unit::QuantityUnit;
pub use settings::{keys, RecipesSortMode, Settings, SettingsUpdate, MAX_DECIMAL_PLACES_AMOUNT};
pub use shopping_list_item::ShoppingListItem;
pub use snapshot::{ImportSummary, Snapshot, SnapshotError, SyncState, DB_CHANGED_TIME_FORMAT};
pub use stock_item::StockItem;
pub use unit_conversion::UnitConversionRule;
