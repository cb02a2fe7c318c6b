//! Quantity unit conversion
//!
//! Resolves a product's unit factor table and converts amounts with it.

pub mod catalog;
pub mod convert;
pub mod factor;
pub mod format;
pub mod resolver;

pub use catalog::{ConversionIndex, ProductIndex, UnitCatalog};
pub use convert::{amount_in_stock_unit, convert, shopping_list_item_amount};
pub use factor::{ReferenceUnit, UnitFactor, UnitFactors, IDENTITY_SENTINEL};
pub use format::{
    amount_with_unit, stock_amount_info, stock_entry_amount_info, trim_amount, unit_label,
};
pub use resolver::{resolve_factors, resolve_stock_factors, LookupError, UnitRole};
