//! Tools module
//!
//! MCP tool implementations for Grocy unit conversion.

pub mod catalog;
pub mod settings;
pub mod snapshot;
pub mod status;
pub mod units;
