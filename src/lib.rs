//! Grocy Units Library
//!
//! Quantity unit factor resolution and amount conversion for Grocy
//! products, backed by a local snapshot store.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod units;
