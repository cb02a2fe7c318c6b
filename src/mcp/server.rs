//! Grocy Units MCP Server Implementation
//!
//! Exposes the unit conversion, catalog, snapshot and settings tools.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::tools::status::{StatusTracker, UNIT_INSTRUCTIONS};
use crate::tools::{catalog, settings, snapshot, units};
use crate::units::ReferenceUnit;

/// Grocy Units MCP Service
#[derive(Clone)]
pub struct GrocyUnitsService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<GrocyUnitsService>,
}

impl GrocyUnitsService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Snapshot Parameters
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportSnapshotParams {
    /// Path of the snapshot JSON file
    pub path: String,
    /// Reimport even if db_changed_time is unchanged
    #[serde(default)]
    pub force: bool,
}

// ============================================================================
// Catalog Parameters
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetProductParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListProductsParams {
    /// Substring of the product name
    pub query: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

// ============================================================================
// Unit Parameters
// ============================================================================

fn default_relative_to_stock() -> bool { true }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUnitFactorsParams {
    pub product_id: i64,
    /// Factors relative to the stock unit (default) or the purchase unit
    #[serde(default = "default_relative_to_stock")]
    pub relative_to_stock: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertAmountParams {
    pub product_id: i64,
    /// Amount in the reference unit
    pub amount: f64,
    /// Target unit; omitted returns the amount unchanged
    pub unit_id: Option<i64>,
    #[serde(default = "default_relative_to_stock")]
    pub relative_to_stock: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AmountInStockUnitParams {
    pub product_id: i64,
    /// Unit the amount is given in
    pub unit_id: i64,
    pub amount: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StockAmountInfoParams {
    pub product_id: i64,
}

// ============================================================================
// Settings Parameters
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateSettingsParams {
    /// name, calories or due_score
    pub recipes_sort_mode: Option<String>,
    pub recipes_sort_ascending: Option<bool>,
    pub beginner_mode: Option<bool>,
    /// 0 to 10
    pub stock_decimal_places_amount: Option<u32>,
    /// Recipe list fields to show or hide, e.g. {"calories": true}.
    /// Fields: due_score, fulfillment, calories, desired_servings, picture
    pub recipes_fields: Option<BTreeMap<String, bool>>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl GrocyUnitsService {
    // --- Status ---

    #[tool(description = "Get the current status of the service including build info, database status, last imported snapshot and process information")]
    async fn units_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get instructions for the unit conversion tools: reference units, factor kinds and which conversion direction each tool uses. Call this before converting amounts.")]
    async fn unit_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(UNIT_INSTRUCTIONS)]))
    }

    // --- Snapshot ---

    #[tool(description = "Import a Grocy snapshot JSON file, replacing all units, products, conversions, shopping list and stock. Skipped when db_changed_time is unchanged unless force=true.")]
    fn import_snapshot(&self, Parameters(p): Parameters<ImportSnapshotParams>) -> Result<CallToolResult, McpError> {
        let result = snapshot::import_snapshot(&self.database, std::path::Path::new(&p.path), p.force)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Show which snapshot is loaded (db_changed_time, import time) and row counts")]
    fn sync_state(&self) -> Result<CallToolResult, McpError> {
        let result = snapshot::sync_state(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Catalog ---

    #[tool(description = "List all quantity units")]
    fn list_quantity_units(&self) -> Result<CallToolResult, McpError> {
        let result = catalog::list_quantity_units(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a product with its stock/purchase unit names and the conversion rules that apply to it")]
    fn get_product(&self, Parameters(p): Parameters<GetProductParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::get_product(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(product) => serde_json::to_string_pretty(&product),
            None => Ok(format!(r#"{{"error": "Product not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List products by name with optional substring filter and pagination")]
    fn list_products(&self, Parameters(p): Parameters<ListProductsParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::list_products(&self.database, p.query.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Units ---

    #[tool(description = "Get a product's unit factor table relative to its stock unit (default) or purchase unit")]
    fn get_unit_factors(&self, Parameters(p): Parameters<GetUnitFactorsParams>) -> Result<CallToolResult, McpError> {
        let reference = ReferenceUnit::from_stock_flag(p.relative_to_stock);
        let result = units::get_unit_factors(&self.database, p.product_id, reference)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Express an amount given in the reference unit (stock unit by default) in another unit of the product")]
    fn convert_amount(&self, Parameters(p): Parameters<ConvertAmountParams>) -> Result<CallToolResult, McpError> {
        let reference = ReferenceUnit::from_stock_flag(p.relative_to_stock);
        let result = units::convert_amount(&self.database, p.product_id, p.unit_id, p.amount, reference)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Convert an amount typed in some unit of the product into the product's stock unit (e.g. 3 packs -> 18 pieces)")]
    fn amount_in_stock_unit(&self, Parameters(p): Parameters<AmountInStockUnitParams>) -> Result<CallToolResult, McpError> {
        let result = units::amount_in_stock_unit(&self.database, p.product_id, p.unit_id, p.amount)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List shopping list items with their amounts shown in each item's own unit")]
    fn shopping_list_amounts(&self) -> Result<CallToolResult, McpError> {
        let result = units::shopping_list_amounts(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the formatted stock line of a product (amount, opened amount, aggregated sum)")]
    fn stock_amount_info(&self, Parameters(p): Parameters<StockAmountInfoParams>) -> Result<CallToolResult, McpError> {
        let result = units::stock_amount_info(&self.database, p.product_id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Settings ---

    #[tool(description = "Get the current settings (recipe sorting, recipe list fields, beginner mode, decimal places for amounts)")]
    fn get_settings(&self) -> Result<CallToolResult, McpError> {
        let result = settings::get_settings(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update settings. Only the provided fields change.")]
    fn update_settings(&self, Parameters(p): Parameters<UpdateSettingsParams>) -> Result<CallToolResult, McpError> {
        let result = settings::update_settings(
            &self.database,
            p.recipes_sort_mode.as_deref(),
            p.recipes_sort_ascending,
            p.beginner_mode,
            p.stock_decimal_places_amount,
            p.recipes_fields,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for GrocyUnitsService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "grocy-units".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Grocy Units".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Grocy Units - quantity unit factors and amount conversion for Grocy products. \
                 IMPORTANT: Call unit_instructions before converting amounts. \
                 Data: import_snapshot loads a Grocy snapshot file, sync_state shows what is loaded. \
                 Catalog: list_quantity_units, get_product, list_products. \
                 Units: get_unit_factors, convert_amount (reference unit -> unit), \
                 amount_in_stock_unit (unit -> stock unit), shopping_list_amounts, stock_amount_info. \
                 Settings: get_settings, update_settings."
                    .into(),
            ),
        }
    }
}
