//! Catalog tools
//!
//! Read access to quantity units and products.

use serde::Serialize;

use crate::db::Database;
use crate::models::{Product, QuantityUnit, UnitConversionRule};

/// Product with its unit names and conversion rules
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub stock_unit_name: Option<String>,
    pub purchase_unit_name: Option<String>,
    /// Rules scoped to this product plus the generic ones
    pub conversions: Vec<UnitConversionRule>,
}

/// Response for list_products
#[derive(Debug, Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<Product>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for list_quantity_units
#[derive(Debug, Serialize)]
pub struct ListQuantityUnitsResponse {
    pub quantity_units: Vec<QuantityUnit>,
    pub count: usize,
}

pub fn list_quantity_units(db: &Database) -> Result<ListQuantityUnitsResponse, String> {
    let units = db
        .with_conn(QuantityUnit::list)
        .map_err(|e| format!("Failed to list quantity units: {}", e))?;

    Ok(ListQuantityUnitsResponse {
        count: units.len(),
        quantity_units: units,
    })
}

/// Product details, `None` when the id is unknown
pub fn get_product(db: &Database, product_id: i64) -> Result<Option<ProductDetail>, String> {
    db.with_conn(|conn| {
        let Some(product) = Product::get_by_id(conn, product_id)? else {
            return Ok(None);
        };

        let unit_name = |id| -> crate::db::DbResult<Option<String>> {
            Ok(QuantityUnit::get_by_id(conn, id)?.map(|u| u.name))
        };

        Ok(Some(ProductDetail {
            stock_unit_name: unit_name(product.stock_unit_id)?,
            purchase_unit_name: unit_name(product.purchase_unit_id)?,
            conversions: UnitConversionRule::list_for_product(conn, product_id)?,
            product,
        }))
    })
    .map_err(|e| format!("Failed to get product: {}", e))
}

/// Products by name, optionally filtered by a substring
pub fn list_products(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListProductsResponse, String> {
    let limit = limit.clamp(1, 500);
    let offset = offset.max(0);

    db.with_conn(|conn| {
        Ok(ListProductsResponse {
            products: Product::search(conn, query.unwrap_or(""), limit, offset)?,
            total: Product::count(conn)?,
            limit,
            offset,
        })
    })
    .map_err(|e| format!("Failed to list products: {}", e))
}
