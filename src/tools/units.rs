//! Unit conversion tools
//!
//! Factor tables, amount conversion and shopping list amounts for products
//! in the snapshot store.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::models::{Product, Settings, ShoppingListItem, StockItem, UnitConversionRule};
use crate::units::{
    self, resolve_factors, ConversionIndex, ProductIndex, ReferenceUnit, UnitCatalog, UnitFactor,
    UnitFactors,
};

/// One row of a factor table
#[derive(Debug, Serialize)]
pub struct UnitFactorEntry {
    pub unit_id: i64,
    pub unit_name: String,
    /// `identity` | `fixed_product` | `rule`
    pub kind: &'static str,
    pub factor: Option<f64>,
    /// Legacy numeric form, -1 for the reference unit
    pub raw_factor: f64,
}

/// Response for get_unit_factors
#[derive(Debug, Serialize)]
pub struct UnitFactorsResponse {
    pub product_id: i64,
    pub product_name: String,
    pub reference: ReferenceUnit,
    pub reference_unit_id: i64,
    pub reference_unit_name: String,
    pub factors: Vec<UnitFactorEntry>,
}

/// Response for convert_amount
#[derive(Debug, Serialize)]
pub struct ConvertAmountResponse {
    pub product_id: i64,
    pub amount: f64,
    pub reference_unit_name: String,
    pub unit_id: Option<i64>,
    pub unit_name: Option<String>,
    pub converted: f64,
    /// False when no factor applied and `converted` is the input amount
    pub conversion_applied: bool,
    pub display: String,
}

/// Response for amount_in_stock_unit
#[derive(Debug, Serialize)]
pub struct AmountInStockResponse {
    pub product_id: i64,
    pub amount: f64,
    pub unit_id: i64,
    pub stock_unit_id: i64,
    /// None when the unit is the stock unit or has no factor
    pub stock_amount: Option<f64>,
    pub display: Option<String>,
}

/// A shopping list item with its display amount
#[derive(Debug, Serialize)]
pub struct ShoppingListAmount {
    pub id: i64,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub note: Option<String>,
    pub stock_amount: f64,
    pub unit_id: Option<i64>,
    pub unit_name: Option<String>,
    /// Amount in the item's unit, None to show `stock_amount` as is
    pub unit_amount: Option<f64>,
    pub display: String,
}

/// Response for shopping_list_amounts
#[derive(Debug, Serialize)]
pub struct ShoppingListAmountsResponse {
    pub items: Vec<ShoppingListAmount>,
    pub total: usize,
}

/// Response for stock_amount_info
#[derive(Debug, Serialize)]
pub struct StockAmountInfoResponse {
    pub product_id: i64,
    pub product_name: String,
    pub in_stock: bool,
    pub info: String,
}

fn factor_kind(factor: &UnitFactor) -> &'static str {
    match factor {
        UnitFactor::Identity => "identity",
        UnitFactor::FixedProduct(_) => "fixed_product",
        UnitFactor::Rule(_) => "rule",
    }
}

fn load_product(conn: &Connection, product_id: i64) -> Result<Product, String> {
    Product::get_by_id(conn, product_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Product {} not found", product_id))
}

/// Product, catalog and factor table in one go
fn resolve_for_product(
    conn: &Connection,
    product_id: i64,
    reference: ReferenceUnit,
) -> Result<(Product, UnitCatalog, UnitFactors), String> {
    let product = load_product(conn, product_id)?;
    let catalog = UnitCatalog::load(conn).map_err(|e| format!("Database error: {}", e))?;
    let rules = UnitConversionRule::list_for_product(conn, product_id)
        .map_err(|e| format!("Database error: {}", e))?;

    let factors = resolve_factors(&catalog, &rules, &product, reference).map_err(|e| e.to_string())?;
    Ok((product, catalog, factors))
}

fn decimal_places(conn: &Connection) -> Result<u32, String> {
    Settings::load(conn)
        .map(|s| s.stock_decimal_places_amount)
        .map_err(|e| format!("Database error: {}", e))
}

/// Factor table of a product relative to its stock or purchase unit
pub fn get_unit_factors(
    db: &Database,
    product_id: i64,
    reference: ReferenceUnit,
) -> Result<UnitFactorsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let (product, catalog, factors) = resolve_for_product(&conn, product_id, reference)?;

    let entries = factors
        .unit_ids()
        .into_iter()
        .filter_map(|unit_id| {
            let factor = factors.get(unit_id)?;
            Some(UnitFactorEntry {
                unit_id,
                unit_name: catalog.name_of(unit_id),
                kind: factor_kind(&factor),
                factor: factor.value(),
                raw_factor: factor.raw(),
            })
        })
        .collect();

    Ok(UnitFactorsResponse {
        product_id: product.id,
        product_name: product.name,
        reference,
        reference_unit_id: factors.reference_unit_id(),
        reference_unit_name: catalog.name_of(factors.reference_unit_id()),
        factors: entries,
    })
}

/// Express an amount given in the reference unit in `unit_id`
pub fn convert_amount(
    db: &Database,
    product_id: i64,
    unit_id: Option<i64>,
    amount: f64,
    reference: ReferenceUnit,
) -> Result<ConvertAmountResponse, String> {
    if !amount.is_finite() {
        return Err("amount must be a finite number".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let (product, catalog, factors) = resolve_for_product(&conn, product_id, reference)?;
    let places = decimal_places(&conn)?;

    let converted = units::convert(&factors, &product, unit_id, amount);
    let conversion_applied = unit_id
        .and_then(|id| factors.get(id))
        .map_or(false, |f| !f.is_identity());

    // Without a conversion the amount is still in the reference unit
    let display_unit = if conversion_applied {
        unit_id.and_then(|id| catalog.get(id))
    } else {
        catalog.get(factors.reference_unit_id())
    };

    Ok(ConvertAmountResponse {
        product_id: product.id,
        amount,
        reference_unit_name: catalog.name_of(factors.reference_unit_id()),
        unit_id,
        unit_name: unit_id.and_then(|id| catalog.get(id)).map(|u| u.name.clone()),
        converted,
        conversion_applied,
        display: units::amount_with_unit(converted, display_unit, places),
    })
}

/// Amount typed in `unit_id`, expressed in the product's stock unit
pub fn amount_in_stock_unit(
    db: &Database,
    product_id: i64,
    unit_id: i64,
    amount: f64,
) -> Result<AmountInStockResponse, String> {
    if !amount.is_finite() {
        return Err("amount must be a finite number".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let (product, catalog, factors) = resolve_for_product(&conn, product_id, ReferenceUnit::Stock)?;
    let places = decimal_places(&conn)?;

    let stock_amount = units::amount_in_stock_unit(&factors, &product, unit_id, amount);
    let display = stock_amount.map(|a| {
        units::amount_with_unit(a, catalog.get(product.stock_unit_id), places)
    });

    Ok(AmountInStockResponse {
        product_id: product.id,
        amount,
        unit_id,
        stock_unit_id: product.stock_unit_id,
        stock_amount,
        display,
    })
}

/// Every shopping list item with its amount in the item's own unit
pub fn shopping_list_amounts(db: &Database) -> Result<ShoppingListAmountsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let db_err = |e: crate::db::DbError| format!("Database error: {}", e);

    let items = ShoppingListItem::list(&conn).map_err(db_err)?;
    let products = ProductIndex::load(&conn).map_err(db_err)?;
    let catalog = UnitCatalog::load(&conn).map_err(db_err)?;
    let conversions = ConversionIndex::load(&conn).map_err(db_err)?;
    let places = decimal_places(&conn)?;

    let amounts: Vec<ShoppingListAmount> = items
        .into_iter()
        .map(|item| {
            let product = item.product_id.and_then(|id| products.get(id));
            let unit_amount = units::shopping_list_item_amount(&item, &products, &catalog, &conversions);

            let display = match unit_amount {
                Some(a) => units::amount_with_unit(a, item.unit_id.and_then(|id| catalog.get(id)), places),
                None => units::amount_with_unit(
                    item.amount,
                    product.and_then(|p| catalog.get(p.stock_unit_id)),
                    places,
                ),
            };

            ShoppingListAmount {
                id: item.id,
                product_id: item.product_id,
                product_name: product.map(|p| p.name.clone()),
                note: item.note.clone(),
                stock_amount: item.amount,
                unit_id: item.unit_id,
                unit_name: item.unit_id.and_then(|id| catalog.get(id)).map(|u| u.name.clone()),
                unit_amount,
                display,
            }
        })
        .collect();

    Ok(ShoppingListAmountsResponse {
        total: amounts.len(),
        items: amounts,
    })
}

/// Stock line for a product, in its stock unit
pub fn stock_amount_info(db: &Database, product_id: i64) -> Result<StockAmountInfoResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let product = load_product(&conn, product_id)?;
    let catalog = UnitCatalog::load(&conn).map_err(|e| format!("Database error: {}", e))?;
    let places = decimal_places(&conn)?;

    let stock = StockItem::get_for_product(&conn, product_id)
        .map_err(|e| format!("Database error: {}", e))?;
    let in_stock = stock.is_some();
    let stock = stock.unwrap_or(StockItem {
        product_id,
        ..Default::default()
    });

    Ok(StockAmountInfoResponse {
        product_id,
        info: units::stock_amount_info(
            &stock,
            catalog.get(product.stock_unit_id),
            product.no_own_stock,
            places,
        ),
        product_name: product.name,
        in_stock,
    })
}
