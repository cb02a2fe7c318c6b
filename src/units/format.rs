//! Amount display
//!
//! Truncation to the configured number of decimal places happens here and
//! only here; resolution and conversion never round.

use crate::models::{QuantityUnit, StockItem};

/// Format `amount` with at most `max_decimal_places` decimals, without
/// trailing zeros
pub fn trim_amount(amount: f64, max_decimal_places: u32) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let formatted = format!("{:.*}", max_decimal_places as usize, amount);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };

    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Singular name for exactly one, plural name (if any) otherwise
pub fn unit_label(unit: &QuantityUnit, amount: f64) -> &str {
    if amount == 1.0 {
        return &unit.name;
    }
    unit.name_plural.as_deref().unwrap_or(&unit.name)
}

/// `"<amount> <unit>"`, unit omitted when unknown
pub fn amount_with_unit(amount: f64, unit: Option<&QuantityUnit>, max_decimal_places: u32) -> String {
    let number = trim_amount(amount, max_decimal_places);
    match unit {
        Some(unit) => format!("{} {}", number, unit_label(unit, amount)),
        None => number,
    }
}

fn push_amount(
    out: &mut String,
    amount: f64,
    opened: f64,
    unit: Option<&QuantityUnit>,
    max_decimal_places: u32,
) {
    out.push_str(&amount_with_unit(amount, unit, max_decimal_places));
    if opened > 0.0 {
        out.push_str(&format!(" {} opened", trim_amount(opened, max_decimal_places)));
    }
}

/// Line for a single stock entry, e.g. `"6 Pieces opened"`
pub fn stock_entry_amount_info(
    amount: f64,
    opened: bool,
    unit: Option<&QuantityUnit>,
    max_decimal_places: u32,
) -> String {
    let mut out = amount_with_unit(amount, unit, max_decimal_places);
    if opened {
        out.push_str(" opened");
    }
    out
}

/// Stock line for a product, e.g. `"18 Pieces 2 opened  ∑ 24 Pieces"`.
///
/// The product's own amount is left out for products without own stock;
/// the aggregated part only appears for aggregated stock items.
pub fn stock_amount_info(
    stock: &StockItem,
    unit: Option<&QuantityUnit>,
    no_own_stock: bool,
    max_decimal_places: u32,
) -> String {
    let mut out = String::new();

    if !no_own_stock {
        push_amount(&mut out, stock.amount, stock.amount_opened, unit, max_decimal_places);
    }

    if stock.is_aggregated_amount {
        if !out.is_empty() {
            out.push_str("  ");
        }
        out.push_str("∑ ");
        push_amount(
            &mut out,
            stock.amount_aggregated,
            stock.amount_opened_aggregated,
            unit,
            max_decimal_places,
        );
    }

    out
}
