// Utility functions
use crate::model::Price;
use chrono::{Local, NaiveDate};

pub const SENTINEL: f64 = -1.0;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a price cell. Empty cells and `-1` mean "no observation".
pub fn parse_price(raw: &str) -> Option<Price> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(Price::Unobserved);
    }
    let value = raw.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    if value == SENTINEL {
        Some(Price::Unobserved)
    } else {
        Some(Price::Observed(value))
    }
}

pub fn format_price(price: Price) -> String {
    match price {
        Price::Observed(value) => value.to_string(),
        Price::Unobserved => "-1".to_string(),
    }
}

/// Upper-cases the first character and lower-cases the rest ("lg " -> "Lg ").
pub fn capitalize(keyword: &str) -> String {
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Canonical form of a row key: trimmed, and integers without leading zeros
/// or sign so that `01`, ` 1` and `1` join as the same product.
pub fn normalize_uid(raw: &str) -> String {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(value) => value.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today_label() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

pub fn is_iso_date(label: &str) -> bool {
    NaiveDate::parse_from_str(label, DATE_FORMAT).is_ok()
}
