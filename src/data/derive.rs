//! Derived macro features.
//!
//! - an indexed Real GDP level built from annualized quarterly growth rates
//! - BBB and mortgage spreads over the 10-year Treasury yield
//!
//! Derived columns are placed right after the column they are computed from so
//! the intermediate files read naturally.

use indexmap::IndexMap;

use crate::domain::{BaselineSnapshot, ScenarioTable};
use crate::error::AppError;

pub const REAL_GDP_GROWTH: &str = "Real GDP growth";
pub const REAL_GDP_LEVEL: &str = "Real GDP level (index)";
pub const TEN_YEAR_YIELD: &str = "10-year Treasury yield";
pub const BBB_YIELD: &str = "BBB corporate yield";
pub const BBB_SPREAD: &str = "BBB-10Y spread";
pub const MORTGAGE_RATE: &str = "Mortgage rate";
pub const MORTGAGE_SPREAD: &str = "Mortgage-10Y spread";

/// GDP level at t0.
pub const GDP_BASE_LEVEL: f64 = 100.0;

const DERIVED_DIGITS: i32 = 4;

fn round4(v: f64) -> f64 {
    let scale = 10f64.powi(DERIVED_DIGITS);
    (v * scale).round() / scale
}

/// Chain annualized growth rates into a level index starting at `base`.
///
/// A missing growth rate yields a missing level and does not advance the index.
pub fn real_gdp_level(growth: &[Option<f64>], base: f64) -> Vec<Option<f64>> {
    let mut level = base;
    growth
        .iter()
        .map(|g| {
            g.map(|g| {
                level *= (1.0 + g / 100.0).powf(0.25);
                round4(level)
            })
        })
        .collect()
}

/// Element-wise `a - b`, missing if either side is missing.
pub fn spread(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(a, b)| Some(round4((*a)? - (*b)?)))
        .collect()
}

/// Insert (or replace) `name` immediately after `anchor`.
pub fn insert_column_after(
    table: &mut ScenarioTable,
    anchor: &str,
    name: &str,
    values: Vec<Option<f64>>,
) -> Result<(), AppError> {
    table.columns.shift_remove(name);
    let pos = table
        .columns
        .get_index_of(anchor)
        .ok_or_else(|| AppError::new(2, format!("Anchor column '{anchor}' not found in scenario path.")))?;
    table.columns.shift_insert(pos + 1, name.to_string(), values);
    Ok(())
}

/// Insert (or replace) `key` immediately after `anchor`, or at the end if the
/// anchor is absent.
pub fn insert_key_after(
    map: &mut IndexMap<String, Option<f64>>,
    anchor: &str,
    key: &str,
    value: Option<f64>,
) {
    map.shift_remove(key);
    match map.get_index_of(anchor) {
        Some(pos) => {
            map.shift_insert(pos + 1, key.to_string(), value);
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

fn column<'a>(table: &'a ScenarioTable, name: &str) -> Result<&'a [Option<f64>], AppError> {
    table
        .column(name)
        .ok_or_else(|| AppError::new(2, format!("Required column '{name}' not found in scenario path.")))
}

/// Add the derived columns to a scenario path.
pub fn derive_path(table: &mut ScenarioTable) -> Result<(), AppError> {
    let gdp_level = real_gdp_level(column(table, REAL_GDP_GROWTH)?, GDP_BASE_LEVEL);
    let ten_year = column(table, TEN_YEAR_YIELD)?;
    let bbb_spread = spread(column(table, BBB_YIELD)?, ten_year);
    let mortgage_spread = spread(column(table, MORTGAGE_RATE)?, ten_year);

    insert_column_after(table, REAL_GDP_GROWTH, REAL_GDP_LEVEL, gdp_level)?;
    insert_column_after(table, BBB_YIELD, BBB_SPREAD, bbb_spread)?;
    insert_column_after(table, MORTGAGE_RATE, MORTGAGE_SPREAD, mortgage_spread)?;
    Ok(())
}

/// Add the derived keys to a t0 snapshot.
pub fn derive_t0(t0: &mut BaselineSnapshot) {
    let ten_year = t0.value(TEN_YEAR_YIELD);
    let diff = |a: Option<f64>| Some(round4(a? - ten_year?));
    let bbb_spread = diff(t0.value(BBB_YIELD));
    let mortgage_spread = diff(t0.value(MORTGAGE_RATE));

    insert_key_after(&mut t0.factors, REAL_GDP_GROWTH, REAL_GDP_LEVEL, Some(GDP_BASE_LEVEL));
    insert_key_after(&mut t0.factors, BBB_YIELD, BBB_SPREAD, bbb_spread);
    insert_key_after(&mut t0.factors, MORTGAGE_RATE, MORTGAGE_SPREAD, mortgage_spread);
}
