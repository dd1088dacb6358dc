//! Scenario CSV ingest and t0 extraction.
//!
//! Source tables have one row per quarter (`Date` = `YYYY Qn`) and one numeric
//! column per macro variable. This module turns them into `ScenarioTable`s:
//! - **Strict schema** for the `Date` column (clear errors + exit code 2)
//! - **Lenient cells**: anything that is not a finite number becomes missing
//! - **Deterministic ordering**: rows sorted by quarter, columns in file order

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use indexmap::IndexMap;

use crate::domain::{BaselineSnapshot, Period, ScenarioTable};
use crate::error::AppError;

pub const DATE_COLUMN: &str = "Date";
/// Free-text label column carried by the published tables; never numeric.
pub const SCENARIO_COLUMN: &str = "Scenario Name";

/// Read one scenario CSV from disk.
pub fn read_scenario_csv(path: &Path) -> Result<ScenarioTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_scenario_table(file, &path.display().to_string())
}

/// Parse a scenario table from any reader. `source` names it in error messages.
pub fn read_scenario_table<R: Read>(reader: R, source: &str) -> Result<ScenarioTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers of '{source}': {e}")))?
        .clone();
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

    let date_idx = names
        .iter()
        .position(|n| n == DATE_COLUMN)
        .ok_or_else(|| AppError::new(2, format!("Missing required column `{DATE_COLUMN}` in '{source}'")))?;

    let value_columns: Vec<(usize, &str)> = names
        .iter()
        .enumerate()
        .filter(|(idx, name)| *idx != date_idx && name.as_str() != SCENARIO_COLUMN)
        .map(|(idx, name)| (idx, name.as_str()))
        .collect();

    let mut rows: Vec<(Period, Vec<Option<f64>>)> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result
            .map_err(|e| AppError::new(2, format!("CSV parse error in '{source}' line {line}: {e}")))?;

        let period = parse_period(&record, date_idx)
            .map_err(|e| AppError::new(2, format!("'{source}' line {line}: {e}")))?;
        let values = value_columns
            .iter()
            .map(|(col, _)| parse_cell(record.get(*col)))
            .collect();
        rows.push((period, values));
    }

    rows.sort_by_key(|(period, _)| *period);
    if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(AppError::new(
            2,
            format!("Duplicate period '{}' in '{source}'", pair[0].0),
        ));
    }

    let mut table = ScenarioTable {
        periods: rows.iter().map(|(p, _)| *p).collect(),
        columns: IndexMap::with_capacity(value_columns.len()),
    };
    for (pos, (_, name)) in value_columns.iter().enumerate() {
        let values = rows.iter().map(|(_, row)| row[pos]).collect();
        if table.columns.insert(name.to_string(), values).is_some() {
            return Err(AppError::new(2, format!("Duplicate column '{name}' in '{source}'")));
        }
    }

    Ok(table)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn parse_period(record: &StringRecord, date_idx: usize) -> Result<Period, String> {
    let raw = record.get(date_idx).unwrap_or("");
    raw.parse()
}

/// Empty, non-numeric and non-finite cells are missing.
pub fn parse_cell(s: Option<&str>) -> Option<f64> {
    let v = s?.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Outer-join tables on period. Columns keep first-seen order.
pub fn merge_tables(tables: &[ScenarioTable]) -> Result<ScenarioTable, AppError> {
    if tables.is_empty() {
        return Err(AppError::new(2, "No scenario tables were provided."));
    }

    let periods: Vec<Period> = tables
        .iter()
        .flat_map(|t| t.periods.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut merged = ScenarioTable {
        periods,
        columns: IndexMap::new(),
    };

    for table in tables {
        let row_of: HashMap<Period, usize> = table
            .periods
            .iter()
            .enumerate()
            .map(|(idx, p)| (*p, idx))
            .collect();

        for (name, values) in &table.columns {
            if merged.columns.contains_key(name) {
                return Err(AppError::new(
                    2,
                    format!("Column '{name}' appears in more than one scenario table."),
                ));
            }
            let aligned = merged
                .periods
                .iter()
                .map(|p| row_of.get(p).and_then(|&idx| values[idx]))
                .collect();
            merged.columns.insert(name.clone(), aligned);
        }
    }

    Ok(merged)
}

/// The last quarter's values: the jumping-off point of the scenario.
pub fn extract_t0(table: &ScenarioTable) -> Result<BaselineSnapshot, AppError> {
    let last = table.periods.len().checked_sub(1).ok_or_else(|| {
        AppError::new(2, "Historic table has no rows; cannot determine t0.")
    })?;

    let factors = table
        .columns
        .iter()
        .map(|(name, values)| (name.clone(), values[last]))
        .collect();

    Ok(BaselineSnapshot {
        date: table.periods[last].to_string(),
        factors,
    })
}

/// Combine the t0 snapshots of several historic tables (one per region).
///
/// Factor names must be unique across regions and every table must end on the
/// same quarter.
pub fn build_t0(tables: &[(&str, ScenarioTable)]) -> Result<BaselineSnapshot, AppError> {
    let mut combined = BaselineSnapshot::default();
    let mut dates: BTreeSet<String> = BTreeSet::new();

    for (region, table) in tables {
        let snapshot = extract_t0(table)?;
        dates.insert(snapshot.date);
        for (name, value) in snapshot.factors {
            if combined.factors.contains_key(&name) {
                return Err(AppError::new(
                    2,
                    format!("Duplicate factor name '{name}' found while merging {region}."),
                ));
            }
            combined.factors.insert(name, value);
        }
    }

    let mut dates = dates.into_iter();
    match (dates.next(), dates.next()) {
        (Some(date), None) => {
            combined.date = date;
            Ok(combined)
        }
        (None, _) => Err(AppError::new(2, "No historic tables were provided.")),
        (Some(first), Some(second)) => Err(AppError::new(
            2,
            format!("Historic tables must share the same t0 date. Found: {first}, {second}"),
        )),
    }
}
