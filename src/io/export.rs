//! CSV and text exports.
//!
//! Scenario paths round-trip through CSV between stages; comparison tables are
//! exported as plain string grids that open cleanly in a spreadsheet.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::domain::ScenarioTable;
use crate::error::AppError;
use crate::io::ingest::DATE_COLUMN;

pub(crate) fn create_file(path: &Path) -> Result<File, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new(2, format!("Failed to create directory '{}': {e}", parent.display()))
        })?;
    }
    File::create(path).map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}

/// Write a scenario table as `Date,<factor>...`; missing cells are empty.
pub fn write_scenario_csv(path: &Path, table: &ScenarioTable) -> Result<(), AppError> {
    let header = std::iter::once(DATE_COLUMN.to_string()).chain(table.columns.keys().cloned());
    let rows = table.periods.iter().enumerate().map(|(row, period)| {
        std::iter::once(period.to_string())
            .chain(
                table
                    .columns
                    .values()
                    .map(|values| values[row].map(|v| v.to_string()).unwrap_or_default()),
            )
            .collect::<Vec<_>>()
    });
    write_csv(path, header.collect(), rows)
}

/// Write a header row plus string rows.
pub fn write_table_csv(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<(), AppError> {
    write_csv(path, header.to_vec(), rows.iter().cloned())
}

fn write_csv(
    path: &Path,
    header: Vec<String>,
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Result<(), AppError> {
    let file = create_file(path)?;
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
    let fail = |e: csv::Error| AppError::new(2, format!("Failed to write CSV '{}': {e}", path.display()));

    writer.write_record(&header).map_err(fail)?;
    for row in rows {
        writer.write_record(&row).map_err(fail)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write CSV '{}': {e}", path.display())))
}

/// Write a UTF-8 text artifact (Markdown reports).
pub fn write_text(path: &Path, contents: &str) -> Result<(), AppError> {
    let mut file = create_file(path)?;
    file.write_all(contents.as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Period;
    use crate::io::ingest::read_scenario_csv;

    #[test]
    fn scenario_csv_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("path_SA.csv");

        let mut table = ScenarioTable {
            periods: vec![Period::new(2025, 1).unwrap(), Period::new(2025, 2).unwrap()],
            ..Default::default()
        };
        table.columns.insert("BBB-10Y spread".to_string(), vec![Some(1.8123), None]);
        table.columns.insert("VIX, level".to_string(), vec![Some(65.0), Some(40.5)]);

        write_scenario_csv(&path, &table).unwrap();
        let back = read_scenario_csv(&path).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn table_csv_quotes_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("table.csv");
        let header = vec!["Factor".to_string(), "CCAR 2025".to_string()];
        let rows = vec![vec!["Equity, total".to_string(), "-50.0%".to_string()]];
        write_table_csv(&path, &header, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Factor,CCAR 2025\n\"Equity, total\",-50.0%\n");
    }
}
