//! Factor selection: project source columns onto the configured factor names.

use indexmap::IndexMap;

use crate::domain::{BaselineSnapshot, FactorMapping, ScenarioTable};
use crate::error::AppError;

fn missing_error(missing: &[&str], source: &str) -> AppError {
    AppError::new(2, format!("Columns missing in '{source}': {}", missing.join(", ")))
}

/// Keep only mapped columns, in mapping order, renamed to their factor names.
pub fn select_path(
    table: &ScenarioTable,
    mapping: &[FactorMapping],
    source: &str,
) -> Result<ScenarioTable, AppError> {
    let missing: Vec<&str> = mapping
        .iter()
        .map(|m| m.source_column.as_str())
        .filter(|col| !table.columns.contains_key(*col))
        .collect();
    if !missing.is_empty() {
        return Err(missing_error(&missing, source));
    }

    let mut columns = IndexMap::with_capacity(mapping.len());
    for m in mapping {
        let values = table.columns[m.source_column.as_str()].clone();
        if columns.insert(m.name.clone(), values).is_some() {
            return Err(AppError::new(2, format!("Factor '{}' is mapped more than once.", m.name)));
        }
    }

    Ok(ScenarioTable {
        periods: table.periods.clone(),
        columns,
    })
}

/// Same projection for the t0 snapshot.
pub fn select_t0(
    t0: &BaselineSnapshot,
    mapping: &[FactorMapping],
    source: &str,
) -> Result<BaselineSnapshot, AppError> {
    let missing: Vec<&str> = mapping
        .iter()
        .map(|m| m.source_column.as_str())
        .filter(|key| !t0.factors.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(missing_error(&missing, source));
    }

    let factors = mapping
        .iter()
        .map(|m| (m.name.clone(), t0.factors[m.source_column.as_str()]))
        .collect();

    Ok(BaselineSnapshot {
        date: t0.date.clone(),
        factors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Period;

    fn mapping() -> Vec<FactorMapping> {
        vec![
            FactorMapping {
                name: "Equities".to_string(),
                source_column: "Dow Jones Total Stock Market Index (Level)".to_string(),
            },
            FactorMapping {
                name: "VIX".to_string(),
                source_column: "Market Volatility Index (Level)".to_string(),
            },
        ]
    }

    #[test]
    fn selects_and_renames_in_mapping_order() {
        let mut t = ScenarioTable {
            periods: vec![Period::new(2025, 1).unwrap()],
            ..Default::default()
        };
        t.columns.insert("Market Volatility Index (Level)".to_string(), vec![Some(65.0)]);
        t.columns.insert("Unmapped".to_string(), vec![Some(1.0)]);
        t.columns.insert("Dow Jones Total Stock Market Index (Level)".to_string(), vec![Some(30000.0)]);

        let selected = select_path(&t, &mapping(), "path_SA_source.csv").unwrap();
        let names: Vec<&str> = selected.columns.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Equities", "VIX"]);
        assert_eq!(selected.column("VIX").unwrap(), &[Some(65.0)]);
    }

    #[test]
    fn missing_source_names_the_file() {
        let t = ScenarioTable::default();
        let err = select_path(&t, &mapping(), "path_SA_source.csv").unwrap_err();
        assert!(err.to_string().contains("path_SA_source.csv"));
        assert!(err.to_string().contains("Market Volatility Index (Level)"));
    }

    #[test]
    fn selects_t0_keeping_nulls() {
        let mut t0 = BaselineSnapshot {
            date: "2024 Q4".to_string(),
            ..Default::default()
        };
        t0.factors.insert("Dow Jones Total Stock Market Index (Level)".to_string(), Some(60000.0));
        t0.factors.insert("Market Volatility Index (Level)".to_string(), None);

        let selected = select_t0(&t0, &mapping(), "t0_source.json").unwrap();
        assert_eq!(selected.date, "2024 Q4");
        assert_eq!(selected.value("Equities"), Some(60000.0));
        assert_eq!(selected.factors.get("VIX"), Some(&None));
    }
}
