//! Current vs. last year's scenarios.
//!
//! Each configured factor gets a display string rendered from a cell template
//! with locals derived from its shock result:
//!
//! - scalar shock: `shock`, `delta` (= shock × `delta_scale`), `extreme`
//! - range shock: `high`, `low`, `extreme_high`, `extreme_low`

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::{ShockResult, ShockValue};
use crate::error::AppError;
use crate::report::render_template;
use crate::template::{Locals, RenderContext, RenderOptions};

pub const TABLE_NAME: &str = "table_vs_lastyear";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastYearConfig {
    #[serde(default = "default_scenario_name")]
    pub scenario_name: String,
    #[serde(default)]
    pub factors: Vec<LastYearCell>,
}

fn default_scenario_name() -> String {
    "Unknown Scenario".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastYearCell {
    pub source: String,
    pub template: String,
    #[serde(default)]
    pub delta_scale: Option<f64>,
}

/// A shock result plus its rendered display string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastYearEntry {
    #[serde(flatten)]
    pub result: ShockResult,
    pub display: String,
}

/// `{ scenario: { factor: entry } }`
pub type LastYearTable = IndexMap<String, IndexMap<String, LastYearEntry>>;

/// Only the display string of archived scenarios is used.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryCell {
    #[serde(default)]
    pub display: String,
}

pub type LastYearHistory = IndexMap<String, IndexMap<String, HistoryCell>>;

/// Locals available to a cell template.
pub fn cell_locals(result: &ShockResult, delta_scale: Option<f64>) -> Locals {
    let mut locals = Locals::new();
    match result.shock_value {
        ShockValue::Scalar(shock) => {
            locals.insert("shock".to_string(), shock);
            locals.insert("delta".to_string(), shock * delta_scale.unwrap_or(1.0));
        }
        ShockValue::Range { min, max } => {
            locals.insert("high".to_string(), min.max(max));
            locals.insert("low".to_string(), min.min(max));
        }
    }
    match result.extreme_value {
        ShockValue::Scalar(extreme) => {
            locals.insert("extreme".to_string(), extreme);
        }
        ShockValue::Range { min, max } => {
            locals.insert("extreme_high".to_string(), min.max(max));
            locals.insert("extreme_low".to_string(), min.min(max));
        }
    }
    locals
}

pub fn build_lastyear(config: &LastYearConfig, ctx: &RenderContext<'_>) -> Result<LastYearTable, AppError> {
    let mut rows = IndexMap::with_capacity(config.factors.len());
    for cell in &config.factors {
        let result = ctx.shocks.get(&cell.source).ok_or_else(|| {
            AppError::new(
                3,
                format!("Factor '{}' in {TABLE_NAME} has no shock result.", cell.source),
            )
        })?;
        let locals = cell_locals(result, cell.delta_scale);
        let display = render_template(&cell.template, &ctx.with_locals(&locals), RenderOptions::default())?;
        rows.insert(
            cell.source.clone(),
            LastYearEntry {
                result: result.clone(),
                display,
            },
        );
    }

    Ok(IndexMap::from([(config.scenario_name.clone(), rows)]))
}

/// Spreadsheet grid: one row per factor, archived scenarios (sorted) then the current one.
pub fn lastyear_rows(
    config: &LastYearConfig,
    current: &LastYearTable,
    history: &LastYearHistory,
) -> (Vec<String>, Vec<Vec<String>>) {
    let mut scenarios: Vec<&String> = history.keys().collect();
    scenarios.sort();

    let mut header = vec!["Factor".to_string()];
    header.extend(scenarios.iter().map(|s| s.to_string()));
    header.extend(current.keys().cloned());

    let rows = config
        .factors
        .iter()
        .map(|cell| {
            let factor = cell.source.as_str();
            let mut row = vec![factor.to_string()];
            row.extend(scenarios.iter().map(|s| {
                history[s.as_str()]
                    .get(factor)
                    .map(|c| c.display.clone())
                    .unwrap_or_default()
            }));
            row.extend(current.values().map(|table| {
                table
                    .get(factor)
                    .map(|e| e.display.clone())
                    .unwrap_or_default()
            }));
            row
        })
        .collect();

    (header, rows)
}
