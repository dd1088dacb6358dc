//! Current scenario vs. archived scenarios, one row per scenario.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::ShockData;
use crate::error::AppError;
use crate::report::render_template;
use crate::template::{Locals, RenderContext, RenderOptions, default_repr};

pub const TABLE_NAME: &str = "table_vs_history";

const AVERAGE_TAG: &str = "Average";
const CRISIS_TAG: &str = "Financial Crisis";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTableConfig {
    #[serde(default = "default_scenario_name")]
    pub scenario_name: String,
    pub factor_order: Vec<String>,
    /// Optional presentation per factor (matched by `source`).
    #[serde(default)]
    pub columns: Vec<HistoryColumn>,
}

fn default_scenario_name() -> String {
    "CCAR 2025 FRB SA".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryColumn {
    pub source: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Cell template with local `shock`, e.g. `"{shock:.1f}"`.
    #[serde(default)]
    pub template: Option<String>,
}

/// `{ scenario: { factor: shock | null } }`
pub type HistoryTable = IndexMap<String, IndexMap<String, Option<f64>>>;

/// Scalar shock per configured factor; ranges and unknown factors are `null`.
pub fn build_history(config: &HistoryTableConfig, shocks: &ShockData) -> HistoryTable {
    let values = config
        .factor_order
        .iter()
        .map(|factor| {
            let value = shocks.get(factor).and_then(|r| r.shock_value.as_scalar());
            (factor.clone(), value)
        })
        .collect();
    IndexMap::from([(config.scenario_name.clone(), values)])
}

/// Regular scenarios, then averages, then the current scenario, then crisis benchmarks.
pub fn scenario_order<'a>(history: &'a HistoryTable, current: &'a str) -> Vec<&'a str> {
    let archived: Vec<&str> = history
        .keys()
        .map(String::as_str)
        .filter(|name| *name != current)
        .collect();

    let regular = archived
        .iter()
        .filter(|name| !name.contains(AVERAGE_TAG) && !name.contains(CRISIS_TAG));
    let averages = archived
        .iter()
        .filter(|name| name.contains(AVERAGE_TAG) && !name.contains(CRISIS_TAG));
    let crises = archived.iter().filter(|name| name.contains(CRISIS_TAG));

    regular
        .chain(averages)
        .copied()
        .chain(std::iter::once(current))
        .chain(crises.copied())
        .collect()
}

pub fn history_rows(
    config: &HistoryTableConfig,
    current: &HistoryTable,
    history: &HistoryTable,
    ctx: &RenderContext<'_>,
) -> Result<(Vec<String>, Vec<Vec<String>>), AppError> {
    let column_of = |factor: &str| config.columns.iter().find(|c| c.source == factor);
    let current_name = config.scenario_name.as_str();

    let mut header = vec!["Scenario".to_string()];
    let mut symbols = vec![String::new()];
    let mut units = vec![String::new()];
    for factor in &config.factor_order {
        let column = column_of(factor);
        header.push(column.and_then(|c| c.header.clone()).unwrap_or_else(|| factor.clone()));
        symbols.push(column.and_then(|c| c.symbol.clone()).unwrap_or_default());
        units.push(column.and_then(|c| c.unit.clone()).unwrap_or_default());
    }

    let mut rows = Vec::new();
    if symbols.iter().any(|s| !s.is_empty()) {
        rows.push(symbols);
    }
    if units.iter().any(|u| !u.is_empty()) {
        rows.push(units);
    }

    for scenario in scenario_order(history, current_name) {
        let values = if scenario == current_name {
            current.get(scenario)
        } else {
            history.get(scenario)
        };

        let mut row = vec![scenario.to_string()];
        for factor in &config.factor_order {
            let value = values.and_then(|v| v.get(factor).copied().flatten());
            let template = column_of(factor).and_then(|c| c.template.as_deref());
            row.push(match (value, template) {
                (None, _) => String::new(),
                (Some(v), None) => default_repr(v),
                (Some(v), Some(template)) => {
                    let locals = Locals::from([("shock".to_string(), v)]);
                    render_template(template, &ctx.with_locals(&locals), RenderOptions::default())?
                }
            });
        }
        rows.push(row);
    }

    Ok((header, rows))
}
