//! Current scenario vs. the historical scenario average and the GFC benchmark.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::ShockData;
use crate::error::AppError;
use crate::report::render_template;
use crate::template::{Locals, RenderContext, RenderOptions};

pub const TABLE_NAME: &str = "table_vs_avg_gfc";

pub const MORE_SEVERE: &str = "more severe";
pub const LESS_SEVERE: &str = "less severe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvgGfcConfig {
    #[serde(default = "default_scenario_name")]
    pub scenario_name: String,
    #[serde(default = "default_average_label")]
    pub average_label: String,
    #[serde(default = "default_gfc_label")]
    pub gfc_label: String,
    #[serde(default)]
    pub factor_groups: Vec<FactorGroup>,
}

fn default_scenario_name() -> String {
    "CCAR 2025 (SA)".to_string()
}

fn default_average_label() -> String {
    "CCAR Avg.".to_string()
}

fn default_gfc_label() -> String {
    "GFC Shock".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorGroup {
    pub group: String,
    #[serde(default)]
    pub factors: Vec<GroupFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFactor {
    pub name: String,
    pub source: String,
    /// Cell template with local `value`.
    #[serde(default = "default_template")]
    pub template: String,
    /// Multiplier applied to the current shock (e.g. 100 for rate deltas in bps).
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_template() -> String {
    "{value}".to_string()
}

fn default_scale() -> f64 {
    1.0
}

/// Archived reference values keyed by factor source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvgGfcHistory {
    #[serde(default)]
    pub ccar_avg: IndexMap<String, Option<f64>>,
    #[serde(default)]
    pub gfc: IndexMap<String, Option<f64>>,
}

/// `{ scenario: { source: scaled shock } }`; range and unknown factors are omitted.
pub type AvgGfcTable = IndexMap<String, IndexMap<String, f64>>;

pub fn build_avg_gfc(config: &AvgGfcConfig, shocks: &ShockData) -> AvgGfcTable {
    let values = config
        .factor_groups
        .iter()
        .flat_map(|g| &g.factors)
        .filter_map(|f| {
            let shock = shocks.get(&f.source)?.shock_value.as_scalar()?;
            Some((f.source.clone(), shock * f.scale))
        })
        .collect();
    IndexMap::from([(config.scenario_name.clone(), values)])
}

/// Compare magnitudes: at least as large as the reference is "more severe".
pub fn relative_severity(current: f64, reference: f64) -> &'static str {
    if current.abs() >= reference.abs() {
        MORE_SEVERE
    } else {
        LESS_SEVERE
    }
}

pub fn avg_gfc_rows(
    config: &AvgGfcConfig,
    current: &AvgGfcTable,
    history: &AvgGfcHistory,
    ctx: &RenderContext<'_>,
) -> Result<(Vec<String>, Vec<Vec<String>>), AppError> {
    let header = vec![
        "Group".to_string(),
        "Factor".to_string(),
        config.scenario_name.clone(),
        config.average_label.clone(),
        config.gfc_label.clone(),
        format!("Relative to {}", config.average_label),
        format!("Relative to {}", config.gfc_label),
    ];

    let current = current.get(&config.scenario_name);
    let cell = |template: &str, value: Option<f64>| -> Result<String, AppError> {
        match value {
            Some(v) => {
                let locals = Locals::from([("value".to_string(), v)]);
                render_template(template, &ctx.with_locals(&locals), RenderOptions::default())
            }
            None => Ok(String::new()),
        }
    };
    let relative = |cur: Option<f64>, reference: Option<f64>| match (cur, reference) {
        (Some(c), Some(r)) => relative_severity(c, r).to_string(),
        _ => String::new(),
    };

    let mut rows = Vec::new();
    for group in &config.factor_groups {
        for (idx, factor) in group.factors.iter().enumerate() {
            let cur = current.and_then(|c| c.get(&factor.source).copied());
            let avg = history.ccar_avg.get(&factor.source).copied().flatten();
            let gfc = history.gfc.get(&factor.source).copied().flatten();

            rows.push(vec![
                if idx == 0 { group.group.clone() } else { String::new() },
                factor.name.clone(),
                cell(&factor.template, cur)?,
                cell(&factor.template, avg)?,
                cell(&factor.template, gfc)?,
                relative(cur, avg),
                relative(cur, gfc),
            ]);
        }
    }

    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ShockResult, ShockValue};

    fn config() -> AvgGfcConfig {
        serde_json::from_str(
            r#"{
                "scenario_name": "CCAR 2025 (SA)",
                "factor_groups": [
                    {"group": "Rates", "factors": [
                        {"name": "10Y UST", "source": "10-year Treasury yield", "template": "{value:.0f}bps", "scale": 100},
                        {"name": "BBB spread", "source": "BBB-10Y spread", "template": "{value:.0f}bps", "scale": 100}
                    ]},
                    {"group": "Markets", "factors": [
                        {"name": "VIX", "source": "VIX"}
                    ]}
                ]
            }"#,
        )
        .unwrap()
    }

    fn shocks() -> ShockData {
        let mut data = ShockData::new();
        for (name, shock) in [("10-year Treasury yield", -3.5), ("BBB-10Y spread", 3.0), ("VIX", 48.0)] {
            data.insert(
                name.to_string(),
                ShockResult {
                    extreme_value: ShockValue::Scalar(shock),
                    shock_value: ShockValue::Scalar(shock),
                    extreme_period: None,
                    formatted: None,
                },
            );
        }
        data
    }

    #[test]
    fn scales_per_factor() {
        let table = build_avg_gfc(&config(), &shocks());
        let row = &table["CCAR 2025 (SA)"];
        assert_eq!(row["10-year Treasury yield"], -350.0);
        assert_eq!(row["VIX"], 48.0);
    }

    #[test]
    fn severity_compares_magnitudes() {
        assert_eq!(relative_severity(-350.0, 300.0), MORE_SEVERE);
        assert_eq!(relative_severity(48.0, 48.0), MORE_SEVERE);
        assert_eq!(relative_severity(2.0, -5.0), LESS_SEVERE);
    }

    #[test]
    fn rows_show_group_once() {
        let data = shocks();
        let current = build_avg_gfc(&config(), &data);
        let history: AvgGfcHistory = serde_json::from_str(
            r#"{"ccar_avg": {"10-year Treasury yield": -300.0, "VIX": 55.0}, "gfc": {"VIX": 60.0}}"#,
        )
        .unwrap();

        let (header, rows) = avg_gfc_rows(&config(), &current, &history, &RenderContext::new(&data)).unwrap();
        assert_eq!(header.len(), 7);
        assert_eq!(header[5], "Relative to CCAR Avg.");
        assert_eq!(
            rows[0],
            vec!["Rates", "10Y UST", "-350bps", "-300bps", "", "more severe", ""]
        );
        assert_eq!(rows[1][0], "");
        assert_eq!(rows[2], vec!["Markets", "VIX", "48.0", "55.0", "60.0", "less severe", "less severe"]);
    }
}
