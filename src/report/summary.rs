//! Summary page (`summary.md`).
//!
//! Bullets with a `template` are rendered against shock data, t0 and the
//! baseline path (`{baseline.<factor>.<agg>}`); bullets without one use `text`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::report::render_template;
use crate::template::{RenderContext, RenderOptions};

/// A label that may be written as a JSON string or number (`"2025"` or `2025`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Number(i64),
    Text(String),
}

impl Default for Label {
    fn default() -> Self {
        Label::Text(String::new())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(n) => write!(f, "{n}"),
            Label::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub scenario_year: Label,
    /// Append `` `[computed]` `` after every rendered value.
    #[serde(default)]
    pub show_computed_marker: bool,
    #[serde(default)]
    pub sections: Vec<Section>,
}

fn default_title() -> String {
    "Summary".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bullets: Vec<SummaryBullet>,
    #[serde(default)]
    pub footnote: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBullet {
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub text: String,
}

pub fn build_summary(config: &SummaryConfig, ctx: &RenderContext<'_>) -> Result<String, AppError> {
    let options = RenderOptions {
        mark_computed: config.show_computed_marker,
    };

    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", config.title));
    out.push_str(&format!(
        "On {}, the FRB released the CCAR {} Supervisory scenarios.\n\n",
        config.release_date, config.scenario_year
    ));

    for section in &config.sections {
        out.push_str(&format!("## {}\n\n", section.name));

        if let Some(description) = section.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("*{description}*\n\n"));
        }

        for bullet in &section.bullets {
            let text = match &bullet.template {
                Some(template) => render_template(template, ctx, options)?,
                None => bullet.text.clone(),
            };
            out.push_str(&format!("- {text}\n"));
        }

        if let Some(footnote) = section.footnote.as_deref().filter(|f| !f.is_empty()) {
            out.push_str(&format!("\n> {footnote}\n"));
        }
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Period, ScenarioTable, ShockData, ShockResult, ShockValue};

    fn config(show_marker: bool) -> SummaryConfig {
        let mut config: SummaryConfig = serde_json::from_str(
            r#"{
                "release_date": "February 5, 2025",
                "scenario_year": 2025,
                "sections": [{
                    "name": "Severely Adverse",
                    "description": "Severe global recession",
                    "bullets": [
                        {"template": "Unemployment rises {Unemployment rate.shock:.1f}ppts"},
                        {"template": "Baseline unemployment peaks at {baseline.Unemployment rate.max:.1f}%"},
                        {"text": "House prices fall sharply."}
                    ],
                    "footnote": "Source: FRB"
                }]
            }"#,
        )
        .unwrap();
        config.show_computed_marker = show_marker;
        config
    }

    fn data() -> (ShockData, ScenarioTable) {
        let mut shocks = ShockData::new();
        shocks.insert(
            "Unemployment rate".to_string(),
            ShockResult {
                extreme_value: ShockValue::Scalar(10.0),
                shock_value: ShockValue::Scalar(5.9),
                extreme_period: None,
                formatted: None,
            },
        );
        let mut baseline = ScenarioTable {
            periods: vec![Period::new(2025, 1).unwrap(), Period::new(2025, 2).unwrap()],
            ..Default::default()
        };
        baseline
            .columns
            .insert("Unemployment rate".to_string(), vec![Some(4.2), Some(4.5)]);
        (shocks, baseline)
    }

    #[test]
    fn builds_sections_with_baseline_context() {
        let (shocks, baseline) = data();
        let ctx = RenderContext::new(&shocks).with_baseline_path(&baseline);
        let md = build_summary(&config(false), &ctx).unwrap();

        let expected = "# Summary\n\n\
            On February 5, 2025, the FRB released the CCAR 2025 Supervisory scenarios.\n\n\
            ## Severely Adverse\n\n\
            *Severe global recession*\n\n\
            - Unemployment rises 5.9ppts\n\
            - Baseline unemployment peaks at 4.5%\n\
            - House prices fall sharply.\n\n\
            > Source: FRB\n\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn marker_follows_the_unit() {
        let (shocks, baseline) = data();
        let ctx = RenderContext::new(&shocks).with_baseline_path(&baseline);
        let md = build_summary(&config(true), &ctx).unwrap();
        assert!(md.contains("- Unemployment rises 5.9ppts `[computed]`\n"));
        assert!(md.contains("peaks at 4.5% `[computed]`\n"));
    }

    #[test]
    fn scenario_year_may_be_text() {
        let config: SummaryConfig =
            serde_json::from_str(r#"{"release_date": "TBD", "scenario_year": "2026 (proposed)"}"#).unwrap();
        let shocks = ShockData::new();
        let md = build_summary(&config, &RenderContext::new(&shocks)).unwrap();
        assert!(md.contains("the CCAR 2026 (proposed) Supervisory scenarios."));
    }
}
