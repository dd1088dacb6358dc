//! Timeline page (`timeline.md`): milestone dates counted from the release date.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub intro_bullets: Vec<String>,
    /// Day 1, `YYYY-MM-DD`.
    pub release_date: String,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

fn default_title() -> String {
    "Timeline".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(default)]
    pub day_offset: i64,
    /// May contain a `{date}` placeholder.
    #[serde(default)]
    pub description: String,
}

/// `Saturday, February 8`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

pub fn build_timeline(config: &TimelineConfig) -> Result<String, AppError> {
    let release = NaiveDate::parse_from_str(&config.release_date, "%Y-%m-%d").map_err(|e| {
        AppError::new(
            2,
            format!("Invalid release_date '{}' (expected YYYY-MM-DD): {e}", config.release_date),
        )
    })?;

    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", config.title));
    for bullet in &config.intro_bullets {
        out.push_str(&format!("- {bullet}\n"));
    }
    out.push('\n');

    for (idx, milestone) in config.milestones.iter().enumerate() {
        let date = Duration::try_days(milestone.day_offset)
            .and_then(|offset| release.checked_add_signed(offset))
            .ok_or_else(|| AppError::new(2, format!("Milestone day_offset {} is out of range.", milestone.day_offset)))?;
        let text = milestone.description.replace("{date}", &format_date(date));
        out.push_str(&format!("{}. {text}\n", idx + 1));
    }
    out.push('\n');

    Ok(out)
}
