//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages in memory
//! - written to the intermediate JSON/CSV files
//! - reloaded by later stages (and by the ad hoc `render` command)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A calendar quarter, e.g. `2025 Q1`.
///
/// Scenario tables are keyed by quarter labels; ordering is `(year, quarter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    pub year: i32,
    pub quarter: u8,
}

impl Period {
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self { year, quarter })
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.quarter).cmp(&(other.year, other.quarter))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Q{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = String;

    /// Accepts `YYYY Qn` with optional whitespace between year and `Q`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid period '{s}'. Expected the 'YYYY Qn' format.");
        let trimmed = s.trim();
        let (year, rest) = trimmed.split_at_checked(4).ok_or_else(invalid)?;
        if !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let quarter = rest.trim_start().strip_prefix('Q').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let quarter: u8 = quarter.parse().map_err(|_| invalid())?;
        Period::new(year, quarter).ok_or_else(invalid)
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

/// A time-ordered numeric table: one row per quarter, one column per factor.
///
/// Missing cells are `None` (never zero). Column order follows the source files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioTable {
    pub periods: Vec<Period>,
    pub columns: IndexMap<String, Vec<Option<f64>>>,
}

impl ScenarioTable {
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Chronological `(period, value)` pairs for one factor.
    pub fn path(&self, name: &str) -> Option<Vec<(Period, Option<f64>)>> {
        let values = self.columns.get(name)?;
        Some(self.periods.iter().copied().zip(values.iter().copied()).collect())
    }

    pub fn last_period(&self) -> Option<Period> {
        self.periods.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// The last historical quarter before the scenario horizon (`t0`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub date: String,
    pub factors: IndexMap<String, Option<f64>>,
}

impl BaselineSnapshot {
    /// Baseline value for a factor; `None` when absent or explicitly null.
    pub fn value(&self, factor: &str) -> Option<f64> {
        self.factors.get(factor).copied().flatten()
    }
}

/// Which point(s) of a path are relevant to a shock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremePolicy {
    #[default]
    Min,
    Max,
    Range,
}

/// Shock calculation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockMethod {
    /// `(extreme / t0 - 1) × 100`.
    LevelPctVsT0,
    /// `extreme - t0`.
    LevelDeltaVsT0,
    /// `{min, max}` over the path; t0 is ignored.
    RateRange,
}

impl ShockMethod {
    pub const ALL: [ShockMethod; 3] = [
        ShockMethod::LevelPctVsT0,
        ShockMethod::LevelDeltaVsT0,
        ShockMethod::RateRange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShockMethod::LevelPctVsT0 => "level_pct_vs_t0",
            ShockMethod::LevelDeltaVsT0 => "level_delta_vs_t0",
            ShockMethod::RateRange => "rate_range",
        }
    }

    /// Resolve a configured method name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for ShockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A shock statistic: a single number, or a `{min, max}` pair for range methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShockValue {
    Scalar(f64),
    Range { min: f64, max: f64 },
}

impl ShockValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ShockValue::Scalar(v) => Some(*v),
            ShockValue::Range { .. } => None,
        }
    }

    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            ShockValue::Scalar(_) => None,
            ShockValue::Range { min, max } => Some((*min, *max)),
        }
    }
}

/// Where on the path the extreme(s) were observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtremePeriod {
    Single(Period),
    Range { min: Period, max: Period },
}

/// Per-factor output of the shock calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockResult {
    pub extreme_value: ShockValue,
    pub shock_value: ShockValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extreme_period: Option<ExtremePeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

/// Shock results keyed by factor name, in configuration order.
pub type ShockData = IndexMap<String, ShockResult>;

/// Where a direct output formatter reads its number from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Shock,
    Extreme,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeOrder {
    #[default]
    Desc,
    Asc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Before,
    #[default]
    After,
}

/// Direct output formatting attached to a factor (stored as `formatted`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputFormat {
    /// `-12.3%`
    Percent {
        #[serde(default = "default_shock_source")]
        source: ValueSource,
        #[serde(default = "default_precision")]
        precision: Option<usize>,
        #[serde(default)]
        show_sign: bool,
    },
    /// `5.1% to 0.4%`
    RangePercent {
        #[serde(default = "default_extreme_source")]
        source: ValueSource,
        #[serde(default = "default_precision")]
        precision: Option<usize>,
        #[serde(default)]
        show_sign: bool,
        #[serde(default)]
        order: RangeOrder,
    },
    /// `VIX 65.0 (+48.2)`
    LevelDelta {
        #[serde(default)]
        level_precision: Option<usize>,
        #[serde(default)]
        level_unit: String,
        #[serde(default)]
        level_show_sign: bool,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        label_position: LabelPosition,
        #[serde(default = "default_delta_scale")]
        delta_scale: f64,
        #[serde(default)]
        delta_precision: Option<usize>,
        #[serde(default)]
        delta_unit: String,
        #[serde(default = "default_true")]
        delta_show_sign: bool,
    },
}

fn default_shock_source() -> ValueSource {
    ValueSource::Shock
}

fn default_extreme_source() -> ValueSource {
    ValueSource::Extreme
}

fn default_precision() -> Option<usize> {
    Some(1)
}

fn default_delta_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Per-factor calculation policy from `shock_config.json`.
///
/// The method stays a string here so an unrecognized name surfaces as a
/// calculation error naming the factor rather than a generic parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorConfig {
    pub name: String,
    #[serde(default)]
    pub extreme: ExtremePolicy,
    pub shock_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShockConfig {
    #[serde(default)]
    pub factors: Vec<FactorConfig>,
}

/// One entry of `factor_mapping.json`: rename `source_column` to `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorMapping {
    pub name: String,
    pub source_column: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorMappingFile {
    #[serde(default)]
    pub factors: Vec<FactorMapping>,
}
