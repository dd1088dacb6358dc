//! Per-factor shock computation.
//!
//! `compute` is a pure function of one factor's path, its t0 value and the
//! configured policy/method. `compute_all` drives it over a whole configuration.

use thiserror::Error;
use tracing::debug;

use crate::domain::{
    BaselineSnapshot, ExtremePeriod, ExtremePolicy, FactorConfig, Period, ScenarioTable, ShockData,
    ShockMethod, ShockResult, ShockValue,
};
use crate::shock::extreme::{self, Extreme};
use crate::shock::output::format_output;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShockError {
    #[error("unknown shock method '{method}' for factor '{factor}'")]
    UnknownMethod { factor: String, method: String },

    #[error("factor '{factor}' ({method}): {reason}")]
    InvalidBaseline {
        factor: String,
        method: ShockMethod,
        reason: &'static str,
    },

    #[error("factor '{factor}' ({method}): series has no numeric values")]
    EmptySeries { factor: String, method: ShockMethod },

    #[error("factor '{factor}' ({method}): extreme policy 'range' is only valid with 'rate_range'")]
    UnsupportedExtreme { factor: String, method: ShockMethod },

    #[error("factor '{factor}' is missing from the scenario path")]
    MissingColumn { factor: String },

    #[error("factor '{factor}': {reason}")]
    InvalidOutput { factor: String, reason: String },
}

/// Beyond this many decimals rounding cannot change an `f64` shock meaningfully.
pub const MAX_ROUND_DIGITS: u32 = 15;

/// Calculation knobs that do not change the method semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShockSettings {
    /// Round stored extremes/shocks to this many decimals (half away from zero).
    pub round_digits: Option<u32>,
}

impl ShockSettings {
    /// Digits above `MAX_ROUND_DIGITS` leave the value as is; the result is always finite
    /// when the input is.
    fn round(&self, value: f64) -> f64 {
        match self.round_digits {
            Some(digits) if digits <= MAX_ROUND_DIGITS => {
                let scale = 10f64.powi(digits as i32);
                let rounded = (value * scale).round() / scale;
                if rounded.is_finite() { rounded } else { value }
            }
            _ => value,
        }
    }

    fn round_value(&self, value: ShockValue) -> ShockValue {
        match value {
            ShockValue::Scalar(v) => ShockValue::Scalar(self.round(v)),
            ShockValue::Range { min, max } => ShockValue::Range {
                min: self.round(min),
                max: self.round(max),
            },
        }
    }
}

/// Compute one factor's shock from its chronological path.
pub fn compute(
    factor: &str,
    path: &[(Period, Option<f64>)],
    baseline: Option<f64>,
    policy: ExtremePolicy,
    method: ShockMethod,
    settings: &ShockSettings,
) -> Result<ShockResult, ShockError> {
    let empty = || ShockError::EmptySeries {
        factor: factor.to_string(),
        method,
    };

    let result = match method {
        ShockMethod::RateRange => {
            let (min, max) = extreme::select_range(path).ok_or_else(empty)?;
            let range = ShockValue::Range {
                min: min.value,
                max: max.value,
            };
            ShockResult {
                extreme_value: range,
                shock_value: range,
                extreme_period: Some(ExtremePeriod::Range {
                    min: min.period,
                    max: max.period,
                }),
                formatted: None,
            }
        }
        ShockMethod::LevelPctVsT0 | ShockMethod::LevelDeltaVsT0 => {
            let which = match policy {
                ExtremePolicy::Min => Extreme::Min,
                ExtremePolicy::Max => Extreme::Max,
                ExtremePolicy::Range => {
                    return Err(ShockError::UnsupportedExtreme {
                        factor: factor.to_string(),
                        method,
                    });
                }
            };
            let obs = extreme::select(path, which).ok_or_else(empty)?;
            let shock = level_shock(factor, method, obs.value, baseline)?;
            ShockResult {
                extreme_value: ShockValue::Scalar(obs.value),
                shock_value: ShockValue::Scalar(shock),
                extreme_period: Some(ExtremePeriod::Single(obs.period)),
                formatted: None,
            }
        }
    };

    Ok(ShockResult {
        extreme_value: settings.round_value(result.extreme_value),
        shock_value: settings.round_value(result.shock_value),
        ..result
    })
}

fn level_shock(
    factor: &str,
    method: ShockMethod,
    extreme: f64,
    baseline: Option<f64>,
) -> Result<f64, ShockError> {
    let invalid = |reason| ShockError::InvalidBaseline {
        factor: factor.to_string(),
        method,
        reason,
    };

    let t0 = baseline.ok_or_else(|| invalid("t0 value is missing"))?;
    if method == ShockMethod::LevelDeltaVsT0 {
        return Ok(extreme - t0);
    }
    if t0 == 0.0 {
        return Err(invalid("t0 value is zero (percent change undefined)"));
    }
    Ok((extreme / t0 - 1.0) * 100.0)
}

/// Resolve every configured method name up front.
///
/// A single unknown method is a configuration error for the whole run.
pub fn resolve_methods(configs: &[FactorConfig]) -> Result<Vec<ShockMethod>, ShockError> {
    configs
        .iter()
        .map(|cfg| {
            ShockMethod::from_name(&cfg.shock_method).ok_or_else(|| ShockError::UnknownMethod {
                factor: cfg.name.clone(),
                method: cfg.shock_method.clone(),
            })
        })
        .collect()
}

/// Compute one configured factor against the scenario path and t0 snapshot.
pub fn compute_factor(
    table: &ScenarioTable,
    t0: &BaselineSnapshot,
    config: &FactorConfig,
    method: ShockMethod,
    settings: &ShockSettings,
) -> Result<ShockResult, ShockError> {
    let path = table.path(&config.name).ok_or_else(|| ShockError::MissingColumn {
        factor: config.name.clone(),
    })?;

    let mut result = compute(
        &config.name,
        &path,
        t0.value(&config.name),
        config.extreme,
        method,
        settings,
    )?;

    if let Some(output) = &config.output {
        result.formatted = Some(format_output(output, &result).map_err(|reason| {
            ShockError::InvalidOutput {
                factor: config.name.clone(),
                reason,
            }
        })?);
    }

    Ok(result)
}

/// Compute every configured factor, in configuration order.
pub fn compute_all(
    table: &ScenarioTable,
    t0: &BaselineSnapshot,
    configs: &[FactorConfig],
    settings: &ShockSettings,
) -> Result<ShockData, ShockError> {
    let methods = resolve_methods(configs)?;

    let mut data = ShockData::with_capacity(configs.len());
    for (config, method) in configs.iter().zip(methods) {
        let result = compute_factor(table, t0, config, method, settings)?;
        debug!(
            factor = %config.name,
            method = %method,
            extreme = ?result.extreme_value,
            shock = ?result.shock_value,
            "computed shock"
        );
        data.insert(config.name.clone(), result);
    }
    Ok(data)
}
