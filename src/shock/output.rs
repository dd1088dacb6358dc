//! Direct output formatters (`formatted` field of a shock result).

use crate::domain::{LabelPosition, OutputFormat, RangeOrder, ShockResult, ShockValue, ValueSource};
use crate::template::FormatSpec;

fn payload(result: &ShockResult, source: ValueSource) -> ShockValue {
    match source {
        ValueSource::Shock => result.shock_value,
        ValueSource::Extreme => result.extreme_value,
    }
}

fn number(value: f64, precision: Option<usize>, show_sign: bool) -> String {
    FormatSpec::number(precision, show_sign).apply(value)
}

/// Render a configured output block. Errors describe a payload-shape mismatch.
pub fn format_output(output: &OutputFormat, result: &ShockResult) -> Result<String, String> {
    match output {
        OutputFormat::Percent {
            source,
            precision,
            show_sign,
        } => {
            let value = payload(result, *source)
                .as_scalar()
                .ok_or_else(|| "percent output requires a scalar value".to_string())?;
            Ok(format!("{}%", number(value, *precision, *show_sign)))
        }
        OutputFormat::RangePercent {
            source,
            precision,
            show_sign,
            order,
        } => {
            let (a, b) = payload(result, *source)
                .as_range()
                .ok_or_else(|| "range_percent output requires a {min, max} value".to_string())?;
            let hi = number(a.max(b), *precision, *show_sign);
            let lo = number(a.min(b), *precision, *show_sign);
            let (first, second) = match order {
                RangeOrder::Desc => (hi, lo),
                RangeOrder::Asc => (lo, hi),
            };
            Ok(format!("{first}% to {second}%"))
        }
        OutputFormat::LevelDelta {
            level_precision,
            level_unit,
            level_show_sign,
            label,
            label_position,
            delta_scale,
            delta_precision,
            delta_unit,
            delta_show_sign,
        } => {
            let shape = || "level_delta output requires scalar values".to_string();
            let level = result.extreme_value.as_scalar().ok_or_else(shape)?;
            let delta = result.shock_value.as_scalar().ok_or_else(shape)? * delta_scale;

            let mut level_text = number(level, *level_precision, *level_show_sign) + level_unit;
            if let Some(label) = label.as_deref().filter(|l| !l.is_empty()) {
                level_text = match label_position {
                    LabelPosition::Before => format!("{label} {level_text}"),
                    LabelPosition::After => format!("{level_text} {label}"),
                };
            }
            let delta_text = number(delta, *delta_precision, *delta_show_sign) + delta_unit;

            Ok(format!("{} ({})", level_text.trim(), delta_text.trim()))
        }
    }
}
