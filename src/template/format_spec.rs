//! Numeric format specifiers for placeholders (`{GDP.shock:+.1f}`).
//!
//! Only a small directive set is supported:
//!
//! `[sign][width][.precision][type]`
//!
//! - sign: `+` (always), `-` (negatives only, the default), or a space
//! - width: minimum field width, right-aligned with spaces (at most 100)
//! - precision: digits after the decimal point (requires a type, at most 100)
//! - type: `f` fixed point, `%` fixed point of `value × 100` followed by `%`
//!
//! Rounding is whatever the standard fixed-point formatter does with the exact
//! binary value: ties round half to even (`2.5 → 2`, `0.125 → 0.12`).

use thiserror::Error;

/// Fixed-point precision used by `f`/`%` when none is given.
const DEFAULT_PRECISION: usize = 6;

/// Upper bound for width and precision; the std formatter rejects larger arguments.
pub const MAX_FIELD: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid format spec '{spec}': {reason}")]
pub struct FormatSpecError {
    pub spec: String,
    pub reason: String,
}

impl FormatSpecError {
    fn new(spec: &str, reason: impl Into<String>) -> Self {
        Self {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sign {
    #[default]
    NegativeOnly,
    Always,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Fixed,
    Percent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatSpec {
    pub sign: Sign,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub kind: Option<NumberKind>,
}

impl FormatSpec {
    /// Fixed-point with an optional forced sign; `None` precision keeps the default repr.
    pub fn number(precision: Option<usize>, show_sign: bool) -> Self {
        Self {
            sign: if show_sign { Sign::Always } else { Sign::NegativeOnly },
            width: None,
            precision,
            kind: precision.map(|_| NumberKind::Fixed),
        }
    }

    pub fn parse(spec: &str) -> Result<Self, FormatSpecError> {
        let mut out = FormatSpec::default();
        let mut rest = spec;

        if let Some(c) = rest.chars().next() {
            let sign = match c {
                '+' => Some(Sign::Always),
                '-' => Some(Sign::NegativeOnly),
                ' ' => Some(Sign::Space),
                _ => None,
            };
            if let Some(sign) = sign {
                out.sign = sign;
                rest = &rest[1..];
            }
        }

        let (width, after_width) = take_digits(rest);
        if !width.is_empty() {
            out.width = Some(bounded(spec, width, "width out of range")?);
        }
        rest = after_width;

        if let Some(after_dot) = rest.strip_prefix('.') {
            let (digits, after_digits) = take_digits(after_dot);
            if digits.is_empty() {
                return Err(FormatSpecError::new(spec, "expected digits after '.'"));
            }
            out.precision = Some(bounded(spec, digits, "precision out of range")?);
            rest = after_digits;
        }

        let mut chars = rest.chars();
        match chars.next() {
            None => {}
            Some('f') | Some('F') => out.kind = Some(NumberKind::Fixed),
            Some('%') => out.kind = Some(NumberKind::Percent),
            Some(other) => {
                return Err(FormatSpecError::new(
                    spec,
                    format!("unsupported format type '{other}' (expected 'f' or '%')"),
                ));
            }
        }
        if chars.next().is_some() {
            return Err(FormatSpecError::new(spec, "unexpected characters after format type"));
        }

        if out.precision.is_some() && out.kind.is_none() {
            return Err(FormatSpecError::new(
                spec,
                "precision requires a format type ('f' or '%')",
            ));
        }

        Ok(out)
    }

    /// Width and precision above `MAX_FIELD` are clamped.
    pub fn apply(&self, value: f64) -> String {
        let negative = value.is_sign_negative() && !value.is_nan();
        let magnitude = value.abs();

        let body = match self.kind {
            None => default_repr(magnitude),
            Some(NumberKind::Fixed) => {
                format!("{:.*}", self.precision_or_default(), magnitude)
            }
            Some(NumberKind::Percent) => format!("{:.*}%", self.precision_or_default(), magnitude * 100.0),
        };

        let sign = match (negative, self.sign) {
            (true, _) => "-",
            (false, Sign::Always) => "+",
            (false, Sign::Space) => " ",
            (false, Sign::NegativeOnly) => "",
        };

        let text = format!("{sign}{body}");
        match self.width.map(|w| w.min(MAX_FIELD)) {
            Some(width) => format!("{text:>width$}"),
            None => text,
        }
    }
}

impl FormatSpec {
    fn precision_or_default(&self) -> usize {
        self.precision.unwrap_or(DEFAULT_PRECISION).min(MAX_FIELD)
    }
}

fn bounded(spec: &str, digits: &str, reason: &str) -> Result<usize, FormatSpecError> {
    digits
        .parse::<usize>()
        .ok()
        .filter(|n| *n <= MAX_FIELD)
        .ok_or_else(|| FormatSpecError::new(spec, reason))
}

/// Format with an optional spec string; `None` uses the default repr.
pub fn format_value(value: f64, spec: Option<&str>) -> Result<String, FormatSpecError> {
    match spec {
        Some(spec) => Ok(FormatSpec::parse(spec)?.apply(value)),
        None => Ok(default_repr(value)),
    }
}

/// Shortest round-trip representation, keeping a trailing `.0` on integral values.
///
/// Magnitudes at or above `1e16` or below `1e-4` use exponent notation with a
/// signed, two-digit exponent (`1e+16`, `1.5e-07`).
pub fn default_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let magnitude = value.abs();
    if value == 0.0 || !value.is_finite() || (1e-4..1e16).contains(&magnitude) {
        return format!("{value:?}");
    }

    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

fn take_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}
