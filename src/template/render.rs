//! Placeholder resolution and substitution.
//!
//! Rendering is total over missing data: any reference that cannot be resolved
//! becomes an inline `[...:N/A]` marker. The only failure is a format spec that
//! cannot be applied to a resolved number.

use indexmap::IndexMap;

use crate::domain::{BaselineSnapshot, ScenarioTable, ShockData, ShockValue};
use crate::template::format_spec::{FormatSpecError, format_value};
use crate::template::parser::{self, Placeholder, Reference, Segment};

/// Appended after computed values when `RenderOptions::mark_computed` is set.
pub const COMPUTED_MARKER: &str = "`[computed]`";

/// Named numbers available to single-name placeholders (`{shock:.1f}`).
pub type Locals = IndexMap<String, f64>;

/// Everything a template may reference. All parts are read-only.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub shocks: &'a ShockData,
    pub t0: Option<&'a BaselineSnapshot>,
    pub baseline_path: Option<&'a ScenarioTable>,
    /// When `None`, single-name placeholders are left as literal text.
    pub locals: Option<&'a Locals>,
}

impl<'a> RenderContext<'a> {
    pub fn new(shocks: &'a ShockData) -> Self {
        Self {
            shocks,
            t0: None,
            baseline_path: None,
            locals: None,
        }
    }

    pub fn with_t0(mut self, t0: &'a BaselineSnapshot) -> Self {
        self.t0 = Some(t0);
        self
    }

    pub fn with_baseline_path(mut self, path: &'a ScenarioTable) -> Self {
        self.baseline_path = Some(path);
        self
    }

    pub fn with_locals(mut self, locals: &'a Locals) -> Self {
        self.locals = Some(locals);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub mark_computed: bool,
}

/// Fields of the shock namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShockField {
    /// Raw shock (percent or delta).
    Shock,
    /// `|shock|`.
    ShockAbs,
    /// `|shock| × 100`, for basis-point display of rate deltas.
    ShockBps,
    Extreme,
    /// Baseline value from the t0 snapshot.
    T0,
    /// Upper end of a range shock.
    High,
    /// Lower end of a range shock.
    Low,
}

impl ShockField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "shock" => Some(ShockField::Shock),
            "shock_abs" => Some(ShockField::ShockAbs),
            "shock_bps" => Some(ShockField::ShockBps),
            "extreme" => Some(ShockField::Extreme),
            "t0" => Some(ShockField::T0),
            "high" => Some(ShockField::High),
            "low" => Some(ShockField::Low),
            _ => None,
        }
    }
}

/// Aggregates of the baseline namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesAgg {
    Max,
    Min,
    First,
    Last,
    Mean,
}

impl SeriesAgg {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "max" => Some(SeriesAgg::Max),
            "min" => Some(SeriesAgg::Min),
            "first" => Some(SeriesAgg::First),
            "last" => Some(SeriesAgg::Last),
            "mean" => Some(SeriesAgg::Mean),
            _ => None,
        }
    }

    /// Aggregate the non-missing values; `None` if there are none.
    pub fn apply(self, values: &[Option<f64>]) -> Option<f64> {
        let mut present = values.iter().copied().flatten();
        match self {
            SeriesAgg::Max => present.reduce(f64::max),
            SeriesAgg::Min => present.reduce(f64::min),
            SeriesAgg::First => present.next(),
            SeriesAgg::Last => present.last(),
            SeriesAgg::Mean => {
                let (sum, n) = present.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                (n > 0).then(|| sum / n as f64)
            }
        }
    }
}

/// Render a template against a context.
pub fn render(
    template: &str,
    ctx: &RenderContext<'_>,
    options: RenderOptions,
) -> Result<String, FormatSpecError> {
    let mut out = String::with_capacity(template.len());
    for segment in parser::parse(template) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder(placeholder) => render_placeholder(&mut out, &placeholder, ctx, options)?,
        }
    }
    Ok(out)
}

fn render_placeholder(
    out: &mut String,
    placeholder: &Placeholder<'_>,
    ctx: &RenderContext<'_>,
    options: RenderOptions,
) -> Result<(), FormatSpecError> {
    if matches!(placeholder.reference, Reference::Local { .. }) && ctx.locals.is_none() {
        out.push_str(placeholder.raw);
        return Ok(());
    }

    // The unit belongs to the placeholder and goes with it.
    let Some(value) = resolve(&placeholder.reference, ctx) else {
        out.push_str(&unresolved_marker(&placeholder.reference));
        return Ok(());
    };

    out.push_str(&format_value(value, placeholder.spec)?);
    if let Some(unit) = placeholder.unit {
        out.push_str(unit.as_str());
    }
    if options.mark_computed {
        out.push(' ');
        out.push_str(COMPUTED_MARKER);
    }
    Ok(())
}

/// Resolve a reference to a number, or `None` when unavailable.
pub fn resolve(reference: &Reference<'_>, ctx: &RenderContext<'_>) -> Option<f64> {
    match *reference {
        Reference::Shock { factor, field } => resolve_shock(factor, ShockField::from_name(field)?, ctx),
        Reference::Baseline { factor, agg } => {
            let column = ctx.baseline_path?.column(factor)?;
            SeriesAgg::from_name(agg)?.apply(column)
        }
        Reference::Local { name } => ctx.locals?.get(name).copied(),
    }
}

fn resolve_shock(factor: &str, field: ShockField, ctx: &RenderContext<'_>) -> Option<f64> {
    if field == ShockField::T0 {
        return ctx.t0?.value(factor);
    }

    let entry = ctx.shocks.get(factor)?;
    match field {
        ShockField::Shock => entry.shock_value.as_scalar(),
        ShockField::ShockAbs => entry.shock_value.as_scalar().map(f64::abs),
        ShockField::ShockBps => entry.shock_value.as_scalar().map(|v| v.abs() * 100.0),
        ShockField::Extreme => entry.extreme_value.as_scalar(),
        ShockField::High => match entry.shock_value {
            ShockValue::Range { min, max } => Some(min.max(max)),
            ShockValue::Scalar(_) => None,
        },
        ShockField::Low => match entry.shock_value {
            ShockValue::Range { min, max } => Some(min.min(max)),
            ShockValue::Scalar(_) => None,
        },
        ShockField::T0 => None,
    }
}

fn unresolved_marker(reference: &Reference<'_>) -> String {
    match reference {
        Reference::Shock { factor, field } => format!("[{factor}.{field}:N/A]"),
        Reference::Baseline { factor, agg } => format!("[baseline.{factor}.{agg}:N/A]"),
        Reference::Local { name } => format!("[{name}:N/A]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Period, ShockResult};

    fn scalar(extreme: f64, shock: f64) -> ShockResult {
        ShockResult {
            extreme_value: ShockValue::Scalar(extreme),
            shock_value: ShockValue::Scalar(shock),
            extreme_period: None,
            formatted: None,
        }
    }

    fn shocks() -> ShockData {
        let mut data = ShockData::new();
        data.insert("Inflation".to_string(), scalar(1.2, -2.345));
        data.insert("10-year Treasury yield".to_string(), scalar(3.9, -0.25));
        let range = ShockValue::Range { min: 1.0, max: 5.0 };
        data.insert(
            "US Inflation".to_string(),
            ShockResult {
                extreme_value: range,
                shock_value: range,
                extreme_period: None,
                formatted: None,
            },
        );
        data
    }

    fn t0() -> BaselineSnapshot {
        let mut snap = BaselineSnapshot {
            date: "2024 Q4".to_string(),
            ..Default::default()
        };
        snap.factors.insert("Inflation".to_string(), Some(3.1));
        snap.factors.insert("VIX".to_string(), None);
        snap
    }

    fn baseline_path() -> ScenarioTable {
        let mut table = ScenarioTable {
            periods: vec![
                Period::new(2025, 1).unwrap(),
                Period::new(2025, 2).unwrap(),
                Period::new(2025, 3).unwrap(),
            ],
            ..Default::default()
        };
        table
            .columns
            .insert("Unemployment rate".to_string(), vec![Some(4.2), None, Some(4.6)]);
        table
    }

    fn plain(template: &str) -> String {
        let data = shocks();
        render(template, &RenderContext::new(&data), RenderOptions::default()).unwrap()
    }

    #[test]
    fn no_placeholders_renders_unchanged() {
        let text = "Unemployment rises sharply {not a placeholder}";
        assert_eq!(plain(text), text);
    }

    #[test]
    fn formats_shock_with_precision_and_unit() {
        assert_eq!(plain("{Inflation.shock:.1f}%"), "-2.3%");
        assert_eq!(plain("{Inflation.shock}"), "-2.345");
        assert_eq!(plain("{Inflation.shock_abs:.1f}"), "2.3");
        assert_eq!(plain("{10-year Treasury yield.shock_bps:.0f}bps"), "25bps");
        assert_eq!(plain("{Inflation.extreme:.1f}"), "1.2");
    }

    #[test]
    fn missing_factor_degrades_to_marker() {
        assert_eq!(plain("GDP {Real GDP.shock:.1f}%"), "GDP [Real GDP.shock:N/A]");
        assert_eq!(plain("{Inflation.velocity}"), "[Inflation.velocity:N/A]");
    }

    #[test]
    fn range_shock_has_no_scalar_fields() {
        assert_eq!(plain("{US Inflation.shock_abs:.1f}"), "[US Inflation.shock_abs:N/A]");
        assert_eq!(plain("{US Inflation.shock_bps}"), "[US Inflation.shock_bps:N/A]");
        assert_eq!(plain("{US Inflation.extreme}"), "[US Inflation.extreme:N/A]");
        assert_eq!(plain("{US Inflation.low:.1f} to {US Inflation.high:.1f}"), "1.0 to 5.0");
        assert_eq!(plain("{Inflation.high}"), "[Inflation.high:N/A]");
    }

    #[test]
    fn unresolved_reference_skips_format_spec() {
        assert_eq!(plain("{Nope.shock:garbage}"), "[Nope.shock:N/A]");
    }

    #[test]
    fn invalid_spec_on_resolved_value_is_an_error() {
        let data = shocks();
        let err = render("{Inflation.shock:.1}", &RenderContext::new(&data), RenderOptions::default())
            .unwrap_err();
        assert_eq!(err.spec, ".1");

        for template in ["{Inflation.shock:.70000f}", "{Inflation.shock:70000.1f}"] {
            let err = render(template, &RenderContext::new(&data), RenderOptions::default()).unwrap_err();
            assert!(err.to_string().contains("out of range"), "{template}: {err}");
        }
    }

    #[test]
    fn t0_field_reads_baseline_snapshot() {
        let data = shocks();
        let snap = t0();
        let ctx = RenderContext::new(&data).with_t0(&snap);
        let opts = RenderOptions::default();
        assert_eq!(render("{Inflation.t0:.1f}", &ctx, opts).unwrap(), "3.1");
        assert_eq!(render("{VIX.t0}", &ctx, opts).unwrap(), "[VIX.t0:N/A]");
        assert_eq!(plain("{Inflation.t0}"), "[Inflation.t0:N/A]");
    }

    #[test]
    fn baseline_namespace_aggregates_path() {
        let data = shocks();
        let path = baseline_path();
        let ctx = RenderContext::new(&data).with_baseline_path(&path);
        let opts = RenderOptions::default();
        let r = |t: &str| render(t, &ctx, opts).unwrap();
        assert_eq!(r("{baseline.Unemployment rate.max:.1f}"), "4.6");
        assert_eq!(r("{baseline.Unemployment rate.min:.1f}"), "4.2");
        assert_eq!(r("{baseline.Unemployment rate.first}"), "4.2");
        assert_eq!(r("{baseline.Unemployment rate.last}"), "4.6");
        assert_eq!(r("{baseline.Unemployment rate.mean:.1f}"), "4.4");
        assert_eq!(r("{baseline.Mortgage rate.max}"), "[baseline.Mortgage rate.max:N/A]");
        assert_eq!(r("{baseline.Unemployment rate.median}"), "[baseline.Unemployment rate.median:N/A]");
    }

    #[test]
    fn computed_marker_follows_unit() {
        let data = shocks();
        let ctx = RenderContext::new(&data);
        let opts = RenderOptions { mark_computed: true };
        assert_eq!(
            render("CPI {Inflation.shock:.1f}% overall", &ctx, opts).unwrap(),
            "CPI -2.3% `[computed]` overall"
        );
        assert_eq!(render("{Inflation.shock:.1f}", &ctx, opts).unwrap(), "-2.3 `[computed]`");
        assert_eq!(render("{Missing.shock}% overall", &ctx, opts).unwrap(), "[Missing.shock:N/A] overall");
    }

    #[test]
    fn unresolved_marker_drops_unit() {
        let data = shocks();
        let ctx = RenderContext::new(&data);
        let opts = RenderOptions::default();
        assert_eq!(render("{Missing.shock:.1f}ppts", &ctx, opts).unwrap(), "[Missing.shock:N/A]");
        assert_eq!(
            render("{baseline.Inflation.max}bps here", &ctx, opts).unwrap(),
            "[baseline.Inflation.max:N/A] here"
        );
        assert_eq!(render("{Missing.shock} pts", &ctx, opts).unwrap(), "[Missing.shock:N/A] pts");
    }

    #[test]
    fn locals_only_resolve_when_scope_is_given() {
        let data = shocks();
        let mut locals = Locals::new();
        locals.insert("shock".to_string(), 12.345);
        let opts = RenderOptions::default();

        assert_eq!(plain("{shock:.1f}%"), "{shock:.1f}%");

        let ctx = RenderContext::new(&data).with_locals(&locals);
        assert_eq!(render("{shock:.1f}%", &ctx, opts).unwrap(), "12.3%");
        assert_eq!(render("{delta:+.0f}", &ctx, opts).unwrap(), "[delta:N/A]");
    }

    #[test]
    fn placeholders_resolve_independently() {
        let data = shocks();
        let template = "{Inflation.shock:.1f} / {Missing.shock} / {Inflation.extreme}";
        let ctx = RenderContext::new(&data);
        let first = render(template, &ctx, RenderOptions::default()).unwrap();
        let second = render(template, &ctx, RenderOptions::default()).unwrap();
        assert_eq!(first, "-2.3 / [Missing.shock:N/A] / 1.2");
        assert_eq!(first, second);
    }
}
