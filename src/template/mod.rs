//! Template rendering for report text.
//!
//! A template is plain text with placeholders such as
//! `{Real GDP level (index).shock:.1f}%` or `{baseline.Unemployment rate.max:.1f}ppts`.
//!
//! - `parser`: template → literal/placeholder segments
//! - `format_spec`: the supported numeric format directives
//! - `render`: resolution against shock results, t0 and the baseline path

pub mod format_spec;
pub mod parser;
pub mod render;

pub use format_spec::{FormatSpec, FormatSpecError, default_repr, format_value};
pub use parser::{Placeholder, Reference, Segment, Unit, parse};
pub use render::{COMPUTED_MARKER, Locals, RenderContext, RenderOptions, SeriesAgg, ShockField, render};
