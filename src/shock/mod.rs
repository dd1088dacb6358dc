//! Shock calculation.
//!
//! - `extreme`: min/max selection over a path (missing values skipped)
//! - `calculator`: the three shock methods and the whole-config driver
//! - `output`: optional preformatted text per factor

pub mod calculator;
pub mod extreme;
pub mod output;

pub use calculator::{ShockError, ShockSettings, compute, compute_all, compute_factor, resolve_methods};
pub use output::format_output;
