//! Report builders: Markdown pages and comparison tables.
//!
//! Builders are pure: they take parsed configuration plus computed data and
//! return text or table rows. Reading inputs and writing artifacts is the
//! pipeline's job.

use crate::error::AppError;
use crate::template::{self, RenderContext, RenderOptions};

pub mod commentary;
pub mod summary;
pub mod timeline;
pub mod vs_avg_gfc;
pub mod vs_history;
pub mod vs_lastyear;

pub use commentary::{CommentaryConfig, build_commentary};
pub use summary::{SummaryConfig, build_summary};
pub use timeline::{TimelineConfig, build_timeline};

/// Render one template; a bad format spec fails the report and names the template.
pub fn render_template(
    text: &str,
    ctx: &RenderContext<'_>,
    options: RenderOptions,
) -> Result<String, AppError> {
    template::render(text, ctx, options)
        .map_err(|e| AppError::new(4, format!("Failed to render template {text:?}: {e}")))
}
