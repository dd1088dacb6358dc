//! Key factor commentary (`key_commentary.md`).
//!
//! Bullets are either `computed` (a template filled from shock data) or
//! `manual` (human-authored text copied verbatim). Each bullet is tagged so a
//! reviewer can tell which is which.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::report::render_template;
use crate::template::{RenderContext, RenderOptions};

pub const LEGEND: &str = "> **Legend**: `[computed]` = auto-generated from data, \
`[manual]` = human-authored (preserved on regeneration)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

fn default_title() -> String {
    "Key Factor Shocks".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub bullets: Vec<Bullet>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletKind {
    Computed,
    #[default]
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    #[serde(rename = "type", default)]
    pub kind: BulletKind,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub text: String,
}

/// Build the commentary page. Computed bullets never carry inline markers.
pub fn build_commentary(config: &CommentaryConfig, ctx: &RenderContext<'_>) -> Result<String, AppError> {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", config.title));
    out.push_str(LEGEND);
    out.push_str("\n\n");

    for category in &config.categories {
        out.push_str(&format!("## {}\n\n", category.name));
        for bullet in &category.bullets {
            let (text, marker) = match bullet.kind {
                BulletKind::Computed => (
                    render_template(&bullet.template, ctx, RenderOptions::default())?,
                    "`[computed]`",
                ),
                BulletKind::Manual => (bullet.text.clone(), "`[manual]`"),
            };
            out.push_str(&format!("- {text}  {marker}\n"));
        }
        out.push('\n');
    }

    Ok(out)
}
