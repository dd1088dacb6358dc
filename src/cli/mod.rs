//! Command-line parsing for the scenario shock pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! stages themselves; `app` turns parsed arguments into a pipeline run.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::pipeline::Stage;
use crate::config::{DEFAULT_SCENARIO, ScenarioPaths};
use crate::shock::calculator::MAX_ROUND_DIGITS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "shocks", version, about = "CCAR scenario shock calculator and report builder")]
pub struct Cli {
    /// Log at debug level (per-factor shocks, resolved paths).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run all stages, or the listed ones, in pipeline order.
    Run(RunArgs),
    /// List the stage names in pipeline order.
    Stages,
    /// Render an ad hoc template against the scenario's intermediate data.
    Render(RenderArgs),
}

/// Where the project lives and which scenario to work on.
#[derive(Debug, Args, Clone)]
pub struct ScenarioArgs {
    /// Project root containing `config/`, `data/` and `artifacts/`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Scenario id (e.g. `2025`, `2026-proposed`).
    #[arg(short = 'y', long, default_value = DEFAULT_SCENARIO)]
    pub scenario: String,
}

impl ScenarioArgs {
    pub fn paths(&self) -> ScenarioPaths {
        ScenarioPaths::new(self.root.clone(), self.scenario.clone())
    }
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Round stored extremes and shocks to N decimals (0 to 15).
    #[arg(
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(0..=MAX_ROUND_DIGITS as i64)
    )]
    pub round_digits: Option<u32>,

    /// Stages to run; all when omitted.
    #[arg(value_enum, value_name = "STAGE")]
    pub stages: Vec<Stage>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Append `[computed]` after every resolved value.
    #[arg(long)]
    pub mark_computed: bool,

    /// Template text, e.g. `"{Unemployment rate.shock:+.1f}ppts"`.
    #[arg(value_name = "TEMPLATE")]
    pub template: String,
}
