//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the log subscriber
//! - runs pipeline stages or renders an ad hoc template

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, RenderArgs, RunArgs};
use crate::error::AppError;
use crate::report::render_template;
use crate::shock::ShockSettings;
use crate::template::RenderOptions;

pub mod pipeline;

use pipeline::{RenderInputs, Stage};

const DEFAULT_LOG_FILTER: &str = "scenario_shocks=info";
const VERBOSE_LOG_FILTER: &str = "scenario_shocks=debug";

/// Entry point for the `shocks` binary.
pub fn run() -> Result<(), AppError> {
    // `shocks` and `shocks -y 2026 ...` behave like `shocks run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Stages => {
            for stage in Stage::ALL {
                println!("{}", stage.name());
            }
            Ok(())
        }
        Command::Render(args) => handle_render(args),
    }
}

/// Log to stderr; `RUST_LOG` wins unless `-v` was given.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let paths = args.scenario.paths();
    let settings = ShockSettings {
        round_digits: args.round_digits,
    };
    pipeline::run_stages(&paths, &settings, &args.stages)
}

fn handle_render(args: RenderArgs) -> Result<(), AppError> {
    let paths = args.scenario.paths();
    let inputs = RenderInputs::load(&paths)?;
    let options = RenderOptions {
        mark_computed: args.mark_computed,
    };
    println!("{}", render_template(&args.template, &inputs.context(), options)?);
    Ok(())
}

/// Rewrite argv so `shocks` defaults to `shocks run`.
///
/// Rules:
/// - `shocks`                      -> `shocks run`
/// - `shocks -y 2026 ...`          -> `shocks run -y 2026 ...`
/// - `shocks --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "stages" | "render");
    if is_subcommand {
        return argv;
    }

    // A leading `-v` may precede an explicit subcommand.
    let has_subcommand = argv
        .iter()
        .skip(1)
        .any(|a| matches!(a.as_str(), "run" | "stages" | "render"));
    if arg1.starts_with('-') && !has_subcommand {
        argv.insert(1, "run".to_string());
    }

    argv
}
