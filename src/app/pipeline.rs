//! The pipeline stages and their file-level inputs/outputs.
//!
//! Every stage reads what earlier stages wrote under `data/<scenario>/` and
//! writes its own outputs there or under `artifacts/<scenario>/`:
//!
//! preprocess -> derive -> select -> compute-shocks -> tables -> Markdown pages
//!
//! Stages always run in this order, whatever order they were requested in.

use std::path::Path;

use clap::ValueEnum;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::config::{RegionFiles, ScenarioPaths};
use crate::data::{derive_path, derive_t0, select_path, select_t0};
use crate::domain::{BaselineSnapshot, FactorMappingFile, ScenarioTable, ShockConfig, ShockData};
use crate::error::AppError;
use crate::io::{
    build_t0, exists, merge_tables, read_json, read_scenario_csv, write_json, write_scenario_csv,
    write_table_csv, write_text,
};
use crate::report::{
    CommentaryConfig, SummaryConfig, TimelineConfig, build_commentary, build_summary, build_timeline,
    vs_avg_gfc, vs_history, vs_lastyear,
};
use crate::shock::{ShockSettings, compute_all};
use crate::template::RenderContext;

/// Pipeline stages in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum Stage {
    Preprocess,
    Derive,
    Select,
    ComputeShocks,
    TableVsLastyear,
    TableVsHistory,
    TableVsAvgGfc,
    KeyCommentary,
    Summary,
    Timeline,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Preprocess,
        Stage::Derive,
        Stage::Select,
        Stage::ComputeShocks,
        Stage::TableVsLastyear,
        Stage::TableVsHistory,
        Stage::TableVsAvgGfc,
        Stage::KeyCommentary,
        Stage::Summary,
        Stage::Timeline,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Preprocess => "preprocess",
            Stage::Derive => "derive",
            Stage::Select => "select",
            Stage::ComputeShocks => "compute-shocks",
            Stage::TableVsLastyear => "table-vs-lastyear",
            Stage::TableVsHistory => "table-vs-history",
            Stage::TableVsAvgGfc => "table-vs-avg-gfc",
            Stage::KeyCommentary => "key-commentary",
            Stage::Summary => "summary",
            Stage::Timeline => "timeline",
        }
    }

    /// The requested stages in canonical order, without duplicates; all stages when empty.
    pub fn plan(requested: &[Stage]) -> Vec<Stage> {
        if requested.is_empty() {
            return Stage::ALL.to_vec();
        }
        Stage::ALL
            .into_iter()
            .filter(|stage| requested.contains(stage))
            .collect()
    }
}

/// Run the requested stages for one scenario.
pub fn run_stages(paths: &ScenarioPaths, settings: &ShockSettings, requested: &[Stage]) -> Result<(), AppError> {
    paths.ensure_dirs()?;

    for stage in Stage::plan(requested) {
        info!(stage = stage.name(), scenario = %paths.scenario, "running stage");
        run_stage(stage, paths, settings).map_err(|err| {
            error!(stage = stage.name(), error = %err, "stage failed");
            err.context(format!("Stage '{}' failed", stage.name()))
        })?;
    }
    Ok(())
}

fn run_stage(stage: Stage, paths: &ScenarioPaths, settings: &ShockSettings) -> Result<(), AppError> {
    match stage {
        Stage::Preprocess => preprocess(paths),
        Stage::Derive => derive(paths),
        Stage::Select => select(paths),
        Stage::ComputeShocks => compute_shocks(paths, settings),
        Stage::TableVsLastyear => table_vs_lastyear(paths),
        Stage::TableVsHistory => table_vs_history(paths),
        Stage::TableVsAvgGfc => table_vs_avg_gfc(paths),
        Stage::KeyCommentary => key_commentary(paths),
        Stage::Summary => summary(paths),
        Stage::Timeline => timeline(paths),
    }
}

fn wrote(path: &Path) {
    info!(path = %path.display(), "wrote");
}

fn merge_region(files: &RegionFiles) -> Result<ScenarioTable, AppError> {
    let tables = files
        .iter()
        .map(|(_, path)| read_scenario_csv(path))
        .collect::<Result<Vec<_>, _>>()?;
    merge_tables(&tables)
}

fn preprocess(paths: &ScenarioPaths) -> Result<(), AppError> {
    let files = paths.source_files();

    let historic = files
        .historic
        .iter()
        .map(|(region, path)| -> Result<_, AppError> { Ok((region, read_scenario_csv(path)?)) })
        .collect::<Result<Vec<_>, _>>()?;
    let t0 = build_t0(&historic)?;
    let severely_adverse = merge_region(&files.severely_adverse)?;
    let baseline = merge_region(&files.baseline)?;

    info!(
        t0 = %t0.date,
        factors = t0.factors.len(),
        periods = severely_adverse.periods.len(),
        "ingested source tables"
    );

    write_json(&paths.t0_source_json(), &t0)?;
    wrote(&paths.t0_source_json());
    write_scenario_csv(&paths.path_sa_source_csv(), &severely_adverse)?;
    wrote(&paths.path_sa_source_csv());
    write_scenario_csv(&paths.path_baseline_source_csv(), &baseline)?;
    wrote(&paths.path_baseline_source_csv());
    Ok(())
}

fn derive(paths: &ScenarioPaths) -> Result<(), AppError> {
    let mut t0: BaselineSnapshot = read_json(&paths.t0_source_json())?;
    derive_t0(&mut t0);
    write_json(&paths.t0_source_json(), &t0)?;
    wrote(&paths.t0_source_json());

    for path in [paths.path_sa_source_csv(), paths.path_baseline_source_csv()] {
        let mut table = read_scenario_csv(&path)?;
        derive_path(&mut table).map_err(|e| e.context(path.display()))?;
        write_scenario_csv(&path, &table)?;
        wrote(&path);
    }
    Ok(())
}

fn select(paths: &ScenarioPaths) -> Result<(), AppError> {
    let mapping_path = paths.factor_mapping_path();
    let mapping: FactorMappingFile = read_json(&mapping_path)?;

    let t0_source = paths.t0_source_json();
    let t0 = select_t0(&read_json(&t0_source)?, &mapping.factors, &t0_source.display().to_string())?;
    write_json(&paths.t0_json(), &t0)?;
    wrote(&paths.t0_json());

    for (source, target) in [
        (paths.path_sa_source_csv(), paths.path_sa_csv()),
        (paths.path_baseline_source_csv(), paths.path_baseline_csv()),
    ] {
        let table = select_path(&read_scenario_csv(&source)?, &mapping.factors, &source.display().to_string())?;
        write_scenario_csv(&target, &table)?;
        wrote(&target);
    }
    Ok(())
}

fn compute_shocks(paths: &ScenarioPaths, settings: &ShockSettings) -> Result<(), AppError> {
    let config: ShockConfig = read_json(&paths.shock_config_path())?;
    let table = read_scenario_csv(&paths.path_sa_csv())?;
    let t0: BaselineSnapshot = read_json(&paths.t0_json())?;

    let shocks = compute_all(&table, &t0, &config.factors, settings)?;
    info!(factors = shocks.len(), "computed shocks");

    write_json(&paths.shock_data_json(), &shocks)?;
    wrote(&paths.shock_data_json());
    Ok(())
}

/// Shock data plus the optional t0 and baseline path templates may reference.
pub struct RenderInputs {
    pub shocks: ShockData,
    pub t0: Option<BaselineSnapshot>,
    pub baseline_path: Option<ScenarioTable>,
}

impl RenderInputs {
    pub fn load(paths: &ScenarioPaths) -> Result<Self, AppError> {
        let shocks = read_json(&paths.shock_data_json())?;
        let t0 = if exists(&paths.t0_json()) {
            Some(read_json(&paths.t0_json())?)
        } else {
            None
        };
        let baseline_path = if exists(&paths.path_baseline_csv()) {
            Some(read_scenario_csv(&paths.path_baseline_csv())?)
        } else {
            None
        };
        Ok(Self {
            shocks,
            t0,
            baseline_path,
        })
    }

    pub fn context(&self) -> RenderContext<'_> {
        let mut ctx = RenderContext::new(&self.shocks);
        if let Some(t0) = &self.t0 {
            ctx = ctx.with_t0(t0);
        }
        if let Some(path) = &self.baseline_path {
            ctx = ctx.with_baseline_path(path);
        }
        ctx
    }
}

/// Archived table data; `None` (with a warning) when the file is absent.
fn load_history<T: DeserializeOwned>(paths: &ScenarioPaths, table: &str) -> Result<Option<T>, AppError> {
    let path = paths.history_table_json(table);
    if !exists(&path) {
        warn!(path = %path.display(), table, "history file not found; skipping CSV output");
        return Ok(None);
    }
    read_json(&path).map(Some)
}

fn write_table_outputs<T: serde::Serialize>(
    paths: &ScenarioPaths,
    table: &str,
    current: &T,
    grid: Option<(Vec<String>, Vec<Vec<String>>)>,
) -> Result<(), AppError> {
    let json_path = paths.current_table_json(table);
    write_json(&json_path, current)?;
    wrote(&json_path);

    if let Some((header, rows)) = grid {
        let csv_path = paths.artifact(&format!("{table}.csv"));
        write_table_csv(&csv_path, &header, &rows)?;
        wrote(&csv_path);
    }
    Ok(())
}

fn table_vs_lastyear(paths: &ScenarioPaths) -> Result<(), AppError> {
    let name = vs_lastyear::TABLE_NAME;
    let config: vs_lastyear::LastYearConfig = read_json(&paths.table_config(name))?;
    let inputs = RenderInputs::load(paths)?;

    let current = vs_lastyear::build_lastyear(&config, &inputs.context())?;
    let grid = load_history::<vs_lastyear::LastYearHistory>(paths, name)?
        .map(|history| vs_lastyear::lastyear_rows(&config, &current, &history));
    write_table_outputs(paths, name, &current, grid)
}

fn table_vs_history(paths: &ScenarioPaths) -> Result<(), AppError> {
    let name = vs_history::TABLE_NAME;
    let config: vs_history::HistoryTableConfig = read_json(&paths.table_config(name))?;
    let inputs = RenderInputs::load(paths)?;

    let current = vs_history::build_history(&config, &inputs.shocks);
    let grid = match load_history::<vs_history::HistoryTable>(paths, name)? {
        Some(history) => Some(vs_history::history_rows(&config, &current, &history, &inputs.context())?),
        None => None,
    };
    write_table_outputs(paths, name, &current, grid)
}

fn table_vs_avg_gfc(paths: &ScenarioPaths) -> Result<(), AppError> {
    let name = vs_avg_gfc::TABLE_NAME;
    let config: vs_avg_gfc::AvgGfcConfig = read_json(&paths.table_config(name))?;
    let inputs = RenderInputs::load(paths)?;

    let current = vs_avg_gfc::build_avg_gfc(&config, &inputs.shocks);
    let grid = match load_history::<vs_avg_gfc::AvgGfcHistory>(paths, name)? {
        Some(history) => Some(vs_avg_gfc::avg_gfc_rows(&config, &current, &history, &inputs.context())?),
        None => None,
    };
    write_table_outputs(paths, name, &current, grid)
}

fn write_page(paths: &ScenarioPaths, file_name: &str, markdown: &str) -> Result<(), AppError> {
    let path = paths.artifact(file_name);
    write_text(&path, markdown)?;
    wrote(&path);
    Ok(())
}

fn key_commentary(paths: &ScenarioPaths) -> Result<(), AppError> {
    let config: CommentaryConfig = read_json(&paths.md_config("key_commentary"))?;
    let inputs = RenderInputs::load(paths)?;
    let markdown = build_commentary(&config, &inputs.context())?;
    write_page(paths, "key_commentary.md", &markdown)
}

fn summary(paths: &ScenarioPaths) -> Result<(), AppError> {
    let config: SummaryConfig = read_json(&paths.md_config("summary"))?;
    let inputs = RenderInputs::load(paths)?;
    let markdown = build_summary(&config, &inputs.context())?;
    write_page(paths, "summary.md", &markdown)
}

fn timeline(paths: &ScenarioPaths) -> Result<(), AppError> {
    let config: TimelineConfig = read_json(&paths.md_config("timeline"))?;
    let markdown = build_timeline(&config)?;
    write_page(paths, "timeline.md", &markdown)
}
