//! Filesystem layout for one scenario run.
//!
//! Everything lives under a project root:
//!
//! ```text
//! config/factor_mapping.json  config/shock_config.json
//! config/<scenario>/{md_config,table_config}/
//! data/<scenario>/{source,intermediate,current,history}/
//! artifacts/<scenario>/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const DEFAULT_SCENARIO: &str = "2025";

/// Path resolver for a specific scenario id (e.g. `2025`, `2026-proposed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPaths {
    pub root: PathBuf,
    pub scenario: String,
}

impl ScenarioPaths {
    pub fn new(root: impl Into<PathBuf>, scenario: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            scenario: scenario.into(),
        }
    }

    // Data

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data").join(&self.scenario)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.data_dir().join("source")
    }

    pub fn intermediate_dir(&self) -> PathBuf {
        self.data_dir().join("intermediate")
    }

    pub fn current_dir(&self) -> PathBuf {
        self.data_dir().join("current")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.data_dir().join("history")
    }

    // Config

    pub fn shared_config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.shared_config_dir().join(&self.scenario)
    }

    pub fn md_config_dir(&self) -> PathBuf {
        self.config_dir().join("md_config")
    }

    pub fn table_config_dir(&self) -> PathBuf {
        self.config_dir().join("table_config")
    }

    pub fn factor_mapping_path(&self) -> PathBuf {
        self.shared_config_dir().join("factor_mapping.json")
    }

    pub fn shock_config_path(&self) -> PathBuf {
        self.shared_config_dir().join("shock_config.json")
    }

    pub fn md_config(&self, name: &str) -> PathBuf {
        self.md_config_dir().join(format!("{name}.json"))
    }

    pub fn table_config(&self, name: &str) -> PathBuf {
        self.table_config_dir().join(format!("{name}.json"))
    }

    // Intermediate files

    pub fn t0_source_json(&self) -> PathBuf {
        self.intermediate_dir().join("t0_source.json")
    }

    pub fn path_sa_source_csv(&self) -> PathBuf {
        self.intermediate_dir().join("path_SA_source.csv")
    }

    pub fn path_baseline_source_csv(&self) -> PathBuf {
        self.intermediate_dir().join("path_baseline_source.csv")
    }

    pub fn t0_json(&self) -> PathBuf {
        self.intermediate_dir().join("t0.json")
    }

    pub fn path_sa_csv(&self) -> PathBuf {
        self.intermediate_dir().join("path_SA.csv")
    }

    pub fn path_baseline_csv(&self) -> PathBuf {
        self.intermediate_dir().join("path_baseline.csv")
    }

    pub fn shock_data_json(&self) -> PathBuf {
        self.intermediate_dir().join("shock_data.json")
    }

    // Outputs

    pub fn artifacts_dir(&self) -> PathBuf {
        self.root.join("artifacts").join(&self.scenario)
    }

    pub fn artifact(&self, file_name: &str) -> PathBuf {
        self.artifacts_dir().join(file_name)
    }

    /// `data/<scenario>/current/<name>.json`
    pub fn current_table_json(&self, name: &str) -> PathBuf {
        self.current_dir().join(format!("{name}.json"))
    }

    /// `data/<scenario>/history/<name>.json`
    pub fn history_table_json(&self, name: &str) -> PathBuf {
        self.history_dir().join(format!("{name}.json"))
    }

    /// Create every directory a run may write to or read from.
    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        let dirs = [
            self.source_dir(),
            self.intermediate_dir(),
            self.current_dir(),
            self.history_dir(),
            self.md_config_dir(),
            self.table_config_dir(),
            self.artifacts_dir(),
        ];
        for dir in dirs {
            fs::create_dir_all(&dir).map_err(|e| {
                AppError::new(2, format!("Failed to create directory '{}': {e}", dir.display()))
            })?;
        }
        Ok(())
    }

    /// Leading digits of the scenario id (`2026-proposed` → `2026`).
    ///
    /// Falls back to the whole id when it does not start with a year.
    pub fn scenario_year(&self) -> &str {
        let end = self
            .scenario
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.scenario.len());
        if end == 0 { &self.scenario } else { &self.scenario[..end] }
    }

    pub fn source_files(&self) -> SourceFiles {
        SourceFiles::new(&self.source_dir(), self.scenario_year())
    }
}

/// Domestic/international pair of published tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFiles {
    pub domestic: PathBuf,
    pub international: PathBuf,
}

impl RegionFiles {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        [
            ("domestic", self.domestic.as_path()),
            ("international", self.international.as_path()),
        ]
        .into_iter()
    }
}

/// The six published source tables for a scenario year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    pub historic: RegionFiles,
    pub baseline: RegionFiles,
    pub severely_adverse: RegionFiles,
}

impl SourceFiles {
    pub fn new(dir: &Path, year: &str) -> Self {
        let file = |table: &str, name: &str| dir.join(format!("{year}-Table_{table}_{name}.csv"));
        Self {
            historic: RegionFiles {
                domestic: file("1A", "Historic_Domestic"),
                international: file("1B", "Historic_International"),
            },
            baseline: RegionFiles {
                domestic: file("2A", "Supervisory_Baseline_Domestic"),
                international: file("2B", "Supervisory_Baseline_International"),
            },
            severely_adverse: RegionFiles {
                domestic: file("3A", "Supervisory_Severely_Adverse_Domestic"),
                international: file("3B", "Supervisory_Severely_Adverse_International"),
            },
        }
    }
}
