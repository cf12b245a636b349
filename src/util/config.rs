//! Configuration file support for autodeps.
//!
//! Two configuration file locations are read:
//! - Global: `~/.autodeps/config.toml` - User-wide defaults
//! - Project: `.autodeps/config.toml` next to `BUILD.toml` - Project overrides
//!
//! Project config takes precedence over global config. An explicit
//! `--config` path takes the place of the project file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ops::apply::DEFAULT_ACCEPTED_STATUSES;
use crate::ops::fix_deps::{FixOptions, DEFAULT_CODEGEN_DEP, DEFAULT_CODEGEN_MARKERS};
use crate::resolver::{MappingTables, MappingsConfig, ScoreStrategy};

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR_NAME: &str = ".autodeps";

/// autodeps configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inference settings
    pub inference: InferenceConfig,

    /// Header mapping tables
    pub mappings: MappingsConfig,

    /// How command batches are applied
    pub apply: ApplyConfig,
}

/// Inference-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base-score strategy (edit_distance, list_size, best)
    pub score: Option<ScoreStrategy>,

    /// Only process targets carrying this tag
    pub opt_in_tag: Option<String>,

    /// Symbols that mark use of the legacy codegen interface
    pub codegen_markers: Option<Vec<String>>,

    /// Dependency injected for codegen users
    pub codegen_dep: Option<String>,
}

/// Apply-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// External program run over the command file (None = edit BUILD.toml)
    pub program: Option<PathBuf>,

    /// Arguments placed before the command file
    pub args: Vec<String>,

    /// Exit statuses of `program` that count as success
    pub accepted_statuses: Option<Vec<i32>>,

    /// Write external deps through the temporary `deps` field
    pub external_via_deps: Option<bool>,
}

impl ApplyConfig {
    /// Accepted statuses, falling back to the defaults.
    pub fn accepted_statuses(&self) -> Vec<i32> {
        self.accepted_statuses
            .clone()
            .unwrap_or_else(|| DEFAULT_ACCEPTED_STATUSES.to_vec())
    }

    /// Whether external deps go through `deps`, on unless disabled.
    pub fn external_via_deps(&self) -> bool {
        self.external_via_deps.unwrap_or(true)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Inference settings
        if other.inference.score.is_some() {
            self.inference.score = other.inference.score;
        }
        if other.inference.opt_in_tag.is_some() {
            self.inference.opt_in_tag = other.inference.opt_in_tag;
        }
        if other.inference.codegen_markers.is_some() {
            self.inference.codegen_markers = other.inference.codegen_markers;
        }
        if other.inference.codegen_dep.is_some() {
            self.inference.codegen_dep = other.inference.codegen_dep;
        }

        self.mappings.merge(other.mappings);

        // Apply settings
        if other.apply.program.is_some() {
            self.apply.program = other.apply.program;
            self.apply.args = other.apply.args;
        }
        if other.apply.accepted_statuses.is_some() {
            self.apply.accepted_statuses = other.apply.accepted_statuses;
        }
        if other.apply.external_via_deps.is_some() {
            self.apply.external_via_deps = other.apply.external_via_deps;
        }
    }

    /// Mapping tables described by this configuration.
    pub fn mapping_tables(&self) -> MappingTables {
        MappingTables::from_config(&self.mappings)
    }

    /// Fix options described by this configuration.
    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            targets: Vec::new(),
            strategy: self.inference.score.unwrap_or_default(),
            opt_in_tag: self.inference.opt_in_tag.clone(),
            codegen_markers: self.inference.codegen_markers.clone().unwrap_or_else(|| {
                DEFAULT_CODEGEN_MARKERS.iter().map(|s| s.to_string()).collect()
            }),
            codegen_dep: self
                .inference
                .codegen_dep
                .clone()
                .unwrap_or_else(|| DEFAULT_CODEGEN_DEP.to_string()),
            external_via_deps: self.apply.external_via_deps(),
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.autodeps/config.toml)
/// 2. Global config (~/.autodeps/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path.filter(|p| p.exists()) {
        config.merge(Config::load_or_default(global_path));
    }

    // Project config overrides global
    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global autodeps config directory (~/.autodeps).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.autodeps/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.autodeps/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join("config.toml")
}
