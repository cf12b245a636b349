//! Global context for autodeps operations.
//!
//! Provides centralized access to the working directory, the build file
//! location and the layered configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{find_build_file, BuildFileError};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Global context containing the paths a command works from.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Explicit build file, bypassing the upward search
    build_file: Option<PathBuf>,

    /// Explicit config file, replacing the project layer
    config_file: Option<PathBuf>,

    /// Global config file (~/.autodeps/config.toml)
    global_config: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            build_file: None,
            config_file: None,
            global_config: global_config_path(),
        }
    }

    /// Use an explicit build file.
    pub fn set_build_file(&mut self, path: Option<PathBuf>) {
        self.build_file = path.map(|p| self.absolute(p));
    }

    /// Use an explicit config file in place of the project one.
    pub fn set_config_file(&mut self, path: Option<PathBuf>) {
        self.config_file = path.map(|p| self.absolute(p));
    }

    /// Override the global config location (None disables it).
    pub fn set_global_config(&mut self, path: Option<PathBuf>) {
        self.global_config = path;
    }

    fn absolute(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.cwd.join(path)
        }
    }

    /// Locate the build file: the explicit one, or `BUILD.toml` in cwd or
    /// any parent directory.
    ///
    /// An explicit path is returned as given; loading reports it if missing.
    pub fn find_build_file(&self) -> Result<PathBuf, BuildFileError> {
        match &self.build_file {
            Some(path) => Ok(path.clone()),
            None => find_build_file(&self.cwd),
        }
    }

    /// The project config path next to `build_file`, unless overridden.
    pub fn project_config_path(&self, build_file: &Path) -> PathBuf {
        match &self.config_file {
            Some(path) => path.clone(),
            None => project_config_path(build_file.parent().unwrap_or(&self.cwd)),
        }
    }

    /// Load the merged configuration for `build_file`.
    pub fn load_config(&self, build_file: &Path) -> Config {
        let project = self.project_config_path(build_file);
        if let Some(explicit) = &self.config_file {
            if !explicit.exists() {
                tracing::warn!("config file {} does not exist", explicit.display());
            }
        }
        load_config(self.global_config.as_deref(), &project)
    }
}
