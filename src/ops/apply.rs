//! Submitting a command batch.
//!
//! The whole batch of one run is handed over in a single call. Two
//! appliers exist: an external program that reads commands from a file,
//! and a native editor that rewrites `BUILD.toml` with `toml_edit`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use toml_edit::{value, Array, DocumentMut, Table};

use crate::ops::commands::{render, Edit, MutationCommand};
use crate::util::diagnostic::Diagnostic;
use crate::util::fs;
use crate::util::process::{find_executable, ProcessBuilder};

/// Exit statuses an external applier may return without failing the run.
pub const DEFAULT_ACCEPTED_STATUSES: &[i32] = &[0, 3];

/// Error applying a command batch.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("`{command}` failed with status {}", .status.map_or("<signal>".to_string(), |s| s.to_string()))]
    RejectedStatus {
        command: String,
        status: Option<i32>,
        accepted: Vec<i32>,
    },

    #[error("no library named `{target}` in {}", .path.display())]
    UnknownTarget { target: String, path: PathBuf },

    #[error("library `{target}` has no `{field}` to rename")]
    MissingField { target: String, field: String },

    #[error("{} has no [[library]] tables to edit", .path.display())]
    UnsupportedLayout { path: PathBuf },
}

impl ApplyError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ApplyError::RejectedStatus { accepted, .. } => {
                let accepted: Vec<String> = accepted.iter().map(i32::to_string).collect();
                diag.with_context(format!("accepted statuses: {}", accepted.join(", ")))
                    .with_suggestion("Re-run with --dry-run to inspect the command batch")
            }
            ApplyError::UnknownTarget { path, .. } | ApplyError::UnsupportedLayout { path } => {
                diag.with_location(path)
            }
            ApplyError::MissingField { .. } => diag,
        }
    }
}

/// Something that can carry out a batch of commands.
pub trait Applier {
    /// Apply every command, in order.
    fn apply(&self, commands: &[MutationCommand]) -> Result<()>;
}

/// Runs an external program over a file containing the rendered batch.
#[derive(Debug, Clone)]
pub struct ExternalApplier {
    program: PathBuf,
    args: Vec<String>,
    accepted_statuses: Vec<i32>,
    cwd: PathBuf,
}

impl ExternalApplier {
    /// Create an applier; bare program names are looked up in `PATH`.
    ///
    /// The program is invoked as `program args... <command-file>` from `cwd`.
    pub fn new(program: impl AsRef<Path>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        let program = program.as_ref();
        let cwd = cwd.into();
        let resolved = if program.components().count() == 1 {
            find_executable(&program.to_string_lossy()).unwrap_or_else(|| program.to_path_buf())
        } else if program.is_relative() {
            cwd.join(program)
        } else {
            program.to_path_buf()
        };

        ExternalApplier {
            program: resolved,
            args,
            accepted_statuses: DEFAULT_ACCEPTED_STATUSES.to_vec(),
            cwd,
        }
    }

    /// Override the accepted exit statuses.
    pub fn with_accepted_statuses(mut self, statuses: Vec<i32>) -> Self {
        self.accepted_statuses = statuses;
        self
    }
}

impl Applier for ExternalApplier {
    fn apply(&self, commands: &[MutationCommand]) -> Result<()> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut file = tempfile::NamedTempFile::new()
            .context("failed to create temporary command file")?;
        file.write_all(render(commands).as_bytes())
            .context("failed to write command file")?;
        file.flush().context("failed to write command file")?;

        let process = ProcessBuilder::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .cwd(&self.cwd);

        tracing::info!("applying {} commands with `{}`", commands.len(), process.display_command());
        let status = process.status()?;

        match status.code() {
            Some(code) if self.accepted_statuses.contains(&code) => Ok(()),
            code => Err(ApplyError::RejectedStatus {
                command: process.display_command(),
                status: code,
                accepted: self.accepted_statuses.clone(),
            }
            .into()),
        }
    }
}

/// Edits `[[library]]` tables of a build file in place.
#[derive(Debug, Clone)]
pub struct TomlApplier {
    path: PathBuf,
}

impl TomlApplier {
    /// Create an applier for the build file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TomlApplier { path: path.into() }
    }

    /// Apply commands to document text, returning the edited text.
    pub fn apply_to_str(&self, contents: &str, commands: &[MutationCommand]) -> Result<String> {
        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("failed to parse {}", self.path.display()))?;

        let libraries = doc
            .get_mut("library")
            .and_then(|item| item.as_array_of_tables_mut())
            .ok_or_else(|| ApplyError::UnsupportedLayout {
                path: self.path.clone(),
            })?;

        for command in commands {
            let table = libraries
                .iter_mut()
                .find(|table| {
                    table.get("name").and_then(|name| name.as_str()) == Some(command.target.as_str())
                })
                .ok_or_else(|| ApplyError::UnknownTarget {
                    target: command.target.clone(),
                    path: self.path.clone(),
                })?;

            apply_edit(table, &command.target, &command.edit)?;
        }

        Ok(doc.to_string())
    }
}

fn apply_edit(table: &mut Table, target: &str, edit: &Edit) -> Result<(), ApplyError> {
    match edit {
        Edit::Set { field, values } => {
            let array: Array = values.iter().map(String::as_str).collect();
            table[field.as_str()] = value(array);
        }
        Edit::Remove { field } => {
            table.remove(field);
        }
        Edit::Rename { from, to } => {
            let item = table.remove(from).ok_or_else(|| ApplyError::MissingField {
                target: target.to_string(),
                field: from.clone(),
            })?;
            table.insert(to, item);
        }
    }
    Ok(())
}

impl Applier for TomlApplier {
    fn apply(&self, commands: &[MutationCommand]) -> Result<()> {
        if commands.is_empty() {
            return Ok(());
        }

        let contents = fs::read_to_string(&self.path)?;
        let edited = self.apply_to_str(&contents, commands)?;
        fs::write_string(&self.path, &edited)?;

        tracing::info!("applied {} commands to {}", commands.len(), self.path.display());
        Ok(())
    }
}
