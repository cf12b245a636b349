//! Mutation commands against a target's dependency declarations.
//!
//! Commands render to the line format understood by buildozer-style tools:
//! `set deps "a" "b"|:foo`, `remove deps|:foo`, `rename deps external_deps|:foo`.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Field holding internal dependencies.
pub const DEPS: &str = "deps";

/// Field holding external dependencies.
pub const EXTERNAL_DEPS: &str = "external_deps";

/// One edit of a list field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Replace the field with a literal list
    Set { field: String, values: Vec<String> },
    /// Delete the field
    Remove { field: String },
    /// Move the field to a new name
    Rename { from: String, to: String },
}

/// An edit addressed to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationCommand {
    pub target: String,
    #[serde(flatten)]
    pub edit: Edit,
}

impl MutationCommand {
    pub fn set(
        target: impl Into<String>,
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        MutationCommand {
            target: target.into(),
            edit: Edit::Set {
                field: field.into(),
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn remove(target: impl Into<String>, field: impl Into<String>) -> Self {
        MutationCommand {
            target: target.into(),
            edit: Edit::Remove {
                field: field.into(),
            },
        }
    }

    pub fn rename(
        target: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        MutationCommand {
            target: target.into(),
            edit: Edit::Rename {
                from: from.into(),
                to: to.into(),
            },
        }
    }

    /// Label of the target in command lines.
    pub fn label(&self) -> String {
        format!(":{}", self.target)
    }
}

impl fmt::Display for MutationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.edit {
            Edit::Set { field, values } => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
                write!(f, "set {} {}|{}", field, quoted.join(" "), self.label())
            }
            Edit::Remove { field } => write!(f, "remove {}|{}", field, self.label()),
            Edit::Rename { from, to } => write!(f, "rename {} {}|{}", from, to, self.label()),
        }
    }
}

/// Commands that make `field` hold exactly `values`.
///
/// An empty list removes the field. With `via`, the list is written to the
/// temporary field first and then renamed over `field`.
pub fn set_list(
    target: &str,
    field: &str,
    values: &BTreeSet<String>,
    via: Option<&str>,
) -> Vec<MutationCommand> {
    if values.is_empty() {
        return vec![MutationCommand::remove(target, field)];
    }

    match via {
        Some(via) => vec![
            MutationCommand::set(target, via, values.iter().cloned()),
            MutationCommand::remove(target, field),
            MutationCommand::rename(target, via, field),
        ],
        None => vec![MutationCommand::set(target, field, values.iter().cloned())],
    }
}

/// Diff the selected assignments against the existing declarations.
///
/// External deps are emitted first. When they go through the temporary
/// `deps` field a non-empty internal list is always re-established
/// afterwards, even if it did not change.
pub fn diff_commands(
    target: &str,
    deps: &BTreeSet<String>,
    existing_deps: &BTreeSet<String>,
    external_deps: &BTreeSet<String>,
    existing_external_deps: &BTreeSet<String>,
    external_via_deps: bool,
) -> Vec<MutationCommand> {
    let mut commands = Vec::new();

    let external_changed = external_deps != existing_external_deps;
    let via = external_via_deps.then_some(DEPS);
    if external_changed {
        commands.extend(set_list(target, EXTERNAL_DEPS, external_deps, via));
    }

    let clobbered =
        external_changed && via.is_some() && !external_deps.is_empty() && !deps.is_empty();
    if clobbered || deps != existing_deps {
        commands.extend(set_list(target, DEPS, deps, None));
    }

    commands
}

/// Render a batch, one command per line.
pub fn render(commands: &[MutationCommand]) -> String {
    commands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
