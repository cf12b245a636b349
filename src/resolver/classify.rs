//! Header classification.
//!
//! Every included header maps to exactly one [`Classification`]. The rules
//! form an ordered cascade and the first matching rule wins. Later rules are
//! more general than earlier ones, so the order must not change: a header
//! that is both declared locally and present in a fixed table resolves the
//! way the cascade below says, not by any cleaner principle.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::core::HeaderIndex;
use crate::resolver::mappings::MappingTables;

/// Prefix tried when a header is not found in the index as written.
const INCLUDE_PREFIX: &str = "include/";

/// The meaning of one included header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Classification {
    /// A fixed or derived internal package
    InternalFixed(String),
    /// A fixed external package
    ExternalFixed(String),
    /// Any one of these targets provides the header
    InternalCandidates(BTreeSet<String>),
    /// External package derived from a namespaced path
    ExternalNamespace(String),
    /// System or ignorable header
    SystemIgnored,
    /// No rule matched
    Unresolvable(String),
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::InternalFixed(name) => write!(f, "internal {}", name),
            Classification::ExternalFixed(name) => write!(f, "external {}", name),
            Classification::InternalCandidates(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                write!(f, "internal one of [{}]", names.join(", "))
            }
            Classification::ExternalNamespace(name) => write!(f, "external {} (namespace)", name),
            Classification::SystemIgnored => write!(f, "system (ignored)"),
            Classification::Unresolvable(header) => write!(f, "unresolvable: {}", header),
        }
    }
}

/// Classifies headers against the header index and the mapping tables.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    index: &'a HeaderIndex,
    tables: &'a MappingTables,
}

impl<'a> Classifier<'a> {
    /// Create a classifier over an index and a set of tables.
    pub fn new(index: &'a HeaderIndex, tables: &'a MappingTables) -> Self {
        Classifier { index, tables }
    }

    /// Classify a single header path.
    pub fn classify(&self, header: &str) -> Classification {
        let tables = self.tables;

        if tables.ignore.contains(header) {
            return Classification::SystemIgnored;
        }

        if let Some(package) = tables.internal.get(header) {
            return Classification::InternalFixed(package.clone());
        }

        if self.index.contains(header) {
            return Classification::InternalCandidates(self.index.lookup(header).clone());
        }

        let prefixed = format!("{}{}", INCLUDE_PREFIX, header);
        if self.index.contains(&prefixed) {
            return Classification::InternalCandidates(self.index.lookup(&prefixed).clone());
        }

        // C++ standard library headers carry no extension.
        if !header.contains('.') {
            return Classification::SystemIgnored;
        }

        if let Some(package) = tables.external.get(header) {
            return Classification::ExternalFixed(package.clone());
        }

        for rule in &tables.namespaces {
            if let Some(rest) = header.strip_prefix(rule.prefix.as_str()) {
                // The segment must be a directory with a name.
                return match rest.split_once('/') {
                    Some((segment, _)) if !segment.is_empty() => Classification::ExternalNamespace(
                        format!("{}{}", rule.package_prefix, segment),
                    ),
                    _ => Classification::Unresolvable(header.to_string()),
                };
            }
        }

        for prefix in &tables.service_prefixes {
            if header.starts_with(prefix.as_str()) {
                return match service_package(header) {
                    Some(package) => Classification::InternalFixed(package),
                    None => Classification::Unresolvable(header.to_string()),
                };
            }
        }

        for rule in &tables.prefix_packages {
            let excluded = rule
                .exclude_suffix
                .as_deref()
                .is_some_and(|suffix| header.ends_with(suffix));
            if header.starts_with(rule.prefix.as_str()) && !excluded {
                return Classification::ExternalFixed(rule.package.clone());
            }
        }

        if !header.contains('/') {
            return Classification::SystemIgnored;
        }

        let leading = header.split('/').next().unwrap_or_default();
        if tables.system_dirs.contains(leading) {
            return Classification::SystemIgnored;
        }

        if tables.skip.contains(header) {
            return Classification::SystemIgnored;
        }

        Classification::Unresolvable(header.to_string())
    }
}

/// Derive a service package from a generated header path.
///
/// `envoy/config/core/v3/address.upb.h` becomes `envoy_config_core_upb`: the
/// directory minus its last segment, joined with the filename's second
/// dotted component.
fn service_package(header: &str) -> Option<String> {
    let (dir, file) = match header.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", header),
    };
    let kind = file.split('.').nth(1)?;

    let mut parts: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    parts.pop();
    parts.push(kind);
    Some(parts.join("_"))
}
