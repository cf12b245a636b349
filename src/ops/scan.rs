//! Textual `#include` extraction.
//!
//! Lines are matched one at a time. Nothing is preprocessed: includes inside
//! comments or disabled `#if` blocks count like any other.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::Target;
use crate::resolver::ResolveError;

static ANGLE_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"#\s*include\s*<([^>]*)>"#).expect("valid regex"));

static QUOTE_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"#\s*include\s*"([^"]*)""#).expect("valid regex"));

/// What a scan of one target's files found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Every included header, sorted and deduplicated
    pub includes: BTreeSet<String>,
    /// Whether any line mentioned a legacy codegen marker
    pub uses_codegen: bool,
}

/// Line scanner for include directives and marker symbols.
#[derive(Debug, Clone)]
pub struct IncludeScanner {
    codegen_markers: Vec<String>,
}

impl IncludeScanner {
    /// Create a scanner that also looks for the given marker symbols.
    pub fn new(codegen_markers: Vec<String>) -> Self {
        IncludeScanner { codegen_markers }
    }

    /// Scan text, accumulating into `result`.
    pub fn scan_content(&self, content: &str, result: &mut ScanResult) {
        for line in content.lines() {
            if let Some(cap) = ANGLE_INCLUDE.captures(line) {
                result.includes.insert(cap[1].to_string());
            }
            if let Some(cap) = QUOTE_INCLUDE.captures(line) {
                result.includes.insert(cap[1].to_string());
            }
            if !result.uses_codegen
                && self
                    .codegen_markers
                    .iter()
                    .any(|marker| line.contains(marker.as_str()))
            {
                result.uses_codegen = true;
            }
        }
    }

    /// Scan every header and source of `target`, relative to `root`.
    pub fn scan_target(&self, root: &Path, target: &Target) -> Result<ScanResult, ResolveError> {
        let mut result = ScanResult::default();
        for file in target.scanned_files() {
            let path = root.join(file);
            let bytes = std::fs::read(&path).map_err(|source| ResolveError::UnreadableSource {
                target: target.name.clone(),
                path: path.clone(),
                source,
            })?;
            self.scan_content(&String::from_utf8_lossy(&bytes), &mut result);
        }
        tracing::debug!(
            "{}: {} includes in {} files",
            target.name,
            result.includes.len(),
            target.scanned_files().count()
        );
        Ok(result)
    }
}
