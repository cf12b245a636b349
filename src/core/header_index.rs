//! Reverse index from header path to the targets that declare it.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::target::Target;

static NO_PROVIDERS: BTreeSet<String> = BTreeSet::new();

/// Maps every declared header to the set of targets exposing it.
///
/// A header declared by several targets yields several providers; each is
/// an equally valid way of satisfying an include of that header.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    providers: BTreeMap<String, BTreeSet<String>>,
}

impl HeaderIndex {
    /// Build the index from every target's public and private headers.
    pub fn build<'a>(targets: impl IntoIterator<Item = &'a Target>) -> Self {
        let mut index = HeaderIndex::default();
        for target in targets {
            for header in target.headers() {
                index.insert(header, &target.name);
            }
        }
        tracing::debug!("indexed {} headers", index.providers.len());
        index
    }

    /// Record that `target` declares `header`.
    pub fn insert(&mut self, header: impl Into<String>, target: impl Into<String>) {
        self.providers
            .entry(header.into())
            .or_default()
            .insert(target.into());
    }

    /// Targets providing `header`; empty if nobody declares it.
    pub fn lookup(&self, header: &str) -> &BTreeSet<String> {
        self.providers.get(header).unwrap_or(&NO_PROVIDERS)
    }

    /// Whether any target declares `header`.
    pub fn contains(&self, header: &str) -> bool {
        self.providers.contains_key(header)
    }

    /// Number of distinct headers indexed.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
