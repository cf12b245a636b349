//! Target definitions - the libraries whose dependencies get inferred.
//!
//! A Target is read once from the build description and stays immutable for
//! the rest of the run. Its weight and avoidance penalty are derived here so
//! the scorer never has to consult anything but the target record.

use std::collections::BTreeSet;

use serde::Serialize;

/// Tag that marks a target as expensive to depend on.
pub const TAG_AVOID_DEP: &str = "avoid_dep";

/// Tag that exempts a target from dependency fixing.
pub const TAG_NOFIXDEPS: &str = "nofixdeps";

/// Avoidance penalty contributed by [`TAG_AVOID_DEP`].
pub const AVOID_DEP_PENALTY: u64 = 10;

/// Avoidance penalty contributed by [`TAG_NOFIXDEPS`].
pub const NOFIXDEPS_PENALTY: u64 = 1;

/// A declared build target (library).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Target identifier, unique within the build description
    pub name: String,

    /// Public header paths
    pub public_hdrs: Vec<String>,

    /// Private header paths
    pub hdrs: Vec<String>,

    /// Source file paths
    pub srcs: Vec<String>,

    /// Existing internal dependencies as declared by hand
    pub deps: BTreeSet<String>,

    /// Existing external dependencies as declared by hand
    pub external_deps: BTreeSet<String>,

    /// Free-form tags
    pub tags: BTreeSet<String>,

    /// Whether the target uses a conditional dependency form that cannot be
    /// rewritten as a flat list
    pub has_select_deps: bool,
}

impl Target {
    /// Create an empty target with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Target {
            name: name.into(),
            public_hdrs: Vec::new(),
            hdrs: Vec::new(),
            srcs: Vec::new(),
            deps: BTreeSet::new(),
            external_deps: BTreeSet::new(),
            tags: BTreeSet::new(),
            has_select_deps: false,
        }
    }

    /// Set private headers.
    pub fn with_hdrs(mut self, hdrs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hdrs = hdrs.into_iter().map(Into::into).collect();
        self
    }

    /// Set public headers.
    pub fn with_public_hdrs(mut self, hdrs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.public_hdrs = hdrs.into_iter().map(Into::into).collect();
        self
    }

    /// Set sources.
    pub fn with_srcs(mut self, srcs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.srcs = srcs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the existing internal dependency declaration.
    pub fn with_deps(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the existing external dependency declaration.
    pub fn with_external_deps(
        mut self,
        deps: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.external_deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether the target carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// All declared headers, public first.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.public_hdrs
            .iter()
            .chain(self.hdrs.iter())
            .map(String::as_str)
    }

    /// Every file that gets scanned for includes: headers, then sources.
    pub fn scanned_files(&self) -> impl Iterator<Item = &str> {
        self.headers().chain(self.srcs.iter().map(String::as_str))
    }

    /// Cost of depending on this target: its header count.
    pub fn weight(&self) -> u64 {
        (self.public_hdrs.len() + self.hdrs.len()) as u64
    }

    /// Penalty for pulling this target into a dependency list.
    pub fn avoidance(&self) -> u64 {
        let mut penalty = 0;
        if self.has_tag(TAG_AVOID_DEP) {
            penalty += AVOID_DEP_PENALTY;
        }
        if self.has_tag(TAG_NOFIXDEPS) {
            penalty += NOFIXDEPS_PENALTY;
        }
        penalty
    }
}
