//! autodeps - dependency inference for C/C++ build descriptions
//!
//! This crate scans the headers and sources of every library declared in a
//! `BUILD.toml`, maps each include to the library or external package that
//! provides it, and emits the edits that bring each `deps` and
//! `external_deps` list in line with what the code actually includes.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities for autodeps unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides source-tree fixtures and a recording applier.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildFile, HeaderIndex, Target};
pub use ops::{fix_deps, FixOptions, FixReport};
pub use resolver::{ChoiceSet, Classification, Classifier, MappingTables, ScoreStrategy};
pub use util::context::GlobalContext;
