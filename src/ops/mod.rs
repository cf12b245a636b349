//! High-level operations.
//!
//! This module contains the implementation of autodeps commands.

pub mod apply;
pub mod commands;
pub mod fix_deps;
pub mod scan;

pub use apply::{Applier, ApplyError, ExternalApplier, TomlApplier};
pub use commands::{diff_commands, render, Edit, MutationCommand};
pub use fix_deps::{
    fix_and_apply, fix_deps, FixOptions, FixReport, SkipReason, TargetOutcome, TargetReport,
};
pub use scan::{IncludeScanner, ScanResult};
