//! Core data structures for autodeps.
//!
//! This module contains the inputs every run starts from:
//! - Targets read from the build description
//! - The build description loader
//! - The header -> provider index

pub mod build_file;
pub mod header_index;
pub mod target;

pub use build_file::{find_build_file, BuildFile, BuildFileError, BUILD_FILE_NAME};
pub use header_index::HeaderIndex;
pub use target::Target;
