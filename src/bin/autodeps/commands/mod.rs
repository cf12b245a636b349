//! Command implementations

pub mod classify;
pub mod completions;
pub mod fix;
