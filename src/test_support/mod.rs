//! Test utilities for autodeps unit tests.
//!
//! Provides temporary source-tree fixtures and an applier that records the
//! batches it is given instead of touching any file.

pub mod fixtures;

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use crate::ops::apply::Applier;
use crate::ops::commands::MutationCommand;

pub use fixtures::*;

/// Applier that records every batch it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingApplier {
    batches: Arc<Mutex<Vec<Vec<MutationCommand>>>>,
    fail: bool,
}

impl RecordingApplier {
    /// Create a recorder that accepts every batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that rejects every batch.
    pub fn failing() -> Self {
        RecordingApplier {
            batches: Arc::default(),
            fail: true,
        }
    }

    /// Batches received so far.
    pub fn batches(&self) -> Vec<Vec<MutationCommand>> {
        self.batches.lock().unwrap().clone()
    }
}

impl Applier for RecordingApplier {
    fn apply(&self, commands: &[MutationCommand]) -> Result<()> {
        self.batches.lock().unwrap().push(commands.to_vec());
        if self.fail {
            bail!("recording applier configured to fail");
        }
        Ok(())
    }
}
