//! Dependency inference for a single target.
//!
//! The pieces compose leaves-first:
//! - [`classify`]: one header -> one [`Classification`]
//! - [`choices`]: the set of consistent assignments
//! - [`score`]: ranking of assignments

pub mod choices;
pub mod classify;
pub mod errors;
pub mod mappings;
pub mod score;

pub use choices::{Assignment, ChoiceSet};
pub use classify::{Classification, Classifier};
pub use errors::{ResolveError, UnresolvedHeader};
pub use mappings::{MappingTables, MappingsConfig};
pub use score::{ScoreKey, ScoreStrategy, Scorer};
