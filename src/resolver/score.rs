//! Ranking of candidate assignments.
//!
//! Assignments are compared by a composite key, lowest first:
//! 1. total avoidance penalty of the chosen targets
//! 2. the strategy's base score
//! 3. total weight of the chosen targets

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::Target;
use crate::resolver::choices::Assignment;

/// Base-score strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStrategy {
    /// Minimize churn against the existing declaration
    #[default]
    EditDistance,
    /// Minimize the number of dependencies
    ListSize,
    /// Defer entirely to the weight tiebreak
    Best,
}

impl ScoreStrategy {
    /// All strategy names, in CLI order.
    pub const NAMES: &'static [&'static str] = &["edit_distance", "list_size", "best"];

    /// The strategy's name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStrategy::EditDistance => "edit_distance",
            ScoreStrategy::ListSize => "list_size",
            ScoreStrategy::Best => "best",
        }
    }

    /// Base score of `proposed` given the `existing` declaration.
    pub fn base_score(&self, proposed: &Assignment, existing: &BTreeSet<String>) -> u64 {
        match self {
            ScoreStrategy::EditDistance => {
                proposed.symmetric_difference(existing).count() as u64
            }
            ScoreStrategy::ListSize => proposed.len() as u64,
            ScoreStrategy::Best => 0,
        }
    }
}

impl fmt::Display for ScoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edit_distance" => Ok(ScoreStrategy::EditDistance),
            "list_size" => Ok(ScoreStrategy::ListSize),
            "best" => Ok(ScoreStrategy::Best),
            _ => Err(format!(
                "unknown scoring function `{}`, expected one of: {}",
                s,
                ScoreStrategy::NAMES.join(", ")
            )),
        }
    }
}

/// Composite ranking key; field order is comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScoreKey {
    pub avoidance: u64,
    pub base: u64,
    pub weight: u64,
}

/// Scores assignments using per-target weight and avoidance.
#[derive(Debug, Clone)]
pub struct Scorer<'a> {
    strategy: ScoreStrategy,
    targets: BTreeMap<&'a str, &'a Target>,
}

impl<'a> Scorer<'a> {
    /// Create a scorer over the known targets.
    pub fn new(strategy: ScoreStrategy, targets: impl IntoIterator<Item = &'a Target>) -> Self {
        Scorer {
            strategy,
            targets: targets
                .into_iter()
                .map(|target| (target.name.as_str(), target))
                .collect(),
        }
    }

    /// Score `proposed` against the `existing` declaration.
    ///
    /// Names that are not targets (external packages, fixed internal
    /// packages) carry no weight and no penalty.
    pub fn score(&self, proposed: &Assignment, existing: &BTreeSet<String>) -> ScoreKey {
        let mut avoidance = 0;
        let mut weight = 0;
        for dep in proposed {
            if let Some(target) = self.targets.get(dep.as_str()) {
                avoidance += target.avoidance();
                weight += target.weight();
            }
        }

        ScoreKey {
            avoidance,
            base: self.strategy.base_score(proposed, existing),
            weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::choices::ChoiceSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strategy_parse_and_display() {
        for name in ScoreStrategy::NAMES {
            let strategy: ScoreStrategy = name.parse().unwrap();
            assert_eq!(strategy.to_string(), *name);
        }
        let err = "fastest".parse::<ScoreStrategy>().unwrap_err();
        assert!(err.contains("edit_distance, list_size, best"));
    }

    #[test]
    fn test_base_scores() {
        let proposed = set(&["a", "b"]);
        let existing = set(&["b", "c", "d"]);

        assert_eq!(ScoreStrategy::EditDistance.base_score(&proposed, &existing), 3);
        assert_eq!(ScoreStrategy::ListSize.base_score(&proposed, &existing), 2);
        assert_eq!(ScoreStrategy::Best.base_score(&proposed, &existing), 0);
    }

    #[test]
    fn test_edit_distance_prefers_existing_choice() {
        let targets = vec![
            Target::new("impl_a").with_hdrs(["iface.h"]),
            Target::new("impl_b").with_hdrs(["iface.h"]),
        ];
        let scorer = Scorer::new(ScoreStrategy::EditDistance, &targets);

        let mut choices = ChoiceSet::new();
        choices.add_one_of(["impl_a", "impl_b"]);

        let existing = set(&["impl_b"]);
        assert_eq!(scorer.score(&set(&["impl_a"]), &existing).base, 2);
        assert_eq!(scorer.score(&set(&["impl_b"]), &existing).base, 0);

        let best = choices.best(|alt| scorer.score(alt, &existing));
        assert_eq!(best, set(&["impl_b"]));
    }

    #[test]
    fn test_avoidance_dominates_base_score() {
        let targets = vec![
            Target::new("cheap").with_hdrs(["x.h"]),
            Target::new("avoided").with_hdrs(["x.h"]).with_tags(["avoid_dep"]),
        ];
        let scorer = Scorer::new(ScoreStrategy::EditDistance, &targets);

        // The avoided target is already declared, which would make it the
        // zero-distance choice without the penalty.
        let existing = set(&["avoided"]);
        let avoided = scorer.score(&set(&["avoided"]), &existing);
        let cheap = scorer.score(&set(&["cheap"]), &existing);
        assert!(cheap < avoided);
    }

    #[test]
    fn test_weight_breaks_ties() {
        let targets = vec![
            Target::new("big").with_hdrs(["x.h", "y.h", "z.h"]),
            Target::new("small").with_hdrs(["x.h"]),
        ];
        let scorer = Scorer::new(ScoreStrategy::Best, &targets);

        let mut choices = ChoiceSet::new();
        choices.add_one_of(["big", "small"]);

        let best = choices.best(|alt| scorer.score(alt, &BTreeSet::new()));
        assert_eq!(best, set(&["small"]));
    }

    #[test]
    fn test_unknown_names_are_free() {
        let scorer = Scorer::new(ScoreStrategy::ListSize, &[]);
        let key = scorer.score(&set(&["absl/strings"]), &BTreeSet::new());
        assert_eq!(
            key,
            ScoreKey {
                avoidance: 0,
                base: 1,
                weight: 0
            }
        );
    }
}
