//! The set of candidate dependency assignments for one target.
//!
//! Each include that several targets can satisfy multiplies the number of
//! valid assignments. [`ChoiceSet`] keeps all of them, eagerly, as a set of
//! sets; identical alternatives collapse as soon as they appear.

use std::collections::BTreeSet;

/// One concrete dependency list.
pub type Assignment = BTreeSet<String>;

/// Every dependency assignment consistent with the headers seen so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    alternatives: BTreeSet<Assignment>,
}

impl ChoiceSet {
    /// A choice set holding the single empty assignment.
    pub fn new() -> Self {
        let mut alternatives = BTreeSet::new();
        alternatives.insert(Assignment::new());
        ChoiceSet { alternatives }
    }

    /// Require at least one of `candidates`.
    ///
    /// Every existing alternative is extended with each candidate in turn.
    /// An empty candidate set leaves the choices untouched.
    pub fn add_one_of<I, S>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates: Vec<S> = candidates.into_iter().collect();
        if candidates.is_empty() {
            return;
        }

        let mut next = BTreeSet::new();
        for alternative in &self.alternatives {
            for candidate in &candidates {
                let mut extended = alternative.clone();
                extended.insert(candidate.as_ref().to_string());
                next.insert(extended);
            }
        }
        self.alternatives = next;
    }

    /// Require `value` in every alternative.
    pub fn add(&mut self, value: &str) {
        self.add_one_of([value]);
    }

    /// Drop `value` from every alternative.
    pub fn remove(&mut self, value: &str) {
        self.alternatives = std::mem::take(&mut self.alternatives)
            .into_iter()
            .map(|mut alternative| {
                alternative.remove(value);
                alternative
            })
            .collect();
    }

    /// The alternative with the smallest key.
    ///
    /// Alternatives are visited in ascending order and only a strictly
    /// smaller key replaces the current best, so ties always resolve to the
    /// same alternative.
    pub fn best<K, F>(&self, mut key: F) -> Assignment
    where
        K: Ord,
        F: FnMut(&Assignment) -> K,
    {
        let mut best: Option<(K, &Assignment)> = None;
        for alternative in &self.alternatives {
            let score = key(alternative);
            let better = match &best {
                Some((best_score, _)) => score < *best_score,
                None => true,
            };
            if better {
                best = Some((score, alternative));
            }
        }
        best.map(|(_, alternative)| alternative.clone())
            .unwrap_or_default()
    }

    /// Number of distinct alternatives.
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Whether there are no alternatives left.
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Iterate over alternatives in ascending order.
    pub fn alternatives(&self) -> impl Iterator<Item = &Assignment> {
        self.alternatives.iter()
    }
}

impl Default for ChoiceSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> Assignment {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn alternatives(choices: &ChoiceSet) -> Vec<Assignment> {
        choices.alternatives().cloned().collect()
    }

    #[test]
    fn test_starts_with_single_empty_alternative() {
        let choices = ChoiceSet::new();
        assert_eq!(alternatives(&choices), vec![Assignment::new()]);
    }

    #[test]
    fn test_add_one_of_branches() {
        let mut choices = ChoiceSet::new();
        choices.add_one_of(["impl_a", "impl_b"]);

        assert_eq!(
            alternatives(&choices),
            vec![set(&["impl_a"]), set(&["impl_b"])]
        );
    }

    #[test]
    fn test_add_forces_value_everywhere() {
        let mut choices = ChoiceSet::new();
        choices.add_one_of(["a", "b"]);
        choices.add("c");

        assert_eq!(
            alternatives(&choices),
            vec![set(&["a", "c"]), set(&["b", "c"])]
        );
    }

    #[test]
    fn test_add_one_of_empty_is_noop() {
        let mut choices = ChoiceSet::new();
        choices.add("a");
        choices.add_one_of(Vec::<String>::new());

        assert_eq!(alternatives(&choices), vec![set(&["a"])]);
    }

    #[test]
    fn test_growth_bounded_by_product() {
        let mut choices = ChoiceSet::new();
        choices.add_one_of(["a", "b"]);
        choices.add_one_of(["c", "d", "e"]);
        assert_eq!(choices.len(), 6);

        // Overlapping candidates collapse instead of multiplying.
        let mut overlapping = ChoiceSet::new();
        overlapping.add_one_of(["a", "b"]);
        overlapping.add_one_of(["a", "b"]);
        assert!(overlapping.len() <= 4);
        assert_eq!(
            alternatives(&overlapping),
            vec![set(&["a"]), set(&["a", "b"]), set(&["b"])]
        );
    }

    #[test]
    fn test_remove_strips_value_and_collapses() {
        let mut choices = ChoiceSet::new();
        choices.add_one_of(["self", "other"]);
        choices.add("x");
        choices.remove("self");
        choices.remove("other");

        assert_eq!(alternatives(&choices), vec![set(&["x"])]);
    }

    #[test]
    fn test_best_picks_minimum() {
        let mut choices = ChoiceSet::new();
        choices.add_one_of(["a", "b", "c"]);
        choices.add_one_of(["a", "d"]);

        let best = choices.best(|alternative| alternative.len());
        assert_eq!(best, set(&["a"]));
    }

    #[test]
    fn test_best_ties_resolve_to_first_in_order() {
        let mut choices = ChoiceSet::new();
        choices.add_one_of(["zeta", "alpha", "mid"]);

        let best = choices.best(|_| 0);
        assert_eq!(best, set(&["alpha"]));
    }
}
