//! Stable mapping between class labels and dense class indices.

use std::collections::{BTreeSet, HashMap};
use std::hash::BuildHasher;

use rustc_hash::FxHashMap;

use super::LabelMap;
use crate::corpus::CorpusError;

/// Bijection between label strings and `0..len()`.
///
/// `ordered_classes()[order.index_of(label)] == label` holds for every label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassOrder {
    index: FxHashMap<String, usize>,
    ordered: Vec<String>,
}

impl ClassOrder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns indices to the distinct labels of `labels` in lexicographic order.
    #[must_use]
    pub fn lexicographic(labels: &LabelMap) -> Self {
        let distinct: BTreeSet<&str> = labels.values().map(String::as_str).collect();
        let mut order = Self::new();
        for label in distinct {
            order.insert(label);
        }
        order
    }

    /// Builds an order from explicit assignments.
    ///
    /// # Errors
    /// Returns [`CorpusError::InvalidClassOrder`] unless the indices are
    /// exactly `0..assignments.len()` with no repeats.
    pub fn from_assignments<S: BuildHasher>(
        assignments: &HashMap<String, usize, S>,
    ) -> Result<Self, CorpusError> {
        let mut ordered: Vec<Option<String>> = vec![None; assignments.len()];
        for (label, &position) in assignments {
            let slot = ordered.get_mut(position).ok_or_else(|| {
                CorpusError::InvalidClassOrder(format!(
                    "class '{label}' has index {position} outside 0..{}",
                    assignments.len()
                ))
            })?;
            if let Some(existing) = slot {
                return Err(CorpusError::InvalidClassOrder(format!(
                    "classes '{existing}' and '{label}' share index {position}"
                )));
            }
            *slot = Some(label.clone());
        }
        let ordered: Vec<String> = ordered.into_iter().flatten().collect();
        let index = ordered
            .iter()
            .enumerate()
            .map(|(position, label)| (label.clone(), position))
            .collect();
        Ok(Self { index, ordered })
    }

    /// Returns the index of `label`, allocating the next free one when the
    /// label is new. The flag is `true` when an index was allocated.
    pub fn insert(&mut self, label: &str) -> (usize, bool) {
        if let Some(&position) = self.index.get(label) {
            return (position, false);
        }
        let position = self.ordered.len();
        self.index.insert(label.to_string(), position);
        self.ordered.push(label.to_string());
        (position, true)
    }

    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    #[must_use]
    pub fn label(&self, position: usize) -> Option<&str> {
        self.ordered.get(position).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Labels indexed by their class index.
    #[must_use]
    pub fn ordered_classes(&self) -> &[String] {
        &self.ordered
    }

    #[must_use]
    pub fn to_map(&self) -> HashMap<String, usize> {
        self.index
            .iter()
            .map(|(label, &position)| (label.clone(), position))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> LabelMap {
        pairs
            .iter()
            .map(|(title, label)| ((*title).to_string(), (*label).to_string()))
            .collect()
    }

    #[test]
    fn lexicographic_sorts_distinct_labels() {
        let order = ClassOrder::lexicographic(&labels(&[
            ("d1", "science"),
            ("d2", "computer"),
            ("d3", "science"),
            ("d4", "religion"),
        ]));

        assert_eq!(order.ordered_classes(), &["computer", "religion", "science"]);
        assert_eq!(order.index_of("science"), Some(2));
    }

    #[test]
    fn insert_allocates_in_first_seen_order() {
        let mut order = ClassOrder::new();
        assert_eq!(order.insert("B"), (0, true));
        assert_eq!(order.insert("A"), (1, true));
        assert_eq!(order.insert("B"), (0, false));
        assert_eq!(order.len(), 2);
        assert_eq!(order.label(1), Some("A"));
    }

    #[test]
    fn from_assignments_accepts_a_bijection() {
        let assignments: HashMap<String, usize> =
            [("x".to_string(), 1), ("y".to_string(), 0)].into_iter().collect();
        let order = ClassOrder::from_assignments(&assignments).expect("valid order");
        assert_eq!(order.ordered_classes(), &["y", "x"]);
        assert_eq!(order.to_map(), assignments);
    }

    #[test]
    fn from_assignments_rejects_gaps_and_collisions() {
        let gap: HashMap<String, usize> =
            [("x".to_string(), 0), ("y".to_string(), 2)].into_iter().collect();
        assert!(matches!(
            ClassOrder::from_assignments(&gap),
            Err(CorpusError::InvalidClassOrder(_))
        ));

        let collision: HashMap<String, usize> =
            [("x".to_string(), 0), ("y".to_string(), 0)].into_iter().collect();
        assert!(matches!(
            ClassOrder::from_assignments(&collision),
            Err(CorpusError::InvalidClassOrder(_))
        ));
    }
}
