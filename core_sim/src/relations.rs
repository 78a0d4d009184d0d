use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ids::FactionId;

/// Serialized form of one directed relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEntry {
    pub from: FactionId,
    pub to: FactionId,
    pub value: f32,
}

/// Directed disposition scores between factions.
///
/// `relation(a, b)` and `relation(b, a)` are independent entries. Pairs that were never
/// written read as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<RelationEntry>", into = "Vec<RelationEntry>")]
pub struct RelationMatrix {
    scores: BTreeMap<(FactionId, FactionId), f32>,
}

impl RelationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relation(&self, from: &FactionId, to: &FactionId) -> f32 {
        // Tuple keys cannot borrow as (&str, &str); clone only on the lookup path.
        self.scores
            .get(&(from.clone(), to.clone()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn contains(&self, from: &FactionId, to: &FactionId) -> bool {
        self.scores.contains_key(&(from.clone(), to.clone()))
    }

    /// Overwrite the `from -> to` score, returning the previous stored value.
    pub fn set_relation(&mut self, from: FactionId, to: FactionId, value: f32) -> Option<f32> {
        if !value.is_finite() {
            warn!(
                target: "concord::relations",
                %from,
                %to,
                value,
                "relation.set_rejected=non_finite"
            );
            return self.scores.get(&(from, to)).copied();
        }
        self.scores.insert((from, to), value)
    }

    /// Add `delta` to the `from -> to` score, creating the pair at zero. Returns the new value.
    pub fn adjust_relation(&mut self, from: FactionId, to: FactionId, delta: f32) -> f32 {
        let entry = self.scores.entry((from, to)).or_insert(0.0);
        if delta.is_finite() {
            *entry += delta;
        } else {
            warn!(
                target: "concord::relations",
                delta,
                "relation.adjust_rejected=non_finite"
            );
        }
        *entry
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FactionId, &FactionId, f32)> {
        self.scores
            .iter()
            .map(|((from, to), value)| (from, to, *value))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.scores.values_mut()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn all_finite(&self) -> bool {
        self.scores.values().all(|value| value.is_finite())
    }
}

impl From<Vec<RelationEntry>> for RelationMatrix {
    fn from(entries: Vec<RelationEntry>) -> Self {
        let scores = entries
            .into_iter()
            .map(|entry| ((entry.from, entry.to), entry.value))
            .collect();
        Self { scores }
    }
}

impl From<RelationMatrix> for Vec<RelationEntry> {
    fn from(matrix: RelationMatrix) -> Self {
        matrix
            .scores
            .into_iter()
            .map(|((from, to), value)| RelationEntry { from, to, value })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> FactionId {
        FactionId::new(value)
    }

    #[test]
    fn unknown_pair_reads_zero() {
        let matrix = RelationMatrix::new();
        assert_eq!(matrix.relation(&id("X"), &id("Y")), 0.0);
        assert!(!matrix.contains(&id("X"), &id("Y")));
    }

    #[test]
    fn relations_are_directional() {
        let mut matrix = RelationMatrix::new();
        matrix.set_relation(id("A"), id("B"), 30.0);
        assert_eq!(matrix.relation(&id("A"), &id("B")), 30.0);
        assert_eq!(matrix.relation(&id("B"), &id("A")), 0.0);
    }

    #[test]
    fn adjust_creates_pair_at_zero() {
        let mut matrix = RelationMatrix::new();
        assert_eq!(matrix.adjust_relation(id("A"), id("B"), 10.0), 10.0);
        assert_eq!(matrix.adjust_relation(id("A"), id("B"), -4.0), 6.0);
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn set_returns_previous_value() {
        let mut matrix = RelationMatrix::new();
        assert_eq!(matrix.set_relation(id("A"), id("B"), 5.0), None);
        assert_eq!(matrix.set_relation(id("A"), id("B"), -50.0), Some(5.0));
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let mut matrix = RelationMatrix::new();
        matrix.set_relation(id("A"), id("B"), 12.0);
        matrix.set_relation(id("A"), id("B"), f32::NAN);
        matrix.adjust_relation(id("A"), id("B"), f32::INFINITY);
        assert_eq!(matrix.relation(&id("A"), &id("B")), 12.0);
        assert!(matrix.all_finite());
    }

    #[test]
    fn serializes_as_entry_list() {
        let mut matrix = RelationMatrix::new();
        matrix.set_relation(id("A"), id("B"), 10.0);
        let json = serde_json::to_value(&matrix).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([{"from": "A", "to": "B", "value": 10.0}])
        );
        let back: RelationMatrix = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, matrix);
    }
}
