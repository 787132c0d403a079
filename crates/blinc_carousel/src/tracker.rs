//! Visibility tracking
//!
//! Every tracked element receives a stable, zero-based carousel index and a
//! [`VisibilityEntry`] in a keyed cache. Observer facts are merged into that
//! entry; the carousel index assigned at tracking time is never overwritten
//! by a fact.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::Rect;

/// Opaque handle for a host element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        ElementId(raw)
    }
}

/// A single visibility observation reported by the host
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityFact {
    pub target: ElementId,
    /// Fraction of the element's own width that intersects the container
    pub intersection_ratio: f32,
    pub bounding_box: Rect,
}

/// Cached visibility of one tracked element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisibilityEntry {
    pub carousel_index: usize,
    pub target: ElementId,
    /// `None` until the first fact arrives
    pub intersection_ratio: Option<f32>,
    pub bounding_box: Option<Rect>,
}

impl VisibilityEntry {
    fn seeded(carousel_index: usize, target: ElementId) -> Self {
        Self {
            carousel_index,
            target,
            intersection_ratio: None,
            bounding_box: None,
        }
    }

    /// Whether at least one fact has been merged
    pub fn is_observed(&self) -> bool {
        self.intersection_ratio.is_some() && self.bounding_box.is_some()
    }

    fn merge(&mut self, fact: &VisibilityFact) -> bool {
        let ratio = Some(fact.intersection_ratio);
        let bbox = Some(fact.bounding_box);
        let changed = self.intersection_ratio != ratio
            || self.bounding_box != bbox
            || self.target != fact.target;
        self.intersection_ratio = ratio;
        self.bounding_box = bbox;
        self.target = fact.target;
        changed
    }
}

/// Keyed cache of visibility entries
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    /// Observed elements and their carousel index
    observed: FxHashMap<ElementId, usize>,
    entries: FxHashMap<usize, VisibilityEntry>,
    revision: u64,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin observing `elements`, assigning indices from `starting_index`
    pub fn track(&mut self, elements: &[ElementId], starting_index: usize) {
        for (offset, &target) in elements.iter().enumerate() {
            let carousel_index = starting_index + offset;
            self.observed.insert(target, carousel_index);
            self.entries
                .insert(carousel_index, VisibilityEntry::seeded(carousel_index, target));
        }
        if !elements.is_empty() {
            self.revision += 1;
        }
        trace!(
            count = elements.len(),
            starting_index,
            "tracking carousel elements"
        );
    }

    /// Stop observing `elements`; cached entries are kept
    pub fn untrack(&mut self, elements: &[ElementId]) {
        for target in elements {
            self.observed.remove(target);
        }
    }

    /// Stop observing every element; cached entries are kept
    pub fn untrack_all(&mut self) {
        self.observed.clear();
    }

    /// Drop every cached entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.revision += 1;
        }
        self.entries.clear();
    }

    /// Merge a fact into the entry of its element
    ///
    /// Facts for elements that are not observed are ignored. Returns `true`
    /// when the cache changed.
    pub fn apply(&mut self, fact: &VisibilityFact) -> bool {
        let Some(&carousel_index) = self.observed.get(&fact.target) else {
            trace!(target = fact.target.0, "ignoring fact for unobserved element");
            return false;
        };
        let entry = self
            .entries
            .entry(carousel_index)
            .or_insert_with(|| VisibilityEntry::seeded(carousel_index, fact.target));
        let changed = entry.merge(fact);
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn is_observed(&self, target: ElementId) -> bool {
        self.observed.contains_key(&target)
    }

    pub fn index_of(&self, target: ElementId) -> Option<usize> {
        self.observed.get(&target).copied()
    }

    pub fn get(&self, carousel_index: usize) -> Option<&VisibilityEntry> {
        self.entries.get(&carousel_index)
    }

    /// Number of cached entries (the item count)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped whenever the cache content changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// All entries ordered by carousel index
    pub fn sorted_entries(&self) -> Vec<VisibilityEntry> {
        let mut entries: Vec<VisibilityEntry> = self.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.carousel_index);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(range: std::ops::Range<u64>) -> Vec<ElementId> {
        range.map(ElementId).collect()
    }

    fn fact(id: u64, ratio: f32) -> VisibilityFact {
        VisibilityFact {
            target: ElementId(id),
            intersection_ratio: ratio,
            bounding_box: Rect::new(id as f32 * 100.0, 0.0, 100.0, 50.0),
        }
    }

    #[test]
    fn test_track_assigns_dense_indices() {
        let mut tracker = VisibilityTracker::new();
        tracker.track(&ids(10..14), 0);
        assert_eq!(tracker.len(), 4);
        assert_eq!(tracker.index_of(ElementId(12)), Some(2));
        let entry = tracker.get(3).unwrap();
        assert_eq!(entry.target, ElementId(13));
        assert!(!entry.is_observed());
    }

    #[test]
    fn test_track_incremental() {
        let mut tracker = VisibilityTracker::new();
        tracker.track(&ids(0..3), 0);
        tracker.track(&ids(3..5), tracker.len());
        assert_eq!(tracker.len(), 5);
        assert_eq!(tracker.index_of(ElementId(4)), Some(4));
    }

    #[test]
    fn test_apply_merges_and_keeps_index() {
        let mut tracker = VisibilityTracker::new();
        tracker.track(&ids(0..3), 0);
        let rev = tracker.revision();

        assert!(tracker.apply(&fact(1, 0.5)));
        assert!(tracker.revision() > rev);

        let entry = tracker.get(1).unwrap();
        assert_eq!(entry.carousel_index, 1);
        assert_eq!(entry.intersection_ratio, Some(0.5));
        assert!(entry.is_observed());
    }

    #[test]
    fn test_apply_same_fact_is_not_a_change() {
        let mut tracker = VisibilityTracker::new();
        tracker.track(&ids(0..2), 0);
        assert!(tracker.apply(&fact(0, 1.0)));
        let rev = tracker.revision();
        assert!(!tracker.apply(&fact(0, 1.0)));
        assert_eq!(tracker.revision(), rev);
    }

    #[test]
    fn test_untracked_facts_are_ignored() {
        let mut tracker = VisibilityTracker::new();
        tracker.track(&ids(0..2), 0);
        tracker.untrack(&[ElementId(1)]);
        assert!(!tracker.apply(&fact(1, 1.0)));
        assert!(!tracker.apply(&fact(99, 1.0)));
        // Entry stays cached after untrack
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut tracker = VisibilityTracker::new();
        tracker.track(&ids(0..2), 0);
        tracker.untrack_all();
        tracker.clear();
        assert!(tracker.is_empty());
        assert!(tracker.sorted_entries().is_empty());
    }

    #[test]
    fn test_sorted_entries() {
        let mut tracker = VisibilityTracker::new();
        tracker.track(&ids(0..6), 0);
        let order: Vec<usize> = tracker
            .sorted_entries()
            .iter()
            .map(|e| e.carousel_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    }
}
