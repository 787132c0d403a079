//! Derived section state
//!
//! The section chain is a small dependency graph:
//!
//! ```text
//! entries ─┬─> intersecting ──> max visible latch ──> section count ─┐
//!          │        │                                               v
//!          └────────┼──────────────────────────────────────────> sections
//!                   └──────────────────────────────────────────> section index
//! ```
//!
//! Inputs invalidate their node and every dependent; [`SectionState::refresh`]
//! recomputes dirty nodes in topological order and reports what changed.

use tracing::{trace, warn};

use crate::config::Alignment;
use crate::intersection::filter_visible;
use crate::resolver::resolve_section_index;
use crate::sections::{section_count, sections, Generation, MaxVisibleLatch};
use crate::tracker::{VisibilityEntry, VisibilityTracker};

// Dirty flags, one bit per derived node
const INTERSECTING: u8 = 1 << 0;
const COUNT: u8 = 1 << 1;
const SECTIONS: u8 = 1 << 2;
const INDEX: u8 = 1 << 3;
const ALL: u8 = INTERSECTING | COUNT | SECTIONS | INDEX;

/// Nodes invalidated together with `node`
fn closure(node: u8) -> u8 {
    let mut flags = node;
    if flags & INTERSECTING != 0 {
        flags |= INDEX;
    }
    if flags & COUNT != 0 {
        flags |= SECTIONS;
    }
    if flags & SECTIONS != 0 {
        flags |= INDEX;
    }
    flags
}

/// What a refresh changed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateChanges {
    /// Visible subset membership changed
    pub intersecting: bool,
    /// Section representatives changed
    pub sections: bool,
    /// `(old, new)` section index
    pub section_index: Option<(Option<usize>, Option<usize>)>,
    /// Max visible count latched during this refresh
    pub latched: Option<usize>,
}

impl StateChanges {
    pub fn is_empty(&self) -> bool {
        !self.intersecting
            && !self.sections
            && self.section_index.is_none()
            && self.latched.is_none()
    }
}

/// Cached section count, sections and section index
#[derive(Debug)]
pub struct SectionState {
    alignment: Alignment,
    threshold: f32,
    generation: Generation,
    latch: MaxVisibleLatch,
    container_width: f32,
    seen_revision: Option<u64>,
    dirty: u8,

    entries: Vec<VisibilityEntry>,
    intersecting: Vec<VisibilityEntry>,
    section_count: usize,
    sections: Vec<VisibilityEntry>,
    section_index: Option<usize>,
}

impl SectionState {
    pub fn new(alignment: Alignment, threshold: f32) -> Self {
        Self {
            alignment,
            threshold,
            generation: Generation::default(),
            latch: MaxVisibleLatch::new(),
            container_width: 0.0,
            seen_revision: None,
            dirty: ALL,
            entries: Vec::new(),
            intersecting: Vec::new(),
            section_count: 0,
            sections: Vec::new(),
            section_index: None,
        }
    }

    fn invalidate(&mut self, node: u8) {
        self.dirty |= closure(node);
    }

    /// Start a new element generation; the max visible latch is reset
    pub fn begin_generation(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.latch.reset(self.generation);
        self.invalidate(ALL);
        self.generation
    }

    pub fn set_container_width(&mut self, width: f32) {
        if width != self.container_width {
            self.container_width = width;
            self.invalidate(INTERSECTING);
        }
    }

    /// Recompute dirty nodes against the tracker's current cache
    pub fn refresh(&mut self, tracker: &VisibilityTracker) -> StateChanges {
        let mut changes = StateChanges::default();

        if self.seen_revision != Some(tracker.revision()) {
            self.seen_revision = Some(tracker.revision());
            self.entries = tracker.sorted_entries();
            self.invalidate(INTERSECTING | COUNT);
        }

        if self.dirty & INTERSECTING != 0 {
            let mut visible = filter_visible(&self.entries, self.threshold, self.container_width);
            visible.sort_by_key(|e| e.carousel_index);
            changes.intersecting = !same_members(&visible, &self.intersecting);
            self.intersecting = visible;

            if self.latch.observe(self.generation, self.intersecting.len()) {
                changes.latched = self.latch.get();
                self.invalidate(COUNT);
            }
        }

        if self.dirty & COUNT != 0 {
            self.section_count =
                section_count(self.alignment, self.entries.len(), self.latch.get());
            if self.alignment == Alignment::Center
                && (self.entries.len() - self.section_count) % 2 != 0
            {
                warn!(
                    items = self.entries.len(),
                    sections = self.section_count,
                    "center section count parity violated"
                );
            }
        }

        if self.dirty & SECTIONS != 0 {
            let next = sections(self.alignment, &self.entries, self.section_count);
            changes.sections = !same_members(&next, &self.sections);
            self.sections = next;
        }

        if self.dirty & INDEX != 0 {
            let next = resolve_section_index(self.alignment, &self.sections, &self.intersecting);
            if next != self.section_index {
                changes.section_index = Some((self.section_index, next));
                self.section_index = next;
            }
        }

        self.dirty = 0;
        if !changes.is_empty() {
            trace!(?changes, "section state refreshed");
        }
        changes
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn max_visible(&self) -> Option<usize> {
        self.latch.get()
    }

    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    pub fn intersecting(&self) -> &[VisibilityEntry] {
        &self.intersecting
    }

    pub fn section_count(&self) -> usize {
        self.section_count
    }

    pub fn sections(&self) -> &[VisibilityEntry] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&VisibilityEntry> {
        self.sections.get(index)
    }

    pub fn section_index(&self) -> Option<usize> {
        self.section_index
    }

    /// Sections exist and agree with the section count
    pub fn is_consistent(&self) -> bool {
        !self.sections.is_empty() && self.sections.len() == self.section_count
    }
}

fn same_members(a: &[VisibilityEntry], b: &[VisibilityEntry]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.carousel_index == y.carousel_index && x.target == y.target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::tracker::{ElementId, VisibilityFact};

    fn ids(n: u64) -> Vec<ElementId> {
        (0..n).map(ElementId).collect()
    }

    /// Report items `visible` as fully visible and the rest as hidden
    fn observe(tracker: &mut VisibilityTracker, n: u64, visible: &[u64]) {
        for id in 0..n {
            tracker.apply(&VisibilityFact {
                target: ElementId(id),
                intersection_ratio: if visible.contains(&id) { 1.0 } else { 0.0 },
                bounding_box: Rect::new(id as f32 * 100.0, 0.0, 100.0, 50.0),
            });
        }
    }

    fn setup(alignment: Alignment, n: u64) -> (SectionState, VisibilityTracker) {
        let mut state = SectionState::new(alignment, 1.0);
        let mut tracker = VisibilityTracker::new();
        state.begin_generation();
        state.set_container_width(300.0);
        tracker.track(&ids(n), 0);
        (state, tracker)
    }

    #[test]
    fn test_not_ready_before_observation() {
        let (mut state, tracker) = setup(Alignment::Center, 10);
        let changes = state.refresh(&tracker);
        assert_eq!(state.section_count(), 0);
        assert!(state.sections().is_empty());
        assert_eq!(state.section_index(), None);
        assert!(changes.latched.is_none());
    }

    #[test]
    fn test_center_scenario() {
        let (mut state, mut tracker) = setup(Alignment::Center, 10);
        observe(&mut tracker, 10, &[0, 1, 2]);
        let changes = state.refresh(&tracker);
        assert_eq!(changes.latched, Some(3));
        assert!(changes.sections);
        assert_eq!(state.section_count(), 8);
        assert_eq!(state.section_index(), Some(0));

        observe(&mut tracker, 10, &[3, 4, 5]);
        let changes = state.refresh(&tracker);
        assert_eq!(changes.section_index, Some((Some(0), Some(3))));
        assert!(!changes.sections);
        assert_eq!(state.section(3).unwrap().carousel_index, 4);
    }

    #[test]
    fn test_latch_survives_scroll() {
        let (mut state, mut tracker) = setup(Alignment::Start, 10);
        observe(&mut tracker, 10, &[0, 1, 2]);
        state.refresh(&tracker);
        observe(&mut tracker, 10, &[4, 5]);
        state.refresh(&tracker);
        assert_eq!(state.max_visible(), Some(3));
        assert_eq!(state.section_count(), 8);
        assert_eq!(state.section_index(), Some(4));
    }

    #[test]
    fn test_new_generation_relatches() {
        let (mut state, mut tracker) = setup(Alignment::Start, 10);
        observe(&mut tracker, 10, &[0, 1, 2]);
        state.refresh(&tracker);

        tracker.untrack_all();
        tracker.clear();
        state.begin_generation();
        tracker.track(&ids(6), 0);
        observe(&mut tracker, 6, &[0, 1]);
        state.refresh(&tracker);
        assert_eq!(state.max_visible(), Some(2));
        assert_eq!(state.section_count(), 5);
    }

    #[test]
    fn test_between_sections_is_none() {
        let (mut state, mut tracker) = setup(Alignment::Center, 10);
        observe(&mut tracker, 10, &[0, 1, 2]);
        state.refresh(&tracker);
        observe(&mut tracker, 10, &[]);
        let changes = state.refresh(&tracker);
        assert_eq!(changes.section_index, Some((Some(0), None)));
        assert!(changes.intersecting);
    }

    #[test]
    fn test_refresh_without_input_change_is_empty() {
        let (mut state, mut tracker) = setup(Alignment::Center, 10);
        observe(&mut tracker, 10, &[0, 1, 2]);
        state.refresh(&tracker);
        assert!(state.refresh(&tracker).is_empty());
    }
}
