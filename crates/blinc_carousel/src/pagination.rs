//! Snap targets for recycled lists
//!
//! A recycled (virtualized) list only materializes a handful of item
//! containers. Scroll snapping still needs one target per reachable
//! position, so the carousel tracks a set of empty placeholder snap
//! targets instead of the items themselves. The virtualization layer
//! reports which page it is rendering through a [`PaginationHint`]; the
//! snap target count grows ahead of it and shrinks with the item list.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Page currently rendered by the virtualization layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationHint {
    /// Items per page
    pub count: usize,
    /// First item index of the page
    pub start: usize,
    /// One past the last item index of the page
    pub end: usize,
}

/// Number of recycled item containers needed to cover the container
pub fn recycled_container_count(container_width: f32, item_width: f32, margin: f32) -> usize {
    if container_width <= 0.0 || item_width <= 0.0 {
        return 1;
    }
    ((container_width * margin) / item_width).ceil().max(1.0) as usize
}

/// Placeholder snap target bookkeeping
#[derive(Debug)]
pub struct SnapTargets {
    item_count: usize,
    infinite: bool,
    /// Targets requested so far (materialized or pending)
    count: usize,
    visible_count: usize,
    pagination: Option<PaginationHint>,
}

impl SnapTargets {
    pub fn new(item_count: usize, infinite: bool) -> Self {
        Self {
            item_count,
            infinite,
            count: 0,
            visible_count: 1,
            pagination: None,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn pagination(&self) -> Option<PaginationHint> {
        self.pagination
    }

    /// Items visible per page: whole items across the container, times rows
    pub fn set_page_geometry(&mut self, container_width: f32, item_width: f32, per: usize) {
        self.visible_count = if container_width > 0.0 && item_width > 0.0 {
            (container_width / item_width).ceil() as usize * per.max(1)
        } else {
            1
        };
    }

    /// Update the logical item count
    ///
    /// Targets beyond the new count are dropped from the end (except in
    /// infinite mode). Returns how many were dropped.
    pub fn set_item_count(&mut self, item_count: usize) -> usize {
        self.item_count = item_count;
        if self.infinite || self.count <= item_count {
            return 0;
        }
        let removed = self.count - item_count;
        self.count = item_count;
        debug!(removed, remaining = self.count, "snap targets trimmed");
        removed
    }

    /// How many of `count` requested targets may actually be added
    pub fn addable(&self, count: usize) -> usize {
        if self.infinite {
            count
        } else {
            count.min(self.item_count.saturating_sub(self.count))
        }
    }

    /// Add up to `count` targets; returns how many were added
    pub fn add(&mut self, count: usize) -> usize {
        let added = self.addable(count);
        self.count += added;
        if added > 0 {
            debug!(added, total = self.count, "snap targets added");
        }
        added
    }

    /// Grow ahead of the rendered page
    ///
    /// Returns `None` when the targets already cover the page (the hint is
    /// redundant), otherwise the number of targets added.
    pub fn on_pagination(&mut self, hint: PaginationHint) -> Option<usize> {
        self.pagination = Some(hint);
        let buffer = hint.start + self.visible_count;
        if self.count > 0 && buffer < self.count {
            return None;
        }
        Some(self.add(hint.count))
    }

    /// Clamp a navigation target to the reachable range
    pub fn clamp_index(&self, index: usize) -> usize {
        if self.infinite {
            index
        } else {
            index.min(self.item_count.saturating_sub(1))
        }
    }

    /// Make sure section `index` exists given `trailing` non-section items
    ///
    /// Adds at least a page worth of targets when some are missing. Returns
    /// the number added.
    pub fn ensure_reachable(&mut self, index: usize, trailing: usize) -> usize {
        let needed = index + 1 + trailing;
        if needed <= self.count {
            return 0;
        }
        let missing = needed - self.count;
        let page = self.pagination.map(|hint| hint.count).unwrap_or(0);
        self.add(missing.max(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(count: usize, start: usize) -> PaginationHint {
        PaginationHint {
            count,
            start,
            end: start + count,
        }
    }

    #[test]
    fn test_container_count() {
        assert_eq!(recycled_container_count(300.0, 100.0, 1.5), 5);
        assert_eq!(recycled_container_count(300.0, 100.0, 8.0), 24);
        assert_eq!(recycled_container_count(0.0, 100.0, 8.0), 1);
    }

    #[test]
    fn test_visible_count() {
        let mut snaps = SnapTargets::new(20, false);
        assert_eq!(snaps.visible_count(), 1);
        snaps.set_page_geometry(350.0, 100.0, 1);
        assert_eq!(snaps.visible_count(), 4);
        snaps.set_page_geometry(350.0, 100.0, 2);
        assert_eq!(snaps.visible_count(), 8);
    }

    #[test]
    fn test_add_is_bounded_by_items() {
        let mut snaps = SnapTargets::new(10, false);
        assert_eq!(snaps.add(6), 6);
        assert_eq!(snaps.add(6), 4);
        assert_eq!(snaps.add(6), 0);
        assert_eq!(snaps.count(), 10);
    }

    #[test]
    fn test_infinite_add_is_unbounded() {
        let mut snaps = SnapTargets::new(4, true);
        assert_eq!(snaps.add(6), 6);
        assert_eq!(snaps.add(6), 6);
        assert_eq!(snaps.count(), 12);
        assert_eq!(snaps.set_item_count(2), 0);
    }

    #[test]
    fn test_shrinking_items_trims_targets() {
        let mut snaps = SnapTargets::new(10, false);
        snaps.add(10);
        assert_eq!(snaps.set_item_count(7), 3);
        assert_eq!(snaps.count(), 7);
        assert_eq!(snaps.set_item_count(12), 0);
        assert_eq!(snaps.count(), 7);
    }

    #[test]
    fn test_pagination_grows_ahead() {
        let mut snaps = SnapTargets::new(30, false);
        snaps.set_page_geometry(300.0, 100.0, 1);
        assert_eq!(snaps.on_pagination(hint(6, 0)), Some(6));
        // Page still covered
        assert_eq!(snaps.on_pagination(hint(6, 1)), None);
        // Approaching the end of the targets
        assert_eq!(snaps.on_pagination(hint(6, 3)), Some(6));
        assert_eq!(snaps.count(), 12);
        assert_eq!(snaps.pagination(), Some(hint(6, 3)));
    }

    #[test]
    fn test_clamp_index() {
        let snaps = SnapTargets::new(10, false);
        assert_eq!(snaps.clamp_index(25), 9);
        let snaps = SnapTargets::new(10, true);
        assert_eq!(snaps.clamp_index(25), 25);
    }

    #[test]
    fn test_ensure_reachable() {
        let mut snaps = SnapTargets::new(30, false);
        snaps.on_pagination(hint(6, 0));
        assert_eq!(snaps.ensure_reachable(3, 2), 0);
        // Needs 12 targets; adds at least a page
        assert_eq!(snaps.ensure_reachable(9, 2), 6);
        assert_eq!(snaps.count(), 12);
        // One short; still adds a full page
        assert_eq!(snaps.ensure_reachable(10, 2), 6);
    }
}
