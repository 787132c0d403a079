//! Section model
//!
//! A *section* is a scroll stop. With `n` items of which at most `v` fit
//! on screen at once, only `n - diff` distinct positions exist, where
//! `diff` depends on the alignment:
//!
//! | alignment | diff                      |
//! |-----------|---------------------------|
//! | start     | `v - 1`                   |
//! | end       | `v - 1`                   |
//! | center    | `v - 1` (odd), `v - 2` (even) |
//!
//! `v` is latched once per generation from the first non-empty visible
//! subset so that the section count stays stable while scrolling.

use tracing::debug;

use crate::config::Alignment;
use crate::tracker::VisibilityEntry;

// =============================================================================
// Generation latch
// =============================================================================

/// Token identifying one element set; bumped on every full replacement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Maximum number of concurrently visible items, latched once per generation
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxVisibleLatch {
    generation: Generation,
    value: Option<usize>,
}

impl MaxVisibleLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the latched value and bind to `generation`
    pub fn reset(&mut self, generation: Generation) {
        self.generation = generation;
        self.value = None;
    }

    /// Offer a visible subset size
    ///
    /// The value is latched only when the latch is empty, `generation` is
    /// current and `visible` is non-zero. Returns `true` when it latched.
    pub fn observe(&mut self, generation: Generation, visible: usize) -> bool {
        if generation != self.generation || self.value.is_some() || visible == 0 {
            return false;
        }
        self.value = Some(visible);
        debug!(
            generation = generation.value(),
            max_visible = visible,
            "latched max concurrent visible"
        );
        true
    }

    pub fn get(&self) -> Option<usize> {
        self.value
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

// =============================================================================
// Section math
// =============================================================================

/// Number of items that are not scroll stops of their own
pub fn section_diff(alignment: Alignment, max_visible: usize) -> usize {
    if max_visible == 0 {
        return 0;
    }
    match alignment {
        Alignment::Start | Alignment::End => max_visible - 1,
        Alignment::Center if max_visible % 2 == 1 => max_visible - 1,
        Alignment::Center => max_visible - 2,
    }
}

/// Section count for `item_count` items
///
/// Zero until the max visible count is known. The visible count is
/// clamped to the item count so the result never exceeds the item count.
pub fn section_count(alignment: Alignment, item_count: usize, max_visible: Option<usize>) -> usize {
    let Some(max_visible) = max_visible else {
        return 0;
    };
    if item_count == 0 || max_visible == 0 {
        return 0;
    }
    let visible = max_visible.min(item_count);
    item_count - section_diff(alignment, visible)
}

/// Trim the ordered entry list down to `count` section representatives
pub fn sections(alignment: Alignment, entries: &[VisibilityEntry], count: usize) -> Vec<VisibilityEntry> {
    let count = count.min(entries.len());
    if count == 0 {
        return Vec::new();
    }
    let trimmed = entries.len() - count;
    let start = match alignment {
        Alignment::Start => 0,
        Alignment::End => trimmed,
        Alignment::Center => trimmed / 2,
    };
    entries[start..start + count].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::ElementId;

    fn entries(n: usize) -> Vec<VisibilityEntry> {
        (0..n)
            .map(|i| VisibilityEntry {
                carousel_index: i,
                target: ElementId(i as u64),
                intersection_ratio: None,
                bounding_box: None,
            })
            .collect()
    }

    fn indices(entries: &[VisibilityEntry]) -> Vec<usize> {
        entries.iter().map(|e| e.carousel_index).collect()
    }

    #[test]
    fn test_section_diff() {
        assert_eq!(section_diff(Alignment::Start, 3), 2);
        assert_eq!(section_diff(Alignment::End, 4), 3);
        assert_eq!(section_diff(Alignment::Center, 3), 2);
        assert_eq!(section_diff(Alignment::Center, 4), 2);
        assert_eq!(section_diff(Alignment::Center, 2), 0);
        assert_eq!(section_diff(Alignment::Center, 1), 0);
        assert_eq!(section_diff(Alignment::Start, 0), 0);
    }

    #[test]
    fn test_section_count_not_ready() {
        assert_eq!(section_count(Alignment::Center, 10, None), 0);
        assert_eq!(section_count(Alignment::Center, 0, Some(3)), 0);
        assert_eq!(section_count(Alignment::Start, 10, Some(0)), 0);
    }

    #[test]
    fn test_section_count_examples() {
        assert_eq!(section_count(Alignment::Center, 10, Some(3)), 8);
        assert_eq!(section_count(Alignment::Start, 10, Some(3)), 8);
        assert_eq!(section_count(Alignment::End, 10, Some(3)), 8);
        assert_eq!(section_count(Alignment::Center, 10, Some(4)), 8);
        assert_eq!(section_count(Alignment::Center, 10, Some(2)), 10);
    }

    #[test]
    fn test_section_count_bounds_and_parity() {
        for alignment in [Alignment::Start, Alignment::Center, Alignment::End] {
            for items in 1..=12 {
                for visible in 1..=15 {
                    let count = section_count(alignment, items, Some(visible));
                    assert!(count <= items, "{alignment} {items} {visible}");
                    assert!(count >= 1);
                    if alignment == Alignment::Center {
                        assert_eq!((items - count) % 2, 0, "{items} {visible}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_sections_trim() {
        let list = entries(10);
        assert_eq!(indices(&sections(Alignment::Start, &list, 8)), (0..8).collect::<Vec<_>>());
        assert_eq!(indices(&sections(Alignment::End, &list, 8)), (2..10).collect::<Vec<_>>());
        assert_eq!(indices(&sections(Alignment::Center, &list, 8)), (1..9).collect::<Vec<_>>());
        assert!(sections(Alignment::Center, &list, 0).is_empty());
    }

    #[test]
    fn test_latch_once_per_generation() {
        let mut latch = MaxVisibleLatch::new();
        let gen = Generation::default();
        assert!(!latch.observe(gen, 0));
        assert!(latch.observe(gen, 3));
        assert!(!latch.observe(gen, 5));
        assert_eq!(latch.get(), Some(3));

        let next = gen.next();
        // Stale generation is ignored
        latch.reset(next);
        assert!(!latch.observe(gen, 4));
        assert_eq!(latch.get(), None);
        assert!(latch.observe(next, 2));
        assert_eq!(latch.get(), Some(2));
    }
}
