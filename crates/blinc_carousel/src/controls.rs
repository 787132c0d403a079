//! Controls model
//!
//! State behind optional navigation arrows and section dots. Rendering is
//! up to the host; the carousel only consumes [`ControlIntent`]s.

use serde::{Deserialize, Serialize};

use crate::navigator::Direction;

/// Something the user asked for through the controls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlIntent {
    /// Arrow clicked
    Nav(Direction),
    /// Dot clicked
    Dot(usize),
}

/// One section dot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DotItem {
    pub index: usize,
    pub selected: bool,
}

/// Dots for `count` sections with `section_index` highlighted
///
/// Indices past the dot count wrap around, which keeps the dots meaningful
/// for infinite lists.
pub fn dot_items(count: usize, section_index: Option<usize>) -> Vec<DotItem> {
    let selected = section_index.filter(|_| count > 0).map(|i| i % count);
    (0..count)
        .map(|index| DotItem {
            index,
            selected: Some(index) == selected,
        })
        .collect()
}

/// Section index for a dot in an infinite list
///
/// Picks the copy of `selected` in the current cycle or the previous one,
/// whichever is nearer to `section_index`. Ties stay in the current cycle.
pub fn closest_cycle_index(selected: usize, section_index: usize, cycle_len: usize) -> usize {
    if cycle_len == 0 {
        return selected;
    }
    let cycles = section_index / cycle_len;
    if cycles == 0 {
        return selected;
    }
    let current = selected + cycle_len * cycles;
    let previous = selected + cycle_len * (cycles - 1);
    if current.abs_diff(section_index) <= previous.abs_diff(section_index) {
        current
    } else {
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_items() {
        let dots = dot_items(4, Some(2));
        assert_eq!(dots.len(), 4);
        assert!(dots[2].selected);
        assert_eq!(dots.iter().filter(|d| d.selected).count(), 1);
    }

    #[test]
    fn test_dot_items_wrap_and_none() {
        let dots = dot_items(4, Some(9));
        assert!(dots[1].selected);
        assert!(dot_items(4, None).iter().all(|d| !d.selected));
        assert!(dot_items(0, Some(3)).is_empty());
    }

    #[test]
    fn test_closest_cycle_first_cycle() {
        assert_eq!(closest_cycle_index(3, 2, 5), 3);
    }

    #[test]
    fn test_closest_cycle_prefers_previous_when_nearer() {
        // Section 11 in cycle 2 of length 5; dot 4 is 14 or 9
        assert_eq!(closest_cycle_index(4, 11, 5), 9);
        // Dot 1 is 11 or 6
        assert_eq!(closest_cycle_index(1, 11, 5), 11);
    }

    #[test]
    fn test_closest_cycle_tie_stays() {
        // Section 9, cycle length 4: dot 3 is 11 or 7, both two away
        assert_eq!(closest_cycle_index(3, 9, 4), 11);
    }
}
