//! Intersection filter
//!
//! An element counts as visible when its *effective* intersection ratio
//! meets the threshold. The ratio is taken relative to the smaller of the
//! container and the element, so an element wider than the container can
//! still be "fully" visible.

use crate::tracker::VisibilityEntry;

/// Decimal digits kept before comparing against the threshold
const RATIO_PRECISION: f32 = 10_000.0;

/// Effective intersection ratio of an observed entry
///
/// Returns `None` for entries that have never been observed.
pub fn effective_ratio(entry: &VisibilityEntry, container_width: f32) -> Option<f32> {
    let ratio = entry.intersection_ratio?;
    let bbox = entry.bounding_box?;

    let element_width = bbox.width;
    let reference = container_width.min(element_width);
    if reference <= 0.0 {
        return Some(0.0);
    }
    let visible_width = ratio * element_width;
    Some(round_ratio(visible_width / reference))
}

/// Round to four decimal digits
#[inline]
pub fn round_ratio(value: f32) -> f32 {
    (value * RATIO_PRECISION).round() / RATIO_PRECISION
}

/// Whether `entry` satisfies `threshold`
pub fn is_visible(entry: &VisibilityEntry, threshold: f32, container_width: f32) -> bool {
    effective_ratio(entry, container_width).is_some_and(|ratio| ratio >= threshold)
}

/// Entries satisfying `threshold`, in input order
pub fn filter_visible<'a, I>(entries: I, threshold: f32, container_width: f32) -> Vec<VisibilityEntry>
where
    I: IntoIterator<Item = &'a VisibilityEntry>,
{
    entries
        .into_iter()
        .filter(|entry| is_visible(entry, threshold, container_width))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::tracker::ElementId;

    fn entry(index: usize, ratio: Option<f32>, width: f32) -> VisibilityEntry {
        VisibilityEntry {
            carousel_index: index,
            target: ElementId(index as u64),
            intersection_ratio: ratio,
            bounding_box: ratio.map(|_| Rect::new(0.0, 0.0, width, 10.0)),
        }
    }

    #[test]
    fn test_unobserved_excluded() {
        let e = entry(0, None, 100.0);
        assert_eq!(effective_ratio(&e, 300.0), None);
        assert!(!is_visible(&e, 0.5, 300.0));
    }

    #[test]
    fn test_small_element_uses_own_width() {
        let e = entry(0, Some(0.5), 100.0);
        assert_eq!(effective_ratio(&e, 300.0), Some(0.5));
    }

    #[test]
    fn test_wide_element_relative_to_container() {
        // 600 wide element, 300 of it visible in a 300 container
        let e = entry(0, Some(0.5), 600.0);
        assert_eq!(effective_ratio(&e, 300.0), Some(1.0));
        assert!(is_visible(&e, 1.0, 300.0));
    }

    #[test]
    fn test_rounding_absorbs_float_noise() {
        let e = entry(0, Some(0.999_96), 100.0);
        assert_eq!(effective_ratio(&e, 300.0), Some(1.0));
        let e = entry(0, Some(0.9994), 100.0);
        assert!(!is_visible(&e, 1.0, 300.0));
    }

    #[test]
    fn test_filter_visible() {
        let entries = vec![
            entry(0, Some(0.4), 100.0),
            entry(1, Some(1.0), 100.0),
            entry(2, Some(1.0), 100.0),
            entry(3, None, 100.0),
        ];
        let visible = filter_visible(&entries, 0.99, 300.0);
        let indices: Vec<usize> = visible.iter().map(|e| e.carousel_index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_zero_width_container() {
        let e = entry(0, Some(1.0), 100.0);
        assert_eq!(effective_ratio(&e, 0.0), Some(0.0));
    }
}
