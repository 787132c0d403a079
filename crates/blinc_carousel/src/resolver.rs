//! Section index resolution
//!
//! Maps the visible subset onto one active section.

use smallvec::SmallVec;

use crate::config::Alignment;
use crate::geometry::Rect;
use crate::tracker::VisibilityEntry;

/// Carousel index of the entry that stands for the visible subset
///
/// `visible` may be in any order. For an even subset under center
/// alignment the right-hand middle element is chosen, except when the
/// subset starts at the first item.
pub fn representative_index(alignment: Alignment, visible: &[VisibilityEntry]) -> Option<usize> {
    let mut indices: SmallVec<[usize; 8]> = visible.iter().map(|e| e.carousel_index).collect();
    if indices.is_empty() {
        return None;
    }
    indices.sort_unstable();

    let len = indices.len();
    let index = match alignment {
        Alignment::Start => indices[0],
        Alignment::End => indices[len - 1],
        Alignment::Center if len % 2 == 1 => indices[(len - 1) / 2],
        Alignment::Center if indices[0] == 0 => 0,
        Alignment::Center => indices[len / 2],
    };
    Some(index)
}

/// Active section index, `None` when nothing is visible
pub fn resolve_section_index(
    alignment: Alignment,
    sections: &[VisibilityEntry],
    visible: &[VisibilityEntry],
) -> Option<usize> {
    let representative = representative_index(alignment, visible)?;

    if alignment == Alignment::Center && visible.len() % 2 == 0 && representative == 0 {
        // Scrolled all the way to the start
        return (!sections.is_empty()).then_some(0);
    }

    sections
        .iter()
        .position(|section| section.carousel_index == representative)
}

/// Visible entry whose center is closest to `container_center`
///
/// `measure` supplies fresh bounding boxes; entries it cannot measure fall
/// back to their cached box. On equal distance the later entry wins.
pub fn centered_entry<F>(
    visible: &[VisibilityEntry],
    container_center: f32,
    mut measure: F,
) -> Option<VisibilityEntry>
where
    F: FnMut(&VisibilityEntry) -> Option<Rect>,
{
    let mut ordered: Vec<&VisibilityEntry> = visible.iter().collect();
    ordered.sort_by_key(|e| e.carousel_index);

    let mut best: Option<(&VisibilityEntry, f32)> = None;
    for entry in ordered {
        let Some(rect) = measure(entry).or(entry.bounding_box) else {
            continue;
        };
        let distance = (rect.center_x() - container_center).abs();
        match best {
            Some((_, best_distance)) if best_distance < distance => {}
            _ => best = Some((entry, distance)),
        }
    }
    best.map(|(entry, _)| entry.clone())
}
