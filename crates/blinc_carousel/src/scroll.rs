//! Scroll container abstraction
//!
//! The engine never owns a real scroll view. The host implements
//! [`ScrollContainer`] for whatever it renders into (a Blinc scroll
//! element, a browser node, the [`HeadlessViewport`](crate::headless::HeadlessViewport)).

use crate::geometry::Rect;
use crate::tracker::ElementId;

/// Scroll animation behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    /// Instant scroll (no animation)
    #[default]
    Auto,
    /// Smooth animated scroll
    Smooth,
}

/// Host scroll container consumed by the navigator
///
/// All rectangles are in the same coordinate space (typically viewport
/// pixels) and measured at call time.
pub trait ScrollContainer {
    /// Bounding box of the scroll container
    fn container_rect(&self) -> Rect;

    /// Fresh bounding box of a child element, `None` if it cannot be measured
    fn element_rect(&self, element: ElementId) -> Option<Rect>;

    /// Current horizontal scroll offset
    fn scroll_left(&self) -> f32;

    /// Largest reachable horizontal scroll offset
    fn max_scroll_left(&self) -> f32;

    /// Request a scroll to an absolute horizontal offset
    fn scroll_to(&mut self, left: f32, behavior: ScrollBehavior);

    /// Whether the container is currently laid out and shown
    fn is_displayed(&self) -> bool {
        true
    }

    /// Whether a smooth scroll is still in flight
    fn is_scrolling(&self) -> bool {
        false
    }
}
