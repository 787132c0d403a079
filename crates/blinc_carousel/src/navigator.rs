//! Section navigation
//!
//! Computes how far the container must scroll to bring a section into
//! place and keeps the final offset stable against platforms that
//! re-snap after programmatic scrolls.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::Alignment;
use crate::geometry::Rect;
use crate::scroll::{ScrollBehavior, ScrollContainer};
use crate::tracker::ElementId;

/// Offsets closer than this are considered equal
pub const CONVERGENCE_EPSILON: f32 = 0.5;

/// Horizontal navigation direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// Behaviour at the first and last section
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Stay put at the boundary
    #[default]
    Clamp,
    /// Wrap around to the other end
    Recycle,
}

// =============================================================================
// Offsets
// =============================================================================

/// Signed scroll distance that aligns `target` inside `container`
pub fn scroll_delta(alignment: Alignment, target: &Rect, container: &Rect) -> f32 {
    match alignment {
        Alignment::Start => target.left() - container.left(),
        Alignment::End => target.right() - container.right(),
        Alignment::Center => target.center_x() - container.center_x(),
    }
}

/// Delta for `element` measured now, zero when it cannot be measured
pub fn element_delta<C: ScrollContainer + ?Sized>(
    container: &C,
    alignment: Alignment,
    element: ElementId,
) -> f32 {
    match container.element_rect(element) {
        Some(rect) => scroll_delta(alignment, &rect, &container.container_rect()),
        None => 0.0,
    }
}

/// Clamp an offset to the container's scroll range
pub fn clamp_offset<C: ScrollContainer + ?Sized>(container: &C, left: f32) -> f32 {
    left.clamp(0.0, container.max_scroll_left().max(0.0))
}

/// Section reached from `current` by one step
///
/// Returns `None` when there is no current section, no sections at all, or
/// the boundary is hit under [`WrapMode::Clamp`].
pub fn step_index(current: Option<usize>, count: usize, direction: Direction, wrap: WrapMode) -> Option<usize> {
    let current = current?;
    if count == 0 {
        return None;
    }
    match direction {
        Direction::Right if current + 1 < count => Some(current + 1),
        Direction::Left if current > 0 => Some((current - 1).min(count - 1)),
        _ if wrap == WrapMode::Clamp => None,
        Direction::Right => Some(0),
        Direction::Left => Some(count - 1),
    }
}

// =============================================================================
// Stability correction
// =============================================================================

/// Outcome of one correction frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionStatus {
    /// More frames needed
    Running,
    /// Offset confirmed at the target
    Settled,
    /// Attempt budget exhausted without converging
    GaveUp,
    /// Container no longer displayed
    Aborted,
}

impl CorrectionStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, CorrectionStatus::Running)
    }
}

/// Bounded retry loop holding the scroll offset at a target
///
/// Starting the loop scrolls one pixel short of the target so the next
/// request is a real change. Each frame then re-measures; an unconverged
/// offset is re-requested until the attempt budget is spent. A converged
/// (or exhausted) state is confirmed by one extra frame before finishing.
#[derive(Clone, Debug)]
pub struct ScrollCorrection {
    target: f32,
    attempts: u32,
    max_attempts: u32,
    double_checked: bool,
}

impl ScrollCorrection {
    pub fn start<C: ScrollContainer + ?Sized>(container: &mut C, target: f32, max_attempts: u32) -> Self {
        let target = clamp_offset(container, target);
        container.scroll_to(clamp_offset(container, target - 1.0), ScrollBehavior::Auto);
        trace!(target, "scroll correction started");
        Self {
            target,
            attempts: 0,
            max_attempts,
            double_checked: false,
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run one animation frame of the loop
    pub fn on_frame<C: ScrollContainer + ?Sized>(&mut self, container: &mut C) -> CorrectionStatus {
        if !container.is_displayed() {
            return CorrectionStatus::Aborted;
        }

        let converged = (container.scroll_left() - self.target).abs() <= CONVERGENCE_EPSILON;
        if converged || self.attempts >= self.max_attempts {
            if self.double_checked {
                return if converged {
                    CorrectionStatus::Settled
                } else {
                    CorrectionStatus::GaveUp
                };
            }
            self.double_checked = true;
            return CorrectionStatus::Running;
        }

        container.scroll_to(self.target, ScrollBehavior::Auto);
        self.attempts += 1;
        self.double_checked = false;
        CorrectionStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Container that ignores the first `stubborn` scroll requests
    struct StubbornContainer {
        left: f32,
        stubborn: u32,
        displayed: bool,
        requests: Vec<f32>,
    }

    impl StubbornContainer {
        fn new(stubborn: u32) -> Self {
            Self {
                left: 0.0,
                stubborn,
                displayed: true,
                requests: Vec::new(),
            }
        }
    }

    impl ScrollContainer for StubbornContainer {
        fn container_rect(&self) -> Rect {
            Rect::new(0.0, 0.0, 300.0, 100.0)
        }

        fn element_rect(&self, _element: ElementId) -> Option<Rect> {
            None
        }

        fn scroll_left(&self) -> f32 {
            self.left
        }

        fn max_scroll_left(&self) -> f32 {
            1000.0
        }

        fn scroll_to(&mut self, left: f32, _behavior: ScrollBehavior) {
            self.requests.push(left);
            if self.stubborn > 0 {
                self.stubborn -= 1;
            } else {
                self.left = left;
            }
        }

        fn is_displayed(&self) -> bool {
            self.displayed
        }
    }

    fn run(correction: &mut ScrollCorrection, container: &mut StubbornContainer) -> (CorrectionStatus, u32) {
        for frame in 1..=100 {
            let status = correction.on_frame(container);
            if status.is_finished() {
                return (status, frame);
            }
        }
        panic!("correction did not finish");
    }

    #[test]
    fn test_scroll_delta_policies() {
        let container = Rect::new(0.0, 0.0, 300.0, 100.0);
        let target = Rect::new(400.0, 0.0, 100.0, 100.0);
        assert_eq!(scroll_delta(Alignment::Start, &target, &container), 400.0);
        assert_eq!(scroll_delta(Alignment::End, &target, &container), 200.0);
        assert_eq!(scroll_delta(Alignment::Center, &target, &container), 300.0);

        let behind = Rect::new(-250.0, 0.0, 100.0, 100.0);
        assert_eq!(scroll_delta(Alignment::Start, &behind, &container), -250.0);
    }

    #[test]
    fn test_step_index() {
        assert_eq!(step_index(Some(4), 5, Direction::Right, WrapMode::Recycle), Some(0));
        assert_eq!(step_index(Some(4), 5, Direction::Right, WrapMode::Clamp), None);
        assert_eq!(step_index(Some(0), 5, Direction::Left, WrapMode::Recycle), Some(4));
        assert_eq!(step_index(Some(0), 5, Direction::Left, WrapMode::Clamp), None);
        assert_eq!(step_index(Some(2), 5, Direction::Left, WrapMode::Clamp), Some(1));
        assert_eq!(step_index(None, 5, Direction::Right, WrapMode::Recycle), None);
        assert_eq!(step_index(Some(0), 0, Direction::Right, WrapMode::Recycle), None);
    }

    #[test]
    fn test_correction_converges() {
        let mut container = StubbornContainer::new(0);
        let mut correction = ScrollCorrection::start(&mut container, 200.0, 10);
        assert_eq!(container.requests, vec![199.0]);

        let (status, frames) = run(&mut correction, &mut container);
        assert_eq!(status, CorrectionStatus::Settled);
        assert_eq!(container.left, 200.0);
        // fix, confirm, finish
        assert_eq!(frames, 3);
        assert_eq!(correction.attempts(), 1);
    }

    #[test]
    fn test_correction_retries_stubborn_container() {
        let mut container = StubbornContainer::new(4);
        let mut correction = ScrollCorrection::start(&mut container, 200.0, 10);
        let (status, _) = run(&mut correction, &mut container);
        assert_eq!(status, CorrectionStatus::Settled);
        assert_eq!(container.left, 200.0);
        assert!(correction.attempts() <= 10);
    }

    #[test]
    fn test_correction_gives_up_after_budget() {
        let mut container = StubbornContainer::new(u32::MAX);
        let mut correction = ScrollCorrection::start(&mut container, 200.0, 10);
        let (status, _) = run(&mut correction, &mut container);
        assert_eq!(status, CorrectionStatus::GaveUp);
        assert_eq!(correction.attempts(), 10);
        // initial request plus ten retries
        assert_eq!(container.requests.len(), 11);
    }

    #[test]
    fn test_correction_aborts_when_hidden() {
        let mut container = StubbornContainer::new(u32::MAX);
        let mut correction = ScrollCorrection::start(&mut container, 200.0, 10);
        container.displayed = false;
        assert_eq!(correction.on_frame(&mut container), CorrectionStatus::Aborted);
    }

    #[test]
    fn test_correction_target_is_clamped() {
        let mut container = StubbornContainer::new(0);
        let correction = ScrollCorrection::start(&mut container, -40.0, 10);
        assert_eq!(correction.target(), 0.0);
        assert_eq!(container.requests, vec![0.0]);
    }
}
