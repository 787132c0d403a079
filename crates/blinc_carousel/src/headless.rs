//! In-memory scroll container
//!
//! [`HeadlessViewport`] lays items out in a single row, scrolls them,
//! animates smooth scrolls over a fixed number of frames and reports
//! intersection facts the way a browser intersection observer would. It
//! can also mimic platforms that re-snap after programmatic scrolls.
//! Tests and the simulator CLI drive carousels through it.

use std::time::Instant;

use tracing::trace;

use crate::carousel::Carousel;
use crate::geometry::Rect;
use crate::scroll::{ScrollBehavior, ScrollContainer};
use crate::tracker::{ElementId, VisibilityFact};

/// Frames a smooth scroll takes by default
pub const DEFAULT_SMOOTH_FRAMES: u32 = 8;

#[derive(Clone, Copy, Debug)]
struct SmoothScroll {
    from: f32,
    to: f32,
    frame: u32,
    frames: u32,
}

impl SmoothScroll {
    /// Ease-out quad position for the current frame
    fn position(&self) -> f32 {
        let t = (self.frame as f32 / self.frames.max(1) as f32).min(1.0);
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.from + (self.to - self.from) * eased
    }

    fn is_done(&self) -> bool {
        self.frame >= self.frames
    }
}

/// Single-row scroll container simulation
#[derive(Clone, Debug)]
pub struct HeadlessViewport {
    bounds: Rect,
    padding: f32,
    gap: f32,
    items: Vec<(ElementId, f32)>,
    scroll_left: f32,
    displayed: bool,
    smooth_frames: u32,
    animation: Option<SmoothScroll>,
    /// Programmatic scrolls still to be undone on the next frame
    resnaps: u32,
    revert_to: Option<f32>,
    next_id: u64,
}

impl HeadlessViewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: Rect::new(0.0, 0.0, width, height),
            padding: 0.0,
            gap: 0.0,
            items: Vec::new(),
            scroll_left: 0.0,
            displayed: true,
            smooth_frames: DEFAULT_SMOOTH_FRAMES,
            animation: None,
            resnaps: 0,
            revert_to: None,
            next_id: 1,
        }
    }

    /// Viewport of `width` holding `count` items of `item_width`
    pub fn uniform(width: f32, item_width: f32, count: usize) -> (Self, Vec<ElementId>) {
        let mut viewport = Self::new(width, item_width);
        let ids = viewport.push_items(std::iter::repeat(item_width).take(count));
        (viewport, ids)
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_smooth_frames(mut self, frames: u32) -> Self {
        self.smooth_frames = frames;
        self
    }

    /// Undo the next `count` programmatic instant scrolls one frame later
    pub fn with_resnaps(mut self, count: u32) -> Self {
        self.resnaps = count;
        self
    }

    /// Append items; returns their ids
    pub fn push_items<I>(&mut self, widths: I) -> Vec<ElementId>
    where
        I: IntoIterator<Item = f32>,
    {
        widths
            .into_iter()
            .map(|width| {
                let id = ElementId(self.next_id);
                self.next_id += 1;
                self.items.push((id, width));
                id
            })
            .collect()
    }

    /// Drop items past `len`
    pub fn truncate_items(&mut self, len: usize) {
        self.items.truncate(len);
        self.scroll_left = self.clamp(self.scroll_left);
    }

    pub fn item_ids(&self) -> Vec<ElementId> {
        self.items.iter().map(|(id, _)| *id).collect()
    }

    pub fn set_width(&mut self, width: f32) {
        self.bounds.width = width;
        self.scroll_left = self.clamp(self.scroll_left);
    }

    pub fn set_displayed(&mut self, displayed: bool) {
        self.displayed = displayed;
    }

    /// Scroll as a user would, cancelling any animation
    pub fn user_scroll_to(&mut self, left: f32) {
        self.animation = None;
        self.revert_to = None;
        self.scroll_left = self.clamp(left);
    }

    pub fn content_width(&self) -> f32 {
        let items: f32 = self.items.iter().map(|(_, width)| width).sum();
        let gaps = self.gap * self.items.len().saturating_sub(1) as f32;
        self.padding * 2.0 + items + gaps
    }

    fn clamp(&self, left: f32) -> f32 {
        left.clamp(0.0, self.max_scroll_left())
    }

    /// Advance one frame: apply pending re-snaps and step animations
    pub fn advance_frame(&mut self) {
        if let Some(previous) = self.revert_to.take() {
            if self.resnaps > 0 {
                self.resnaps -= 1;
                trace!(from = self.scroll_left, to = previous, "viewport re-snapped");
                self.scroll_left = previous;
            }
        }
        if let Some(animation) = self.animation.as_mut() {
            animation.frame += 1;
            self.scroll_left = animation.position();
            if animation.is_done() {
                self.scroll_left = animation.to;
                self.animation = None;
            }
        }
    }

    /// Intersection facts for every item at the current offset
    pub fn observe(&self) -> Vec<VisibilityFact> {
        let container = self.container_rect();
        self.items
            .iter()
            .filter_map(|(id, _)| {
                let rect = self.element_rect(*id)?;
                let ratio = if rect.width > 0.0 {
                    rect.horizontal_overlap(&container) / rect.width
                } else {
                    0.0
                };
                Some(VisibilityFact {
                    target: *id,
                    intersection_ratio: ratio,
                    bounding_box: rect,
                })
            })
            .collect()
    }
}

impl ScrollContainer for HeadlessViewport {
    fn container_rect(&self) -> Rect {
        self.bounds
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        let mut x = self.bounds.x + self.padding - self.scroll_left;
        for (id, width) in &self.items {
            if *id == element {
                return Some(Rect::new(x, self.bounds.y, *width, self.bounds.height));
            }
            x += width + self.gap;
        }
        None
    }

    fn scroll_left(&self) -> f32 {
        self.scroll_left
    }

    fn max_scroll_left(&self) -> f32 {
        (self.content_width() - self.bounds.width).max(0.0)
    }

    fn scroll_to(&mut self, left: f32, behavior: ScrollBehavior) {
        let left = self.clamp(left);
        match behavior {
            ScrollBehavior::Auto => {
                self.animation = None;
                if self.resnaps > 0 {
                    self.revert_to = Some(self.scroll_left);
                }
                self.scroll_left = left;
            }
            ScrollBehavior::Smooth => {
                self.revert_to = None;
                self.animation = Some(SmoothScroll {
                    from: self.scroll_left,
                    to: left,
                    frame: 0,
                    frames: self.smooth_frames,
                });
            }
        }
    }

    fn is_displayed(&self) -> bool {
        self.displayed
    }

    fn is_scrolling(&self) -> bool {
        self.animation.is_some()
    }
}

impl Carousel<HeadlessViewport> {
    /// Run one frame: advance the viewport, report visibility, then tick
    pub fn run_headless_frame(&mut self, now: Instant) {
        self.container_mut().advance_frame();
        let facts = self.container().observe();
        self.apply_visibility(&facts);
        self.tick(now);
    }
}
