//! Axis-aligned rectangles measured in the host's viewport coordinates

use serde::{Deserialize, Serialize};

/// A bounding box as reported by the host (viewport coordinates, pixels)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Leading (left) edge
    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Trailing (right) edge
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Horizontal center
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Width of the horizontal overlap with `other`, zero when disjoint
    pub fn horizontal_overlap(&self, other: &Rect) -> f32 {
        (self.right().min(other.right()) - self.left().max(other.left())).max(0.0)
    }
}
