use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Axis-aligned box stored as origin + extent.
///
/// Corners are derived (`right()`, `bottom()` are exclusive), never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        debug_assert!(
            width >= 0 && height >= 0,
            "rect extent must be non-negative"
        );
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the rect spanning two inclusive pixel corners.
    pub fn from_inclusive_corners(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    /// Rect covering a whole `width × height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn perimeter(&self) -> i64 {
        2 * (self.width as i64 + self.height as i64)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rect containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Rounds the origin down and the extent up to even values.
    ///
    /// Only meant for the final aggregated rect; per-image boxes keep their
    /// exact geometry.
    pub fn with_even_parity(&self) -> Rect {
        Rect::new(
            self.x - (self.x & 1),
            self.y - (self.y & 1),
            self.width + (self.width & 1),
            self.height + (self.height & 1),
        )
    }

    /// Orders rects by perimeter. Distinct rects may compare `Equal`.
    pub fn cmp_perimeter(&self, other: &Rect) -> Ordering {
        self.perimeter().cmp(&other.perimeter())
    }

    pub fn is_larger_than(&self, other: &Rect) -> bool {
        self.cmp_perimeter(other) == Ordering::Greater
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x={} y={} width={} height={}",
            self.x, self.y, self.width, self.height
        )
    }
}
