// Axis-aligned rectangle helpers shared by label placement and the
// forbidden-zone bookkeeping. All coordinates are closed intervals.

use crate::ir::Point;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Rectangle of `width` x `height` whose top-left corner is `(x, y)`.
    /// Edges clamp at the `i32` range.
    pub const fn from_origin(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    pub fn width(&self) -> i32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> i32 {
        self.max_y.saturating_sub(self.min_y)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn inflate(self, pad: i32) -> Self {
        Self::new(
            self.min_x.saturating_sub(pad),
            self.min_y.saturating_sub(pad),
            self.max_x.saturating_add(pad),
            self.max_y.saturating_add(pad),
        )
    }
}

/// True unless the rectangles are separated on at least one axis.
/// Touching edges count as intersecting.
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    !(a.max_x < b.min_x || a.min_x > b.max_x || a.max_y < b.min_y || a.min_y > b.max_y)
}

pub fn is_within_bounds(rect: &Rect, width: i32, height: i32) -> bool {
    rect.min_x >= 0 && rect.min_y >= 0 && rect.max_x <= width && rect.max_y <= height
}

/// A candidate is safe when it lies inside the image and touches no zone.
pub fn is_safe(candidate: &Rect, zones: &[Rect], image_size: (i32, i32)) -> bool {
    let (width, height) = image_size;
    if !is_within_bounds(candidate, width, height) {
        return false;
    }
    !zones.iter().any(|zone| intersects(candidate, zone))
}

pub fn bounding_box(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut rect = Rect::new(first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        rect.min_x = rect.min_x.min(p.x);
        rect.min_y = rect.min_y.min(p.y);
        rect.max_x = rect.max_x.max(p.x);
        rect.max_y = rect.max_y.max(p.y);
    }
    Some(rect)
}
