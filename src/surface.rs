//! Drawing surface contract the overlay passes render through.
//!
//! Every coordinate handed to a [`Surface`] is in scaled render space.

use crate::geometry::Rect;
use crate::ir::Point;
use crate::theme::Rgb;

/// Font selection for a single line of label text.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

/// Mean background color of a sampled window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeanColor {
    Luma(f64),
    Rgb([f64; 3]),
}

impl MeanColor {
    /// Single-channel means are replicated across all three channels.
    pub fn to_rgb(self) -> [f64; 3] {
        match self {
            MeanColor::Luma(v) => [v, v, v],
            MeanColor::Rgb(rgb) => rgb,
        }
    }
}

pub trait Surface {
    /// Pixel dimensions `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Mean color of the window of `radius` around `(x, y)`, clamped to the
    /// surface. `None` when nothing of the window lies inside the surface.
    fn sample_region(&self, x: i32, y: i32, radius: i32) -> Option<MeanColor>;

    fn draw_polygon(&mut self, points: &[Point], outline: Rgb, width: f32);

    /// Fill the ellipse inscribed in `bounds` (inclusive pixel coordinates).
    fn draw_filled_ellipse(&mut self, bounds: Rect, fill: Rgb);

    /// Measured `(width, height)` of one line of text in whole pixels.
    fn measure_text(&self, text: &str, font: &FontSpec) -> (i32, i32);

    /// Draw text with its measured box's top-left corner at `position`.
    fn draw_text(&mut self, position: Point, text: &str, color: Rgb, font: &FontSpec);
}

/// Half-open pixel window `[x0, x1) x [y0, y1)` sampled around `(x, y)`.
pub fn sample_window(x: i32, y: i32, radius: i32, width: u32, height: u32) -> Option<Rect> {
    let w = i32::try_from(width).unwrap_or(i32::MAX);
    let h = i32::try_from(height).unwrap_or(i32::MAX);
    let x0 = x.saturating_sub(radius).max(0);
    let y0 = y.saturating_sub(radius).max(0);
    let x1 = x.saturating_add(radius + 1).min(w);
    let y1 = y.saturating_add(radius + 1).min(h);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(Rect::new(x0, y0, x1, y1))
}
