//! Raster [`Surface`] backed by a tiny-skia pixmap.
//!
//! Images are decoded and encoded with the `image` crate; primitives are
//! filled with tiny-skia without anti-aliasing so outlines stay one pixel
//! wide, and text goes through usvg/resvg.

use crate::error::{OverlayError, Result};
use crate::geometry::Rect;
use crate::ir::Point;
use crate::surface::{FontSpec, MeanColor, Surface, sample_window};
use crate::text_metrics::{TextExtent, fallback_extent, measure_text};
use crate::theme::Rgb;
use image::RgbImage;
use image::imageops::{self, FilterType};
use resvg::tiny_skia::{self, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};
use std::path::Path;
use tracing::warn;

pub struct Canvas {
    pixmap: Pixmap,
    svg_options: Option<usvg::Options<'static>>,
}

impl Canvas {
    /// Decode any format the `image` crate understands, converted to RGB.
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(|source| OverlayError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        Self::from_rgb(&image)
    }

    pub fn filled(width: u32, height: u32, background: Rgb) -> Result<Self> {
        let image = RgbImage::from_pixel(width, height, image::Rgb(background.0));
        Self::from_rgb(&image)
    }

    pub fn from_rgb(image: &RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for px in image.pixels() {
            data.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        let pixmap = tiny_skia::IntSize::from_wh(width, height)
            .and_then(|size| Pixmap::from_vec(data, size))
            .ok_or(OverlayError::Pixmap { width, height })?;
        Ok(Self {
            pixmap,
            svg_options: None,
        })
    }

    /// Upscale by an integer factor with nearest-neighbour sampling.
    pub fn scale(&self, factor: u32) -> Result<Self> {
        let (width, height) = (self.width(), self.height());
        let invalid = OverlayError::InvalidScale {
            width,
            height,
            factor,
        };
        if factor == 0 {
            return Err(invalid);
        }
        let (Some(new_w), Some(new_h)) = (width.checked_mul(factor), height.checked_mul(factor))
        else {
            return Err(invalid);
        };
        let resized = imageops::resize(&self.to_rgb_image(), new_w, new_h, FilterType::Nearest);
        Self::from_rgb(&resized)
    }

    /// Encode in the format implied by the extension of `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.to_rgb_image()
            .save(path)
            .map_err(|source| OverlayError::ImageSave {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let px = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgb([px.red(), px.green(), px.blue()]))
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let mut out = RgbImage::new(self.width(), self.height());
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            let px = src.demultiply();
            *dst = image::Rgb([px.red(), px.green(), px.blue()]);
        }
        out
    }

    fn extent(&self, text: &str, font: &FontSpec) -> TextExtent {
        measure_text(text, font.size, &font.family).unwrap_or_else(|| fallback_extent(text, font.size))
    }

    fn solid_paint(color: Rgb) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r(), color.g(), color.b(), 255);
        paint.anti_alias = false;
        paint
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn sample_region(&self, x: i32, y: i32, radius: i32) -> Option<MeanColor> {
        let window = sample_window(x, y, radius, self.width(), self.height())?;
        let stride = self.width() as usize;
        let pixels = self.pixmap.pixels();
        let mut sum = [0.0f64; 3];
        let mut count = 0usize;
        for row in window.min_y..window.max_y {
            for col in window.min_x..window.max_x {
                let px = pixels[row as usize * stride + col as usize].demultiply();
                sum[0] += px.red() as f64;
                sum[1] += px.green() as f64;
                sum[2] += px.blue() as f64;
                count += 1;
            }
        }
        let n = count as f64;
        Some(MeanColor::Rgb([sum[0] / n, sum[1] / n, sum[2] / n]))
    }

    fn draw_polygon(&mut self, points: &[Point], outline: Rgb, width: f32) {
        let paint = Self::solid_paint(outline);
        // Offsetting by half a pixel puts the stroke on pixel centers.
        let center = |p: &Point| (p.x as f32 + 0.5, p.y as f32 + 0.5);
        let [first, rest @ ..] = points else {
            return;
        };
        if rest.is_empty() {
            if let Some(rect) = tiny_skia::Rect::from_xywh(first.x as f32, first.y as f32, 1.0, 1.0) {
                self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
            return;
        }

        let mut pb = PathBuilder::new();
        let (x, y) = center(first);
        pb.move_to(x, y);
        for p in rest {
            let (x, y) = center(p);
            pb.line_to(x, y);
        }
        pb.close();
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn draw_filled_ellipse(&mut self, bounds: Rect, fill: Rgb) {
        let Some(oval) = tiny_skia::Rect::from_ltrb(
            bounds.min_x as f32,
            bounds.min_y as f32,
            bounds.max_x as f32 + 1.0,
            bounds.max_y as f32 + 1.0,
        ) else {
            return;
        };
        let Some(path) = PathBuilder::from_oval(oval) else {
            return;
        };
        let paint = Self::solid_paint(fill);
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> (i32, i32) {
        let extent = self.extent(text, font);
        (extent.width.ceil() as i32, extent.height().ceil() as i32)
    }

    fn draw_text(&mut self, position: Point, text: &str, color: Rgb, font: &FontSpec) {
        let extent = self.extent(text, font);
        let baseline = position.y as f32 + extent.ascent;
        let (width, height) = (self.width(), self.height());
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\"><text x=\"{}\" y=\"{baseline:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text></svg>",
            position.x,
            escape_xml(&font.family),
            font.size,
            color.to_svg(),
            escape_xml(text)
        );

        let options = self.svg_options.get_or_insert_with(|| {
            let mut opt = usvg::Options::default();
            opt.fontdb_mut().load_system_fonts();
            opt
        });
        match usvg::Tree::from_str(&svg, options) {
            Ok(tree) => {
                let mut pixmap = self.pixmap.as_mut();
                resvg::render(&tree, Transform::default(), &mut pixmap);
            }
            Err(err) => warn!(label = text, "failed to render label text: {err}"),
        }
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::adaptive_marker_color;

    #[test]
    fn nearest_neighbour_scale_replicates_pixels() {
        let mut image = RgbImage::from_pixel(2, 1, image::Rgb([255, 255, 255]));
        image.put_pixel(1, 0, image::Rgb([0, 0, 0]));
        let canvas = Canvas::from_rgb(&image).unwrap().scale(2).unwrap();
        assert_eq!(canvas.size(), (4, 2));
        assert_eq!(canvas.pixel(0, 0), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(1, 1), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(2, 0), Some(Rgb([0, 0, 0])));
        assert_eq!(canvas.pixel(3, 1), Some(Rgb([0, 0, 0])));
    }

    #[test]
    fn zero_scale_is_rejected() {
        let canvas = Canvas::filled(4, 4, Rgb::WHITE).unwrap();
        assert!(matches!(
            canvas.scale(0),
            Err(OverlayError::InvalidScale { factor: 0, .. })
        ));
    }

    #[test]
    fn sample_region_averages_clamped_window() {
        let mut image = RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
        image.put_pixel(0, 0, image::Rgb([90, 180, 30]));
        let canvas = Canvas::from_rgb(&image).unwrap();
        // Window at the corner is 3x3: one colored pixel out of nine.
        let mean = canvas.sample_region(0, 0, 2).unwrap().to_rgb();
        assert!((mean[0] - 10.0).abs() < 1e-9);
        assert!((mean[1] - 20.0).abs() < 1e-9);
        assert!((mean[2] - 30.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn marker_color_tracks_background() {
        let green = Canvas::filled(10, 10, Rgb::GREEN).unwrap();
        assert_eq!(adaptive_marker_color(&green, 5, 5), Rgb::MAGENTA);
        let white = Canvas::filled(10, 10, Rgb::WHITE).unwrap();
        assert_eq!(adaptive_marker_color(&white, 5, 5), Rgb::GREEN);
    }

    #[test]
    fn filled_ellipse_covers_three_by_three_dot() {
        let mut canvas = Canvas::filled(10, 10, Rgb::WHITE).unwrap();
        canvas.draw_filled_ellipse(Rect::new(4, 4, 6, 6), Rgb::GREEN);
        assert_eq!(canvas.pixel(5, 5), Some(Rgb::GREEN));
        assert_eq!(canvas.pixel(4, 5), Some(Rgb::GREEN));
        assert_eq!(canvas.pixel(6, 5), Some(Rgb::GREEN));
        assert_eq!(canvas.pixel(5, 4), Some(Rgb::GREEN));
        assert_eq!(canvas.pixel(5, 6), Some(Rgb::GREEN));
        assert_eq!(canvas.pixel(8, 8), Some(Rgb::WHITE));
    }

    #[test]
    fn polygon_outline_leaves_interior_untouched() {
        let mut canvas = Canvas::filled(20, 20, Rgb::WHITE).unwrap();
        let square = [
            Point::new(2, 2),
            Point::new(12, 2),
            Point::new(12, 12),
            Point::new(2, 12),
        ];
        canvas.draw_polygon(&square, Rgb::RED, 1.0);
        assert_eq!(canvas.pixel(7, 2), Some(Rgb::RED));
        assert_eq!(canvas.pixel(2, 7), Some(Rgb::RED));
        assert_eq!(canvas.pixel(7, 7), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(16, 16), Some(Rgb::WHITE));
    }

    #[test]
    fn single_point_polygon_marks_one_pixel() {
        let mut canvas = Canvas::filled(5, 5, Rgb::WHITE).unwrap();
        canvas.draw_polygon(&[Point::new(2, 3)], Rgb::RED, 1.0);
        assert_eq!(canvas.pixel(2, 3), Some(Rgb::RED));
        assert_eq!(canvas.pixel(3, 3), Some(Rgb::WHITE));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = Canvas::load(Path::new("/nonexistent/input.png"))
            .err()
            .expect("load should fail");
        assert!(matches!(err, OverlayError::ImageLoad { .. }));
    }

    #[test]
    fn save_and_reload_round_trip_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.png");
        Canvas::filled(7, 3, Rgb::MAGENTA).unwrap().save(&path).unwrap();
        let reloaded = Canvas::load(&path).unwrap();
        assert_eq!(reloaded.size(), (7, 3));
        assert_eq!(reloaded.pixel(6, 2), Some(Rgb::MAGENTA));
    }

    #[test]
    fn escapes_label_text() {
        assert_eq!(escape_xml("<#1&>"), "&lt;#1&amp;&gt;");
    }
}
