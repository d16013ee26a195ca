use crate::canvas::Canvas;
use crate::color::adaptive_marker_color;
use crate::config::Config;
use crate::error::Result;
use crate::geometry::{Rect, bounding_box};
use crate::ir::{Capstone, Point};
use crate::label_placement::{ForbiddenZones, LabelPlacement, LabelStyle, place_label};
use crate::surface::{FontSpec, Surface};
use crate::theme::Rgb;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Center dot drawn for one capstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DotMark {
    pub id: u32,
    pub center: Point,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedLabel {
    pub id: u32,
    pub text: String,
    pub placement: LabelPlacement,
}

/// What one render pass produced, in scaled render space.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderReport {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub shape_zones: Vec<Rect>,
    pub dots: Vec<DotMark>,
    pub labels: Vec<PlacedLabel>,
}

/// Forbidden zones covering every shape's scaled bounding box, grown by
/// `buffer` on each side.
pub fn seed_forbidden_zones(capstones: &[Capstone], scale: i32, buffer: i32) -> ForbiddenZones {
    let mut zones = ForbiddenZones::new();
    zones.extend(
        capstones
            .iter()
            .filter_map(|cap| bounding_box(&cap.scaled_corners(scale)))
            .map(|bbox| bbox.inflate(buffer)),
    );
    zones
}

/// Draw every capstone onto an already scaled surface.
///
/// Passes run to completion one after another: zones for all shapes exist
/// before the first label is placed, and records are visited in log order
/// in every pass.
pub fn render_overlay<S: Surface + ?Sized>(
    surface: &mut S,
    capstones: &[Capstone],
    config: &Config,
) -> RenderReport {
    let theme = &config.theme;
    let overlay = &config.overlay;
    let scale = i32::try_from(overlay.scale).unwrap_or(i32::MAX);
    let (width, height) = surface.size();

    let mut zones = seed_forbidden_zones(capstones, scale, overlay.zone_buffer);
    let shape_zones = zones.as_slice().to_vec();

    let mut dots = Vec::new();
    for cap in capstones {
        if !cap.corners.is_empty() {
            let corners = cap.scaled_corners(scale);
            surface.draw_polygon(&corners, theme.outline_color, theme.outline_width);
        }
        if let Some(center) = cap.scaled_center(scale) {
            let color = adaptive_marker_color(&*surface, center.x, center.y);
            let r = overlay.dot_radius;
            let bounds = Rect::new(
                center.x.saturating_sub(r),
                center.y.saturating_sub(r),
                center.x.saturating_add(r),
                center.y.saturating_add(r),
            );
            surface.draw_filled_ellipse(bounds, color);
            dots.push(DotMark {
                id: cap.id,
                center,
                color,
            });
        }
    }

    let font = FontSpec {
        family: theme.font_family.clone(),
        size: theme.font_size,
    };
    let style = LabelStyle {
        font: &font,
        color: theme.label_color,
        margin: overlay.label_margin,
    };
    let mut labels = Vec::new();
    for cap in capstones {
        if cap.corners.is_empty() {
            continue;
        }
        let text = cap.label();
        let corners = cap.scaled_corners(scale);
        if let Some(placement) = place_label(&mut *surface, &text, &corners, &mut zones, &style) {
            labels.push(PlacedLabel {
                id: cap.id,
                text,
                placement,
            });
        }
    }

    RenderReport {
        width,
        height,
        scale: overlay.scale,
        shape_zones,
        dots,
        labels,
    }
}

/// Load `input`, upscale it, draw the overlay and save it to `output`.
///
/// Nothing is written when the input cannot be loaded.
pub fn render_file(
    input: &Path,
    output: &Path,
    capstones: &[Capstone],
    config: &Config,
) -> Result<RenderReport> {
    let mut canvas = Canvas::load(input)?.scale(config.overlay.scale)?;
    info!("Processing {} capstones...", capstones.len());
    let report = render_overlay(&mut canvas, capstones, config);
    canvas.save(output)?;
    info!("Saved: {}", output.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label_placement::CandidateSlot;
    use crate::surface::MeanColor;
    use crate::surface::recording::{DrawOp, RecordingSurface};

    fn square_capstone(id: u32, x: i32, y: i32, side: i32) -> Capstone {
        Capstone {
            id,
            center: Some(Point::new(x + side / 2, y + side / 2)),
            corners: vec![
                Point::new(x, y),
                Point::new(x + side, y),
                Point::new(x + side, y + side),
                Point::new(x, y + side),
            ],
        }
    }

    #[test]
    fn seeds_buffered_scaled_boxes_for_shapes_only() {
        let caps = vec![
            square_capstone(1, 0, 0, 20),
            Capstone {
                id: 2,
                center: Some(Point::new(5, 5)),
                corners: Vec::new(),
            },
        ];
        let zones = seed_forbidden_zones(&caps, 2, 2);
        assert_eq!(zones.as_slice(), &[Rect::new(-2, -2, 42, 42)]);
    }

    #[test]
    fn single_square_scenario() {
        let caps = vec![Capstone {
            id: 3,
            center: Some(Point::new(10, 10)),
            corners: vec![
                Point::new(0, 0),
                Point::new(20, 0),
                Point::new(20, 20),
                Point::new(0, 20),
            ],
        }];
        let mut surface = RecordingSurface::new(100, 100);
        let report = render_overlay(&mut surface, &caps, &Config::default());

        assert_eq!(
            surface.ops[0],
            DrawOp::Polygon {
                points: vec![
                    Point::new(0, 0),
                    Point::new(40, 0),
                    Point::new(40, 40),
                    Point::new(0, 40),
                ],
                outline: Rgb::RED,
            }
        );
        assert_eq!(
            surface.ops[1],
            DrawOp::Ellipse {
                bounds: Rect::new(19, 19, 21, 21),
                fill: Rgb::GREEN,
            }
        );
        assert_eq!(report.dots[0].center, Point::new(20, 20));

        // Nothing above the square fits inside the image, so the label goes
        // to the first slot below it.
        let label = &report.labels[0];
        assert_eq!(label.text, "#3");
        assert_eq!(label.placement.slot, CandidateSlot::BelowLeft);
        assert!(!label.placement.forced);
        assert_eq!(label.placement.rect, Rect::new(0, 45, 20, 59));
        assert_eq!(surface.texts(), vec![(Point::new(0, 45), "#3".to_string())]);
    }

    #[test]
    fn label_goes_above_left_when_there_is_room() {
        let caps = vec![square_capstone(8, 20, 20, 20)];
        let mut surface = RecordingSurface::new(200, 200);
        let report = render_overlay(&mut surface, &caps, &Config::default());
        let label = &report.labels[0];
        assert_eq!(label.placement.slot, CandidateSlot::AboveLeft);
        assert_eq!(label.placement.rect, Rect::new(40, 21, 60, 35));
    }

    #[test]
    fn neighbouring_shape_pushes_label_to_next_slot() {
        // The second square overlaps the first one's above-left slot.
        let caps = vec![square_capstone(1, 30, 30, 20), square_capstone(2, 30, 22, 4)];
        let mut surface = RecordingSurface::new(300, 300);
        let report = render_overlay(&mut surface, &caps, &Config::default());
        assert_eq!(report.shape_zones.len(), 2);
        assert_eq!(report.labels[0].placement.slot, CandidateSlot::AboveRight);
        assert_eq!(report.labels[1].placement.slot, CandidateSlot::AboveLeft);
        for label in &report.labels {
            for zone in &report.shape_zones {
                assert!(!crate::geometry::intersects(&label.placement.rect, zone));
            }
        }
    }

    #[test]
    fn center_only_record_gets_dot_but_no_label() {
        let caps = vec![Capstone {
            id: 5,
            center: Some(Point::new(4, 4)),
            corners: Vec::new(),
        }];
        let mut surface = RecordingSurface::new(50, 50);
        let report = render_overlay(&mut surface, &caps, &Config::default());
        assert_eq!(report.dots.len(), 1);
        assert!(report.labels.is_empty());
        assert!(report.shape_zones.is_empty());
        assert_eq!(surface.ops.len(), 1);
    }

    #[test]
    fn green_background_switches_dot_to_magenta() {
        let caps = vec![square_capstone(1, 10, 10, 10)];
        let mut surface =
            RecordingSurface::new(100, 100).with_background(MeanColor::Rgb([0.0, 255.0, 0.0]));
        let report = render_overlay(&mut surface, &caps, &Config::default());
        assert_eq!(report.dots[0].color, Rgb::MAGENTA);
    }

    #[test]
    fn labels_follow_record_order() {
        let caps = vec![
            square_capstone(9, 50, 50, 10),
            square_capstone(4, 100, 50, 10),
            square_capstone(7, 50, 100, 10),
        ];
        let mut surface = RecordingSurface::new(300, 300);
        let report = render_overlay(&mut surface, &caps, &Config::default());
        let ids: Vec<u32> = report.labels.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![9, 4, 7]);
    }

    #[test]
    fn huge_coordinates_clamp_instead_of_wrapping() {
        let log = "--- Capstone #1 ---\n\
                   Center: (2000000000, 5)\n\
                   Corner 0: (2000000000, 5)\n\
                   Corner 1: (2000000010, 5)\n\
                   Corner 2: (2000000010, 15)\n";
        let caps = crate::parser::parse_capstone_log(log);
        assert_eq!(caps.len(), 1);

        let mut surface = RecordingSurface::new(20, 20);
        let report = render_overlay(&mut surface, &caps, &Config::default());

        let zone = report.shape_zones[0];
        assert_eq!((zone.min_x, zone.max_x), (i32::MAX - 2, i32::MAX));
        assert_eq!((zone.min_y, zone.max_y), (8, 32));
        assert_eq!(report.dots[0].center, Point::new(i32::MAX, 10));

        let label = &report.labels[0];
        assert!(label.placement.forced);
        assert_eq!(label.placement.slot, CandidateSlot::AboveLeft);
        assert!(label.placement.rect.min_x <= label.placement.rect.max_x);
        assert!(label.placement.rect.min_y <= label.placement.rect.max_y);
    }

    #[test]
    fn self_intersecting_polygon_is_drawn_and_labelled() {
        let caps = vec![Capstone {
            id: 6,
            center: None,
            corners: vec![
                Point::new(0, 0),
                Point::new(20, 20),
                Point::new(20, 0),
                Point::new(0, 20),
            ],
        }];
        let mut surface = RecordingSurface::new(100, 100);
        let report = render_overlay(&mut surface, &caps, &Config::default());

        assert_eq!(
            surface.ops[0],
            DrawOp::Polygon {
                points: vec![
                    Point::new(0, 0),
                    Point::new(40, 40),
                    Point::new(40, 0),
                    Point::new(0, 40),
                ],
                outline: Rgb::RED,
            }
        );
        assert_eq!(report.shape_zones, vec![Rect::new(-2, -2, 42, 42)]);
        assert!(report.dots.is_empty());
        let label = &report.labels[0];
        assert_eq!(label.text, "#6");
        assert!(!label.placement.forced);
        assert_eq!(label.placement.rect, Rect::new(0, 45, 20, 59));
    }

    #[test]
    fn open_polyline_is_accepted() {
        let caps = vec![Capstone {
            id: 8,
            center: None,
            corners: vec![Point::new(10, 10), Point::new(30, 10)],
        }];
        let mut surface = RecordingSurface::new(100, 100);
        let report = render_overlay(&mut surface, &caps, &Config::default());
        assert_eq!(report.shape_zones, vec![Rect::new(18, 18, 62, 22)]);
        assert_eq!(report.labels.len(), 1);
        assert!(!report.labels[0].placement.forced);
    }

    #[test]
    fn empty_record_list_draws_nothing() {
        let mut surface = RecordingSurface::new(10, 10);
        let report = render_overlay(&mut surface, &[], &Config::default());
        assert!(surface.ops.is_empty());
        assert!(report.labels.is_empty());
        assert_eq!((report.width, report.height), (10, 10));
    }
}
