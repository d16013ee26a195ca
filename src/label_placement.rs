// Label placement and collision avoidance for capstone labels.
// Four fixed slots around the shape's bounding box are tried in priority
// order; the first one inside the image that touches no forbidden zone wins.

use crate::geometry::{Rect, bounding_box, is_safe};
use crate::ir::Point;
use crate::surface::{FontSpec, Surface};
use crate::theme::Rgb;
use serde::Serialize;
use tracing::debug;

pub const LABEL_MARGIN: i32 = 5;

/// Regions of the render surface already taken by shapes or labels.
///
/// Lives for exactly one render pass. Zones are only ever appended.
#[derive(Debug, Clone, Default)]
pub struct ForbiddenZones {
    zones: Vec<Rect>,
}

impl ForbiddenZones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, zone: Rect) {
        self.zones.push(zone);
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn as_slice(&self) -> &[Rect] {
        &self.zones
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rect> {
        self.zones.iter()
    }
}

impl Extend<Rect> for ForbiddenZones {
    fn extend<T: IntoIterator<Item = Rect>>(&mut self, iter: T) {
        self.zones.extend(iter);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateSlot {
    AboveLeft,
    AboveRight,
    BelowLeft,
    BelowRight,
}

impl CandidateSlot {
    pub const PRIORITY: [CandidateSlot; 4] = [
        CandidateSlot::AboveLeft,
        CandidateSlot::AboveRight,
        CandidateSlot::BelowLeft,
        CandidateSlot::BelowRight,
    ];

    /// Label rectangle for this slot around `shape`.
    pub fn rect(self, shape: &Rect, label_w: i32, label_h: i32, margin: i32) -> Rect {
        let left = shape.min_x;
        let right = shape.max_x.saturating_sub(label_w);
        let above = shape.min_y.saturating_sub(label_h).saturating_sub(margin);
        let below = shape.max_y.saturating_add(margin);
        match self {
            CandidateSlot::AboveLeft => Rect::from_origin(left, above, label_w, label_h),
            CandidateSlot::AboveRight => Rect::from_origin(right, above, label_w, label_h),
            CandidateSlot::BelowLeft => Rect::from_origin(left, below, label_w, label_h),
            CandidateSlot::BelowRight => Rect::from_origin(right, below, label_w, label_h),
        }
    }
}

/// Where a label ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelPlacement {
    pub rect: Rect,
    pub slot: CandidateSlot,
    /// No slot was free; the above-left slot was used anyway.
    pub forced: bool,
}

pub fn candidate_rects(shape: &Rect, label_w: i32, label_h: i32, margin: i32) -> [Rect; 4] {
    CandidateSlot::PRIORITY.map(|slot| slot.rect(shape, label_w, label_h, margin))
}

/// First-fit slot selection. Falls back to above-left when every slot is
/// blocked, so a placement is always produced.
pub fn choose_label_rect(
    shape: &Rect,
    label_size: (i32, i32),
    margin: i32,
    zones: &ForbiddenZones,
    image_size: (i32, i32),
) -> LabelPlacement {
    let (label_w, label_h) = label_size;
    for slot in CandidateSlot::PRIORITY {
        let rect = slot.rect(shape, label_w, label_h, margin);
        if is_safe(&rect, zones.as_slice(), image_size) {
            return LabelPlacement {
                rect,
                slot,
                forced: false,
            };
        }
    }
    LabelPlacement {
        rect: CandidateSlot::AboveLeft.rect(shape, label_w, label_h, margin),
        slot: CandidateSlot::AboveLeft,
        forced: true,
    }
}

#[derive(Debug, Clone)]
pub struct LabelStyle<'a> {
    pub font: &'a FontSpec,
    pub color: Rgb,
    pub margin: i32,
}

/// Measure, place and draw `text` next to the polygon `corners`, then
/// record the chosen rectangle as forbidden.
///
/// Returns `None` only for an empty corner set, which callers filter out
/// beforehand.
pub fn place_label<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    corners: &[Point],
    zones: &mut ForbiddenZones,
    style: &LabelStyle<'_>,
) -> Option<LabelPlacement> {
    let shape = bounding_box(corners)?;
    let label_size = surface.measure_text(text, style.font);
    let (width, height) = surface.size();
    let image_size = (
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    );

    let placement = choose_label_rect(&shape, label_size, style.margin, zones, image_size);
    if placement.forced {
        debug!(label = text, "no free slot, forcing above-left");
    } else {
        debug!(label = text, slot = ?placement.slot, "label placed");
    }

    surface.draw_text(placement.rect.top_left(), text, style.color, style.font);
    zones.push(placement.rect);
    Some(placement)
}
