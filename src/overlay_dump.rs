use crate::ir::Capstone;
use crate::label_placement::CandidateSlot;
use crate::render::RenderReport;
use crate::theme::Rgb;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct OverlayDump {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub capstones: Vec<CapstoneDump>,
    pub labels: Vec<LabelDump>,
}

#[derive(Debug, Serialize)]
pub struct CapstoneDump {
    pub id: u32,
    pub center: Option<[i32; 2]>,
    pub corners: Vec<[i32; 2]>,
    pub zone: Option<[i32; 4]>,
    pub dot_color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub id: u32,
    pub text: String,
    pub slot: CandidateSlot,
    pub forced: bool,
    pub rect: [i32; 4],
}

impl OverlayDump {
    pub fn from_report(capstones: &[Capstone], report: &RenderReport) -> Self {
        // Shape zones were seeded in record order, one per record with corners.
        let mut zones = report.shape_zones.iter();
        let capstones = capstones
            .iter()
            .map(|cap| {
                let zone = if cap.corners.is_empty() {
                    None
                } else {
                    zones
                        .next()
                        .map(|z| [z.min_x, z.min_y, z.max_x, z.max_y])
                };
                let dot_color = report
                    .dots
                    .iter()
                    .find(|dot| dot.id == cap.id)
                    .map(|dot| Rgb::to_string(&dot.color));
                CapstoneDump {
                    id: cap.id,
                    center: cap.center.map(|p| [p.x, p.y]),
                    corners: cap.corners.iter().map(|p| [p.x, p.y]).collect(),
                    zone,
                    dot_color,
                }
            })
            .collect();

        let labels = report
            .labels
            .iter()
            .map(|label| {
                let r = label.placement.rect;
                LabelDump {
                    id: label.id,
                    text: label.text.clone(),
                    slot: label.placement.slot,
                    forced: label.placement.forced,
                    rect: [r.min_x, r.min_y, r.max_x, r.max_y],
                }
            })
            .collect();

        OverlayDump {
            width: report.width,
            height: report.height,
            scale: report.scale,
            capstones,
            labels,
        }
    }
}

pub fn write_overlay_dump(
    path: &Path,
    capstones: &[Capstone],
    report: &RenderReport,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = OverlayDump::from_report(capstones, report);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
