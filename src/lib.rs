pub mod canvas;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod label_placement;
pub mod overlay_dump;
pub mod parser;
pub mod render;
pub mod surface;
pub mod text_metrics;
pub mod theme;

pub use canvas::Canvas;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, OverlayConfig, load_config};
pub use error::OverlayError;
pub use geometry::{Rect, intersects, is_safe, is_within_bounds};
pub use ir::{Capstone, Point};
pub use label_placement::{CandidateSlot, ForbiddenZones, LabelPlacement, place_label};
pub use parser::parse_capstone_log;
pub use render::{RenderReport, render_file, render_overlay};
pub use surface::Surface;
pub use theme::{Rgb, Theme};
