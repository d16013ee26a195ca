use crate::error::OverlayError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const RED: Rgb = Rgb([255, 0, 0]);
    pub const GREEN: Rgb = Rgb([0, 255, 0]);
    pub const MAGENTA: Rgb = Rgb([255, 0, 255]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    pub fn r(self) -> u8 {
        self.0[0]
    }

    pub fn g(self) -> u8 {
        self.0[1]
    }

    pub fn b(self) -> u8 {
        self.0[2]
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Result<Self, OverlayError> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(OverlayError::InvalidColor(value.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| OverlayError::InvalidColor(value.to_string()))
        };
        Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }

    pub fn to_svg(self) -> String {
        format!("rgb({},{},{})", self.r(), self.g(), self.b())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r(), self.g(), self.b())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub outline_color: Rgb,
    pub outline_width: f32,
    pub label_color: Rgb,
}

impl Theme {
    pub fn diagnostic() -> Self {
        Self {
            font_family: "Arial, DejaVu Sans, Liberation Sans, sans-serif".to_string(),
            font_size: 18.0,
            outline_color: Rgb::RED,
            outline_width: 1.0,
            label_color: Rgb::RED,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::diagnostic()
    }
}
