use crate::error::{OverlayError, Result};
use crate::label_placement::LABEL_MARGIN;
use crate::theme::{Rgb, Theme};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Integer upscale applied once after load (nearest neighbour).
    pub scale: u32,
    /// Gap between a shape's bounding box and its label.
    pub label_margin: i32,
    /// Padding added around each shape's bounding box when it is marked
    /// as forbidden.
    pub zone_buffer: i32,
    /// Center dot spans `2 * dot_radius + 1` pixels.
    pub dot_radius: i32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            label_margin: LABEL_MARGIN,
            zone_buffer: 2,
            dot_radius: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<ThemeVariables>,
    overlay: Option<OverlayVariables>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    outline_color: Option<String>,
    outline_width: Option<f32>,
    label_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverlayVariables {
    scale: Option<u32>,
    label_margin: Option<i32>,
    zone_buffer: Option<i32>,
    dot_radius: Option<i32>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|source| OverlayError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile =
        serde_json::from_str(&contents).map_err(|source| OverlayError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    apply_config_file(Config::default(), parsed)
}

/// Parse config JSON that did not come from a file.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    Ok(apply_config_file(Config::default(), parsed)?)
}

fn apply_config_file(mut config: Config, parsed: ConfigFile) -> Result<Config> {
    if let Some(vars) = parsed.theme {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.outline_color {
            config.theme.outline_color = Rgb::from_hex(&v)?;
        }
        if let Some(v) = vars.outline_width {
            config.theme.outline_width = v;
        }
        if let Some(v) = vars.label_color {
            config.theme.label_color = Rgb::from_hex(&v)?;
        }
    }

    if let Some(vars) = parsed.overlay {
        if let Some(v) = vars.scale {
            config.overlay.scale = v;
        }
        if let Some(v) = vars.label_margin {
            config.overlay.label_margin = v;
        }
        if let Some(v) = vars.zone_buffer {
            config.overlay.zone_buffer = v;
        }
        if let Some(v) = vars.dot_radius {
            config.overlay.dot_radius = v;
        }
    }

    Ok(config)
}
