//! Viewer configuration
//!
//! Stored as RON next to the executable (`vga3d.ron`). A missing file means
//! defaults; a malformed one is an error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rasterizer::DrawOptions;

pub const CONFIG_FILE: &str = "vga3d.ron";

/// The viewer's demo scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Demo {
    Lines = 0,
    Projection = 1,
    Triangles = 2,
    RenderTargets = 3,
    TextureMapping = 4,
    Cube = 5,
    Scene = 6,
    Model = 7,
}

impl Demo {
    pub const ALL: [Demo; 8] = [
        Demo::Lines,
        Demo::Projection,
        Demo::Triangles,
        Demo::RenderTargets,
        Demo::TextureMapping,
        Demo::Cube,
        Demo::Scene,
        Demo::Model,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Demo::Lines => "Bresenham lines",
            Demo::Projection => "Projection",
            Demo::Triangles => "Triangles",
            Demo::RenderTargets => "Render targets",
            Demo::TextureMapping => "Texture mapping",
            Demo::Cube => "Rotating cube",
            Demo::Scene => "3D scene",
            Demo::Model => "MDL model",
        }
    }

    pub fn from_index(i: usize) -> Option<Demo> {
        Demo::ALL.get(i).copied()
    }
}

/// Settings read at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window size as a multiple of 320x200
    pub window_scale: u32,
    /// Initial draw options for demos that don't pick their own
    pub draw: DrawOptions,
    /// Demo shown at startup
    pub demo: Demo,
    /// 8-bit BMP used as texture; a checkerboard when unset or unreadable
    pub texture: Option<PathBuf>,
    /// Texture atlas for the 3D scene
    pub atlas: Option<PathBuf>,
    /// MDL file for the model demo
    pub model: Option<PathBuf>,
    /// 768-byte 8-bit RGB palette for model skins
    pub palette: Option<PathBuf>,
    pub screenshot_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_scale: 3,
            draw: DrawOptions::default(),
            demo: Demo::TextureMapping,
            texture: None,
            atlas: None,
            model: None,
            palette: None,
            screenshot_dir: PathBuf::from("screenshots"),
        }
    }
}

/// Load the config, falling back to defaults when the file does not exist
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ViewerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("no {} found, using defaults", path.display());
        return Ok(ViewerConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

pub fn load_config_from_str(s: &str) -> Result<ViewerConfig> {
    let mut config: ViewerConfig = ron::from_str(s)?;
    config.window_scale = config.window_scale.clamp(1, 8);
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &ViewerConfig, path: P) -> Result<()> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());
    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
