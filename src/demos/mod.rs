//! Viewer demo scenes
//!
//! Each demo owns its camera, textures and draw options and renders into the
//! shared 320x200 screen buffer. Switching demos rebuilds the scene from the
//! viewer config.

mod cube;
mod lines;
mod model;
mod projection;
mod render_targets;
mod scene;
mod texmap;
mod triangles;

use std::path::Path;

use vga3d::config::{Demo, ViewerConfig};
use vga3d::input::InputState;
use vga3d::rasterizer::{draw_triangle, Mat4, Triangle, Vertex};
use vga3d::{Bitmap, DrawBuffer, Palette, Result};

/// Color index used as transparent in sprite textures
pub const COLOR_KEY: u8 = 212;

/// One running demo
pub trait DemoScene {
    /// Advance by `input.dt` seconds and react to keys
    fn update(&mut self, input: &mut InputState);

    /// Render into the screen buffer
    fn draw(&mut self, screen: &mut DrawBuffer);

    /// Palette the screen should be presented with
    fn palette(&self) -> &Palette;

    /// Short state summary for the HUD
    fn hud(&self) -> String;

    /// Key help for the HUD
    fn help(&self) -> &'static str {
        ""
    }
}

pub fn create(demo: Demo, config: &ViewerConfig) -> Result<Box<dyn DemoScene>> {
    log::info!("starting demo: {}", demo.label());
    Ok(match demo {
        Demo::Lines => Box::new(lines::Lines::new()),
        Demo::Projection => Box::new(projection::ProjectionDemo::new()),
        Demo::Triangles => Box::new(triangles::Triangles::new()),
        Demo::RenderTargets => Box::new(render_targets::RenderTargets::new(config)?),
        Demo::TextureMapping => Box::new(texmap::TextureMapping::new(config)?),
        Demo::Cube => Box::new(cube::Cube::new(config)?),
        Demo::Scene => Box::new(scene::Scene::new(config)?),
        Demo::Model => Box::new(model::ModelDemo::new(config)),
    })
}

/// The configured texture, or a checkerboard when none is set or it fails to load
pub fn load_texture(config: &ViewerConfig) -> Result<Bitmap> {
    if let Some(path) = &config.texture {
        match Bitmap::load(path) {
            Ok(bmp) => return Ok(bmp),
            Err(e) => log::warn!("failed to load texture {}: {}", path.display(), e),
        }
    }
    Bitmap::checkerboard(64, 64, 8, 15, 44)
}

/// Palette from a 768-byte RGB file, the VGA default when unset or unreadable
pub fn load_palette(path: Option<&Path>) -> Palette {
    let Some(path) = path else {
        return Palette::vga();
    };
    match std::fs::read(path).map_err(vga3d::Error::from).and_then(|b| Palette::from_rgb(&b)) {
        Ok(palette) => palette,
        Err(e) => {
            log::warn!("failed to load palette {}: {}", path.display(), e);
            Palette::vga()
        }
    }
}

/// Two triangles covering the axis-aligned rectangle from (x, y, z) to
/// (x2, y2, z2), texture repeated `u` x `v` times. Walls keep z, floors keep y.
pub fn quad(x: f32, y: f32, z: f32, x2: f32, y2: f32, z2: f32, u: f32, v: f32) -> [[Vertex; 3]; 2] {
    let (a, b, c, d) = if y == y2 {
        (
            Vertex::with_uv(x, y, z, 0.0, 0.0),
            Vertex::with_uv(x2, y, z, u, 0.0),
            Vertex::with_uv(x2, y, z2, u, v),
            Vertex::with_uv(x, y, z2, 0.0, v),
        )
    } else {
        (
            Vertex::with_uv(x, y, z, 0.0, 0.0),
            Vertex::with_uv(x2, y, z2, u, 0.0),
            Vertex::with_uv(x2, y2, z2, u, v),
            Vertex::with_uv(x, y2, z, 0.0, v),
        )
    };
    [[a, c, b], [a, d, c]]
}

/// Draw both halves of a [`quad`] with `texture`
pub fn draw_quad(quad: &[[Vertex; 3]; 2], texture: &Bitmap, mvp: &Mat4, buffer: &mut DrawBuffer) {
    for vertices in quad {
        draw_triangle(&Triangle::textured(*vertices, texture), mvp, buffer);
    }
}

/// Rotation of `angle` radians about one of the coordinate axes
pub fn rotation(axis: Axis, angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    let mut m = Mat4::IDENTITY;
    let (i, j) = match axis {
        Axis::X => (1, 2),
        Axis::Y => (2, 0),
        Axis::Z => (0, 1),
    };
    m.m[i * 4 + i] = c;
    m.m[i * 4 + j] = s;
    m.m[j * 4 + i] = -s;
    m.m[j * 4 + j] = c;
    m
}

#[derive(Debug, Clone, Copy)]
pub enum Axis {
    X,
    Y,
    Z,
}
