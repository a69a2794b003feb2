//! Core types for the rasterizer

use serde::{Deserialize, Serialize};

use super::math::{TexCoord, Vec4};
use crate::bitmap::Bitmap;

/// A vertex with position and texture coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub uv: TexCoord,
}

impl Vertex {
    pub fn new(position: Vec4, uv: TexCoord) -> Self {
        Self { position, uv }
    }

    pub fn from_pos(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec4::point(x, y, z),
            uv: TexCoord::default(),
        }
    }

    pub fn with_uv(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Self {
            position: Vec4::point(x, y, z),
            uv: TexCoord::new(u, v),
        }
    }
}

/// A triangle ready to be submitted to the pipeline.
///
/// The texture is borrowed, so it has to outlive every draw call that uses it.
#[derive(Debug, Clone, Copy)]
pub struct Triangle<'a> {
    pub vertices: [Vertex; 3],
    /// Palette index used for flat fills and wireframe
    pub color: u8,
    pub texture: Option<&'a Bitmap>,
}

impl<'a> Triangle<'a> {
    pub fn new(vertices: [Vertex; 3], color: u8) -> Self {
        Self {
            vertices,
            color,
            texture: None,
        }
    }

    pub fn textured(vertices: [Vertex; 3], texture: &'a Bitmap) -> Self {
        Self {
            vertices,
            color: 1,
            texture: Some(texture),
        }
    }
}

/// How triangles are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawMode {
    /// Texture coordinates interpolated linearly in screen space
    Affine,
    /// Texture coordinates interpolated through 1/z
    Perspective,
    /// Solid fill with the triangle color
    Flat,
    /// Triangle edges only
    Wireframe,
}

impl DrawMode {
    pub fn label(&self) -> &'static str {
        match self {
            DrawMode::Affine => "Affine",
            DrawMode::Perspective => "Perspective",
            DrawMode::Flat => "Flat",
            DrawMode::Wireframe => "Wireframe",
        }
    }

    /// Next mode in the viewer's toggle cycle
    pub fn next(self) -> Self {
        match self {
            DrawMode::Affine => DrawMode::Perspective,
            DrawMode::Perspective => DrawMode::Flat,
            DrawMode::Flat => DrawMode::Wireframe,
            DrawMode::Wireframe => DrawMode::Affine,
        }
    }
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CullMode {
    Back,
    Front,
    None,
}

impl CullMode {
    pub fn label(&self) -> &'static str {
        match self {
            CullMode::Back => "Back",
            CullMode::Front => "Front",
            CullMode::None => "None",
        }
    }

    pub fn next(self) -> Self {
        match self {
            CullMode::None => CullMode::Back,
            CullMode::Back => CullMode::Front,
            CullMode::Front => CullMode::None,
        }
    }
}

/// Depth comparison, OpenGL style.
///
/// The depth plane stores 1/z, so a larger stored value is nearer. `Less`
/// accepts a fragment when the stored value is less than the incoming one,
/// i.e. when the fragment is closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepthFunc {
    /// No depth testing
    Always,
    Less,
    LEqual,
    GEqual,
    Greater,
    NotEqual,
    /// Nothing is drawn
    Never,
}

impl DepthFunc {
    /// Compare a stored 1/z against an incoming 1/z
    #[inline]
    pub fn passes(self, stored: f32, incoming: f32) -> bool {
        match self {
            DepthFunc::Always => true,
            DepthFunc::Less => stored < incoming,
            DepthFunc::LEqual => stored <= incoming,
            DepthFunc::GEqual => stored >= incoming,
            DepthFunc::Greater => stored > incoming,
            DepthFunc::NotEqual => stored != incoming,
            DepthFunc::Never => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DepthFunc::Always => "Always",
            DepthFunc::Less => "Less",
            DepthFunc::LEqual => "LEqual",
            DepthFunc::GEqual => "GEqual",
            DepthFunc::Greater => "Greater",
            DepthFunc::NotEqual => "NotEqual",
            DepthFunc::Never => "Never",
        }
    }
}

/// Per-buffer draw options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawOptions {
    pub draw_mode: DrawMode,
    pub cull_mode: CullMode,
    pub depth_func: DepthFunc,
    /// Texels with this palette index are not written
    pub color_key: Option<u8>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            draw_mode: DrawMode::Perspective,
            cull_mode: CullMode::None,
            depth_func: DepthFunc::Always,
            color_key: None,
        }
    }
}

impl DrawOptions {
    /// Depth testing is active for anything but `Always`
    #[inline]
    pub fn depth_test(&self) -> bool {
        self.depth_func != DepthFunc::Always
    }
}
