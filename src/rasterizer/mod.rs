//! Palette-indexed software rasterizer
//!
//! Triangles go through a clip-space transform, coarse rejection, optional
//! face culling and a perspective divide, then get split into flat-top and
//! flat-bottom pieces that are filled scanline by scanline:
//! - Flat color fill
//! - Affine texture mapping (u,v linear in screen space)
//! - Perspective-correct texture mapping (u/z, v/z, 1/z)
//! - Depth buffer holding 1/z

mod camera;
mod fillers;
mod math;
mod render;
mod triangle;
mod types;

pub use camera::*;
pub use fillers::{FlatTriangle, TriangleKind};
pub use math::*;
pub use render::*;
pub use triangle::*;
pub use types::*;

/// Screen dimensions (VGA mode 13h)
pub const SCREEN_WIDTH: usize = 320;
pub const SCREEN_HEIGHT: usize = 200;
