//! vga3d: 8-bit palette-indexed software rasterizer
//!
//! Scanline triangle rasterization in the spirit of VGA mode 13h:
//! - 320x200 draw buffers with one palette index per pixel
//! - Flat fill, affine and perspective-correct texture mapping
//! - 1/z depth buffer with OpenGL-style depth functions
//! - BMP textures and Quake MDL models

pub mod bitmap;
pub mod config;
pub mod error;
pub mod input;
pub mod mdl;
pub mod rasterizer;

pub use bitmap::{Bitmap, Palette};
pub use error::{Error, Result};
pub use rasterizer::{DrawBuffer, DrawOptions, Planes};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
