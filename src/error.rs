//! Error type shared by the loaders, buffer allocation and configuration.
//!
//! Drawing never fails: bad geometry is skipped, out-of-range pixels are
//! clipped. Only resource creation and file parsing report errors.

use std::path::PathBuf;

/// Error categories.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Memory for a bitmap, skin or draw buffer plane could not be reserved.
    #[error("Out of memory allocating {what} ({bytes} bytes)")]
    OutOfMemory { what: &'static str, bytes: usize },

    /// A buffer or bitmap was requested with a zero or oversized dimension.
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing "BM" signature.
    #[error("{} is not a bitmap file", .0.display())]
    NotABitmap(PathBuf),

    /// A valid BMP that is not an uncompressed 8-bit indexed image.
    #[error("Unsupported bitmap: {0}")]
    UnsupportedBitmap(String),

    /// Wrong magic number or version in an MDL header.
    #[error("Bad model identifier {ident:#010x} or version {version}")]
    BadModelHeader { ident: i32, version: i32 },

    /// A valid MDL using features the loader does not handle (group skins/frames).
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// File ended before the named section was complete.
    #[error("Truncated {0} data")]
    Truncated(&'static str),

    /// Atlas sub-rectangle outside the source bitmap.
    #[error("Region {x},{y} {width}x{height} is outside the {src_width}x{src_height} source")]
    RegionOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        src_width: usize,
        src_height: usize,
    },

    #[error("Config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] ron::Error),

    /// PNG export failure.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub fn truncated(section: &'static str) -> Self {
        Self::Truncated(section)
    }

    pub fn unsupported_bitmap(detail: impl Into<String>) -> Self {
        Self::UnsupportedBitmap(detail.into())
    }

    pub fn unsupported_model(detail: impl Into<String>) -> Self {
        Self::UnsupportedModel(detail.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reserve a zeroed vector of `len` elements, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_alloc<T: Clone + Default>(what: &'static str, len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| Error::OutOfMemory {
        what,
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    v.resize(len, T::default());
    Ok(v)
}
