//! Indexed 8-bit bitmaps and palettes
//!
//! Bitmaps are the textures of the rasterizer: one palette index per pixel,
//! stored top-down, plus the 256-entry palette they were loaded with.

use std::path::{Path, PathBuf};

use crate::error::{try_alloc, Error, Result};
use crate::rasterizer::DrawBuffer;

/// 256 RGB colors, 8 bits per channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [[u8; 3]; 256],
}

impl Palette {
    /// All black
    pub fn black() -> Self {
        Self { colors: [[0; 3]; 256] }
    }

    /// Index i maps to gray level i
    pub fn grayscale() -> Self {
        let mut p = Self::black();
        for (i, c) in p.colors.iter_mut().enumerate() {
            *c = [i as u8; 3];
        }
        p
    }

    /// Default VGA-like palette: 16 EGA colors, a 16 step gray ramp and a
    /// 6x6x6 color cube. The last 8 entries are black.
    pub fn vga() -> Self {
        const EGA: [[u8; 3]; 16] = [
            [0, 0, 0],
            [0, 0, 170],
            [0, 170, 0],
            [0, 170, 170],
            [170, 0, 0],
            [170, 0, 170],
            [170, 85, 0],
            [170, 170, 170],
            [85, 85, 85],
            [85, 85, 255],
            [85, 255, 85],
            [85, 255, 255],
            [255, 85, 85],
            [255, 85, 255],
            [255, 255, 85],
            [255, 255, 255],
        ];

        let mut p = Self::black();
        p.colors[..16].copy_from_slice(&EGA);
        for i in 0..16 {
            let g = (i * 17) as u8;
            p.colors[16 + i] = [g, g, g];
        }
        for i in 0..216 {
            let (r, g, b) = (i / 36, (i / 6) % 6, i % 6);
            p.colors[32 + i] = [(r * 51) as u8, (g * 51) as u8, (b * 51) as u8];
        }
        p
    }

    /// Palette from 768 bytes of 8-bit RGB triplets
    pub fn from_rgb(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 768 {
            return Err(Error::truncated("palette"));
        }
        let mut p = Self::black();
        for (c, rgb) in p.colors.iter_mut().zip(bytes.chunks_exact(3)) {
            c.copy_from_slice(rgb);
        }
        Ok(p)
    }

    /// Palette from 768 bytes of 6-bit VGA DAC values
    pub fn from_vga(bytes: &[u8]) -> Result<Self> {
        let mut p = Self::from_rgb(bytes)?;
        for c in p.colors.iter_mut().flatten() {
            let v = *c & 0x3f;
            *c = (v << 2) | (v >> 4);
        }
        Ok(p)
    }

    /// 6-bit per channel copy as the VGA DAC expects it
    pub fn to_vga(&self) -> [u8; 768] {
        let mut out = [0u8; 768];
        for (o, c) in out.iter_mut().zip(self.colors.iter().flatten()) {
            *o = c >> 2;
        }
        out
    }

    pub fn get(&self, index: u8) -> [u8; 3] {
        self.colors[index as usize]
    }

    pub fn set(&mut self, index: u8, rgb: [u8; 3]) {
        self.colors[index as usize] = rgb;
    }

    #[inline]
    pub fn rgba(&self, index: u8) -> [u8; 4] {
        let [r, g, b] = self.colors[index as usize];
        [r, g, b, 255]
    }

    /// Index of the closest color by squared RGB distance
    pub fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let dist = |c: &[u8; 3]| {
            (0..3)
                .map(|i| {
                    let d = c[i] as i32 - rgb[i] as i32;
                    d * d
                })
                .sum::<i32>()
        };
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| dist(c))
            .map(|(i, _)| i as u8)
            .unwrap_or(0)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::vga()
    }
}

/// Indexed 8-bit image
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub palette: Palette,
    /// Row-major, top row first
    pub data: Vec<u8>,
    pub name: String,
}

fn check_dimensions(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .filter(|_| width > 0 && height > 0)
        .filter(|_| width <= i32::MAX as usize && height <= i32::MAX as usize)
        .ok_or(Error::InvalidDimensions { width, height })
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16> {
    bytes
        .get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(Error::truncated("bitmap header"))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(Error::truncated("bitmap header"))
}

impl Bitmap {
    /// Zero-filled bitmap with the default palette
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            palette: Palette::default(),
            data: try_alloc("bitmap", len)?,
            name: String::new(),
        })
    }

    /// Wrap existing pixel data
    pub fn from_data(width: usize, height: usize, data: Vec<u8>, palette: Palette) -> Result<Self> {
        let len = check_dimensions(width, height)?;
        if data.len() != len {
            return Err(Error::truncated("bitmap pixel"));
        }
        Ok(Self {
            width,
            height,
            palette,
            data,
            name: String::new(),
        })
    }

    /// Two-color checkerboard with square cells of `cell` pixels
    pub fn checkerboard(width: usize, height: usize, cell: usize, a: u8, b: u8) -> Result<Self> {
        let mut bmp = Self::new(width, height)?;
        let cell = cell.max(1);
        for y in 0..height {
            for x in 0..width {
                bmp.data[y * width + x] = if (x / cell + y / cell) % 2 == 0 { a } else { b };
            }
        }
        bmp.name = "checkerboard".to_string();
        Ok(bmp)
    }

    /// Load an uncompressed 8-bit BMP file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut bmp = Self::from_bmp_bytes(&bytes).map_err(|e| match e {
            Error::NotABitmap(_) => Error::NotABitmap(path.to_path_buf()),
            other => other,
        })?;

        bmp.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        log::debug!("loaded bitmap {} ({}x{})", path.display(), bmp.width, bmp.height);
        Ok(bmp)
    }

    /// Decode an uncompressed 8-bit BMP from memory. Rows are stored
    /// bottom-up unless the height is negative.
    pub fn from_bmp_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 || &bytes[0..2] != b"BM" {
            return Err(Error::NotABitmap(PathBuf::from("<memory>")));
        }

        let data_offset = read_u32(bytes, 10)? as usize;
        let header_size = read_u32(bytes, 14)? as usize;
        let width = read_u32(bytes, 18)? as i32;
        let raw_height = read_u32(bytes, 22)? as i32;
        let bpp = read_u16(bytes, 28)?;
        let compression = read_u32(bytes, 30)?;
        let colors_used = read_u32(bytes, 46)?;

        if bpp != 8 {
            return Err(Error::unsupported_bitmap(format!("{} bits per pixel", bpp)));
        }
        if compression != 0 {
            return Err(Error::unsupported_bitmap(format!("compression type {}", compression)));
        }
        if width <= 0 || raw_height == 0 {
            return Err(Error::InvalidDimensions {
                width: width.max(0) as usize,
                height: raw_height.unsigned_abs() as usize,
            });
        }

        let (width, height) = (width as usize, raw_height.unsigned_abs() as usize);
        let top_down = raw_height < 0;
        let num_colors = match colors_used {
            0 => 256,
            n => (n as usize).min(256),
        };

        // palette entries are BGRA
        let mut palette = Palette::black();
        let pal_start = 14 + header_size;
        let pal_bytes = bytes
            .get(pal_start..pal_start + num_colors * 4)
            .ok_or(Error::truncated("bitmap palette"))?;
        for (i, bgra) in pal_bytes.chunks_exact(4).enumerate() {
            palette.set(i as u8, [bgra[2], bgra[1], bgra[0]]);
        }

        let stride = (width + 3) & !3;
        let pixels = bytes
            .get(data_offset..)
            .filter(|p| p.len() >= stride * (height - 1) + width)
            .ok_or(Error::truncated("bitmap pixel"))?;

        let mut bmp = Self::new(width, height)?;
        bmp.palette = palette;
        for row in 0..height {
            let src_row = if top_down { row } else { height - 1 - row };
            let src = &pixels[src_row * stride..src_row * stride + width];
            bmp.data[row * width..(row + 1) * width].copy_from_slice(src);
        }
        Ok(bmp)
    }

    /// Copy a `w` x `h` region at (x, y) into a new bitmap with the same palette
    pub fn from_atlas(&self, x: usize, y: usize, w: usize, h: usize) -> Result<Self> {
        let inside = x.checked_add(w).is_some_and(|r| r <= self.width)
            && y.checked_add(h).is_some_and(|b| b <= self.height);
        if !inside {
            return Err(Error::RegionOutOfBounds {
                x,
                y,
                width: w,
                height: h,
                src_width: self.width,
                src_height: self.height,
            });
        }

        let mut bmp = Self::new(w, h)?;
        bmp.palette = self.palette.clone();
        for row in 0..h {
            let src = (y + row) * self.width + x;
            bmp.data[row * w..(row + 1) * w].copy_from_slice(&self.data[src..src + w]);
        }
        bmp.name = format!("{}@{},{}", self.name, x, y);
        Ok(bmp)
    }

    /// Nearest-neighbour resize
    pub fn resize(&self, w: usize, h: usize) -> Result<Self> {
        let mut bmp = Self::new(w, h)?;
        bmp.palette = self.palette.clone();
        bmp.name = self.name.clone();
        for y in 0..h {
            let sy = y * self.height / h;
            for x in 0..w {
                let sx = x * self.width / w;
                bmp.data[y * w + x] = self.data[sy * self.width + sx];
            }
        }
        Ok(bmp)
    }

    /// Texel lookup on the combined index:
    /// `(u + v * height) mod ((width - 1) * (height - 1))`.
    /// Wrapping happens on the linear index, not per axis, and the area matches
    /// the `(width - 1, height - 1)` texel space the fillers scale UV into.
    #[inline]
    pub fn texel(&self, u: i32, v: i32) -> u8 {
        let area = ((self.width - 1) * (self.height - 1)).max(1) as i64;
        let idx = (u as i64 + v as i64 * self.height as i64).rem_euclid(area);
        self.data[idx as usize]
    }

    /// Pixel at (x, y), None outside the bitmap
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Blit into `target` at (x, y), clipped
    pub fn draw(&self, x: i32, y: i32, target: &mut DrawBuffer) {
        self.draw_offset(x, y, 0, 0, target);
    }

    /// Blit with the source shifted by (x_offset, y_offset), wrapping around
    /// its edges. Used for scrolling backgrounds.
    pub fn draw_offset(&self, x: i32, y: i32, x_offset: i32, y_offset: i32, target: &mut DrawBuffer) {
        self.blit(x, y, x_offset, y_offset, None, target);
    }

    /// Blit skipping pixels equal to `color_key`
    pub fn draw_color_key(&self, x: i32, y: i32, target: &mut DrawBuffer, color_key: u8) {
        self.blit(x, y, 0, 0, Some(color_key), target);
    }

    fn blit(&self, x: i32, y: i32, x_offset: i32, y_offset: i32, key: Option<u8>, target: &mut DrawBuffer) {
        let (w, h) = (self.width as i64, self.height as i64);
        let x0 = (x as i64).max(0);
        let y0 = (y as i64).max(0);
        let x1 = (x as i64 + w).min(target.width as i64);
        let y1 = (y as i64 + h).min(target.height as i64);

        for dy in y0..y1 {
            let sy = (dy - y as i64 + y_offset as i64).rem_euclid(h) as usize;
            for dx in x0..x1 {
                let sx = (dx - x as i64 + x_offset as i64).rem_euclid(w) as usize;
                let c = self.data[sy * self.width + sx];
                if key != Some(c) {
                    target.draw_pixel(dx as i32, dy as i32, c);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rasterizer::Planes;

    /// Build an 8-bit BMP in memory. `rows` are top-down.
    pub(crate) fn bmp_bytes(width: usize, rows: &[Vec<u8>], palette: &[[u8; 3]]) -> Vec<u8> {
        let height = rows.len();
        let stride = (width + 3) & !3;
        let data_offset = 14 + 40 + 256 * 4;
        let mut out = Vec::new();
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&((data_offset + stride * height) as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(data_offset as u32).to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&(width as i32).to_le_bytes());
        out.extend_from_slice(&(height as i32).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // compression
        out.extend_from_slice(&((stride * height) as u32).to_le_bytes());
        out.extend_from_slice(&[0; 8]); // resolution
        out.extend_from_slice(&0u32.to_le_bytes()); // colors used
        out.extend_from_slice(&0u32.to_le_bytes());
        for i in 0..256 {
            let [r, g, b] = palette.get(i).copied().unwrap_or([0, 0, 0]);
            out.extend_from_slice(&[b, g, r, 0]);
        }
        for row in rows.iter().rev() {
            out.extend_from_slice(row);
            out.extend(std::iter::repeat(0).take(stride - width));
        }
        out
    }

    #[test]
    fn test_bmp_rows_are_flipped_and_padded() {
        let rows = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let bytes = bmp_bytes(3, &rows, &[[0, 0, 0], [255, 0, 0]]);
        let bmp = Bitmap::from_bmp_bytes(&bytes).unwrap();
        assert_eq!((bmp.width, bmp.height), (3, 2));
        assert_eq!(bmp.data, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(bmp.palette.get(1), [255, 0, 0]);
    }

    #[test]
    fn test_missing_signature_is_rejected() {
        let mut bytes = bmp_bytes(2, &[vec![0, 0]], &[]);
        bytes[0] = b'P';
        assert!(matches!(Bitmap::from_bmp_bytes(&bytes), Err(Error::NotABitmap(_))));
    }

    #[test]
    fn test_truncated_pixels_are_rejected() {
        let mut bytes = bmp_bytes(4, &[vec![1; 4], vec![2; 4]], &[]);
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(Bitmap::from_bmp_bytes(&bytes), Err(Error::Truncated(_))));
    }

    #[test]
    fn test_atlas_region() {
        let mut atlas = Bitmap::new(4, 4).unwrap();
        for (i, p) in atlas.data.iter_mut().enumerate() {
            *p = i as u8;
        }
        let sub = atlas.from_atlas(1, 2, 2, 2).unwrap();
        assert_eq!(sub.data, vec![9, 10, 13, 14]);
        assert!(matches!(
            atlas.from_atlas(3, 0, 2, 2),
            Err(Error::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_resize_nearest() {
        let bmp = Bitmap::from_data(2, 1, vec![3, 7], Palette::default()).unwrap();
        let big = bmp.resize(4, 2).unwrap();
        assert_eq!(big.data, vec![3, 3, 7, 7, 3, 3, 7, 7]);
    }

    #[test]
    fn test_texel_wraps_on_combined_index() {
        let mut bmp = Bitmap::new(8, 8).unwrap();
        for (i, p) in bmp.data.iter_mut().enumerate() {
            *p = i as u8;
        }
        // u past the width lands on the next row
        assert_eq!(bmp.texel(8 + 5, 0), bmp.texel(5, 1));
        // the (w - 1) * (h - 1) area wraps back
        assert_eq!(bmp.texel(49 + 5, 0), bmp.texel(5, 0));
        assert_eq!(bmp.texel(-1, 0), 48);
        // v is scaled by the height, not the width: (1 + 1 * 2) mod 3
        let strip = Bitmap::from_data(4, 2, (0..8).collect(), Palette::default()).unwrap();
        assert_eq!(strip.texel(1, 1), 0);
        // a single column still has a non-empty area
        let column = Bitmap::from_data(1, 4, vec![6, 7, 8, 9], Palette::default()).unwrap();
        assert_eq!(column.texel(3, 2), 6);
    }

    #[test]
    fn test_draw_offset_wraps_source() {
        let bmp = Bitmap::from_data(4, 1, vec![1, 2, 3, 4], Palette::default()).unwrap();
        let mut buf = DrawBuffer::new(8, 2, Planes::COLOR).unwrap();
        bmp.draw_offset(2, 1, 1, 0, &mut buf);
        let row: Vec<_> = (0..8).map(|x| buf.pixel(x, 1).unwrap()).collect();
        assert_eq!(row, vec![0, 0, 2, 3, 4, 1, 0, 0]);
    }

    #[test]
    fn test_draw_color_key_and_clipping() {
        let bmp = Bitmap::from_data(3, 1, vec![5, 0, 5], Palette::default()).unwrap();
        let mut buf = DrawBuffer::new(4, 1, Planes::COLOR).unwrap();
        buf.clear_color(9);
        bmp.draw_color_key(2, 0, &mut buf, 0);
        let row: Vec<_> = (0..4).map(|x| buf.pixel(x, 0).unwrap()).collect();
        assert_eq!(row, vec![9, 9, 5, 9]);
        bmp.draw(-2, 0, &mut buf);
        assert_eq!(buf.pixel(0, 0), Some(5));
    }

    #[test]
    fn test_palette_vga_round_trip_keeps_high_bits() {
        let mut p = Palette::black();
        p.set(1, [255, 128, 4]);
        let vga = p.to_vga();
        assert_eq!(&vga[3..6], &[63, 32, 1]);
        let back = Palette::from_vga(&vga).unwrap();
        assert_eq!(back.get(1), [255, 130, 4]);
    }

    #[test]
    fn test_default_palette_layout() {
        let p = Palette::default();
        assert_eq!(p.get(15), [255, 255, 255]);
        assert_eq!(p.get(31), [255, 255, 255]);
        assert_eq!(p.get(32 + 215), [255, 255, 255]);
        assert_eq!(p.nearest([250, 250, 250]), 15);
    }
}
