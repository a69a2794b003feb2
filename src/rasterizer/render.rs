//! Draw buffer (render target) and primitive drawing
//!
//! A draw buffer owns an 8-bit color plane and an optional depth plane holding
//! 1/z per pixel. Every pixel write is bounds-checked, so callers can hand in
//! geometry that is partially offscreen.

use std::path::Path;

use super::math::{lerp, Vec4};
use super::types::DrawOptions;
use super::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::bitmap::Palette;
use crate::error::{try_alloc, Error, Result};

bitflags::bitflags! {
    /// Planes of a draw buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Planes: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Render target
#[derive(Debug, Clone)]
pub struct DrawBuffer {
    pub width: usize,
    pub height: usize,
    pub options: DrawOptions,
    color: Option<Vec<u8>>,
    depth: Option<Vec<f32>>,
}

impl DrawBuffer {
    /// Allocate the requested planes with default draw options
    pub fn new(width: usize, height: usize, planes: Planes) -> Result<Self> {
        // coordinates are i32 all the way down the pipeline
        let len = width
            .checked_mul(height)
            .filter(|_| width > 0 && height > 0)
            .filter(|_| width <= i32::MAX as usize && height <= i32::MAX as usize)
            .ok_or(Error::InvalidDimensions { width, height })?;

        let color = if planes.contains(Planes::COLOR) {
            Some(try_alloc::<u8>("color buffer", len)?)
        } else {
            None
        };
        let depth = if planes.contains(Planes::DEPTH) {
            Some(try_alloc::<f32>("depth buffer", len)?)
        } else {
            None
        };

        log::debug!("allocated {}x{} draw buffer ({:?})", width, height, planes);

        Ok(Self {
            width,
            height,
            options: DrawOptions::default(),
            color,
            depth,
        })
    }

    /// Color-only buffer the size of the 320x200 screen
    pub fn screen() -> Result<Self> {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT, Planes::COLOR)
    }

    /// Planes currently allocated
    pub fn planes(&self) -> Planes {
        let mut p = Planes::empty();
        if self.color.is_some() {
            p |= Planes::COLOR;
        }
        if self.depth.is_some() {
            p |= Planes::DEPTH;
        }
        p
    }

    /// Check that every requested plane is present
    pub fn is_valid(&self, planes: Planes) -> bool {
        self.planes().contains(planes)
    }

    pub fn color(&self) -> Option<&[u8]> {
        self.color.as_deref()
    }

    pub fn color_mut(&mut self) -> Option<&mut [u8]> {
        self.color.as_deref_mut()
    }

    pub fn depth(&self) -> Option<&[f32]> {
        self.depth.as_deref()
    }

    /// Color index at (x, y), None outside the buffer or without a color plane
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        let idx = self.index(x, y)?;
        self.color.as_ref().map(|c| c[idx])
    }

    /// Stored 1/z at (x, y)
    pub fn depth_at(&self, x: i32, y: i32) -> Option<f32> {
        let idx = self.index(x, y)?;
        self.depth.as_ref().map(|d| d[idx])
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Clear the given planes: color to 0, depth to 0.0 (1/z of infinitely far)
    pub fn clear(&mut self, planes: Planes) {
        if planes.contains(Planes::COLOR) {
            self.clear_color(0);
        }
        if planes.contains(Planes::DEPTH) {
            self.clear_depth();
        }
    }

    /// Fill the color plane, depth is untouched
    pub fn clear_color(&mut self, color: u8) {
        if let Some(c) = self.color.as_mut() {
            c.fill(color);
        }
    }

    pub fn clear_depth(&mut self) {
        if let Some(d) = self.depth.as_mut() {
            d.fill(0.0);
        }
    }

    /// Copy the color plane of `src` into this buffer at (x, y), clipped to
    /// the destination
    pub fn blit(&mut self, x: i32, y: i32, src: &DrawBuffer) {
        let (Some(src_color), Some(dst_color)) = (src.color.as_ref(), self.color.as_mut()) else {
            return;
        };

        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + src.width as i64).min(self.width as i64);
        let y1 = (y as i64 + src.height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let span = (x1 - x0) as usize;
        for dy in y0..y1 {
            let sy = (dy - y as i64) as usize;
            let sx = (x0 - x as i64) as usize;
            let s = sy * src.width + sx;
            let d = dy as usize * self.width + x0 as usize;
            dst_color[d..d + span].copy_from_slice(&src_color[s..s + span]);
        }
    }

    /// Copy this buffer to a screen buffer of the same size
    pub fn present(&self, screen: &mut DrawBuffer) {
        screen.blit(0, 0, self);
    }

    /// Plot a pixel, ignoring depth
    #[inline]
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: u8) {
        if let Some(idx) = self.index(x, y) {
            if let Some(c) = self.color.as_mut() {
                c[idx] = color;
            }
        }
    }

    /// Plot a pixel through the depth test. `inv_z` is the fragment's 1/z.
    #[inline]
    pub fn draw_pixel_with_depth(&mut self, x: i32, y: i32, inv_z: f32, color: u8) {
        let func = self.options.depth_func;
        let Some(idx) = self.index(x, y) else {
            return;
        };
        let Some(depth) = self.depth.as_mut() else {
            // no depth plane: plain plot
            if let Some(c) = self.color.as_mut() {
                c[idx] = color;
            }
            return;
        };

        if func.passes(depth[idx], inv_z) {
            depth[idx] = inv_z;
            if let Some(c) = self.color.as_mut() {
                c[idx] = color;
            }
        }
    }

    /// Bresenham line from (x0, y0) to (x1, y1). With depth testing active,
    /// 1/z is interpolated between 1/z0 and 1/z1 along the major axis and every
    /// point goes through the depth test.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(&mut self, x0: i32, y0: i32, z0: f32, x1: i32, y1: i32, z1: f32, color: u8) {
        let depth_test = self.options.depth_test();
        let (iz0, iz1) = if depth_test { (1.0 / z0, 1.0 / z1) } else { (0.0, 0.0) };

        let Some((t0, t1)) = self.clip_segment(x0 as f64, y0 as f64, x1 as f64, y1 as f64) else {
            return;
        };

        // endpoints can sit anywhere in i32, so the deltas can't be i32
        let (dx, dy) = (x1 as f64 - x0 as f64, y1 as f64 - y0 as f64);
        let cx0 = (x0 as f64 + dx * t0).round() as i64;
        let cy0 = (y0 as f64 + dy * t0).round() as i64;
        let cx1 = (x0 as f64 + dx * t1).round() as i64;
        let cy1 = (y0 as f64 + dy * t1).round() as i64;
        let ciz0 = lerp(iz0, iz1, t0 as f32);
        let ciz1 = lerp(iz0, iz1, t1 as f32);

        self.bresenham(cx0, cy0, ciz0, cx1, cy1, ciz1, color, depth_test);
    }

    /// Line between the x/y of two screen-space vectors, using their z for depth
    pub fn draw_line_vec(&mut self, from: &Vec4, to: &Vec4, color: u8) {
        self.draw_line(
            from.x as i32,
            from.y as i32,
            from.z,
            to.x as i32,
            to.y as i32,
            to.z,
            color,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn bresenham(&mut self, x0: i64, y0: i64, iz0: f32, x1: i64, y1: i64, iz1: f32, color: u8, depth_test: bool) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut x = x0;
        let mut y = y0;

        let steps = dx.max(-dy);
        let inv_steps = if steps > 0 { 1.0 / steps as f32 } else { 0.0 };
        let mut step = 0i64;

        loop {
            if depth_test {
                let inv_z = lerp(iz0, iz1, step as f32 * inv_steps);
                self.draw_pixel_with_depth(x as i32, y as i32, inv_z, color);
            } else {
                self.draw_pixel(x as i32, y as i32, color);
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            step += 1;
        }
    }

    /// Liang-Barsky clip of a segment against the buffer rectangle. Returns
    /// the visible parameter range, or None if the segment misses the buffer.
    fn clip_segment(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Option<(f64, f64)> {
        let (xmax, ymax) = ((self.width - 1) as f64, (self.height - 1) as f64);
        let dx = x1 - x0;
        let dy = y1 - y0;
        let mut t0 = 0.0f64;
        let mut t1 = 1.0f64;

        for (p, q) in [(-dx, x0), (dx, xmax - x0), (-dy, y0), (dy, ymax - y0)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        Some((t0, t1))
    }

    /// Expand the color plane through a palette into RGBA bytes
    pub fn to_rgba(&self, palette: &Palette) -> Vec<u8> {
        let mut out = vec![0u8; self.width * self.height * 4];
        if let Some(c) = self.color.as_ref() {
            for (px, &idx) in out.chunks_exact_mut(4).zip(c.iter()) {
                px.copy_from_slice(&palette.rgba(idx));
            }
        }
        out
    }

    /// Write the color plane as a PNG screenshot
    pub fn save_png<P: AsRef<Path>>(&self, path: P, palette: &Palette) -> Result<()> {
        let rgba = self.to_rgba(palette);
        let img = image::RgbaImage::from_raw(self.width as u32, self.height as u32, rgba).ok_or(
            Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            },
        )?;
        img.save(path.as_ref())?;
        log::info!("saved screenshot {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::DepthFunc;

    fn buffer(planes: Planes) -> DrawBuffer {
        DrawBuffer::new(16, 8, planes).unwrap()
    }

    fn count(buf: &DrawBuffer, color: u8) -> usize {
        buf.color().unwrap().iter().filter(|&&c| c == color).count()
    }

    #[test]
    fn test_allocation_and_validity() {
        let b = buffer(Planes::COLOR);
        assert!(b.is_valid(Planes::COLOR));
        assert!(!b.is_valid(Planes::COLOR | Planes::DEPTH));

        let d = buffer(Planes::COLOR | Planes::DEPTH);
        assert_eq!(d.depth().unwrap().len(), d.color().unwrap().len());
        assert_eq!(d.options, DrawOptions::default());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            DrawBuffer::new(0, 10, Planes::COLOR),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_clear_depth_stores_float_zero() {
        let mut b = buffer(Planes::COLOR | Planes::DEPTH);
        b.options.depth_func = DepthFunc::Always;
        b.draw_pixel_with_depth(3, 3, 0.75, 9);
        b.clear(Planes::DEPTH);
        assert!(b.depth().unwrap().iter().all(|&d| d == 0.0));
        // color plane untouched
        assert_eq!(b.pixel(3, 3), Some(9));
    }

    #[test]
    fn test_pixel_outside_is_ignored() {
        let mut b = buffer(Planes::COLOR);
        b.draw_pixel(-1, 0, 5);
        b.draw_pixel(16, 0, 5);
        b.draw_pixel(0, 8, 5);
        b.draw_pixel(i32::MIN, i32::MAX, 5);
        assert_eq!(count(&b, 5), 0);
        b.draw_pixel(15, 7, 5);
        assert_eq!(b.pixel(15, 7), Some(5));
    }

    #[test]
    fn test_depth_less_keeps_nearest() {
        let mut b = buffer(Planes::COLOR | Planes::DEPTH);
        b.options.depth_func = DepthFunc::Less;
        b.draw_pixel_with_depth(2, 2, 0.5, 1); // z = 2
        b.draw_pixel_with_depth(2, 2, 0.25, 2); // z = 4, farther
        assert_eq!(b.pixel(2, 2), Some(1));
        b.draw_pixel_with_depth(2, 2, 1.0, 3); // z = 1, nearer
        assert_eq!(b.pixel(2, 2), Some(3));
        assert_eq!(b.depth_at(2, 2), Some(1.0));
    }

    #[test]
    fn test_depth_never_writes_nothing() {
        let mut b = buffer(Planes::COLOR | Planes::DEPTH);
        b.options.depth_func = DepthFunc::Never;
        b.draw_pixel_with_depth(1, 1, 10.0, 4);
        assert_eq!(b.pixel(1, 1), Some(0));
        assert_eq!(b.depth_at(1, 1), Some(0.0));
    }

    #[test]
    fn test_horizontal_line_is_inclusive() {
        let mut b = buffer(Planes::COLOR);
        b.draw_line(2, 3, 0.0, 9, 3, 0.0, 7);
        assert_eq!(count(&b, 7), 8);
        assert_eq!(b.pixel(2, 3), Some(7));
        assert_eq!(b.pixel(9, 3), Some(7));
    }

    #[test]
    fn test_steep_line_one_pixel_per_row() {
        let mut b = buffer(Planes::COLOR);
        b.draw_line(1, 0, 0.0, 3, 7, 0.0, 7);
        for y in 0..8 {
            let on_row = (0..16).filter(|&x| b.pixel(x, y) == Some(7)).count();
            assert_eq!(on_row, 1, "row {}", y);
        }
    }

    #[test]
    fn test_line_far_offscreen_is_clipped() {
        let mut b = buffer(Planes::COLOR);
        b.draw_line(-1_000_000, 4, 0.0, 1_000_000, 4, 0.0, 7);
        assert_eq!(count(&b, 7), 16);
        b.clear_color(0);
        b.draw_line(-50, -50, 0.0, -10, 100, 0.0, 7);
        assert_eq!(count(&b, 7), 0);
    }

    #[test]
    fn test_line_between_i32_extremes() {
        let mut b = buffer(Planes::COLOR);
        b.draw_line(i32::MIN, 4, 0.0, i32::MAX, 4, 0.0, 7);
        assert_eq!(count(&b, 7), 16);

        // screen positions from vertices near w = 0 saturate on the cast
        b.clear_color(0);
        let from = Vec4::new(5.0e12, 3.0, 0.5, 1.0);
        let to = Vec4::new(-5.0e12, 3.0, 0.5, 1.0);
        b.draw_line_vec(&from, &to, 7);
        assert_eq!(count(&b, 7), 16);
        assert_eq!(b.pixel(0, 3), Some(7));
    }

    #[test]
    fn test_line_with_depth_interpolates_reciprocal() {
        let mut b = buffer(Planes::COLOR | Planes::DEPTH);
        b.options.depth_func = DepthFunc::Less;
        // 1/z goes from 1.0 to 0.25
        b.draw_line(0, 0, 1.0, 6, 0, 4.0, 3);
        assert_eq!(b.depth_at(0, 0), Some(1.0));
        assert!((b.depth_at(6, 0).unwrap() - 0.25).abs() < 1e-6);
        assert!((b.depth_at(3, 0).unwrap() - 0.625).abs() < 1e-6);
    }

    #[test]
    fn test_blit_clips_destination() {
        let mut src = DrawBuffer::new(4, 4, Planes::COLOR).unwrap();
        src.clear_color(6);
        let mut dst = buffer(Planes::COLOR);
        dst.blit(14, 6, &src);
        assert_eq!(count(&dst, 6), 4);
        assert_eq!(dst.pixel(15, 7), Some(6));
        dst.clear_color(0);
        dst.blit(-2, -2, &src);
        assert_eq!(count(&dst, 6), 4);
        assert_eq!(dst.pixel(0, 0), Some(6));
        assert_eq!(dst.pixel(2, 2), Some(0));
    }

    #[test]
    fn test_to_rgba_uses_palette() {
        let mut b = buffer(Planes::COLOR);
        let mut palette = Palette::grayscale();
        palette.set(4, [10, 20, 30]);
        b.draw_pixel(0, 0, 4);
        let rgba = b.to_rgba(&palette);
        assert_eq!(&rgba[0..4], &[10, 20, 30, 255]);
        assert_eq!(rgba.len(), 16 * 8 * 4);
    }
}
