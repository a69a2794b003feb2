//! Scanline fillers for flat-bottom and flat-top triangles
//!
//! Every filler walks integer scanlines from the apex toward the base. The
//! first row is the first integer row inside the triangle and the edge values
//! are prestepped to it, so flat-bottom pieces cover `ceil(apex.y)..ceil(base.y)`
//! and flat-top pieces cover `ceil(base.y)..ceil(apex.y)`. The two halves of a
//! split triangle therefore never share a scanline.
//!
//! Positions are in screen space with z still holding clip-space z.

use super::math::lerp;
use super::render::DrawBuffer;
use super::types::Vertex;
use crate::bitmap::Bitmap;

/// Which side of a flat triangle the apex is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleKind {
    /// Apex above a horizontal bottom edge
    FlatBottom,
    /// Apex below a horizontal top edge
    FlatTop,
}

/// A triangle with one horizontal edge
#[derive(Debug, Clone, Copy)]
pub struct FlatTriangle {
    pub kind: TriangleKind,
    pub apex: Vertex,
    /// Base vertex with the larger x
    pub right: Vertex,
    /// Base vertex with the smaller x
    pub left: Vertex,
}

impl FlatTriangle {
    pub fn new(kind: TriangleKind, apex: Vertex, right: Vertex, left: Vertex) -> Self {
        Self { kind, apex, right, left }
    }

    /// Vertical extent from apex to base
    pub fn height(&self) -> f32 {
        (self.left.position.y - self.apex.position.y).abs()
    }

    /// Scanlines this piece covers, half-open
    pub fn rows(&self) -> std::ops::Range<i64> {
        let apex = self.apex.position.y.ceil() as i64;
        let base = self.left.position.y.ceil() as i64;
        match self.kind {
            TriangleKind::FlatBottom => apex..base,
            TriangleKind::FlatTop => base..apex,
        }
    }

    /// Scanlines this piece covers inside `[0, buffer_height)`
    pub fn visible_rows(&self, buffer_height: usize) -> std::ops::Range<i64> {
        let rows = self.rows();
        rows.start.max(0)..rows.end.min(buffer_height as i64)
    }
}

/// Values carried along an edge: x, 1/z and the two texture coordinates
#[derive(Debug, Clone, Copy, Default)]
struct Attrs {
    x: f32,
    inv_z: f32,
    u: f32,
    v: f32,
}

impl Attrs {
    /// Per-scanline change going from `from` to `to` over `height` rows
    fn slope(from: Attrs, to: Attrs, height: f32) -> Attrs {
        let inv = 1.0 / height;
        Attrs {
            x: (to.x - from.x) * inv,
            inv_z: (to.inv_z - from.inv_z) * inv,
            u: (to.u - from.u) * inv,
            v: (to.v - from.v) * inv,
        }
    }

    fn advance(&mut self, d: &Attrs, rows: f32) {
        self.x += d.x * rows;
        self.inv_z += d.inv_z * rows;
        self.u += d.u * rows;
        self.v += d.v * rows;
    }
}

/// Walk the on-screen scanlines of `tri`, calling `span(y, left, right)` for
/// each. Rows above or below the buffer are skipped by prestepping past them.
/// `attrs` maps a vertex to its interpolated values.
fn walk<A, S>(tri: &FlatTriangle, buffer_height: usize, attrs: A, mut span: S)
where
    A: Fn(&Vertex) -> Attrs,
    S: FnMut(i32, &Attrs, &Attrs),
{
    let height = tri.height();
    // sub-scanline pieces are dropped
    if !(height >= 1.0) {
        return;
    }

    let apex = attrs(&tri.apex);
    let d_left = Attrs::slope(apex, attrs(&tri.left), height);
    let d_right = Attrs::slope(apex, attrs(&tri.right), height);

    let rows = tri.visible_rows(buffer_height);
    if rows.is_empty() {
        return;
    }
    let apex_y = tri.apex.position.y as f64;
    // first row walked, the direction of the walk, and its distance from the apex
    let (mut y, y_dir, prestep) = match tri.kind {
        TriangleKind::FlatBottom => (rows.start, 1, rows.start as f64 - apex_y),
        TriangleKind::FlatTop => (rows.end - 1, -1, apex_y - (rows.end - 1) as f64),
    };

    let mut left = apex;
    let mut right = apex;
    left.advance(&d_left, prestep as f32);
    right.advance(&d_right, prestep as f32);

    for _ in rows {
        span(y as i32, &left, &right);
        left.advance(&d_left, 1.0);
        right.advance(&d_right, 1.0);
        y += y_dir;
    }
}

/// Pixel steps of a span starting at `xl` and ending at or before `xr`,
/// restricted to columns inside `[0, width)`. Step `k` lands on column
/// `floor(xl + k)`.
fn span_steps(xl: f32, xr: f32, width: usize) -> std::ops::RangeInclusive<i64> {
    let (xl, xr) = (xl as f64, xr as f64);
    let len = (xr - xl).floor();
    if !(len >= 0.0) {
        #[allow(clippy::reversed_empty_ranges)]
        return 1..=0;
    }
    let first = (-xl).ceil().max(0.0) as i64;
    let last = ((width as f64 - xl).ceil() as i64 - 1).min(len as i64);
    first..=last
}

/// Screen column of span step `k`
#[inline]
fn column(xl: f32, k: i64) -> i32 {
    (xl as f64 + k as f64).floor() as i32
}

fn depth_attrs(v: &Vertex) -> Attrs {
    Attrs {
        x: v.position.x,
        inv_z: 1.0 / v.position.z,
        u: 0.0,
        v: 0.0,
    }
}

/// Solid fill with the triangle color
pub fn flat_fill(tri: &FlatTriangle, color: u8, buffer: &mut DrawBuffer) {
    let depth_test = buffer.options.depth_test();
    let width = buffer.width;

    walk(tri, buffer.height, depth_attrs, |y, left, right| {
        let steps = span_steps(left.x, right.x, width);
        if steps.is_empty() {
            return;
        }

        if depth_test {
            let len = right.x - left.x;
            let (k0, k1) = (*steps.start(), *steps.end());
            let t0 = if len > 0.0 { k0 as f32 / len } else { 0.0 };
            let t1 = if len > 0.0 { k1 as f32 / len } else { 0.0 };
            let iz0 = lerp(left.inv_z, right.inv_z, t0);
            let iz1 = lerp(left.inv_z, right.inv_z, t1);
            let x0 = column(left.x, k0);
            let x1 = column(left.x, k1);
            buffer.draw_line(x0, y, 1.0 / iz0, x1, y, 1.0 / iz1, color);
        } else {
            for k in steps {
                buffer.draw_pixel(column(left.x, k), y, color);
            }
        }
    });
}

/// Write a sampled texel, honoring the color key and the depth test
#[inline]
fn put_texel(buffer: &mut DrawBuffer, x: i32, y: i32, inv_z: f32, texel: u8, depth_test: bool) {
    if buffer.options.color_key == Some(texel) {
        return;
    }
    if depth_test {
        buffer.draw_pixel_with_depth(x, y, inv_z, texel);
    } else {
        buffer.draw_pixel(x, y, texel);
    }
}

/// Texture map with u,v linear in screen space
pub fn affine_texture_map(tri: &FlatTriangle, texture: &Bitmap, buffer: &mut DrawBuffer) {
    let depth_test = buffer.options.depth_test();
    let width = buffer.width;
    let tex_w = (texture.width - 1) as f32;
    let tex_h = (texture.height - 1) as f32;

    let attrs = |v: &Vertex| Attrs {
        x: v.position.x,
        inv_z: 1.0 / v.position.z,
        u: v.uv.u * tex_w,
        v: v.uv.v * tex_h,
    };

    // u,v gradients are constant over a triangle
    let height = tri.height();
    let (apex, l, r) = (attrs(&tri.apex), attrs(&tri.left), attrs(&tri.right));
    let d_left = Attrs::slope(apex, l, height);
    let d_right = Attrs::slope(apex, r, height);
    let dx = d_right.x - d_left.x;
    let (du, dv) = if dx != 0.0 {
        ((d_right.u - d_left.u) / dx, (d_right.v - d_left.v) / dx)
    } else {
        (0.0, 0.0)
    };

    walk(tri, buffer.height, attrs, |y, left, right| {
        let len = right.x - left.x;
        for k in span_steps(left.x, right.x, width) {
            let kf = k as f32;
            let texel = texture.texel((left.u + du * kf) as i32, (left.v + dv * kf) as i32);
            let inv_z = if depth_test && len > 0.0 {
                lerp(left.inv_z, right.inv_z, kf / len)
            } else {
                left.inv_z
            };
            put_texel(buffer, column(left.x, k), y, inv_z, texel, depth_test);
        }
    });
}

/// Texture map with u/z, v/z and 1/z interpolated, dividing per pixel
pub fn perspective_texture_map(tri: &FlatTriangle, texture: &Bitmap, buffer: &mut DrawBuffer) {
    let depth_test = buffer.options.depth_test();
    let width = buffer.width;
    let tex_w = (texture.width - 1) as f32;
    let tex_h = (texture.height - 1) as f32;

    let attrs = |v: &Vertex| {
        let inv_z = 1.0 / v.position.z;
        Attrs {
            x: v.position.x,
            inv_z,
            u: v.uv.u * tex_w * inv_z,
            v: v.uv.v * tex_h * inv_z,
        }
    };

    walk(tri, buffer.height, attrs, |y, left, right| {
        let len = right.x - left.x;
        let inv_len = if len > 0.0 { 1.0 / len } else { 0.0 };
        for k in span_steps(left.x, right.x, width) {
            let kf = k as f32;
            let t = kf * inv_len;
            let inv_z = lerp(left.inv_z, right.inv_z, t);
            let z = 1.0 / inv_z;
            let u = z * lerp(left.u, right.u, t);
            let v = z * lerp(left.v, right.v, t);
            let texel = texture.texel(u as i32, v as i32);
            put_texel(buffer, column(left.x, k), y, inv_z, texel, depth_test);
        }
    });
}

/// Outline of the piece
pub fn wireframe(tri: &FlatTriangle, color: u8, buffer: &mut DrawBuffer) {
    let (a, r, l) = (&tri.apex.position, &tri.right.position, &tri.left.position);
    buffer.draw_line_vec(a, r, color);
    buffer.draw_line_vec(r, l, color);
    buffer.draw_line_vec(l, a, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{DepthFunc, Planes};

    fn vtx(x: f32, y: f32) -> Vertex {
        Vertex::from_pos(x, y, 1.0)
    }

    fn buffer() -> DrawBuffer {
        DrawBuffer::new(32, 32, Planes::COLOR | Planes::DEPTH).unwrap()
    }

    fn filled_rows(buf: &DrawBuffer, color: u8) -> Vec<i32> {
        (0..buf.height as i32)
            .filter(|&y| (0..buf.width as i32).any(|x| buf.pixel(x, y) == Some(color)))
            .collect()
    }

    #[test]
    fn test_flat_bottom_rows_are_half_open() {
        let tri = FlatTriangle::new(
            TriangleKind::FlatBottom,
            vtx(10.0, 2.5),
            vtx(20.0, 12.2),
            vtx(2.0, 12.2),
        );
        assert_eq!(tri.rows(), 3..13);
        let mut buf = buffer();
        flat_fill(&tri, 4, &mut buf);
        assert_eq!(filled_rows(&buf, 4), (3..13).collect::<Vec<_>>());
    }

    #[test]
    fn test_flat_top_rows_are_half_open() {
        let tri = FlatTriangle::new(
            TriangleKind::FlatTop,
            vtx(10.0, 20.0),
            vtx(20.0, 8.5),
            vtx(2.0, 8.5),
        );
        assert_eq!(tri.rows(), 9..20);
        let mut buf = buffer();
        flat_fill(&tri, 4, &mut buf);
        assert_eq!(filled_rows(&buf, 4), (9..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_sub_scanline_piece_is_skipped() {
        let tri = FlatTriangle::new(
            TriangleKind::FlatBottom,
            vtx(10.0, 3.2),
            vtx(20.0, 4.1),
            vtx(2.0, 4.1),
        );
        let mut buf = buffer();
        flat_fill(&tri, 4, &mut buf);
        assert!(filled_rows(&buf, 4).is_empty());
    }

    #[test]
    fn test_span_is_inclusive_and_clipped() {
        assert_eq!(span_steps(2.0, 5.0, 32), 0..=3);
        assert_eq!(span_steps(2.5, 2.5, 32), 0..=0);
        assert!(span_steps(3.0, 2.0, 32).is_empty());
        // starts offscreen left
        assert_eq!(span_steps(-3.5, 4.0, 32), 4..=7);
        // runs off the right edge
        assert_eq!(span_steps(29.0, 40.0, 32), 0..=2);
        // huge spans stay bounded by the buffer
        let s = span_steps(-1.0e9, 1.0e9, 32);
        assert!(s.end() - s.start() < 40);
    }

    #[test]
    fn test_offscreen_piece_writes_nothing() {
        let tri = FlatTriangle::new(
            TriangleKind::FlatBottom,
            vtx(-50.0, -40.0),
            vtx(-10.0, -5.0),
            vtx(-90.0, -5.0),
        );
        let mut buf = buffer();
        flat_fill(&tri, 4, &mut buf);
        assert!(filled_rows(&buf, 4).is_empty());
    }

    #[test]
    fn test_walk_stays_inside_buffer_rows() {
        // an apex a billion rows above the buffer, as a vertex near w = 0 gives
        let tall = FlatTriangle::new(
            TriangleKind::FlatBottom,
            vtx(16.0, -1.0e9),
            vtx(30.0, 20.0),
            vtx(2.0, 20.0),
        );
        assert_eq!(tall.visible_rows(32), 0..20);

        let mut walked = Vec::new();
        walk(&tall, 32, depth_attrs, |y, _, _| walked.push(y));
        assert_eq!(walked, (0..20).collect::<Vec<_>>());

        // the same, walking up from an apex far below
        let deep = FlatTriangle::new(
            TriangleKind::FlatTop,
            vtx(16.0, 1.0e9),
            vtx(30.0, 10.0),
            vtx(2.0, 10.0),
        );
        assert_eq!(deep.visible_rows(32), 10..32);
        walked.clear();
        walk(&deep, 32, depth_attrs, |y, _, _| walked.push(y));
        assert_eq!(walked, (10..32).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_walk_presteps_past_skipped_rows() {
        // apex 20 rows above the buffer, base 20 rows below it
        let tri = FlatTriangle::new(
            TriangleKind::FlatBottom,
            vtx(0.0, -20.0),
            vtx(30.0, 40.0),
            vtx(0.0, 40.0),
        );
        walk(&tri, 32, depth_attrs, |y, left, right| {
            let expected = (y as f32 + 20.0) * 0.5;
            assert!((left.x - 0.0).abs() < 1e-3, "row {}", y);
            assert!((right.x - expected).abs() < 1e-3, "row {}: {} vs {}", y, right.x, expected);
        });

        let tri = FlatTriangle::new(
            TriangleKind::FlatTop,
            vtx(0.0, 52.0),
            vtx(30.0, -8.0),
            vtx(0.0, -8.0),
        );
        walk(&tri, 32, depth_attrs, |y, _, right| {
            let expected = (52.0 - y as f32) * 0.5;
            assert!((right.x - expected).abs() < 1e-3, "row {}: {} vs {}", y, right.x, expected);
        });
    }

    #[test]
    fn test_flat_fill_with_depth_keeps_nearer() {
        let near = |x: f32, y: f32| Vertex::from_pos(x, y, 0.25);
        let far = |x: f32, y: f32| Vertex::from_pos(x, y, 0.5);
        let shape = |f: &dyn Fn(f32, f32) -> Vertex| {
            FlatTriangle::new(TriangleKind::FlatBottom, f(16.0, 2.0), f(30.0, 30.0), f(2.0, 30.0))
        };

        let mut buf = buffer();
        buf.options.depth_func = DepthFunc::Less;
        flat_fill(&shape(&near), 1, &mut buf);
        flat_fill(&shape(&far), 2, &mut buf);
        assert_eq!(buf.pixel(16, 20), Some(1));
        assert!((buf.depth_at(16, 20).unwrap() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_color_key_is_never_written() {
        let mut tex = Bitmap::new(4, 4).unwrap();
        for (i, p) in tex.data.iter_mut().enumerate() {
            *p = if i % 2 == 0 { 5 } else { 9 };
        }
        let tri = FlatTriangle::new(
            TriangleKind::FlatBottom,
            Vertex::with_uv(16.0, 1.0, 1.0, 0.5, 0.0),
            Vertex::with_uv(31.0, 30.0, 1.0, 1.0, 1.0),
            Vertex::with_uv(1.0, 30.0, 1.0, 0.0, 1.0),
        );

        for mapper in [affine_texture_map, perspective_texture_map] {
            let mut buf = buffer();
            buf.options.color_key = Some(5);
            mapper(&tri, &tex, &mut buf);
            let color = buf.color().unwrap();
            assert!(!color.contains(&5));
            assert!(color.contains(&9));
        }
    }

    #[test]
    fn test_wireframe_draws_outline_only() {
        let tri = FlatTriangle::new(
            TriangleKind::FlatBottom,
            vtx(16.0, 2.0),
            vtx(30.0, 30.0),
            vtx(2.0, 30.0),
        );
        let mut buf = buffer();
        wireframe(&tri, 3, &mut buf);
        assert_eq!(buf.pixel(16, 2), Some(3));
        assert_eq!(buf.pixel(10, 30), Some(3));
        assert_eq!(buf.pixel(16, 20), Some(0));
    }
}
