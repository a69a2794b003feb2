//! Triangle pipeline
//!
//! Transform → coarse rejection → culling → perspective divide → sort →
//! split into flat pieces → fill. Bad geometry is skipped, never reported.

use super::fillers::{self, FlatTriangle, TriangleKind};
use super::math::{lerp, Mat4, Vec4};
use super::render::DrawBuffer;
use super::types::{CullMode, DepthFunc, DrawMode, DrawOptions, Triangle, Vertex};

/// True when all three clip-space vertices are outside the same side of the
/// view volume. z is tested against [0, w].
fn offscreen(v: &[Vertex; 3]) -> bool {
    let p = [v[0].position, v[1].position, v[2].position];
    let all = |f: &dyn Fn(usize) -> bool| (0..3).all(f);

    all(&|i| p[i].x < -p[i].w)
        || all(&|i| p[i].x > p[i].w)
        || all(&|i| p[i].y < -p[i].w)
        || all(&|i| p[i].y > p[i].w)
        || all(&|i| p[i].z < 0.0)
        || all(&|i| p[i].z > p[i].w)
}

/// Facing test on clip-space positions: the edge cross product dotted with
/// the first vertex
fn culled(v: &[Vertex; 3], mode: CullMode) -> bool {
    let d1 = v[1].position - v[0].position;
    let d2 = v[2].position - v[0].position;
    let dp = v[0].position.dot(d1.cross(d2));

    match mode {
        CullMode::Back => dp >= 0.0,
        CullMode::Front => dp < 0.0,
        CullMode::None => false,
    }
}

fn degenerate(a: &Vertex, b: &Vertex, c: &Vertex) -> bool {
    let (a, b, c) = (&a.position, &b.position, &c.position);
    (a.x == b.x && a.x == c.x) || (a.y == b.y && a.y == c.y)
}

/// Interpolate depth and uv of the split vertex `r` of the way from `v0` to `v1`
fn split_attributes(v0: &Vertex, v1: &Vertex, r: f32, perspective: bool) -> (f32, f32, f32) {
    let (z0, z1) = (v0.position.z, v1.position.z);
    if perspective {
        let (iz0, iz1) = (1.0 / z0, 1.0 / z1);
        let z = 1.0 / lerp(iz0, iz1, r);
        let u = z * lerp(v0.uv.u * iz0, v1.uv.u * iz1, r);
        let v = z * lerp(v0.uv.v * iz0, v1.uv.v * iz1, r);
        (z, u, v)
    } else {
        (lerp(z0, z1, r), lerp(v0.uv.u, v1.uv.u, r), lerp(v0.uv.v, v1.uv.v, r))
    }
}

/// Sort screen-space vertices and break the triangle into flat pieces.
/// Returns nothing for degenerate triangles.
pub fn split(vertices: [Vertex; 3], options: &DrawOptions) -> Vec<FlatTriangle> {
    let [mut v0, mut v1, mut v2] = vertices;

    // v0 top, v1 bottom, v2 middle
    if v2.position.y > v1.position.y {
        std::mem::swap(&mut v1, &mut v2);
    }
    if v0.position.y > v1.position.y {
        std::mem::swap(&mut v0, &mut v1);
    }
    if v0.position.y > v2.position.y {
        std::mem::swap(&mut v0, &mut v2);
    }

    if degenerate(&v0, &v1, &v2) {
        return Vec::new();
    }

    let right_left = |a: Vertex, b: Vertex| if a.position.x >= b.position.x { (a, b) } else { (b, a) };

    if v1.position.y == v2.position.y {
        let (r, l) = right_left(v1, v2);
        return vec![FlatTriangle::new(TriangleKind::FlatBottom, v0, r, l)];
    }
    if v0.position.y == v2.position.y {
        let (r, l) = right_left(v0, v2);
        return vec![FlatTriangle::new(TriangleKind::FlatTop, v1, r, l)];
    }

    // new vertex on the long edge at the height of the middle one
    let ratio = (v2.position.y - v0.position.y) / (v1.position.y - v0.position.y);
    let mut v3 = v0;
    v3.position.x = v0.position.x + ratio * (v1.position.x - v0.position.x);
    v3.position.y = v2.position.y;

    let perspective = options.draw_mode == DrawMode::Perspective || options.depth_test();
    let (z, u, v) = split_attributes(&v0, &v1, ratio, perspective);
    v3.position.z = z;
    v3.uv.u = u;
    v3.uv.v = v;

    if v3.position.x < v2.position.x {
        std::mem::swap(&mut v3, &mut v2);
    }

    let mut pieces = Vec::with_capacity(2);
    if !degenerate(&v0, &v3, &v2) {
        pieces.push(FlatTriangle::new(TriangleKind::FlatBottom, v0, v3, v2));
    }
    if !degenerate(&v1, &v3, &v2) {
        pieces.push(FlatTriangle::new(TriangleKind::FlatTop, v1, v3, v2));
    }
    pieces
}

/// Perspective divide of a clip-space position onto a `width` x `height`
/// target. z and w are left as they are.
pub fn project(p: Vec4, width: usize, height: usize) -> Vec4 {
    Vec4 {
        x: p.x * width as f32 / (2.0 * p.w) + (width / 2) as f32,
        y: p.y * height as f32 / (2.0 * p.w) + (height / 2) as f32,
        ..p
    }
}

/// Rasterize one triangle through `mvp` into `buffer`
pub fn draw_triangle(triangle: &Triangle, mvp: &Mat4, buffer: &mut DrawBuffer) {
    let options = buffer.options;
    if options.depth_func == DepthFunc::Never {
        return;
    }

    let mut v = triangle.vertices;
    for vertex in v.iter_mut() {
        vertex.position = mvp.transform(vertex.position);
    }

    if offscreen(&v) {
        return;
    }
    if options.cull_mode != CullMode::None && culled(&v, options.cull_mode) {
        return;
    }

    for vertex in v.iter_mut() {
        vertex.position = project(vertex.position, buffer.width, buffer.height);
    }

    let finite = v
        .iter()
        .all(|p| p.position.x.is_finite() && p.position.y.is_finite() && p.position.z.is_finite());
    if !finite {
        log::trace!("skipping triangle with non-finite screen position");
        return;
    }

    for piece in split(v, &options) {
        draw_piece(&piece, triangle, buffer);
    }
}

fn draw_piece(piece: &FlatTriangle, triangle: &Triangle, buffer: &mut DrawBuffer) {
    match (buffer.options.draw_mode, triangle.texture) {
        (DrawMode::Wireframe, _) => fillers::wireframe(piece, triangle.color, buffer),
        (DrawMode::Flat, _) | (_, None) => fillers::flat_fill(piece, triangle.color, buffer),
        (DrawMode::Affine, Some(tex)) => fillers::affine_texture_map(piece, tex, buffer),
        (DrawMode::Perspective, Some(tex)) => fillers::perspective_texture_map(piece, tex, buffer),
    }
}

/// Rasterize a triangle list sharing one matrix
pub fn draw_triangles(triangles: &[Triangle], mvp: &Mat4, buffer: &mut DrawBuffer) {
    for t in triangles {
        draw_triangle(t, mvp, buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Planes;

    fn screen(x: f32, y: f32) -> Vertex {
        Vertex::from_pos(x, y, 0.5)
    }

    #[test]
    fn test_sort_puts_top_vertex_at_apex() {
        let pieces = split([screen(5.0, 20.0), screen(10.0, 2.0), screen(18.0, 20.0)], &DrawOptions::default());
        assert_eq!(pieces.len(), 1);
        let p = &pieces[0];
        assert_eq!(p.kind, TriangleKind::FlatBottom);
        assert_eq!(p.apex.position.y, 2.0);
        assert_eq!(p.right.position.x, 18.0);
        assert_eq!(p.left.position.x, 5.0);
    }

    #[test]
    fn test_flat_top_uses_bottom_vertex_as_apex() {
        let pieces = split([screen(20.0, 3.0), screen(12.0, 25.0), screen(4.0, 3.0)], &DrawOptions::default());
        assert_eq!(pieces.len(), 1);
        let p = &pieces[0];
        assert_eq!(p.kind, TriangleKind::FlatTop);
        assert_eq!(p.apex.position.y, 25.0);
        assert!(p.right.position.x > p.left.position.x);
    }

    #[test]
    fn test_degenerate_triangles_have_no_pieces() {
        let o = DrawOptions::default();
        assert!(split([screen(4.0, 1.0), screen(4.0, 9.0), screen(4.0, 30.0)], &o).is_empty());
        assert!(split([screen(1.0, 7.0), screen(9.0, 7.0), screen(30.0, 7.0)], &o).is_empty());
    }

    #[test]
    fn test_general_split_rows_do_not_overlap() {
        let pieces = split([screen(3.0, 1.3), screen(28.0, 12.6), screen(10.0, 30.2)], &DrawOptions::default());
        assert_eq!(pieces.len(), 2);
        let top = pieces[0].rows();
        let bottom = pieces[1].rows();
        assert_eq!(pieces[0].kind, TriangleKind::FlatBottom);
        assert_eq!(pieces[1].kind, TriangleKind::FlatTop);
        assert_eq!(top.end, bottom.start);
        assert_eq!(top.start, 2);
        assert_eq!(bottom.end, 31);
    }

    #[test]
    fn test_split_vertex_interpolates_reciprocal_depth() {
        let a = Vertex::with_uv(0.0, 0.0, 1.0, 0.0, 0.0);
        let b = Vertex::with_uv(0.0, 10.0, 3.0, 1.0, 0.0);
        let (z, u, _) = split_attributes(&a, &b, 0.5, true);
        // 1/z halfway between 1 and 1/3
        assert!((z - 1.5).abs() < 1e-5);
        // u/z: lerp(0, 1/3, .5) = 1/6, times z
        assert!((u - 0.25).abs() < 1e-5);
        let (z, u, _) = split_attributes(&a, &b, 0.5, false);
        assert!((z - 2.0).abs() < 1e-5 && (u - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_coarse_rejection() {
        let v = |x: f32, y: f32, z: f32| Vertex::new(Vec4::new(x, y, z, 1.0), Default::default());
        assert!(offscreen(&[v(-2.0, 0.0, 0.5), v(-1.5, 0.3, 0.5), v(-3.0, 0.1, 0.5)]));
        assert!(offscreen(&[v(0.0, 0.0, -0.1), v(0.1, 0.3, -0.5), v(0.2, 0.1, -1.0)]));
        assert!(offscreen(&[v(0.0, 0.0, 1.1), v(0.1, 0.3, 1.5), v(0.2, 0.1, 2.0)]));
        // straddling the left edge still passes
        assert!(!offscreen(&[v(-2.0, 0.0, 0.5), v(0.5, 0.3, 0.5), v(-3.0, 0.1, 0.5)]));
    }

    #[test]
    fn test_culling_discards_one_winding() {
        let mut buf = DrawBuffer::new(64, 64, Planes::COLOR).unwrap();
        buf.options.draw_mode = DrawMode::Flat;
        let a = Vertex::from_pos(-0.5, -0.5, 0.5);
        let b = Vertex::from_pos(0.5, -0.5, 0.5);
        let c = Vertex::from_pos(0.0, 0.5, 0.5);
        let ccw = Triangle::new([a, b, c], 3);
        let cw = Triangle::new([a, c, b], 3);

        buf.options.cull_mode = CullMode::Back;
        draw_triangle(&ccw, &Mat4::IDENTITY, &mut buf);
        let back_ccw = buf.color().unwrap().contains(&3);
        buf.clear_color(0);
        draw_triangle(&cw, &Mat4::IDENTITY, &mut buf);
        let back_cw = buf.color().unwrap().contains(&3);
        assert_ne!(back_ccw, back_cw);

        buf.clear_color(0);
        buf.options.cull_mode = CullMode::Front;
        draw_triangle(&ccw, &Mat4::IDENTITY, &mut buf);
        assert_eq!(buf.color().unwrap().contains(&3), back_cw);
    }

    #[test]
    fn test_never_draws_nothing() {
        let mut buf = DrawBuffer::new(64, 64, Planes::COLOR | Planes::DEPTH).unwrap();
        buf.options.depth_func = DepthFunc::Never;
        let t = Triangle::new(
            [
                Vertex::from_pos(-0.5, -0.5, 0.5),
                Vertex::from_pos(0.5, -0.5, 0.5),
                Vertex::from_pos(0.0, 0.5, 0.5),
            ],
            3,
        );
        draw_triangle(&t, &Mat4::IDENTITY, &mut buf);
        assert!(!buf.color().unwrap().contains(&3));
    }

    #[test]
    fn test_project_centers_origin() {
        let p = project(Vec4::new(0.5, -0.5, 0.3, 1.0), 320, 200);
        assert_eq!((p.x, p.y, p.z), (240.0, 50.0, 0.3));
    }

    #[test]
    fn test_zero_w_is_skipped() {
        let mut buf = DrawBuffer::new(64, 64, Planes::COLOR).unwrap();
        let p = |x: f32, y: f32| Vertex::new(Vec4::new(x, y, 0.0, 0.0), Default::default());
        let t = Triangle::new([p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)], 3);
        draw_triangle(&t, &Mat4::IDENTITY, &mut buf);
        assert!(!buf.color().unwrap().contains(&3));
    }
}
