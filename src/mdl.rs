//! Quake MDL (version 6) models
//!
//! Everything is little-endian. Vertices are stored per frame as 3 bytes plus
//! a normal index and decompressed with `scale * v + translate`. Skins become
//! square bitmaps so they can be sampled with the combined-index texel lookup.

use std::path::Path;

use crate::bitmap::{Bitmap, Palette};
use crate::error::{try_alloc, Error, Result};
use crate::rasterizer::{draw_triangle, lerp, DrawBuffer, Mat4, TexCoord, Triangle, Vec4, Vertex};

/// "IDPO"
pub const MDL_IDENT: i32 = 1330660425;
pub const MDL_VERSION: i32 = 6;
const HEADER_SIZE: usize = 84;

/// Palette index for untextured model triangles
pub const MODEL_COLOR: u8 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub scale: [f32; 3],
    pub translate: [f32; 3],
    pub bounding_radius: f32,
    pub eye_position: [f32; 3],
    pub num_skins: usize,
    pub skin_width: usize,
    pub skin_height: usize,
    pub num_verts: usize,
    pub num_tris: usize,
    pub num_frames: usize,
    pub sync_type: i32,
    pub flags: i32,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinVertex {
    pub on_seam: bool,
    pub s: i32,
    pub t: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelTriangle {
    pub faces_front: bool,
    pub vertex: [usize; 3],
}

/// Compressed vertex: position bytes and a normal index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedVertex {
    pub v: [u8; 3],
    pub normal_index: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    pub bbox_min: PackedVertex,
    pub bbox_max: PackedVertex,
    pub verts: Vec<PackedVertex>,
}

/// A loaded model
#[derive(Debug, Clone)]
pub struct Model {
    pub header: Header,
    pub skins: Vec<Bitmap>,
    pub texcoords: Vec<SkinVertex>,
    pub triangles: Vec<ModelTriangle>,
    pub frames: Vec<Frame>,
    /// Skin used when rendering
    pub skin: usize,
}

/// Little-endian cursor over the file contents
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, section: &'static str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::truncated(section))?;
        let s = self.bytes.get(self.pos..end).ok_or(Error::truncated(section))?;
        self.pos = end;
        Ok(s)
    }

    fn i32(&mut self, section: &'static str) -> Result<i32> {
        let b = self.take(4, section)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self, section: &'static str) -> Result<f32> {
        let b = self.take(4, section)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn vec3(&mut self, section: &'static str) -> Result<[f32; 3]> {
        Ok([self.f32(section)?, self.f32(section)?, self.f32(section)?])
    }

    fn count(&mut self, what: &'static str) -> Result<usize> {
        let n = self.i32("header")?;
        usize::try_from(n).map_err(|_| Error::unsupported_model(format!("negative {} ({})", what, n)))
    }

    fn packed(&mut self, section: &'static str) -> Result<PackedVertex> {
        let b = self.take(4, section)?;
        Ok(PackedVertex {
            v: [b[0], b[1], b[2]],
            normal_index: b[3],
        })
    }
}

impl Header {
    fn read(r: &mut Reader) -> Result<Self> {
        if r.bytes.len() < HEADER_SIZE {
            return Err(Error::truncated("header"));
        }
        let ident = r.i32("header")?;
        let version = r.i32("header")?;
        if ident != MDL_IDENT || version != MDL_VERSION {
            return Err(Error::BadModelHeader { ident, version });
        }

        Ok(Self {
            scale: r.vec3("header")?,
            translate: r.vec3("header")?,
            bounding_radius: r.f32("header")?,
            eye_position: r.vec3("header")?,
            num_skins: r.count("skin count")?,
            skin_width: r.count("skin width")?,
            skin_height: r.count("skin height")?,
            num_verts: r.count("vertex count")?,
            num_tris: r.count("triangle count")?,
            num_frames: r.count("frame count")?,
            sync_type: r.i32("header")?,
            flags: r.i32("header")?,
            size: r.f32("header")?,
        })
    }

    /// Decompress a packed vertex into a model-space point
    pub fn unpack(&self, v: &PackedVertex) -> Vec4 {
        Vec4::point(
            self.scale[0] * v.v[0] as f32 + self.translate[0],
            self.scale[1] * v.v[1] as f32 + self.translate[1],
            self.scale[2] * v.v[2] as f32 + self.translate[2],
        )
    }

    /// Decompress the blend of two packed vertices
    pub fn unpack_lerp(&self, a: &PackedVertex, b: &PackedVertex, r: f32) -> Vec4 {
        let c = |i: usize| self.scale[i] * lerp(a.v[i] as f32, b.v[i] as f32, r) + self.translate[i];
        Vec4::point(c(0), c(1), c(2))
    }
}

impl Model {
    /// Load a model file, using `palette` for its skins
    pub fn load<P: AsRef<Path>>(path: P, palette: &Palette) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let model = Self::from_bytes(&bytes, palette)?;
        log::info!(
            "loaded model {} ({} tris, {} verts, {} frames, {} skins)",
            path.display(),
            model.header.num_tris,
            model.header.num_verts,
            model.header.num_frames,
            model.header.num_skins
        );
        Ok(model)
    }

    pub fn from_bytes(bytes: &[u8], palette: &Palette) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let header = Header::read(&mut r)?;

        let skin_len = header
            .skin_width
            .checked_mul(header.skin_height)
            .filter(|&n| n > 0 || header.num_skins == 0)
            .ok_or(Error::InvalidDimensions {
                width: header.skin_width,
                height: header.skin_height,
            })?;
        let side = header.skin_width.max(header.skin_height);

        let mut skins = Vec::new();
        for i in 0..header.num_skins {
            let group = r.i32("skin")?;
            if group != 0 {
                return Err(Error::unsupported_model(format!("skin {} is a skin group", i)));
            }
            let bytes = r.take(skin_len, "skin")?;
            let mut data = try_alloc::<u8>("model skin", skin_len)?;
            data.copy_from_slice(bytes);
            let skin = Bitmap::from_data(header.skin_width, header.skin_height, data, palette.clone())?;
            // the texel lookup only tiles correctly on square textures
            skins.push(skin.resize(side, side)?);
        }

        let mut texcoords = Vec::new();
        for _ in 0..header.num_verts {
            texcoords.push(SkinVertex {
                on_seam: r.i32("texcoord")? != 0,
                s: r.i32("texcoord")?,
                t: r.i32("texcoord")?,
            });
        }

        let mut triangles = Vec::new();
        for i in 0..header.num_tris {
            let faces_front = r.i32("triangle")? != 0;
            let mut vertex = [0usize; 3];
            for v in vertex.iter_mut() {
                let idx = r.i32("triangle")?;
                *v = usize::try_from(idx)
                    .ok()
                    .filter(|&n| n < header.num_verts)
                    .ok_or_else(|| Error::unsupported_model(format!("triangle {} uses vertex {}", i, idx)))?;
            }
            triangles.push(ModelTriangle { faces_front, vertex });
        }

        let mut frames = Vec::new();
        for i in 0..header.num_frames {
            let kind = r.i32("frame")?;
            if kind != 0 {
                return Err(Error::unsupported_model(format!("frame {} is a frame group", i)));
            }
            let bbox_min = r.packed("frame")?;
            let bbox_max = r.packed("frame")?;
            let name_bytes = r.take(16, "frame")?;
            let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(16);
            let name = String::from_utf8_lossy(&name_bytes[..end]).into_owned();

            let mut verts = Vec::new();
            for _ in 0..header.num_verts {
                verts.push(r.packed("frame vertex")?);
            }
            frames.push(Frame {
                name,
                bbox_min,
                bbox_max,
                verts,
            });
        }

        Ok(Self {
            header,
            skins,
            texcoords,
            triangles,
            frames,
            skin: 0,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Texture coordinates of one triangle corner, with back-facing seam
    /// vertices shifted onto the back half of the skin
    fn uv(&self, tri: &ModelTriangle, corner: usize) -> TexCoord {
        let tc = &self.texcoords[tri.vertex[corner]];
        let mut s = tc.s as f32;
        if !tri.faces_front && tc.on_seam {
            s += self.header.skin_width as f32 * 0.5;
        }
        TexCoord::new(
            (s + 0.5) / self.header.skin_width as f32,
            (tc.t as f32 + 0.5) / self.header.skin_height as f32,
        )
    }

    fn build<F>(&self, position: F) -> Vec<Triangle<'_>>
    where
        F: Fn(usize) -> Vec4,
    {
        let texture = self.skins.get(self.skin);
        self.triangles
            .iter()
            .map(|tri| {
                let mut vertices = [Vertex::default(); 3];
                for (j, v) in vertices.iter_mut().enumerate() {
                    *v = Vertex::new(position(tri.vertex[j]), self.uv(tri, j));
                }
                Triangle {
                    vertices,
                    color: MODEL_COLOR,
                    texture,
                }
            })
            .collect()
    }

    /// Triangles of frame `n`, None if the frame does not exist
    pub fn frame_triangles(&self, n: usize) -> Option<Vec<Triangle<'_>>> {
        let frame = self.frames.get(n)?;
        Some(self.build(|i| self.header.unpack(&frame.verts[i])))
    }

    /// Triangles blended between frames `n` and `n + 1`
    pub fn frame_triangles_lerp(&self, n: usize, r: f32) -> Option<Vec<Triangle<'_>>> {
        let a = self.frames.get(n)?;
        let b = self.frames.get(n.checked_add(1)?)?;
        Some(self.build(|i| self.header.unpack_lerp(&a.verts[i], &b.verts[i], r)))
    }

    /// Draw frame `n`; out-of-range frames draw nothing
    pub fn render_frame(&self, n: usize, mvp: &Mat4, target: &mut DrawBuffer) {
        match self.frame_triangles(n) {
            Some(tris) => tris.iter().for_each(|t| draw_triangle(t, mvp, target)),
            None => log::trace!("frame {} out of range ({} frames)", n, self.frames.len()),
        }
    }

    /// Draw frames `n` and `n + 1` blended by `r`; needs both frames to exist
    pub fn render_frame_lerp(&self, n: usize, r: f32, mvp: &Mat4, target: &mut DrawBuffer) {
        match self.frame_triangles_lerp(n, r) {
            Some(tris) => tris.iter().for_each(|t| draw_triangle(t, mvp, target)),
            None => log::trace!("frame pair {}/{} out of range ({} frames)", n, n + 1, self.frames.len()),
        }
    }
}

/// Advance an animation running over frames `start..end`. Resets `frame` to
/// `start` when it is outside the range; once the blend factor `r` reaches 1
/// it moves to the next frame and wraps back to `start` at `end`.
pub fn animate(start: usize, end: usize, frame: &mut usize, r: &mut f32) {
    if *frame < start || *frame > end {
        *frame = start;
    }

    if *r >= 1.0 {
        *r = 0.0;
        *frame += 1;
        if *frame >= end {
            *frame = start;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rasterizer::{DrawMode, Planes};

    fn put_i32(out: &mut Vec<u8>, v: i32) {
        out.extend_from_slice(&v.to_le_bytes());
    }

    fn put_f32(out: &mut Vec<u8>, v: f32) {
        out.extend_from_slice(&v.to_le_bytes());
    }

    /// One triangle, a 4x2 skin and `frames` frames whose x coordinates grow
    /// by 10 per frame
    pub(crate) fn model_bytes(frames: usize) -> Vec<u8> {
        let mut out = Vec::new();
        put_i32(&mut out, MDL_IDENT);
        put_i32(&mut out, MDL_VERSION);
        for v in [0.5, 0.5, 0.5] {
            put_f32(&mut out, v);
        }
        for v in [-10.0, -10.0, 0.0] {
            put_f32(&mut out, v);
        }
        put_f32(&mut out, 20.0);
        for v in [0.0, 0.0, 0.0] {
            put_f32(&mut out, v);
        }
        for v in [1, 4, 2, 3, 1, frames as i32, 0, 0] {
            put_i32(&mut out, v);
        }
        put_f32(&mut out, 1.0);
        assert_eq!(out.len(), HEADER_SIZE);

        // skin
        put_i32(&mut out, 0);
        out.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        // texcoords: vertex 1 is on the seam
        for (seam, s, t) in [(0, 0, 0), (1, 1, 0), (0, 0, 1)] {
            put_i32(&mut out, seam);
            put_i32(&mut out, s);
            put_i32(&mut out, t);
        }

        // back-facing triangle
        for v in [0, 0, 1, 2] {
            put_i32(&mut out, v);
        }

        for f in 0..frames {
            put_i32(&mut out, 0);
            out.extend_from_slice(&[0, 0, 0, 0, 255, 255, 255, 0]);
            let mut name = [0u8; 16];
            let label = format!("frame{}", f);
            name[..label.len()].copy_from_slice(label.as_bytes());
            out.extend_from_slice(&name);
            let dx = (f * 10) as u8;
            out.extend_from_slice(&[dx, 0, 0, 0]);
            out.extend_from_slice(&[dx + 40, 0, 0, 0]);
            out.extend_from_slice(&[dx, 40, 0, 0]);
        }
        out
    }

    #[test]
    fn test_parse_model() {
        let model = Model::from_bytes(&model_bytes(3), &Palette::default()).unwrap();
        assert_eq!(model.header.num_verts, 3);
        assert_eq!(model.num_frames(), 3);
        assert_eq!(model.frames[2].name, "frame2");
        assert!(!model.triangles[0].faces_front);
        assert!(model.texcoords[1].on_seam);
        // 4x2 skin resized to 4x4
        assert_eq!((model.skins[0].width, model.skins[0].height), (4, 4));
        assert_eq!(&model.skins[0].data[..8], &[1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_bad_ident() {
        let mut bytes = model_bytes(1);
        bytes[0] = 0;
        assert!(matches!(
            Model::from_bytes(&bytes, &Palette::default()),
            Err(Error::BadModelHeader { version: 6, .. })
        ));
    }

    #[test]
    fn test_truncated_frames() {
        let mut bytes = model_bytes(2);
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            Model::from_bytes(&bytes, &Palette::default()),
            Err(Error::Truncated("frame vertex"))
        ));
    }

    #[test]
    fn test_oversized_skin_is_truncated() {
        let mut bytes = model_bytes(1);
        // claim a 40000x40000 skin the file doesn't hold
        bytes[52..56].copy_from_slice(&40000i32.to_le_bytes());
        bytes[56..60].copy_from_slice(&40000i32.to_le_bytes());
        assert!(matches!(
            Model::from_bytes(&bytes, &Palette::default()),
            Err(Error::Truncated("skin"))
        ));
    }

    #[test]
    fn test_vertex_decompression_and_seam() {
        let model = Model::from_bytes(&model_bytes(2), &Palette::default()).unwrap();
        let tris = model.frame_triangles(1).unwrap();
        let v = tris[0].vertices;
        // 0.5 * 10 - 10
        assert_eq!(v[0].position, Vec4::point(-5.0, -10.0, 0.0));
        assert_eq!(v[2].position, Vec4::point(-5.0, 10.0, 0.0));
        // back-facing seam vertex moves by half the skin width
        assert!((v[1].uv.u - (1.0 + 2.0 + 0.5) / 4.0).abs() < 1e-6);
        assert!((v[0].uv.u - 0.5 / 4.0).abs() < 1e-6);
        assert!((v[2].uv.v - 1.5 / 2.0).abs() < 1e-6);
        assert_eq!(tris[0].color, MODEL_COLOR);
    }

    #[test]
    fn test_lerp_frames() {
        let model = Model::from_bytes(&model_bytes(2), &Palette::default()).unwrap();
        let tris = model.frame_triangles_lerp(0, 0.5).unwrap();
        // x byte halfway between 0 and 10
        assert_eq!(tris[0].vertices[0].position.x, 0.5 * 5.0 - 10.0);
        // the last frame has no successor
        assert!(model.frame_triangles_lerp(1, 0.5).is_none());
    }

    #[test]
    fn test_out_of_range_frame_draws_nothing() {
        let model = Model::from_bytes(&model_bytes(2), &Palette::default()).unwrap();
        let mut buf = DrawBuffer::new(64, 64, Planes::COLOR).unwrap();
        buf.options.draw_mode = DrawMode::Flat;
        let mvp = Mat4::scaling(0.05, 0.05, 1.0).mul(&Mat4::translation(0.0, 0.0, 0.5));
        model.render_frame(5, &mvp, &mut buf);
        model.render_frame_lerp(1, 0.5, &mvp, &mut buf);
        assert!(buf.color().unwrap().iter().all(|&c| c == 0));
        model.render_frame(0, &mvp, &mut buf);
        assert!(buf.color().unwrap().contains(&MODEL_COLOR));
    }

    #[test]
    fn test_animate_wraps() {
        let (mut frame, mut r) = (7usize, 0.0f32);
        animate(2, 5, &mut frame, &mut r);
        assert_eq!(frame, 2);
        r = 1.0;
        animate(2, 5, &mut frame, &mut r);
        assert_eq!((frame, r), (3, 0.0));
        frame = 4;
        r = 1.2;
        animate(2, 5, &mut frame, &mut r);
        assert_eq!(frame, 2);
    }
}
