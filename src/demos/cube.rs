//! Rotating textured cube with toggles for draw mode, culling and depth test

use vga3d::config::ViewerConfig;
use vga3d::input::{InputState, Key};
use vga3d::rasterizer::{
    draw_triangles, Camera, CullMode, DepthFunc, Projection, Triangle, Vec4, Vertex, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
use vga3d::{Bitmap, DrawBuffer, Palette, Planes, Result};

use super::{load_texture, rotation, Axis};

const HALF: f32 = 20.0;

/// Two triangles for the face with outward normal `u x v` around `center`,
/// wound so back-face culling keeps it when it faces the camera
fn face(center: Vec4, u: Vec4, v: Vec4) -> [[Vertex; 3]; 2] {
    let corner = |su: f32, sv: f32, tu: f32, tv: f32| {
        let p = center + u * su + v * sv;
        Vertex::with_uv(p.x, p.y, p.z, tu, tv)
    };
    let p0 = corner(-1.0, -1.0, 0.0, 0.0);
    let p1 = corner(1.0, -1.0, 1.0, 0.0);
    let p2 = corner(1.0, 1.0, 1.0, 1.0);
    let p3 = corner(-1.0, 1.0, 0.0, 1.0);
    [[p0, p2, p1], [p0, p3, p2]]
}

fn cube_faces() -> Vec<[Vertex; 3]> {
    let d = |x: f32, y: f32, z: f32| Vec4::direction(x * HALF, y * HALF, z * HALF);
    let c = |x: f32, y: f32, z: f32| Vec4::point(x * HALF, y * HALF, z * HALF);
    [
        face(c(0.0, 0.0, 1.0), d(1.0, 0.0, 0.0), d(0.0, 1.0, 0.0)),
        face(c(0.0, 0.0, -1.0), d(-1.0, 0.0, 0.0), d(0.0, 1.0, 0.0)),
        face(c(1.0, 0.0, 0.0), d(0.0, 0.0, -1.0), d(0.0, 1.0, 0.0)),
        face(c(-1.0, 0.0, 0.0), d(0.0, 0.0, 1.0), d(0.0, 1.0, 0.0)),
        face(c(0.0, 1.0, 0.0), d(0.0, 0.0, 1.0), d(1.0, 0.0, 0.0)),
        face(c(0.0, -1.0, 0.0), d(1.0, 0.0, 0.0), d(0.0, 0.0, 1.0)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub struct Cube {
    texture: Bitmap,
    target: DrawBuffer,
    camera: Camera,
    faces: Vec<[Vertex; 3]>,
    angle: f32,
    paused: bool,
}

impl Cube {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let mut target = DrawBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT, Planes::COLOR | Planes::DEPTH)?;
        target.options = config.draw;
        target.options.cull_mode = CullMode::Back;
        target.options.depth_func = DepthFunc::Less;

        let mut camera = Camera::new(0.0, 0.0, 70.0);
        camera.set_projection(Projection::Perspective, SCREEN_WIDTH, SCREEN_HEIGHT);

        Ok(Self {
            texture: load_texture(config)?,
            target,
            camera,
            faces: cube_faces(),
            angle: 0.0,
            paused: false,
        })
    }
}

impl super::DemoScene for Cube {
    fn update(&mut self, input: &mut InputState) {
        let options = &mut self.target.options;
        if input.key_pressed(Key::M) {
            options.draw_mode = options.draw_mode.next();
        }
        if input.key_pressed(Key::C) {
            options.cull_mode = options.cull_mode.next();
        }
        if input.key_pressed(Key::Z) {
            options.depth_func = if options.depth_test() { DepthFunc::Always } else { DepthFunc::Less };
        }
        if input.key_pressed(Key::Space) {
            self.paused = !self.paused;
        }
        if !self.paused {
            self.angle += input.dt;
        }
    }

    fn draw(&mut self, screen: &mut DrawBuffer) {
        self.target.clear(Planes::DEPTH);
        self.target.clear_color(0);

        let model = rotation(Axis::Y, self.angle).mul(&rotation(Axis::X, self.angle * 0.6));
        let mvp = self.camera.mvp(&model);
        let triangles: Vec<Triangle> = self
            .faces
            .iter()
            .enumerate()
            .map(|(i, &v)| Triangle {
                color: 40 + (i / 2) as u8 * 6,
                ..Triangle::textured(v, &self.texture)
            })
            .collect();
        draw_triangles(&triangles, &mvp, &mut self.target);

        self.target.present(screen);
    }

    fn palette(&self) -> &Palette {
        &self.texture.palette
    }

    fn hud(&self) -> String {
        let o = &self.target.options;
        format!("{}, cull {}, depth {}", o.draw_mode.label(), o.cull_mode.label(), o.depth_func.label())
    }

    fn help(&self) -> &'static str {
        "M: draw mode  C: cull  Z: depth  Space: pause"
    }
}
