//! Wireframe projection test: two nested cubes pushed back and forth along z
//! while rotating, switchable between perspective and orthographic.

use vga3d::input::{InputState, Key};
use vga3d::rasterizer::{project, Camera, Projection, Vec4, SCREEN_HEIGHT, SCREEN_WIDTH};
use vga3d::{DrawBuffer, Palette};

use super::{rotation, Axis};

const EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

fn cube_corners(size: f32) -> [Vec4; 8] {
    let s = size;
    [
        Vec4::point(-s, -s, s),
        Vec4::point(s, -s, s),
        Vec4::point(s, s, s),
        Vec4::point(-s, s, s),
        Vec4::point(-s, -s, -s),
        Vec4::point(s, -s, -s),
        Vec4::point(s, s, -s),
        Vec4::point(-s, s, -s),
    ]
}

pub struct ProjectionDemo {
    palette: Palette,
    camera: Camera,
    projection: Projection,
    corners: Vec<Vec4>,
    time: f32,
}

impl ProjectionDemo {
    pub fn new() -> Self {
        let mut camera = Camera::new(0.0, 0.0, 150.0);
        camera.set_projection(Projection::Perspective, SCREEN_WIDTH, SCREEN_HEIGHT);

        let mut corners = cube_corners(40.0).to_vec();
        corners.extend(cube_corners(20.0));

        Self {
            palette: Palette::vga(),
            camera,
            projection: Projection::Perspective,
            corners,
            time: 0.0,
        }
    }
}

impl super::DemoScene for ProjectionDemo {
    fn update(&mut self, input: &mut InputState) {
        if input.key_pressed(Key::P) {
            self.projection = match self.projection {
                Projection::Perspective => Projection::Orthographic,
                Projection::Orthographic => Projection::Perspective,
            };
            self.camera.set_projection(self.projection, SCREEN_WIDTH, SCREEN_HEIGHT);
        }
        self.time += input.dt;
    }

    fn draw(&mut self, screen: &mut DrawBuffer) {
        screen.clear_color(0);

        let mut model = rotation(Axis::X, self.time * 1.5).mul(&rotation(Axis::Y, self.time * 0.7));
        model.m[14] = self.time.sin() * 80.0;
        let mvp = self.camera.mvp(&model);

        let (w, h) = (screen.width, screen.height);
        let screen_space: Vec<Vec4> = self
            .corners
            .iter()
            .map(|&p| project(mvp.transform(p), w, h))
            .collect();

        for (c, cube) in screen_space.chunks(8).enumerate() {
            for (i, &(a, b)) in EDGES.iter().enumerate() {
                screen.draw_line_vec(&cube[a], &cube[b], (3 + i + c * 12) as u8);
            }
        }
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn hud(&self) -> String {
        let name = match self.projection {
            Projection::Perspective => "perspective",
            Projection::Orthographic => "orthographic",
        };
        format!("projection: {}", name)
    }

    fn help(&self) -> &'static str {
        "P: toggle projection"
    }
}
