//! Random flat triangles accumulating on screen

use macroquad::rand::gen_range;

use vga3d::input::{InputState, Key};
use vga3d::rasterizer::{
    draw_triangle, Camera, CullMode, DrawMode, Mat4, Projection, Triangle, Vertex, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use vga3d::{DrawBuffer, Palette};

const BACKGROUND: u8 = 105;
/// Seconds between triangles
const INTERVAL: f32 = 0.05;

pub struct Triangles {
    palette: Palette,
    camera: Camera,
    model: Mat4,
    timer: f32,
    pending: usize,
    count: usize,
    paused: bool,
    cleared: bool,
}

impl Triangles {
    pub fn new() -> Self {
        // one world unit per pixel, origin in the top-left corner
        let mut camera = Camera::new(0.0, 0.0, 150.0);
        camera.set_projection(Projection::Orthographic, SCREEN_WIDTH, SCREEN_HEIGHT);
        let model = Mat4::translation(-(SCREEN_WIDTH as f32) / 2.0, -(SCREEN_HEIGHT as f32) / 2.0, 0.0);

        Self {
            palette: Palette::vga(),
            camera,
            model,
            timer: 0.0,
            pending: 0,
            count: 0,
            paused: false,
            cleared: false,
        }
    }

    fn random_triangle() -> Triangle<'static> {
        let v = || {
            Vertex::from_pos(
                gen_range(0, SCREEN_WIDTH as i32) as f32,
                gen_range(0, SCREEN_HEIGHT as i32) as f32,
                0.0,
            )
        };
        Triangle::new([v(), v(), v()], gen_range(1u8, 104))
    }
}

impl super::DemoScene for Triangles {
    fn update(&mut self, input: &mut InputState) {
        if input.key_pressed(Key::Space) {
            self.paused = !self.paused;
        }
        if input.key_pressed(Key::R) {
            self.cleared = false;
            self.count = 0;
        }
        if self.paused {
            return;
        }
        self.timer += input.dt;
        while self.timer >= INTERVAL {
            self.timer -= INTERVAL;
            self.pending += 1;
        }
    }

    fn draw(&mut self, screen: &mut DrawBuffer) {
        if !self.cleared {
            screen.clear_color(BACKGROUND);
            self.cleared = true;
        }
        screen.options.cull_mode = CullMode::None;
        screen.options.draw_mode = DrawMode::Flat;

        let mvp = self.camera.mvp(&self.model);
        for _ in 0..std::mem::take(&mut self.pending) {
            draw_triangle(&Self::random_triangle(), &mvp, screen);
            self.count += 1;
        }
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn hud(&self) -> String {
        format!("{} triangles{}", self.count, if self.paused { ", paused" } else { "" })
    }

    fn help(&self) -> &'static str {
        "Space: pause  R: clear"
    }
}
