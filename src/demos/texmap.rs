//! Single textured quad, affine versus perspective-correct mapping

use vga3d::config::ViewerConfig;
use vga3d::input::{InputState, Key};
use vga3d::rasterizer::{Camera, CullMode, DrawMode, Mat4, Projection, Vertex, SCREEN_HEIGHT, SCREEN_WIDTH};
use vga3d::{Bitmap, DrawBuffer, Palette, Result};

use super::{draw_quad, load_texture, quad, rotation, Axis};

const TURN_SPEED: f32 = 1.5;

pub struct TextureMapping {
    texture: Bitmap,
    camera: Camera,
    quad: [[Vertex; 3]; 2],
    draw_mode: DrawMode,
    yaw: f32,
    pitch: f32,
    manual: bool,
}

impl TextureMapping {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let mut camera = Camera::new(0.0, 0.0, 60.0);
        camera.set_projection(Projection::Perspective, SCREEN_WIDTH, SCREEN_HEIGHT);

        Ok(Self {
            texture: load_texture(config)?,
            camera,
            quad: quad(-25.0, -25.0, 0.0, 25.0, 25.0, 0.0, 1.0, 1.0),
            draw_mode: DrawMode::Perspective,
            yaw: 0.0,
            pitch: 0.0,
            manual: false,
        })
    }

    fn model(&self) -> Mat4 {
        rotation(Axis::Y, self.yaw).mul(&rotation(Axis::X, self.pitch))
    }
}

impl super::DemoScene for TextureMapping {
    fn update(&mut self, input: &mut InputState) {
        if input.key_pressed(Key::T) {
            self.draw_mode = match self.draw_mode {
                DrawMode::Perspective => DrawMode::Affine,
                _ => DrawMode::Perspective,
            };
        }
        if input.key_pressed(Key::Space) {
            self.manual = !self.manual;
        }

        let step = TURN_SPEED * input.dt;
        if self.manual {
            if input.key_down(Key::Left) {
                self.yaw -= step;
            }
            if input.key_down(Key::Right) {
                self.yaw += step;
            }
            if input.key_down(Key::Up) {
                self.pitch -= step;
            }
            if input.key_down(Key::Down) {
                self.pitch += step;
            }
        } else {
            self.yaw += step;
        }
    }

    fn draw(&mut self, screen: &mut DrawBuffer) {
        screen.clear_color(0);
        screen.options.draw_mode = self.draw_mode;
        screen.options.cull_mode = CullMode::None;
        draw_quad(&self.quad, &self.texture, &self.camera.mvp(&self.model()), screen);
    }

    fn palette(&self) -> &Palette {
        &self.texture.palette
    }

    fn hud(&self) -> String {
        format!(
            "{} mapping, {}",
            self.draw_mode.label(),
            if self.manual { "manual" } else { "auto-rotate" }
        )
    }

    fn help(&self) -> &'static str {
        "T: toggle mapping  Space: manual  Arrows: rotate"
    }
}
