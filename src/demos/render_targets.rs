//! Offscreen render target blitted onto the screen at several positions,
//! some of them hanging off the screen edges

use vga3d::config::ViewerConfig;
use vga3d::input::{InputState, Key};
use vga3d::rasterizer::{Camera, CullMode, DepthFunc, Projection, Vertex};
use vga3d::{Bitmap, DrawBuffer, Palette, Planes, Result};

use super::{draw_quad, load_texture, quad, rotation, Axis};

const TARGET_WIDTH: usize = 128;
const TARGET_HEIGHT: usize = 80;

pub struct RenderTargets {
    texture: Bitmap,
    target: DrawBuffer,
    camera: Camera,
    quad: [[Vertex; 3]; 2],
    angle: f32,
    time: f32,
    depth: bool,
}

impl RenderTargets {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let mut target = DrawBuffer::new(TARGET_WIDTH, TARGET_HEIGHT, Planes::COLOR | Planes::DEPTH)?;
        target.options = config.draw;
        target.options.depth_func = DepthFunc::Less;
        target.options.cull_mode = CullMode::None;

        let mut camera = Camera::new(0.0, 0.0, 60.0);
        camera.set_projection(Projection::Perspective, TARGET_WIDTH, TARGET_HEIGHT);

        Ok(Self {
            texture: load_texture(config)?,
            target,
            camera,
            quad: quad(-25.0, -25.0, 0.0, 25.0, 25.0, 0.0, 1.0, 1.0),
            angle: 0.0,
            time: 0.0,
            depth: true,
        })
    }
}

impl super::DemoScene for RenderTargets {
    fn update(&mut self, input: &mut InputState) {
        if input.key_pressed(Key::Z) {
            self.depth = !self.depth;
            self.target.options.depth_func = if self.depth { DepthFunc::Less } else { DepthFunc::Always };
        }
        self.angle += input.dt;
        self.time += input.dt;
    }

    fn draw(&mut self, screen: &mut DrawBuffer) {
        self.target.clear(Planes::DEPTH);
        self.target.clear_color(1);

        // two crossing quads so the depth test has something to resolve
        let first = rotation(Axis::Y, self.angle);
        let second = rotation(Axis::Y, self.angle + std::f32::consts::FRAC_PI_2);
        for model in [first, second] {
            draw_quad(&self.quad, &self.texture, &self.camera.mvp(&model), &mut self.target);
        }

        screen.clear_color(0);
        let sway = (self.time.sin() * 40.0) as i32;
        screen.blit(96 + sway, 60, &self.target);
        screen.blit(-64, -40, &self.target);
        screen.blit(256, 150, &self.target);
        screen.blit(-40 - sway, 140, &self.target);
    }

    fn palette(&self) -> &Palette {
        &self.texture.palette
    }

    fn hud(&self) -> String {
        format!(
            "target {}x{}, depth {}",
            TARGET_WIDTH,
            TARGET_HEIGHT,
            self.target.options.depth_func.label()
        )
    }

    fn help(&self) -> &'static str {
        "Z: toggle depth test"
    }
}
