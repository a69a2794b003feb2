//! Bresenham line test: spokes around the screen center plus lines running
//! off every edge to exercise clipping

use std::f32::consts::TAU;

use vga3d::input::{InputState, Key};
use vga3d::rasterizer::{SCREEN_HEIGHT, SCREEN_WIDTH};
use vga3d::{DrawBuffer, Palette};

const SPOKES: usize = 64;
const RADIUS: f32 = 90.0;

pub struct Lines {
    palette: Palette,
    angle: f32,
    paused: bool,
}

impl Lines {
    pub fn new() -> Self {
        Self {
            palette: Palette::vga(),
            angle: 0.0,
            paused: false,
        }
    }
}

impl super::DemoScene for Lines {
    fn update(&mut self, input: &mut InputState) {
        if input.key_pressed(Key::Space) {
            self.paused = !self.paused;
        }
        if !self.paused {
            self.angle = (self.angle + input.dt * 0.5) % TAU;
        }
    }

    fn draw(&mut self, screen: &mut DrawBuffer) {
        screen.clear_color(0);
        let (cx, cy) = ((SCREEN_WIDTH / 2) as i32, (SCREEN_HEIGHT / 2 + 3) as i32);

        for i in 0..SPOKES {
            let a = self.angle + i as f32 * TAU / SPOKES as f32;
            let x = cx + (a.cos() * RADIUS) as i32;
            let y = cy + (a.sin() * RADIUS) as i32;
            screen.draw_line(cx, cy, 1.0, x, y, 1.0, 32 + (i % 216) as u8);
        }

        // longer than the screen in every direction
        let r = 400.0;
        for i in 0..8 {
            let a = -self.angle + i as f32 * TAU / 8.0;
            let x = cx + (a.cos() * r) as i32;
            let y = cy + (a.sin() * r) as i32;
            screen.draw_line(cx, cy, 1.0, x, y, 1.0, 15);
        }
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn hud(&self) -> String {
        format!("{} spokes{}", SPOKES, if self.paused { ", paused" } else { "" })
    }

    fn help(&self) -> &'static str {
        "Space: pause"
    }
}
