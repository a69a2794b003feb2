//! Small Doom-style room: scrolling sky, textured floor and walls, and
//! color-keyed sprite billboards, walked through with a first-person camera.
//!
//! Textures come from the configured atlas (sky at 0,0 256x128, then 128x128
//! tiles). Without one the room is textured procedurally.

use std::path::Path;

use vga3d::config::ViewerConfig;
use vga3d::input::{InputState, Key};
use vga3d::rasterizer::{
    Camera, CullMode, DepthFunc, DrawMode, Mat4, Projection, Vertex, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use vga3d::{Bitmap, DrawBuffer, Palette, Planes, Result};

use super::{draw_quad, quad, rotation, Axis, COLOR_KEY};

const SKY: usize = 0;
const BACK_WALL: usize = 1;
const FLOOR: usize = 2;
const SIDE_WALL: usize = 3;
const SPRITES: [usize; 3] = [4, 5, 6];

const SKY_WIDTH: usize = 320;
const SKY_HEIGHT: usize = 128;
const SKY_SPEED: f32 = 30.0;
const MOVE_SPEED: f32 = 60.0;
const TURN_SPEED: f32 = 1.5;

/// Atlas regions for textures 1..=6, 128x128 each
const ATLAS_TILES: [(usize, usize); 6] = [(0, 256), (0, 128), (128, 128), (128, 256), (0, 384), (128, 384)];

/// Wall quads as (corner, opposite corner, texture)
const WALLS: [((f32, f32, f32), (f32, f32, f32), usize); 6] = [
    ((80.0, -40.0, -120.0), (100.0, 40.0, -40.0), SIDE_WALL),
    ((-100.0, -40.0, -40.0), (-80.0, 40.0, -120.0), SIDE_WALL),
    ((-80.0, -120.0, -120.0), (80.0, 40.0, -120.0), BACK_WALL),
    ((20.0, -20.0, -65.0), (84.0, 44.0, -65.0), SPRITES[0]),
    ((-60.0, -20.0, -95.0), (4.0, 44.0, -95.0), SPRITES[1]),
    ((-100.0, -20.0, -42.0), (-34.0, 44.0, -42.0), SPRITES[2]),
];

fn load_atlas(path: &Path) -> Result<Vec<Bitmap>> {
    let atlas = Bitmap::load(path)?;
    let mut textures = vec![atlas.from_atlas(0, 0, 256, 128)?.resize(SKY_WIDTH, SKY_HEIGHT)?];
    for &(x, y) in &ATLAS_TILES {
        textures.push(atlas.from_atlas(x, y, 128, 128)?);
    }
    Ok(textures)
}

/// VGA color cube index, components 0..=5
fn rgb6(r: usize, g: usize, b: usize) -> u8 {
    (32 + r * 36 + g * 6 + b) as u8
}

fn sky() -> Result<Bitmap> {
    let mut bmp = Bitmap::new(SKY_WIDTH, SKY_HEIGHT)?;
    for y in 0..SKY_HEIGHT {
        for x in 0..SKY_WIDTH {
            let (fx, fy) = (x as f32, y as f32);
            let cloud = (fx * 0.0785).sin() + (fy * 0.11 + fx * 0.0196).cos();
            bmp.data[y * SKY_WIDTH + x] = if cloud > 1.3 { 15 } else { rgb6(1, 1 + y * 4 / SKY_HEIGHT, 5) };
        }
    }
    Ok(bmp)
}

fn bricks(brick: u8, mortar: u8) -> Result<Bitmap> {
    let mut bmp = Bitmap::new(128, 128)?;
    for y in 0..128 {
        let shift = if (y / 16) % 2 == 0 { 0 } else { 16 };
        for x in 0..128 {
            let edge = y % 16 == 0 || (x + shift) % 32 == 0;
            bmp.data[y * 128 + x] = if edge { mortar } else { brick };
        }
    }
    Ok(bmp)
}

/// Round creature on a color-keyed background
fn sprite(body: u8, eye: u8) -> Result<Bitmap> {
    let mut bmp = Bitmap::new(128, 128)?;
    for y in 0..128i32 {
        for x in 0..128i32 {
            let d2 = |cx: i32, cy: i32| (x - cx).pow(2) + (y - cy).pow(2);
            bmp.data[(y * 128 + x) as usize] = if d2(64, 52) < 14 * 14 {
                eye
            } else if d2(64, 64) < 50 * 50 {
                body
            } else {
                COLOR_KEY
            };
        }
    }
    Ok(bmp)
}

fn procedural_textures() -> Result<Vec<Bitmap>> {
    Ok(vec![
        sky()?,
        bricks(rgb6(2, 2, 1), 22)?,
        Bitmap::checkerboard(128, 128, 16, 20, 24)?,
        bricks(rgb6(3, 1, 0), 20)?,
        sprite(rgb6(4, 2, 1), 15)?,
        sprite(rgb6(5, 0, 1), rgb6(0, 5, 0))?,
        sprite(rgb6(1, 3, 1), 14)?,
    ])
}

/// The floor is built standing up, then laid flat and pushed down and back
fn floor() -> [[Vertex; 3]; 2] {
    let mut q = quad(-140.0, -48.0, 0.0, 140.0, 48.0, 0.0, 3.0, 2.0);
    let model = rotation(Axis::X, std::f32::consts::FRAC_PI_2).mul(&Mat4::translation(0.0, 50.0, -100.0));
    for v in q.iter_mut().flatten() {
        v.position = model.transform(v.position);
    }
    q
}

pub struct Scene {
    textures: Vec<Bitmap>,
    walls: Vec<([[Vertex; 3]; 2], usize)>,
    target: DrawBuffer,
    camera: Camera,
    sky_offset: f32,
}

impl Scene {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let textures = match &config.atlas {
            Some(path) => load_atlas(path).or_else(|e| {
                log::warn!("failed to load atlas {}: {}", path.display(), e);
                procedural_textures()
            })?,
            None => procedural_textures()?,
        };

        let mut target = DrawBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT, Planes::COLOR | Planes::DEPTH)?;
        target.options = config.draw;
        target.options.color_key = Some(COLOR_KEY);
        target.options.depth_func = DepthFunc::Less;
        target.options.cull_mode = CullMode::None;

        let mut camera = Camera::new(0.0, -20.0, 40.0);
        camera.set_projection(Projection::Perspective, SCREEN_WIDTH, SCREEN_HEIGHT);

        let mut walls = vec![(floor(), FLOOR)];
        for &((x, y, z), (x2, y2, z2), texture) in &WALLS {
            walls.push((quad(x, y, z, x2, y2, z2, 1.0, 1.0), texture));
        }

        Ok(Self {
            textures,
            walls,
            target,
            camera,
            sky_offset: 0.0,
        })
    }
}

impl super::DemoScene for Scene {
    fn update(&mut self, input: &mut InputState) {
        if input.key_pressed(Key::T) {
            let options = &mut self.target.options;
            options.draw_mode = match options.draw_mode {
                DrawMode::Affine => DrawMode::Perspective,
                _ => DrawMode::Affine,
            };
        }

        let dt = input.dt;
        let axis = |neg: Key, pos: Key| input.key_down(pos) as i32 as f32 - input.key_down(neg) as i32 as f32;
        let forward = axis(Key::S, Key::W);
        let strafe = axis(Key::A, Key::D);
        let yaw = axis(Key::Left, Key::Right);
        let pitch = axis(Key::Up, Key::Down);

        if yaw != 0.0 || pitch != 0.0 {
            self.camera.rotate(yaw * TURN_SPEED * dt, pitch * TURN_SPEED * dt);
        }
        if forward != 0.0 || strafe != 0.0 {
            self.camera.translate(forward * MOVE_SPEED * dt, strafe * MOVE_SPEED * dt);
        }

        self.sky_offset = (self.sky_offset + SKY_SPEED * dt) % SKY_WIDTH as f32;
    }

    fn draw(&mut self, screen: &mut DrawBuffer) {
        self.target.clear(Planes::DEPTH);
        self.target.clear_color(0);

        self.textures[SKY].draw_offset(0, 0, self.sky_offset as i32, 0, &mut self.target);

        let mvp = self.camera.view_projection();
        for (q, texture) in &self.walls {
            draw_quad(q, &self.textures[*texture], &mvp, &mut self.target);
        }

        self.target.present(screen);
    }

    fn palette(&self) -> &Palette {
        &self.textures[BACK_WALL].palette
    }

    fn hud(&self) -> String {
        let p = self.camera.position;
        format!(
            "{} mapping, camera ({:.0}, {:.0}, {:.0})",
            self.target.options.draw_mode.label(),
            p.x,
            p.y,
            p.z
        )
    }

    fn help(&self) -> &'static str {
        "WASD: move  Arrows: look  T: toggle mapping"
    }
}
