//! Quake MDL playback with frame interpolation

use std::path::{Path, PathBuf};

use vga3d::config::ViewerConfig;
use vga3d::input::{InputState, Key};
use vga3d::mdl::{animate, Model};
use vga3d::rasterizer::{Camera, CullMode, DepthFunc, Projection, SCREEN_HEIGHT, SCREEN_WIDTH};
use vga3d::{DrawBuffer, Palette, Planes, Result};

use super::{load_palette, rotation, Axis};

/// Animation frames per second
const FRAME_RATE: f32 = 10.0;
const SPIN_SPEED: f32 = 1.0;

pub struct ModelDemo {
    palette: Palette,
    model: Option<Model>,
    path: Option<PathBuf>,
    target: Option<DrawBuffer>,
    camera: Camera,
    frame: usize,
    blend: f32,
    interpolate: bool,
    angle: f32,
    error: Option<String>,
}

impl ModelDemo {
    pub fn new(config: &ViewerConfig) -> Self {
        let mut camera = Camera::new(0.0, 0.0, 100.0);
        camera.set_projection(Projection::Perspective, SCREEN_WIDTH, SCREEN_HEIGHT);

        let target = match DrawBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT, Planes::COLOR | Planes::DEPTH) {
            Ok(mut buffer) => {
                buffer.options = config.draw;
                buffer.options.depth_func = DepthFunc::Less;
                buffer.options.cull_mode = CullMode::None;
                Some(buffer)
            }
            Err(e) => {
                log::error!("model demo: {}", e);
                None
            }
        };

        let mut demo = Self {
            palette: load_palette(config.palette.as_deref()),
            model: None,
            path: None,
            target,
            camera,
            frame: 0,
            blend: 0.0,
            interpolate: true,
            angle: 0.0,
            error: None,
        };
        if let Some(path) = &config.model {
            demo.open(path);
        }
        demo
    }

    fn open(&mut self, path: &Path) {
        match self.try_open(path) {
            Ok(()) => self.error = None,
            Err(e) => {
                log::error!("failed to load model {}: {}", path.display(), e);
                self.error = Some(e.to_string());
            }
        }
    }

    fn try_open(&mut self, path: &Path) -> Result<()> {
        let model = Model::load(path, &self.palette)?;
        log::info!(
            "loaded {}: {} frames, {} triangles, {} skins",
            path.display(),
            model.num_frames(),
            model.triangles.len(),
            model.skins.len()
        );
        self.model = Some(model);
        self.path = Some(path.to_path_buf());
        self.frame = 0;
        self.blend = 0.0;
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn pick_file(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Quake model", &["mdl"]);
        if let Some(dir) = self.path.as_ref().and_then(|p| p.parent()) {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.pick_file() {
            self.open(&path);
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn pick_file(&mut self) {}

    fn interpolating(&self, model: &Model) -> bool {
        self.interpolate && model.num_frames() > 1
    }
}

impl super::DemoScene for ModelDemo {
    fn update(&mut self, input: &mut InputState) {
        if input.key_pressed(Key::O) {
            self.pick_file();
        }
        if input.key_pressed(Key::Space) {
            self.interpolate = !self.interpolate;
        }
        if input.key_pressed(Key::M) {
            if let Some(target) = self.target.as_mut() {
                target.options.draw_mode = target.options.draw_mode.next();
            }
        }
        if let Some(model) = self.model.as_mut() {
            let n = model.skins.len().max(1);
            if input.key_pressed(Key::PageUp) {
                model.skin = (model.skin + 1) % n;
            }
            if input.key_pressed(Key::PageDown) {
                model.skin = (model.skin + n - 1) % n;
            }
        }

        if input.key_down(Key::Left) {
            self.angle -= SPIN_SPEED * input.dt;
        } else if input.key_down(Key::Right) {
            self.angle += SPIN_SPEED * input.dt;
        } else {
            self.angle += SPIN_SPEED * 0.5 * input.dt;
        }

        let Some(model) = self.model.as_ref() else {
            return;
        };
        // the last interpolated pair is (n - 2, n - 1)
        let end = if self.interpolating(model) { model.num_frames() - 1 } else { model.num_frames() };
        self.blend += input.dt * FRAME_RATE;
        animate(0, end, &mut self.frame, &mut self.blend);
    }

    fn draw(&mut self, screen: &mut DrawBuffer) {
        let Some(target) = self.target.as_mut() else {
            screen.clear_color(0);
            return;
        };
        target.clear(Planes::DEPTH);
        target.clear_color(0);

        if let Some(model) = self.model.as_ref() {
            // z-up model space into the y-down world, then spin
            let transform = rotation(Axis::X, std::f32::consts::FRAC_PI_2).mul(&rotation(Axis::Y, self.angle));
            let mvp = self.camera.mvp(&transform);
            if self.interpolate && model.num_frames() > 1 {
                model.render_frame_lerp(self.frame, self.blend.min(1.0), &mvp, target);
            } else {
                model.render_frame(self.frame, &mvp, target);
            }
        }

        target.present(screen);
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn hud(&self) -> String {
        match (&self.model, &self.error) {
            (Some(model), _) => format!(
                "frame {}/{} {}{}",
                self.frame,
                model.num_frames(),
                model.frames.get(self.frame).map(|f| f.name.as_str()).unwrap_or(""),
                if self.interpolate { ", interpolated" } else { "" }
            ),
            (None, Some(e)) => format!("load failed: {}", e),
            (None, None) => "no model loaded".to_string(),
        }
    }

    fn help(&self) -> &'static str {
        "O: open  Space: interpolation  M: draw mode  PgUp/PgDn: skin  Left/Right: spin"
    }
}
