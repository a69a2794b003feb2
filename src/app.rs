//! Viewer state: the running demo, the screen buffer and global keys
//!
//! Number keys switch demos, F12 writes a screenshot and Escape quits.
//! Everything else goes to the active demo.

use std::fs;
use std::path::PathBuf;

use vga3d::config::{Demo, ViewerConfig};
use vga3d::input::{InputState, Key};
use vga3d::{DrawBuffer, Result};

use crate::demos::{self, DemoScene};

const DEMO_KEYS: [Key; 8] = [
    Key::Num1,
    Key::Num2,
    Key::Num3,
    Key::Num4,
    Key::Num5,
    Key::Num6,
    Key::Num7,
    Key::Num8,
];

pub struct App {
    pub config: ViewerConfig,
    pub demo: Demo,
    scene: Box<dyn DemoScene>,
    /// The 320x200 color buffer presented every frame
    pub screen: DrawBuffer,
    pub input: InputState,
    status_message: Option<(String, f64)>,
    screenshots: usize,
    pub quit: bool,
}

impl App {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        let demo = config.demo;
        let mut screen = DrawBuffer::screen()?;
        screen.options = config.draw;
        let scene = demos::create(demo, &config)?;

        Ok(Self {
            config,
            demo,
            scene,
            screen,
            input: InputState::new(),
            status_message: None,
            screenshots: 0,
            quit: false,
        })
    }

    /// Switch demos; on failure the current one keeps running
    pub fn set_demo(&mut self, demo: Demo) {
        match demos::create(demo, &self.config) {
            Ok(scene) => {
                self.scene = scene;
                self.demo = demo;
                self.screen.options = self.config.draw;
                self.screen.clear_color(0);
                self.input.flush();
                self.set_status(demo.label(), 2.0);
            }
            Err(e) => {
                log::error!("failed to start {}: {}", demo.label(), e);
                self.set_status(&format!("{} failed: {}", demo.label(), e), 5.0);
            }
        }
    }

    pub fn update(&mut self) {
        if self.input.key_pressed(Key::Escape) {
            self.quit = true;
            return;
        }
        for (i, key) in DEMO_KEYS.iter().enumerate() {
            if self.input.key_pressed(*key) {
                if let Some(demo) = Demo::from_index(i) {
                    self.set_demo(demo);
                }
            }
        }
        if self.input.key_pressed(Key::F12) {
            match self.screenshot() {
                Ok(path) => self.set_status(&format!("Saved {}", path.display()), 3.0),
                Err(e) => {
                    log::error!("screenshot failed: {}", e);
                    self.set_status(&format!("Screenshot failed: {}", e), 5.0);
                }
            }
        }

        self.scene.update(&mut self.input);
    }

    pub fn draw(&mut self) {
        self.scene.draw(&mut self.screen);
    }

    /// Screen converted through the active palette
    pub fn rgba(&self) -> Vec<u8> {
        self.screen.to_rgba(self.scene.palette())
    }

    pub fn hud(&self) -> String {
        format!("{}: {}", self.demo.label(), self.scene.hud())
    }

    pub fn help(&self) -> &'static str {
        self.scene.help()
    }

    fn screenshot(&mut self) -> Result<PathBuf> {
        let dir = &self.config.screenshot_dir;
        fs::create_dir_all(dir)?;

        let mut path;
        loop {
            self.screenshots += 1;
            path = dir.join(format!("vga3d_{:03}.png", self.screenshots));
            if !path.exists() {
                break;
            }
        }
        self.screen.save_png(&path, self.scene.palette())?;
        log::info!("saved screenshot {}", path.display());
        Ok(path)
    }

    /// Set a status message that will be displayed for a duration
    pub fn set_status(&mut self, message: &str, duration_secs: f64) {
        let expiry = macroquad::time::get_time() + duration_secs;
        self.status_message = Some((message.to_string(), expiry));
    }

    /// Get current status message if not expired
    pub fn get_status(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, expiry)) if macroquad::time::get_time() < *expiry => Some(msg),
            _ => None,
        }
    }
}
