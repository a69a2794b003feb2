//! vga3d viewer
//!
//! Runs the demo scenes in a macroquad window. The rasterizer draws into a
//! 320x200 palette-indexed buffer which is expanded to RGBA and scaled up
//! with nearest filtering every frame.

mod app;
mod demos;

use macroquad::prelude::*;
use vga3d::config::{load_config, ViewerConfig, CONFIG_FILE};
use vga3d::input::Key;
use vga3d::rasterizer::{SCREEN_HEIGHT, SCREEN_WIDTH};
use vga3d::VERSION;

use app::App;

const KEYMAP: [(KeyCode, Key); 28] = [
    (KeyCode::Escape, Key::Escape),
    (KeyCode::Space, Key::Space),
    (KeyCode::Up, Key::Up),
    (KeyCode::Down, Key::Down),
    (KeyCode::Left, Key::Left),
    (KeyCode::Right, Key::Right),
    (KeyCode::PageUp, Key::PageUp),
    (KeyCode::PageDown, Key::PageDown),
    (KeyCode::A, Key::A),
    (KeyCode::C, Key::C),
    (KeyCode::D, Key::D),
    (KeyCode::M, Key::M),
    (KeyCode::O, Key::O),
    (KeyCode::P, Key::P),
    (KeyCode::R, Key::R),
    (KeyCode::S, Key::S),
    (KeyCode::T, Key::T),
    (KeyCode::W, Key::W),
    (KeyCode::Z, Key::Z),
    (KeyCode::Key1, Key::Num1),
    (KeyCode::Key2, Key::Num2),
    (KeyCode::Key3, Key::Num3),
    (KeyCode::Key4, Key::Num4),
    (KeyCode::Key5, Key::Num5),
    (KeyCode::Key6, Key::Num6),
    (KeyCode::Key7, Key::Num7),
    (KeyCode::Key8, Key::Num8),
    (KeyCode::F12, Key::F12),
];

fn config() -> ViewerConfig {
    load_config(CONFIG_FILE).unwrap_or_else(|e| {
        log::error!("{}: {}, using defaults", CONFIG_FILE, e);
        ViewerConfig::default()
    })
}

fn window_conf() -> Conf {
    let scale = config().window_scale as i32;
    Conf {
        window_title: format!("vga3d v{}", VERSION),
        window_width: SCREEN_WIDTH as i32 * scale,
        window_height: SCREEN_HEIGHT as i32 * scale,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn poll_input(app: &mut App) {
    app.input.begin_frame(get_frame_time());
    for (code, key) in KEYMAP {
        app.input.set_key(key, is_key_down(code));
    }
}

/// Scale the screen buffer into the window, keeping its aspect ratio
fn present(app: &App) {
    let (w, h) = (SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32);
    let scale = (screen_width() / w).min(screen_height() / h);
    let (draw_w, draw_h) = (w * scale, h * scale);
    let draw_x = ((screen_width() - draw_w) * 0.5).floor();
    let draw_y = ((screen_height() - draw_h) * 0.5).floor();

    let texture = Texture2D::from_rgba8(SCREEN_WIDTH as u16, SCREEN_HEIGHT as u16, &app.rgba());
    texture.set_filter(FilterMode::Nearest);
    draw_texture_ex(
        &texture,
        draw_x,
        draw_y,
        WHITE,
        DrawTextureParams {
            dest_size: Some(Vec2::new(draw_w, draw_h)),
            ..Default::default()
        },
    );
}

fn draw_hud(app: &App) {
    let text_color = Color::from_rgba(220, 220, 220, 255);
    draw_text(&format!("{}  {} fps", app.hud(), get_fps()), 8.0, 18.0, 18.0, text_color);
    draw_text(
        &format!("1-8: demo  F12: screenshot  Esc: quit  {}", app.help()),
        8.0,
        screen_height() - 8.0,
        16.0,
        Color::from_rgba(160, 160, 160, 255),
    );
    if let Some(msg) = app.get_status() {
        draw_text(msg, 8.0, 38.0, 18.0, YELLOW);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("vga3d v{}", VERSION);

    let mut app = match App::new(config()) {
        Ok(app) => app,
        Err(e) => {
            log::error!("failed to start: {}", e);
            return;
        }
    };

    loop {
        poll_input(&mut app);
        app.update();
        if app.quit {
            break;
        }
        app.draw();

        clear_background(BLACK);
        present(&app);
        draw_hud(&app);

        next_frame().await;
    }
}
