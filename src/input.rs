//! Caller-owned keyboard state
//!
//! The host polls its window system once per frame and feeds key transitions
//! in with [`InputState::set_key`]. Demos query it; the rasterizer never does.

use std::collections::HashSet;

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Space,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    A,
    C,
    D,
    M,
    O,
    P,
    R,
    S,
    T,
    W,
    Z,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    F12,
}

/// Keyboard state plus the frame delta time
#[derive(Debug, Clone, Default)]
pub struct InputState {
    down: HashSet<Key>,
    pressed: HashSet<Key>,
    /// Seconds since the previous frame
    pub dt: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame: forget unread presses and store the delta time
    pub fn begin_frame(&mut self, dt: f32) {
        self.pressed.clear();
        self.dt = dt;
    }

    /// Record the current state of a key. A transition to down counts as a press.
    pub fn set_key(&mut self, key: Key, down: bool) {
        if down {
            if self.down.insert(key) {
                self.pressed.insert(key);
            }
        } else {
            self.down.remove(&key);
        }
    }

    /// Key is held
    pub fn key_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    /// Key went down this frame. Reading consumes the press, so a second
    /// check in the same frame returns false.
    pub fn key_pressed(&mut self, key: Key) -> bool {
        self.pressed.remove(&key)
    }

    /// Drop all key state
    pub fn flush(&mut self) {
        self.down.clear();
        self.pressed.clear();
    }
}
