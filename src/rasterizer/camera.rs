//! Projection camera
//!
//! World space is y-down like the screen. The camera keeps a forward
//! direction (`target`), `up` and `right` and rebuilds its view matrix from
//! yaw and pitch, in the first-person style of the viewer demos.

use super::math::{Mat4, Vec4};

/// Default vertical field of view
pub const DEFAULT_FOV: f32 = 75.0 * std::f32::consts::PI / 180.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Camera state
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec4,
    /// Look direction
    pub target: Vec4,
    pub up: Vec4,
    pub right: Vec4,
    pub view: Mat4,
    pub projection: Mat4,
    pub pitch: f32,
    pub yaw: f32,
}

impl Camera {
    /// Camera at `position` looking down -z
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        let mut cam = Self {
            position: Vec4::point(x, y, z),
            target: Vec4::direction(0.0, 0.0, -1.0),
            up: Vec4::UP,
            right: Vec4::direction(1.0, 0.0, 0.0),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            pitch: 0.0,
            yaw: 0.0,
        };
        cam.update_view();
        cam
    }

    pub fn update_view(&mut self) {
        self.view = Mat4::view(self.position, self.target, self.up);
    }

    /// Perspective projection for a `width` x `height` target
    pub fn set_perspective(&mut self, fov_y: f32, width: usize, height: usize) {
        self.projection = Mat4::perspective(fov_y, width as f32 / height as f32, NEAR, FAR);
    }

    /// Orthographic projection with one world unit per pixel
    pub fn set_orthographic(&mut self, width: usize, height: usize) {
        let (hw, hh) = (width as f32 * 0.5, height as f32 * 0.5);
        self.projection = Mat4::orthographic(-hw, hw, -hh, hh, NEAR, FAR);
    }

    pub fn set_projection(&mut self, projection: Projection, width: usize, height: usize) {
        match projection {
            Projection::Perspective => self.set_perspective(DEFAULT_FOV, width, height),
            Projection::Orthographic => self.set_orthographic(width, height),
        }
    }

    /// view * projection
    pub fn view_projection(&self) -> Mat4 {
        self.view.mul(&self.projection)
    }

    /// model * view * projection
    pub fn mvp(&self, model: &Mat4) -> Mat4 {
        model.mul(&self.view_projection())
    }

    /// Recompute `target`, `right` and `up` from yaw and pitch
    pub fn update_basis(&mut self) {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();

        self.target = Vec4::direction(cp * sy, sp, -cp * cy);
        self.right = Vec4::direction(cy, 0.0, sy);
        self.up = self.right.cross(self.target).normalize();
        self.update_view();
    }

    /// Turn by the given yaw and pitch deltas, pitch clamped short of vertical
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );
        self.update_basis();
    }

    /// Move along the look direction and the right vector
    pub fn translate(&mut self, forward: f32, strafe: f32) {
        self.position = self.position + self.target * forward + self.right * strafe;
        self.position.w = 1.0;
        self.update_view();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn test_basis_at_rest_matches_defaults() {
        let mut cam = Camera::new(0.0, 0.0, 60.0);
        let before = cam.view;
        cam.update_basis();
        assert!(close(cam.target.z, -1.0));
        assert!(close(cam.right.x, 1.0));
        assert!(close(cam.up.y, 1.0));
        for (a, b) in before.m.iter().zip(cam.view.m.iter()) {
            assert!(close(*a, *b));
        }
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut cam = Camera::default();
        cam.rotate(0.0, 10.0);
        assert!(cam.pitch < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_translate_moves_forward() {
        let mut cam = Camera::new(0.0, 0.0, 60.0);
        cam.translate(10.0, 0.0);
        assert!(close(cam.position.z, 50.0));
        assert!(close(cam.position.w, 1.0));
        cam.rotate(std::f32::consts::FRAC_PI_2, 0.0);
        cam.translate(5.0, 0.0);
        assert!(close(cam.position.x, 5.0));
    }

    #[test]
    fn test_mvp_puts_point_ahead_inside_clip_volume() {
        let mut cam = Camera::new(0.0, 0.0, 60.0);
        cam.set_perspective(DEFAULT_FOV, 320, 200);
        let p = cam.mvp(&Mat4::IDENTITY).transform(Vec4::point(0.0, 0.0, 0.0));
        assert!(p.w > 0.0 && p.z >= 0.0 && p.z <= p.w);
        assert!(close(p.x, 0.0) && close(p.y, 0.0));
    }
}
