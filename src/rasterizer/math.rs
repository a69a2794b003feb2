//! Vector math for 3D rendering
//!
//! Row vectors multiplied by row-major 4x4 matrices: `v' = v * M`, so the
//! translation lives in elements 12..14 and `a * b` applies `a` first.

use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// Homogeneous 4D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
    pub const UP: Vec4 = Vec4 { x: 0.0, y: 1.0, z: 0.0, w: 0.0 };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Position with w = 1
    pub fn point(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    /// Direction with w = 0
    pub fn direction(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 0.0 }
    }

    /// Dot product of the xyz part
    pub fn dot(self, other: Vec4) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product of the xyz part (w = 0)
    pub fn cross(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
            w: 0.0,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize the xyz part, keeping w
    pub fn normalize(self) -> Vec4 {
        let l = self.len();
        if l == 0.0 {
            return self;
        }
        Vec4 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
            w: self.w,
        }
    }

    pub fn scale(self, s: f32) -> Vec4 {
        Vec4 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
            w: self.w * s,
        }
    }

    /// Component-wise linear interpolation
    pub fn lerp(self, other: Vec4, t: f32) -> Vec4 {
        Vec4 {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
            z: lerp(self.z, other.z, t),
            w: lerp(self.w, other.w, t),
        }
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w,
        }
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w,
        }
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;
    fn mul(self, s: f32) -> Vec4 {
        self.scale(s)
    }
}

impl Neg for Vec4 {
    type Output = Vec4;
    fn neg(self) -> Vec4 {
        self.scale(-1.0)
    }
}

/// Texture coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

impl TexCoord {
    pub fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 4x4 matrix, row-major
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub m: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const ZERO: Mat4 = Mat4 { m: [0.0; 16] };

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut r = Self::IDENTITY;
        r.m[12] = x;
        r.m[13] = y;
        r.m[14] = z;
        r
    }

    pub fn scaling(x: f32, y: f32, z: f32) -> Self {
        let mut r = Self::IDENTITY;
        r.m[0] = x;
        r.m[5] = y;
        r.m[10] = z;
        r
    }

    /// Transform a row vector: `v * self`
    pub fn transform(&self, v: Vec4) -> Vec4 {
        let m = &self.m;
        Vec4 {
            x: v.x * m[0] + v.y * m[4] + v.z * m[8] + v.w * m[12],
            y: v.x * m[1] + v.y * m[5] + v.z * m[9] + v.w * m[13],
            z: v.x * m[2] + v.y * m[6] + v.z * m[10] + v.w * m[14],
            w: v.x * m[3] + v.y * m[7] + v.z * m[11] + v.w * m[15],
        }
    }

    /// Matrix product; the result applies `self` first, then `other`
    pub fn mul(&self, other: &Mat4) -> Mat4 {
        let mut r = Mat4::ZERO;
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    r.m[i * 4 + j] += self.m[i * 4 + k] * other.m[k * 4 + j];
                }
            }
        }
        r
    }

    pub fn transpose(&self) -> Mat4 {
        let mut r = Mat4::ZERO;
        for i in 0..4 {
            for j in 0..4 {
                r.m[j * 4 + i] = self.m[i * 4 + j];
            }
        }
        r
    }

    /// Right-handed perspective projection. Visible geometry ends up with
    /// clip z in [0, w]: z = 0 on the near plane, z = w on the far plane.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let inv_tan = 1.0 / (fov_y * 0.5).tan();
        let mut r = Mat4::ZERO;
        r.m[0] = inv_tan / aspect;
        r.m[5] = inv_tan;
        r.m[10] = far / (near - far);
        r.m[11] = -1.0;
        r.m[14] = (near * far) / (near - far);
        r
    }

    /// Orthographic projection, clip z in [0, 1] between near and far
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let mut r = Mat4::IDENTITY;
        r.m[0] = 2.0 / (right - left);
        r.m[5] = 2.0 / (top - bottom);
        r.m[10] = 1.0 / (near - far);
        r.m[12] = -(right + left) / (right - left);
        r.m[13] = -(top + bottom) / (top - bottom);
        r.m[14] = near / (near - far);
        r
    }

    /// View matrix for an eye at `position` looking along `forward`
    pub fn view(position: Vec4, forward: Vec4, up: Vec4) -> Self {
        let f = forward.normalize();
        let r = f.cross(up).normalize();
        let u = r.cross(f);

        let mut m = Mat4::IDENTITY;
        m.m[0] = r.x;
        m.m[4] = r.y;
        m.m[8] = r.z;
        m.m[1] = u.x;
        m.m[5] = u.y;
        m.m[9] = u.z;
        m.m[2] = -f.x;
        m.m[6] = -f.y;
        m.m[10] = -f.z;
        m.m[12] = -r.dot(position);
        m.m[13] = -u.dot(position);
        m.m[14] = f.dot(position);
        m
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Rotation of `angle` radians around `axis` (normalized internally)
    pub fn from_axis_angle(axis: Vec4, angle: f32) -> Self {
        let a = axis.normalize();
        let (s, c) = (angle * 0.5).sin_cos();
        Self {
            x: a.x * s,
            y: a.y * s,
            z: a.z * s,
            w: c,
        }
    }

    pub fn conjugate(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    pub fn normalize(self) -> Self {
        let l = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if l == 0.0 {
            return Self::IDENTITY;
        }
        Self {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
            w: self.w / l,
        }
    }

    /// Hamilton product: the result rotates by `other` first, then `self`
    pub fn mul(self, other: Quat) -> Quat {
        Quat {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Rotate the xyz part of `v`, keeping w
    pub fn rotate(self, v: Vec4) -> Vec4 {
        let p = Quat { x: v.x, y: v.y, z: v.z, w: 0.0 };
        let r = self.mul(p).mul(self.conjugate());
        Vec4::new(r.x, r.y, r.z, v.w)
    }

    /// Rotation matrix for row vectors
    pub fn to_mat4(self) -> Mat4 {
        let q = self.normalize();
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let mut m = Mat4::IDENTITY;
        m.m[0] = 1.0 - 2.0 * (y * y + z * z);
        m.m[1] = 2.0 * (x * y + z * w);
        m.m[2] = 2.0 * (x * z - y * w);
        m.m[4] = 2.0 * (x * y - z * w);
        m.m[5] = 1.0 - 2.0 * (x * x + z * z);
        m.m[6] = 2.0 * (y * z + x * w);
        m.m[8] = 2.0 * (x * z + y * w);
        m.m[9] = 2.0 * (y * z - x * w);
        m.m[10] = 1.0 - 2.0 * (x * x + y * y);
        m
    }
}

/// Rotate `v` in place by `angle` radians around the axis (x, y, z)
pub fn rotate_vec_axis_angle(v: &mut Vec4, angle: f32, x: f32, y: f32, z: f32) {
    let q = Quat::from_axis_angle(Vec4::direction(x, y, z), angle);
    *v = q.rotate(*v);
}
