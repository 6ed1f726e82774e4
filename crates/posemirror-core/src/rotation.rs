//! Joint rotation - unit quaternion math used by every stage of the pipeline
//!
//! Conventions follow the avatar runtime the poses are displayed in:
//! Hamilton product, `a * b` applies `b` first, Euler angles decompose as
//! yaw (Y) * pitch (X) * roll (Z).

use std::f32::consts::PI;
use std::ops::Mul;

/// Dot products closer to 1 than this are treated as the same orientation
const SAME_ORIENTATION_EPSILON: f32 = 1.0e-6;

/// Joint rotation (quaternion representation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation3D {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Rotation3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rotation3D {
    pub const IDENTITY: Rotation3D = Rotation3D {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Build from wire component order (x, y, z, w)
    pub const fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `degrees` about `axis` (axis need not be normalized)
    pub fn from_axis_angle(axis: [f32; 3], degrees: f32) -> Self {
        let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        if len < 0.0001 {
            return Self::identity();
        }
        let half = degrees.to_radians() * 0.5;
        let s = half.sin() / len;
        Self {
            w: half.cos(),
            x: axis[0] * s,
            y: axis[1] * s,
            z: axis[2] * s,
        }
    }

    /// Compose from yaw (Y), pitch (X) and roll (Z), all in radians
    pub fn from_euler_yxz(yaw: f32, pitch: f32, roll: f32) -> Self {
        let qy = Self::from_axis_angle([0.0, 1.0, 0.0], yaw.to_degrees());
        let qx = Self::from_axis_angle([1.0, 0.0, 0.0], pitch.to_degrees());
        let qz = Self::from_axis_angle([0.0, 0.0, 1.0], roll.to_degrees());
        qy * qx * qz
    }

    /// Decompose into (yaw, pitch, roll) radians, inverse of [`Self::from_euler_yxz`]
    pub fn to_euler_yxz(&self) -> (f32, f32, f32) {
        let Rotation3D { w, x, y, z } = self.normalize();

        let m12 = 2.0 * (y * z - w * x);
        let sin_pitch = (-m12).clamp(-1.0, 1.0);

        if sin_pitch.abs() > 0.9999 {
            // Gimbal lock: roll folds into yaw
            let m00 = 1.0 - 2.0 * (y * y + z * z);
            let m20 = 2.0 * (x * z - w * y);
            let yaw = (-m20).atan2(m00);
            return (yaw, sin_pitch.signum() * PI * 0.5, 0.0);
        }

        let m02 = 2.0 * (x * z + w * y);
        let m22 = 1.0 - 2.0 * (x * x + y * y);
        let m10 = 2.0 * (x * y + w * z);
        let m11 = 1.0 - 2.0 * (x * x + z * z);

        (m02.atan2(m22), sin_pitch.asin(), m10.atan2(m11))
    }

    pub fn dot(&self, other: &Rotation3D) -> f32 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Inverse rotation (conjugate scaled by the squared norm)
    pub fn inverse(&self) -> Rotation3D {
        let norm_sq = self.dot(self);
        if norm_sq < 1.0e-8 {
            return Rotation3D::identity();
        }
        let inv = 1.0 / norm_sq;
        Rotation3D {
            w: self.w * inv,
            x: -self.x * inv,
            y: -self.y * inv,
            z: -self.z * inv,
        }
    }

    /// Angle in degrees between two orientations (0..=180)
    pub fn angle_to(&self, other: &Rotation3D) -> f32 {
        let dot = self.dot(other).abs();
        if dot > 1.0 - SAME_ORIENTATION_EPSILON {
            return 0.0;
        }
        ((dot.min(1.0) as f64).acos() * 2.0).to_degrees() as f32
    }

    /// Spherical linear interpolation
    pub fn slerp(&self, other: &Rotation3D, t: f32) -> Rotation3D {
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *other;
        }

        let mut dot = self.dot(other);

        let other = if dot < 0.0 {
            dot = -dot;
            Rotation3D {
                w: -other.w,
                x: -other.x,
                y: -other.y,
                z: -other.z,
            }
        } else {
            *other
        };

        if dot > 0.9995 {
            // Linear interpolation for very close quaternions
            let result = Rotation3D {
                w: self.w + (other.w - self.w) * t,
                x: self.x + (other.x - self.x) * t,
                y: self.y + (other.y - self.y) * t,
                z: self.z + (other.z - self.z) * t,
            };
            return result.normalize();
        }

        let theta_0 = dot.acos();
        let theta = theta_0 * t;
        let sin_theta = theta.sin();
        let sin_theta_0 = theta_0.sin();

        let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
        let s1 = sin_theta / sin_theta_0;

        Rotation3D {
            w: self.w * s0 + other.w * s1,
            x: self.x * s0 + other.x * s1,
            y: self.y * s0 + other.y * s1,
            z: self.z * s0 + other.z * s1,
        }
    }

    pub fn normalize(&self) -> Rotation3D {
        let len = self.length();
        if len < 0.0001 || !len.is_finite() {
            return Rotation3D::identity();
        }
        Rotation3D {
            w: self.w / len,
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
        }
    }
}

impl Mul for Rotation3D {
    type Output = Rotation3D;

    fn mul(self, rhs: Rotation3D) -> Rotation3D {
        Rotation3D {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

/// Wrap an angle in radians into (-PI, PI]
pub fn wrap_angle(radians: f32) -> f32 {
    let wrapped = (radians + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Move an angle `t` of the way toward zero along the shortest arc
pub fn blend_angle_toward_zero(radians: f32, t: f32) -> f32 {
    let wrapped = wrap_angle(radians);
    wrapped - wrapped * t.clamp(0.0, 1.0)
}
