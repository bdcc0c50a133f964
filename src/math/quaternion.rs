//! Fixed-point rotation quaternion
//!
//! Euler angles are in degrees and follow the Z, then X, then Y convention
//! that the vehicle and turret tuning values were authored in.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

use super::{Fp, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quat {
    pub x: Fp,
    pub y: Fp,
    pub z: Fp,
    pub w: Fp,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: Fp::ZERO,
        y: Fp::ZERO,
        z: Fp::ZERO,
        w: Fp::ONE,
    };

    pub const fn new(x: Fp, y: Fp, z: Fp, w: Fp) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` degrees around `axis`.
    pub fn angle_axis(angle: Fp, axis: Vec3) -> Quat {
        let axis = axis.normalized();
        let half = angle.to_radians() / Fp::TWO;
        let s = half.sin();
        Quat::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Rotation from Euler angles in degrees, applied Z first, then X, then Y.
    pub fn euler(x: Fp, y: Fp, z: Fp) -> Quat {
        let hx = x.to_radians() / Fp::TWO;
        let hy = y.to_radians() / Fp::TWO;
        let hz = z.to_radians() / Fp::TWO;
        let qx = Quat::new(hx.sin(), Fp::ZERO, Fp::ZERO, hx.cos());
        let qy = Quat::new(Fp::ZERO, hy.sin(), Fp::ZERO, hy.cos());
        let qz = Quat::new(Fp::ZERO, Fp::ZERO, hz.sin(), hz.cos());
        qy * qx * qz
    }

    /// Euler angles in degrees, each in `[-180, 180]`.
    pub fn as_euler(self) -> Vec3 {
        let Quat { x, y, z, w } = self;
        let two = Fp::TWO;
        let pitch = (two * (w * x - y * z)).asin();
        let yaw = Fp::atan2(two * (w * y + x * z), Fp::ONE - two * (x * x + y * y));
        let roll = Fp::atan2(two * (w * z + x * y), Fp::ONE - two * (x * x + z * z));
        Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
    }

    pub fn dot(self, rhs: Quat) -> Fp {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    pub fn conjugate(self) -> Quat {
        Quat::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn normalized(self) -> Quat {
        let len = self.dot(self).sqrt();
        if len.is_zero() {
            return Quat::IDENTITY;
        }
        Quat::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }

    /// Spherical interpolation along the shorter arc.
    pub fn slerp(from: Quat, to: Quat, t: Fp) -> Quat {
        let t = t.clamp01();
        let mut to = to;
        let mut cos = from.dot(to);
        if cos < Fp::ZERO {
            to = Quat::new(-to.x, -to.y, -to.z, -to.w);
            cos = -cos;
        }

        // nearly parallel: fall back to normalized lerp
        if cos > Fp::from_ratio(9995, 10000) {
            return Quat::new(
                Fp::lerp(from.x, to.x, t),
                Fp::lerp(from.y, to.y, t),
                Fp::lerp(from.z, to.z, t),
                Fp::lerp(from.w, to.w, t),
            )
            .normalized();
        }

        let theta = cos.acos();
        let sin_theta = theta.sin();
        let a = ((Fp::ONE - t) * theta).sin() / sin_theta;
        let b = (t * theta).sin() / sin_theta;
        Quat::new(
            from.x * a + to.x * b,
            from.y * a + to.y * b,
            from.z * a + to.z * b,
            from.w * a + to.w * b,
        )
        .normalized()
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * Fp::TWO;
        v + t * self.w + q.cross(t)
    }

    pub fn forward(self) -> Vec3 {
        self.rotate(Vec3::FORWARD)
    }

    pub fn up(self) -> Vec3 {
        self.rotate(Vec3::UP)
    }

    pub fn right(self) -> Vec3 {
        self.rotate(Vec3::RIGHT)
    }
}

impl Mul for Quat {
    type Output = Quat;
    fn mul(self, r: Quat) -> Quat {
        Quat::new(
            self.w * r.x + self.x * r.w + self.y * r.z - self.z * r.y,
            self.w * r.y - self.x * r.z + self.y * r.w + self.z * r.x,
            self.w * r.z + self.x * r.y - self.y * r.x + self.z * r.w,
            self.w * r.w - self.x * r.x - self.y * r.y - self.z * r.z,
        )
    }
}
