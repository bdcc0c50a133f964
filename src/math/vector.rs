//! Fixed-point vectors

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::Fp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: Fp,
    pub y: Fp,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: Fp::ZERO, y: Fp::ZERO };

    pub const fn new(x: Fp, y: Fp) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Three-component vector. Left-handed: +X right, +Y up, +Z forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: Fp,
    pub y: Fp,
    pub z: Fp,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(Fp::ZERO, Fp::ZERO, Fp::ZERO);
    pub const ONE: Vec3 = Vec3::new(Fp::ONE, Fp::ONE, Fp::ONE);
    pub const UP: Vec3 = Vec3::new(Fp::ZERO, Fp::ONE, Fp::ZERO);
    pub const DOWN: Vec3 = Vec3::new(Fp::ZERO, Fp::from_int(-1), Fp::ZERO);
    pub const FORWARD: Vec3 = Vec3::new(Fp::ZERO, Fp::ZERO, Fp::ONE);
    pub const RIGHT: Vec3 = Vec3::new(Fp::ONE, Fp::ZERO, Fp::ZERO);

    pub const fn new(x: Fp, y: Fp, z: Fp) -> Self {
        Self { x, y, z }
    }

    pub const fn from_ints(x: i64, y: i64, z: i64) -> Self {
        Self::new(Fp::from_int(x), Fp::from_int(y), Fp::from_int(z))
    }

    pub fn dot(self, rhs: Vec3) -> Fp {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn sqr_magnitude(self) -> Fp {
        self.dot(self)
    }

    pub fn magnitude(self) -> Fp {
        self.sqr_magnitude().sqrt()
    }

    /// Unit vector, or zero for a zero-length input.
    pub fn normalized(self) -> Vec3 {
        let len = self.magnitude();
        if len.is_zero() {
            return Vec3::ZERO;
        }
        Vec3::new(self.x / len, self.y / len, self.z / len)
    }

    /// Projection of `self` onto `onto`.
    pub fn project(self, onto: Vec3) -> Vec3 {
        let sqr = onto.sqr_magnitude();
        if sqr.is_zero() {
            return Vec3::ZERO;
        }
        onto * (self.dot(onto) / sqr)
    }

    /// Component-wise product.
    pub fn scale(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    /// Component-wise division; zero components of `rhs` yield zero.
    pub fn div_components(self, rhs: Vec3) -> Vec3 {
        let d = |a: Fp, b: Fp| if b.is_zero() { Fp::ZERO } else { a / b };
        Vec3::new(d(self.x, rhs.x), d(self.y, rhs.y), d(self.z, rhs.z))
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Fp> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: Fp) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for Fp {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Vec3 {
        rhs * self
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        *self = *self - rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_is_left_handed_basis() {
        // right x up = forward in this basis
        assert_eq!(Vec3::RIGHT.cross(Vec3::UP), Vec3::FORWARD);
    }

    #[test]
    fn test_normalized_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        let v = Vec3::from_ints(0, 3, 4).normalized();
        assert!((v.magnitude() - Fp::ONE).abs() <= Fp::from_raw(4));
    }

    #[test]
    fn test_project() {
        let v = Vec3::from_ints(2, 5, 0);
        assert_eq!(v.project(Vec3::UP), Vec3::from_ints(0, 5, 0));
    }
}
