//! Q48.16 fixed-point scalar
//!
//! Every value the simulation stores or computes goes through `Fp`. The
//! representation is a plain `i64`, so arithmetic is identical on every
//! platform and compiler.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of fractional bits
pub const FRAC_BITS: u32 = 16;
const ONE_RAW: i64 = 1 << FRAC_BITS;

/// Fixed-point number with 16 fractional bits
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fp(i64);

impl Fp {
    pub const ZERO: Fp = Fp(0);
    pub const ONE: Fp = Fp(ONE_RAW);
    pub const HALF: Fp = Fp(ONE_RAW / 2);
    pub const TWO: Fp = Fp(ONE_RAW * 2);
    pub const MAX: Fp = Fp(i64::MAX);
    pub const MIN: Fp = Fp(i64::MIN);
    pub const EPSILON: Fp = Fp(1);

    pub const PI: Fp = Fp(205_887);
    pub const TWO_PI: Fp = Fp(411_775);
    pub const HALF_PI: Fp = Fp(102_944);
    pub const DEG_TO_RAD: Fp = Fp(1_144);
    pub const RAD_TO_DEG: Fp = Fp(3_754_936);

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Fp(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn from_int(v: i64) -> Self {
        Fp(v << FRAC_BITS)
    }

    /// `num / den` computed at compile time where possible.
    #[inline]
    pub const fn from_ratio(num: i64, den: i64) -> Self {
        Fp((num << FRAC_BITS) / den)
    }

    /// Only used at the serde boundary, never inside a tick. Exact below 2^37.
    pub fn from_f64(v: f64) -> Self {
        Fp((v * ONE_RAW as f64).round() as i64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / ONE_RAW as f64
    }

    /// Floor to integer.
    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 >> FRAC_BITS
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Fp(self.0.saturating_abs())
    }

    /// -1, 0 or 1
    #[inline]
    pub const fn sign(self) -> Self {
        Fp::from_int(self.0.signum())
    }

    #[inline]
    pub fn min(self, other: Fp) -> Fp {
        Ord::min(self, other)
    }

    #[inline]
    pub fn max(self, other: Fp) -> Fp {
        Ord::max(self, other)
    }

    #[inline]
    pub fn clamp(self, lo: Fp, hi: Fp) -> Fp {
        self.max(lo).min(hi)
    }

    #[inline]
    pub fn clamp01(self) -> Fp {
        self.clamp(Fp::ZERO, Fp::ONE)
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn to_radians(self) -> Fp {
        self * Fp::DEG_TO_RAD
    }

    pub fn to_degrees(self) -> Fp {
        self * Fp::RAD_TO_DEG
    }

    pub fn lerp(a: Fp, b: Fp, t: Fp) -> Fp {
        a + (b - a) * t
    }

    /// Square root by integer Newton iteration; negative input yields zero.
    pub fn sqrt(self) -> Fp {
        if self.0 <= 0 {
            return Fp::ZERO;
        }
        let n = (self.0 as u128) << FRAC_BITS;
        let mut x = n;
        let mut y = (x + 1) / 2;
        while y < x {
            x = y;
            y = (x + n / x) / 2;
        }
        Fp(x as i64)
    }

    /// Wrap an angle in radians into `[-PI, PI]`.
    pub fn wrap_angle(self) -> Fp {
        let mut a = Fp(self.0.rem_euclid(Fp::TWO_PI.0));
        if a > Fp::PI {
            a -= Fp::TWO_PI;
        }
        a
    }

    pub fn sin(self) -> Fp {
        let mut x = self.wrap_angle();
        // fold into [-PI/2, PI/2]
        if x > Fp::HALF_PI {
            x = Fp::PI - x;
        } else if x < -Fp::HALF_PI {
            x = -Fp::PI - x;
        }
        let x2 = x * x;
        // x - x^3/3! + x^5/5! - x^7/7! + x^9/9!
        let mut term = x;
        let mut sum = x;
        for div in [6, 20, 42, 72] {
            term = -(term * x2) / Fp::from_int(div);
            sum += term;
        }
        sum.clamp(-Fp::ONE, Fp::ONE)
    }

    pub fn cos(self) -> Fp {
        (self + Fp::HALF_PI).sin()
    }

    /// Polynomial arctangent for |z| <= 1.
    fn atan_unit(z: Fp) -> Fp {
        const COEFFS: [Fp; 8] = [
            Fp(-21_845),
            Fp(13_103),
            Fp(-9_312),
            Fp(6_984),
            Fp(-4_934),
            Fp(2_812),
            Fp(-1_059),
            Fp(188),
        ];
        let z2 = z * z;
        let mut acc = Fp::ZERO;
        for c in COEFFS.iter().rev() {
            acc = (acc + *c) * z2;
        }
        z * (Fp::ONE + acc)
    }

    pub fn atan2(y: Fp, x: Fp) -> Fp {
        if x.is_zero() && y.is_zero() {
            return Fp::ZERO;
        }
        if x.is_zero() {
            return if y > Fp::ZERO { Fp::HALF_PI } else { -Fp::HALF_PI };
        }
        let (ax, ay) = (x.abs(), y.abs());
        let base = if ay <= ax {
            Self::atan_unit(ay / ax)
        } else {
            Fp::HALF_PI - Self::atan_unit(ax / ay)
        };
        let angle = if x > Fp::ZERO { base } else { Fp::PI - base };
        if y < Fp::ZERO {
            -angle
        } else {
            angle
        }
    }

    pub fn asin(self) -> Fp {
        let v = self.clamp(-Fp::ONE, Fp::ONE);
        Fp::atan2(v, (Fp::ONE - v * v).sqrt())
    }

    pub fn acos(self) -> Fp {
        let v = self.clamp(-Fp::ONE, Fp::ONE);
        Fp::atan2((Fp::ONE - v * v).sqrt(), v)
    }
}

impl From<i32> for Fp {
    fn from(v: i32) -> Self {
        Fp::from_int(v as i64)
    }
}

impl Add for Fp {
    type Output = Fp;
    #[inline]
    fn add(self, rhs: Fp) -> Fp {
        Fp(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fp {
    type Output = Fp;
    #[inline]
    fn sub(self, rhs: Fp) -> Fp {
        Fp(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for Fp {
    type Output = Fp;
    #[inline]
    fn mul(self, rhs: Fp) -> Fp {
        Fp(((self.0 as i128 * rhs.0 as i128) >> FRAC_BITS) as i64)
    }
}

impl Div for Fp {
    type Output = Fp;
    /// Saturates on division by zero.
    #[inline]
    fn div(self, rhs: Fp) -> Fp {
        if rhs.0 == 0 {
            return match self.0.cmp(&0) {
                Ordering::Greater => Fp::MAX,
                Ordering::Less => Fp::MIN,
                Ordering::Equal => Fp::ZERO,
            };
        }
        let q = ((self.0 as i128) << FRAC_BITS) / rhs.0 as i128;
        Fp(q.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

impl Neg for Fp {
    type Output = Fp;
    #[inline]
    fn neg(self) -> Fp {
        Fp(self.0.saturating_neg())
    }
}

impl AddAssign for Fp {
    fn add_assign(&mut self, rhs: Fp) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fp {
    fn sub_assign(&mut self, rhs: Fp) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fp {
    fn mul_assign(&mut self, rhs: Fp) {
        *self = *self * rhs;
    }
}

impl DivAssign for Fp {
    fn div_assign(&mut self, rhs: Fp) {
        *self = *self / rhs;
    }
}

impl fmt::Debug for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.to_f64())
    }
}

/// Largest raw magnitude whose decimal form is exact as an `f64`.
const EXACT_RAW: i64 = 1 << 53;

/// Wire form: a plain number while it converts exactly, the raw bits beyond.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Repr {
    Value(f64),
    Raw { raw: i64 },
}

impl Serialize for Fp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = if self.0.unsigned_abs() <= EXACT_RAW as u64 {
            Repr::Value(self.to_f64())
        } else {
            Repr::Raw { raw: self.0 }
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Fp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Value(v) => Fp::from_f64(v),
            Repr::Raw { raw } => Fp(raw),
        })
    }
}
