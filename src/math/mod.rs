//! Deterministic fixed-point math
//!
//! No `f32`/`f64` arithmetic is allowed in simulation code; everything goes
//! through these types.

pub mod curve;
pub mod fixed;
pub mod quaternion;
pub mod vector;

pub use curve::{Curve, CurveKey};
pub use fixed::Fp;
pub use quaternion::Quat;
pub use vector::{Vec2, Vec3};
