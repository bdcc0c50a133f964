//! Per-entity component data
//!
//! Components are plain data. Cross-entity relationships are stored as
//! `EntityRef` values and resolved through the `World` on every use.

use serde::{Deserialize, Serialize};

use crate::ecs::EntityRef;
use crate::math::{Fp, Quat, Vec2, Vec3};

use super::assets::{PrototypeRef, TerrainModifierRef, VehicleRef};

/// Connected player slot
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerRef(pub u16);

impl std::fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// World pose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation.forward()
    }

    pub fn up(&self) -> Vec3 {
        self.rotation.up()
    }

    pub fn down(&self) -> Vec3 {
        -self.rotation.up()
    }

    pub fn right(&self) -> Vec3 {
        self.rotation.right()
    }

    /// Local point to world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation.rotate(local)
    }

    /// Write a rotation, normalizing it.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalized();
    }

    /// Rotate by `angle` degrees around a local-space axis.
    pub fn rotate(&mut self, axis: Vec3, angle: Fp) {
        self.set_rotation(self.rotation * Quat::angle_axis(angle, axis));
    }

    /// Rotate by local Euler angles in degrees.
    pub fn rotate_euler(&mut self, x: Fp, y: Fp, z: Fp) {
        self.set_rotation(self.rotation * Quat::euler(x, y, z));
    }
}

/// Rigid-body dynamics state. Forces and torque accumulate during the tick
/// and are consumed by the physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsBody {
    pub mass: Fp,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub drag: Fp,
    pub angular_drag: Fp,
    pub gravity_scale: Fp,
    /// Diagonal of the local-space inertia tensor
    pub inertia_tensor: Vec3,
    pub force: Vec3,
    pub torque: Vec3,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            mass: Fp::ONE,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            drag: Fp::ZERO,
            angular_drag: Fp::from_ratio(1, 20),
            gravity_scale: Fp::ONE,
            inertia_tensor: Vec3::ONE,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        }
    }
}

impl PhysicsBody {
    pub fn set_inertia_tensor(&mut self, tensor: Vec3) {
        self.inertia_tensor = tensor;
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Force applied at a world-space point, producing torque about the
    /// body's center (the transform position).
    pub fn add_force_at_position(&mut self, force: Vec3, position: Vec3, transform: &Transform) {
        self.force += force;
        self.torque += (position - transform.position).cross(force);
    }

    pub fn add_linear_impulse(&mut self, impulse: Vec3) {
        if self.mass.is_zero() {
            return;
        }
        self.velocity += impulse * (Fp::ONE / self.mass);
    }

    pub fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }
}

/// Sphere collision volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collider {
    pub radius: Fp,
    pub is_trigger: bool,
    pub layer: u32,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            radius: Fp::HALF,
            is_trigger: false,
            layer: crate::physics::LAYER_DYNAMIC,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelData {
    pub anchor_position: Vec3,
    pub hit_point: Vec3,
    pub hit_point_previous: Vec3,
    pub hit_normal: Vec3,
    pub compression: Fp,
    pub compression_previous: Fp,
    pub suspension_force: Fp,
    pub grounded: bool,
    pub grounded_previous: bool,
    pub steer_angle: Fp,
    pub rotation_speed: Fp,
    /// Terrain modifier under the wheel this tick
    pub modifier: Option<TerrainModifierRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisData {
    pub left: WheelData,
    pub right: WheelData,
    pub grounded: bool,
    pub steer_angle: Fp,
    pub downforce: Fp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drivetrain {
    pub engine_rpm: Fp,
    pub gear: usize,
    /// Seconds until another gear change is allowed
    pub shift_timer: Fp,
}

/// Suspension and drivetrain runtime data. `axes` has one entry per axle of
/// the referenced archetype, fixed at spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleState {
    pub config: VehicleRef,
    pub axes: Vec<AxisData>,
    pub grounded: bool,
    pub total_compression: Fp,
    pub drivetrain: Drivetrain,
}

impl VehicleState {
    pub fn new(config: VehicleRef, axle_count: usize) -> Self {
        Self {
            config,
            axes: vec![AxisData::default(); axle_count],
            grounded: false,
            total_compression: Fp::ZERO,
            drivetrain: Drivetrain::default(),
        }
    }
}

/// Combat-relevant tank state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerVehicle {
    /// x: pitch in degrees, y: yaw in degrees
    pub look_direction: Vec2,
    pub current_health: i32,
    pub aiming: bool,
}

impl Default for PlayerVehicle {
    fn default() -> Self {
        Self {
            look_direction: Vec2::ZERO,
            current_health: 100,
            aiming: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLink {
    pub player: PlayerRef,
}

/// On the tank body: which turret entity to drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretUpdater {
    pub turret: EntityRef,
    pub body: EntityRef,
    pub turret_prototype: PrototypeRef,
}

/// On the turret entity (and mirrored on the body): the barrel and body
/// back-reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Turret {
    pub barrel: EntityRef,
    pub body: EntityRef,
    pub barrel_prototype: PrototypeRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireCoolDown {
    pub remaining: Fp,
    pub projectile_prototype: PrototypeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projectile {
    pub owner: EntityRef,
    pub remaining_lifetime: Fp,
    pub speed: Fp,
    pub explosion_prototype: PrototypeRef,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            owner: EntityRef::NONE,
            remaining_lifetime: Fp::from_int(3),
            speed: Fp::from_int(30),
            explosion_prototype: PrototypeRef::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Explosion {
    pub radius: Fp,
    pub damage: i32,
    /// Base push impulse at the center
    pub impulse: Fp,
    pub owner: EntityRef,
    pub remaining_lifetime: Fp,
}

impl Default for Explosion {
    fn default() -> Self {
        Self {
            radius: Fp::from_int(3),
            damage: 40,
            impulse: Fp::from_int(14),
            owner: EntityRef::NONE,
            remaining_lifetime: Fp::HALF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_at_position_produces_torque() {
        let transform = Transform::at(Vec3::from_ints(0, 1, 0));
        let mut body = PhysicsBody::default();
        body.add_force_at_position(Vec3::UP, Vec3::from_ints(1, 1, 0), &transform);
        assert_eq!(body.force, Vec3::UP);
        // lever along +X, force along +Y
        assert_eq!(body.torque, Vec3::FORWARD);
    }

    #[test]
    fn test_impulse_scales_with_mass() {
        let mut body = PhysicsBody {
            mass: Fp::TWO,
            ..Default::default()
        };
        body.add_linear_impulse(Vec3::from_ints(0, 4, 0));
        assert_eq!(body.velocity, Vec3::from_ints(0, 2, 0));
    }

    #[test]
    fn test_transform_point_uses_rotation() {
        let mut transform = Transform::at(Vec3::from_ints(5, 0, 0));
        transform.rotate(Vec3::UP, Fp::from_int(180));
        let p = transform.transform_point(Vec3::FORWARD);
        assert!((p.z + Fp::ONE).abs() < Fp::from_ratio(1, 100));
        assert!((p.x - Fp::from_int(5)).abs() < Fp::from_ratio(1, 100));
    }
}
