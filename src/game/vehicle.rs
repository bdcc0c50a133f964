//! Vehicle model: suspension, grip, drivetrain and steering
//!
//! `VehicleConfig` is a static archetype shared by every tank that uses it.
//! `VehicleConfig::update` is the per-tick procedure; its step order is
//! load-bearing (later steps read what earlier ones wrote) and must not be
//! rearranged.

use serde::{Deserialize, Serialize};

use crate::math::{Curve, Fp, Vec3};
use crate::physics::{PhysicsQuery, QueryOptions, LAYER_GROUND};

use super::assets::AssetDb;
use super::components::{AxisData, Drivetrain, PhysicsBody, Transform, VehicleState, WheelData};
use super::input::{Buttons, Input};

/// Gravity scale while grounded or climbing
const NEUTRAL_GRAVITY_SCALE: Fp = Fp::from_ratio(6, 5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    /// Steerable axle
    pub turn: bool,
    /// Driven axle
    pub traction: bool,
    pub max_steer_angle: Fp,
    /// Forward offset from the body origin
    pub offset: Fp,
    /// Suspension anchor height below the body origin
    pub height: Fp,
    /// Distance between the two wheels
    pub width: Fp,
    pub spring: Fp,
    pub damper: Fp,
    pub torsion_bar_factor: Fp,
    pub suspension_travel: Fp,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            turn: false,
            traction: false,
            max_steer_angle: Fp::from_int(30),
            offset: Fp::ZERO,
            height: Fp::from_ratio(3, 4),
            width: Fp::ONE,
            spring: Fp::from_int(10),
            damper: Fp::ONE,
            torsion_bar_factor: Fp::from_ratio(3, 4),
            suspension_travel: Fp::from_ratio(1, 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripSettings {
    /// Lateral grip over normalized sideways speed
    pub grip: Curve,
    pub grip_intensity: Fp,
    /// Speed that maps to 1.0 on the grip and steer curves
    pub speed_scale: Fp,
    pub grip_height_offset: Fp,
}

impl Default for GripSettings {
    fn default() -> Self {
        Self {
            grip: Curve::constant(Fp::ONE),
            grip_intensity: Fp::from_int(10),
            speed_scale: Fp::from_int(10),
            grip_height_offset: -Fp::from_ratio(1, 10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub collision_mask: u32,
    pub wheel_radius: Fp,
    pub wheel_mass: Fp,
    pub grip: GripSettings,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            collision_mask: LAYER_GROUND,
            wheel_radius: Fp::from_ratio(1, 4),
            wheel_mass: Fp::from_ratio(1, 4),
            grip: GripSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Torque multiplier over `rpm / max_rpm`
    pub torque_curve: Curve,
    pub max_torque: Fp,
    pub max_rpm: Fp,
    pub min_rpm: Fp,
    pub flywheel_mass: Fp,
    pub flywheel_radius: Fp,
    pub gear_ratios: Vec<Fp>,
    pub differential_ratio: Fp,
    pub gear_up_rpm: Fp,
    pub gear_down_rpm: Fp,
    /// Seconds after a shift before the engine delivers torque again
    pub shift_cooldown: Fp,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            torque_curve: Curve::constant(Fp::ONE),
            max_torque: Fp::from_int(20),
            max_rpm: Fp::from_int(6000),
            min_rpm: Fp::from_int(800),
            flywheel_mass: Fp::ONE,
            flywheel_radius: Fp::ONE,
            gear_ratios: vec![
                Fp::from_int(5),
                Fp::from_int(4),
                Fp::from_int(3),
                Fp::from_int(2),
            ],
            differential_ratio: Fp::TWO,
            gear_up_rpm: Fp::from_int(4000),
            gear_down_rpm: Fp::from_int(1500),
            shift_cooldown: Fp::from_ratio(1, 4),
        }
    }
}

fn radians_to_rpm() -> Fp {
    Fp::from_int(60) / Fp::TWO_PI
}

fn rpm_to_radians() -> Fp {
    Fp::TWO_PI / Fp::from_int(60)
}

impl EngineSettings {
    fn gear_ratio(&self, gear: usize) -> Fp {
        self.gear_ratios.get(gear).copied().unwrap_or(Fp::ONE)
    }

    fn clamp_gear(&self, gear: usize) -> usize {
        gear.min(self.gear_ratios.len().saturating_sub(1))
    }

    fn shift(&self, drivetrain: &mut Drivetrain, gear: usize) {
        let gear = self.clamp_gear(gear);
        if gear != drivetrain.gear {
            drivetrain.gear = gear;
            drivetrain.shift_timer = self.shift_cooldown;
        }
    }

    fn torque(&self, drivetrain: &Drivetrain, with_gear: bool) -> Fp {
        // rev limiter, with one rpm of slack for rounding
        if drivetrain.engine_rpm + Fp::ONE >= self.max_rpm {
            return Fp::ZERO;
        }
        let key = drivetrain.engine_rpm / self.max_rpm;
        let ratio = if with_gear {
            self.gear_ratio(drivetrain.gear)
        } else {
            Fp::ONE
        };
        self.torque_curve.evaluate(key) * self.max_torque * ratio * self.differential_ratio
    }

    /// Engine rpm follows the wheels through the current gear; may shift down.
    pub fn update_rpm(&self, drivetrain: &mut Drivetrain, wheel_angular_speed: Fp) {
        let ratio = self.gear_ratio(drivetrain.gear) * self.differential_ratio;
        drivetrain.engine_rpm =
            (wheel_angular_speed.abs() * radians_to_rpm() * ratio).clamp(self.min_rpm, self.max_rpm);
        if drivetrain.engine_rpm < self.gear_down_rpm && drivetrain.gear > 0 {
            self.shift(drivetrain, drivetrain.gear - 1);
        }
    }

    /// Throttle for one tick: spins the engine up, may shift up, and returns
    /// the geared torque. Zero while a shift is in progress.
    pub fn accelerate(&self, drivetrain: &mut Drivetrain, delta: Fp) -> Fp {
        if drivetrain.shift_timer > Fp::ZERO {
            return Fp::ZERO;
        }
        let inertia = self.flywheel_mass * self.flywheel_radius * self.flywheel_radius / Fp::TWO;
        let mut radians = drivetrain.engine_rpm * rpm_to_radians();
        radians += self.torque(drivetrain, false) * delta / inertia;
        drivetrain.engine_rpm = (radians * radians_to_rpm()).clamp(self.min_rpm, self.max_rpm);
        if drivetrain.engine_rpm > self.gear_up_rpm {
            self.shift(drivetrain, drivetrain.gear + 1);
        }
        self.torque(drivetrain, true)
    }

    /// Geared torque at full output in first gear, used to normalize drive force.
    fn peak_torque(&self) -> Fp {
        self.max_torque * self.gear_ratio(0) * self.differential_ratio
    }
}

/// Static vehicle archetype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub name: String,
    pub wheel: WheelConfig,
    pub axes: Vec<AxisConfig>,
    /// Push suspension along world up instead of body up
    pub use_global_up: bool,
    pub ground_drag: Fp,
    pub air_drag: Fp,
    pub down_gravity_scale: Fp,
    pub parametric_inertia: Vec3,
    pub front_wing_coefficient: Fp,
    pub rear_wing_coefficient: Fp,
    /// Steering response over normalized forward speed
    pub steer_curve: Curve,
    /// Degrees per second at full steer
    pub turn_speed: Fp,
    pub max_angular_speed: Fp,
    pub air_control_factor: Fp,
    pub acceleration: Fp,
    pub brake: Fp,
    pub jump_impulse: Fp,
    pub engine: EngineSettings,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            wheel: WheelConfig::default(),
            axes: Vec::new(),
            use_global_up: false,
            ground_drag: Fp::HALF,
            air_drag: Fp::ZERO,
            down_gravity_scale: Fp::from_int(3),
            parametric_inertia: Vec3::from_ints(2, 5, 2),
            front_wing_coefficient: Fp::from_ratio(1, 4),
            rear_wing_coefficient: Fp::from_ratio(1, 4),
            steer_curve: Curve::constant(Fp::ONE),
            turn_speed: Fp::from_int(90),
            max_angular_speed: Fp::ONE,
            air_control_factor: Fp::ZERO,
            acceleration: Fp::from_int(10),
            brake: Fp::from_int(10),
            jump_impulse: Fp::from_ratio(5, 6),
            engine: EngineSettings::default(),
        }
    }
}

/// Everything `VehicleConfig::update` touches for one entity
pub struct VehicleContext<'a> {
    pub transform: &'a mut Transform,
    pub body: &'a mut PhysicsBody,
    pub state: &'a mut VehicleState,
    pub input: &'a Input,
    pub physics: &'a dyn PhysicsQuery,
    pub assets: &'a AssetDb,
    pub delta: Fp,
    /// Ticks per second
    pub update_rate: Fp,
}

/// Averaged terrain multipliers under the wheels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Modifiers {
    grip: Fp,
    drag: Fp,
}

impl VehicleConfig {
    /// Closed-form inertia from the parametric box extents.
    pub fn inertia_tensor(&self) -> Vec3 {
        let p = self.parametric_inertia;
        let third = Fp::from_ratio(1, 3);
        Vec3::new(
            (p.z * p.z + p.y * p.y) * third,
            (p.z * p.z + p.x * p.x) * third,
            (p.x * p.x + p.y * p.y) * third,
        )
    }

    pub fn update(&self, ctx: &mut VehicleContext<'_>) {
        // sized at spawn from this config; a mismatch means a foreign state
        if self.axes.is_empty() || ctx.state.axes.len() != self.axes.len() {
            return;
        }
        if ctx.state.drivetrain.shift_timer > Fp::ZERO {
            ctx.state.drivetrain.shift_timer -= ctx.delta;
        }

        ctx.state.grounded = false;
        ctx.body.set_inertia_tensor(self.inertia_tensor());

        self.update_suspension(ctx);
        let modifiers = self.update_modifiers(ctx);

        let drag = if ctx.state.grounded {
            self.ground_drag
        } else {
            self.air_drag
        };
        ctx.body.drag = drag * modifiers.drag;

        self.update_accel(ctx);
        self.update_steer(ctx, modifiers.grip);
        self.update_downforce(ctx);
        self.update_gravity_scale(ctx);
    }

    fn update_suspension(&self, ctx: &mut VehicleContext<'_>) {
        ctx.state.total_compression = Fp::ZERO;
        for (index, axis) in self.axes.iter().enumerate() {
            let grounded = self.update_axle(ctx, index, axis);
            let data = &ctx.state.axes[index];
            if grounded {
                ctx.state.grounded = true;
            }
            ctx.state.total_compression += data.left.compression + data.right.compression;
        }
    }

    /// Cast both wheels, apply anti-roll and push the body up. Returns the
    /// axle's grounded state.
    fn update_axle(&self, ctx: &mut VehicleContext<'_>, index: usize, axis: &AxisConfig) -> bool {
        let transform = *ctx.transform;
        let down = transform.down();
        let anchor = Vec3::FORWARD * axis.offset + Vec3::DOWN * axis.height;
        let side = Vec3::RIGHT * (axis.width / Fp::TWO);

        let left_anchor = transform.transform_point(anchor - side);
        let right_anchor = transform.transform_point(anchor + side);

        let data: &mut AxisData = &mut ctx.state.axes[index];
        data.grounded = false;
        let grounded_right = self.cast_wheel(ctx.physics, axis, &mut data.right, right_anchor, down);
        let grounded_left = self.cast_wheel(ctx.physics, axis, &mut data.left, left_anchor, down);

        let mut anti_roll_left = Fp::ONE;
        let mut anti_roll_right = Fp::ONE;
        if axis.torsion_bar_factor > Fp::ZERO {
            let factor = axis.torsion_bar_factor * (data.right.compression - data.left.compression);
            anti_roll_right += factor;
            anti_roll_left -= factor;
        }

        let force_right = suspension_force(axis, &mut data.right, anti_roll_right, ctx.update_rate);
        let force_left = suspension_force(axis, &mut data.left, anti_roll_left, ctx.update_rate);
        data.grounded = grounded_left || grounded_right;
        let grounded = data.grounded;

        let mut up = -down;
        if self.use_global_up {
            up = up.project(Vec3::UP);
        }
        let contact = Vec3::FORWARD * axis.offset;
        let left_point = transform.transform_point(contact - side);
        let right_point = transform.transform_point(contact + side);
        ctx.body.add_force_at_position(up * force_left, left_point, &transform);
        ctx.body.add_force_at_position(up * force_right, right_point, &transform);
        grounded
    }

    fn cast_wheel(
        &self,
        physics: &dyn PhysicsQuery,
        axis: &AxisConfig,
        wheel: &mut WheelData,
        anchor: Vec3,
        down: Vec3,
    ) -> bool {
        wheel.modifier = None;
        wheel.anchor_position = anchor;
        wheel.hit_point_previous = wheel.hit_point;
        wheel.grounded_previous = wheel.grounded;

        let ray_length = axis.suspension_travel + self.wheel.wheel_radius;
        let hit = physics.raycast(
            anchor,
            down,
            ray_length,
            self.wheel.collision_mask,
            QueryOptions::SOLID,
        );

        match hit {
            Some(hit) => {
                if hit.is_static {
                    wheel.modifier = hit.modifier;
                }
                let travel = hit.distance - self.wheel.wheel_radius;
                wheel.compression = Fp::ONE - (travel / axis.suspension_travel).clamp01();
                wheel.hit_point = hit.point;
                wheel.hit_normal = hit.normal;
                wheel.grounded = true;
                true
            }
            None => {
                wheel.hit_point = Vec3::ZERO;
                wheel.hit_normal = Vec3::ZERO;
                wheel.compression = Fp::ZERO;
                wheel.grounded = false;
                false
            }
        }
    }

    fn update_modifiers(&self, ctx: &VehicleContext<'_>) -> Modifiers {
        let mut touched = false;
        let mut grip = Fp::ZERO;
        let mut drag = Fp::ZERO;
        for axis in &ctx.state.axes {
            for wheel in [&axis.left, &axis.right] {
                match wheel.modifier.and_then(|m| ctx.assets.terrain_modifier(m)) {
                    Some(modifier) => {
                        grip += modifier.grip_factor;
                        drag += modifier.drag_factor;
                        touched = true;
                    }
                    None => {
                        grip += Fp::ONE;
                        drag += Fp::ONE;
                    }
                }
            }
        }

        if !touched {
            return Modifiers {
                grip: Fp::ONE,
                drag: Fp::ONE,
            };
        }
        let wheels = Fp::from_int(2 * self.axes.len() as i64);
        Modifiers {
            grip: grip / wheels,
            drag: drag / wheels,
        }
    }

    fn update_accel(&self, ctx: &mut VehicleContext<'_>) {
        let transform = *ctx.transform;
        let forward = transform.forward();
        let forward_speed = ctx.body.velocity.dot(forward);
        let wheel_angular_speed = forward_speed / self.wheel.wheel_radius;

        let drivetrain = &mut ctx.state.drivetrain;
        self.engine.update_rpm(drivetrain, wheel_angular_speed);
        let throttle = if ctx.input.is_down(Buttons::FORWARD) {
            let peak = self.engine.peak_torque();
            if peak.is_zero() {
                Fp::ONE
            } else {
                (self.engine.accelerate(drivetrain, ctx.delta) / peak).clamp01()
            }
        } else {
            Fp::ZERO
        };

        let offset = Vec3::DOWN * self.wheel.grip.grip_height_offset;
        for (axis, data) in self.axes.iter().zip(ctx.state.axes.iter_mut()) {
            if !data.grounded {
                continue;
            }
            data.left.rotation_speed = wheel_angular_speed;
            data.right.rotation_speed = wheel_angular_speed;
            if !axis.traction {
                continue;
            }

            let point = transform.transform_point(Vec3::FORWARD * axis.offset + offset);
            if ctx.input.is_down(Buttons::BACKWARD) {
                ctx.body
                    .add_force_at_position(-forward * self.brake, point, &transform);
            }
            if !throttle.is_zero() {
                ctx.body
                    .add_force_at_position(forward * (self.acceleration * throttle), point, &transform);
            }
        }
    }

    fn update_steer(&self, ctx: &mut VehicleContext<'_>, grip_modifier: Fp) {
        let grounded = ctx.state.grounded;
        if !grounded && self.air_control_factor.is_zero() {
            return;
        }

        let speed_scale = self.wheel.grip.speed_scale;
        let forward_speed = ctx.body.velocity.dot(ctx.transform.forward());
        let steer_factor =
            self.steer_curve.evaluate((forward_speed / speed_scale).abs()) * forward_speed.sign();

        let mut turn = Fp::ZERO;
        if ctx.input.is_down(Buttons::LEFT) {
            turn -= Fp::ONE;
        }
        if ctx.input.is_down(Buttons::RIGHT) {
            turn += Fp::ONE;
        }

        if !grounded {
            turn *= self.air_control_factor;
        } else if ctx.input.is_down(Buttons::JUMP) {
            ctx.body.add_linear_impulse(Vec3::UP * self.jump_impulse);
        }

        let yaw = turn * steer_factor * self.turn_speed * ctx.delta;
        if !yaw.is_zero() {
            ctx.transform.rotate(Vec3::UP, yaw);
        }

        if !grounded {
            return;
        }

        let transform = *ctx.transform;
        let right = transform.right();
        let right_speed = -ctx.body.velocity.dot(right);
        let scaled = right_speed / speed_scale;
        let grip = self.wheel.grip.grip.evaluate(scaled.abs()) * grip_modifier;
        let grip_point = transform.position + transform.up() * self.wheel.grip.grip_height_offset;
        let force = right * (grip * self.wheel.grip.grip_intensity * scaled.sign());
        ctx.body.add_force_at_position(force, grip_point, &transform);

        if !self.max_angular_speed.is_zero()
            && ctx.body.angular_velocity.magnitude() > self.max_angular_speed
        {
            ctx.body.angular_velocity =
                ctx.body.angular_velocity.normalized() * self.max_angular_speed;
        }

        for (axis, data) in self.axes.iter().zip(ctx.state.axes.iter_mut()) {
            data.steer_angle = Fp::ZERO;
            if axis.turn {
                data.steer_angle = turn * axis.max_steer_angle;
                data.left.steer_angle = data.steer_angle;
                data.right.steer_angle = data.steer_angle;
            }
        }
    }

    /// Applied whether or not the vehicle is grounded.
    fn update_downforce(&self, ctx: &mut VehicleContext<'_>) {
        let transform = *ctx.transform;
        let forward_velocity = ctx.body.velocity.dot(transform.forward()).max(Fp::ZERO);
        let last = self.axes.len() - 1;
        for (index, (axis, data)) in self.axes.iter().zip(ctx.state.axes.iter_mut()).enumerate() {
            data.downforce = if index == 0 {
                forward_velocity * self.front_wing_coefficient
            } else if index == last {
                forward_velocity * self.rear_wing_coefficient
            } else {
                Fp::ZERO
            };
            let point = transform.transform_point(Vec3::new(Fp::ZERO, Fp::ZERO, axis.offset));
            ctx.body
                .add_force_at_position(transform.down() * data.downforce, point, &transform);
        }
    }

    fn update_gravity_scale(&self, ctx: &mut VehicleContext<'_>) {
        ctx.body.gravity_scale = if ctx.state.grounded || ctx.body.velocity.y >= Fp::ZERO {
            NEUTRAL_GRAVITY_SCALE
        } else {
            self.down_gravity_scale
        };
    }
}

/// Spring plus damper, floored at zero. A wheel that was or is fully
/// extended produces no force this tick.
fn suspension_force(axis: &AxisConfig, wheel: &mut WheelData, anti_roll: Fp, update_rate: Fp) -> Fp {
    if wheel.compression_previous.is_zero() || wheel.compression.is_zero() {
        wheel.compression_previous = wheel.compression;
        wheel.suspension_force = Fp::ZERO;
        return Fp::ZERO;
    }

    let spring = wheel.compression * axis.spring * anti_roll;
    let contact_speed = (wheel.compression - wheel.compression_previous) * update_rate;
    let force = (spring + contact_speed * axis.damper).max(Fp::ZERO);
    wheel.compression_previous = wheel.compression;
    wheel.suspension_force = force;
    force
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::assets::VehicleRef;
    use crate::math::Vec2;
    use crate::physics::Arena;

    struct Rig {
        transform: Transform,
        body: PhysicsBody,
        state: VehicleState,
    }

    fn rig(config: &VehicleConfig, height: Fp, x: i64, z: i64) -> Rig {
        Rig {
            transform: Transform::at(Vec3::new(Fp::from_int(x), height, Fp::from_int(z))),
            body: PhysicsBody::default(),
            state: VehicleState::new(VehicleRef(0), config.axes.len()),
        }
    }

    fn run(config: &VehicleConfig, rig: &mut Rig, input: Input) {
        let assets = AssetDb::builtin();
        let arena = Arena::builtin();
        let mut ctx = VehicleContext {
            transform: &mut rig.transform,
            body: &mut rig.body,
            state: &mut rig.state,
            input: &input,
            physics: &arena,
            assets: &assets,
            delta: Fp::from_ratio(1, 60),
            update_rate: Fp::from_int(60),
        };
        config.update(&mut ctx);
    }

    fn tank() -> VehicleConfig {
        AssetDb::builtin().vehicles[0].clone()
    }

    #[test]
    fn test_inertia_tensor_closed_form() {
        let config = VehicleConfig::default();
        let tensor = config.inertia_tensor();
        // (2^2 + 5^2) / 3 and (2^2 + 2^2) / 3
        assert!((tensor.x - Fp::from_ratio(29, 3)).abs() < Fp::from_ratio(1, 100));
        assert!((tensor.y - Fp::from_ratio(8, 3)).abs() < Fp::from_ratio(1, 100));
        assert_eq!(tensor.x, tensor.z);
    }

    #[test]
    fn test_airborne_vehicle_is_ungrounded() {
        let config = tank();
        let mut rig = rig(&config, Fp::from_int(10), 0, 0);
        run(&config, &mut rig, Input::default());
        assert!(!rig.state.grounded);
        assert_eq!(rig.state.total_compression, Fp::ZERO);
        assert!(rig.state.axes.iter().all(|a| !a.grounded));
        assert_eq!(rig.body.drag, config.air_drag);
    }

    #[test]
    fn test_grounded_compression_and_first_contact_has_no_force() {
        let config = tank();
        // anchors sit 0.1 above the floor: (0.1 - 0.25) / 0.25 clamps to 0
        let mut rig = rig(&config, Fp::from_ratio(17, 20), 0, 0);
        run(&config, &mut rig, Input::default());
        assert!(rig.state.grounded);
        let wheel = rig.state.axes[0].left;
        assert_eq!(wheel.compression, Fp::ONE);
        // previous compression was zero, so the spring is skipped this tick
        assert_eq!(wheel.suspension_force, Fp::ZERO);
        assert_eq!(wheel.compression_previous, Fp::ONE);

        run(&config, &mut rig, Input::default());
        let wheel = rig.state.axes[0].left;
        assert_eq!(wheel.suspension_force, config.axes[0].spring);
        assert_eq!(rig.body.drag, config.ground_drag);
    }

    #[test]
    fn test_downgravity_only_when_falling() {
        let config = tank();
        let mut rig = rig(&config, Fp::from_int(10), 0, 0);
        rig.body.velocity = Vec3::from_ints(0, -1, 0);
        run(&config, &mut rig, Input::default());
        assert_eq!(rig.body.gravity_scale, config.down_gravity_scale);

        rig.body.velocity = Vec3::from_ints(0, 1, 0);
        run(&config, &mut rig, Input::default());
        assert_eq!(rig.body.gravity_scale, NEUTRAL_GRAVITY_SCALE);
    }

    #[test]
    fn test_mud_halves_grip_and_doubles_drag() {
        let config = tank();
        let mut rig = rig(&config, Fp::from_ratio(17, 20), 0, 30);
        run(&config, &mut rig, Input::default());
        // builtin mud: grip 0.5, drag 2.0 under all four wheels
        assert_eq!(rig.body.drag, config.ground_drag * Fp::TWO);
    }

    #[test]
    fn test_forward_intent_pushes_forward() {
        let config = tank();
        let mut rig = rig(&config, Fp::from_ratio(17, 20), 0, 0);
        let input = Input::new(Buttons::FORWARD, Vec2::ZERO);
        run(&config, &mut rig, input);
        assert!(rig.body.force.z > Fp::ZERO);
        assert!(rig.state.drivetrain.engine_rpm >= config.engine.min_rpm);
    }

    #[test]
    fn test_steering_rotates_about_up() {
        let config = tank();
        let mut rig = rig(&config, Fp::from_ratio(17, 20), 0, 0);
        rig.body.velocity = Vec3::from_ints(0, 0, 5);
        let input = Input::new(Buttons::RIGHT, Vec2::ZERO);
        run(&config, &mut rig, input);
        let yaw = rig.transform.rotation.as_euler().y;
        assert!(yaw > Fp::ZERO);
        assert_eq!(rig.state.axes[0].steer_angle, config.axes[0].max_steer_angle);
        assert_eq!(rig.state.axes[1].steer_angle, Fp::ZERO);
    }

    #[test]
    fn test_gear_shifts_set_cooldown() {
        let engine = EngineSettings::default();
        let mut drivetrain = Drivetrain {
            engine_rpm: Fp::from_int(3990),
            ..Default::default()
        };
        engine.accelerate(&mut drivetrain, Fp::from_ratio(1, 60));
        assert_eq!(drivetrain.gear, 1);
        assert_eq!(drivetrain.shift_timer, engine.shift_cooldown);
        // no torque while the shift is in progress
        assert_eq!(engine.accelerate(&mut drivetrain, Fp::from_ratio(1, 60)), Fp::ZERO);

        engine.update_rpm(&mut drivetrain, Fp::ZERO);
        assert_eq!(drivetrain.engine_rpm, engine.min_rpm);
        assert_eq!(drivetrain.gear, 0);
    }
}
