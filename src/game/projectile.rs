//! Tank shells: firing, flight lifetime, detonation and blast push

use tracing::{debug, trace, warn};

use crate::ecs::EntityRef;
use crate::math::{Fp, Vec3};

use super::events::{Notification, SoundKind};
use super::frame::Frame;
use super::signals::Signal;

/// Explosions spawn this far below the shell
const DETONATION_DROP: Vec3 = Vec3::new(Fp::ZERO, Fp::from_ratio(1, 5), Fp::ZERO);
/// Pushes aim slightly above the victim's origin
const PUSH_LIFT: Vec3 = Vec3::new(Fp::ZERO, Fp::HALF, Fp::ZERO);

/// Burn down shell lifetimes; expired shells detonate where they are.
pub fn update(frame: &mut Frame) {
    let delta = frame.delta;
    for entity in frame.world.projectiles.entities() {
        let world = &mut frame.world;
        if !world.transforms.contains(entity) || !world.bodies.contains(entity) {
            continue;
        }
        let Some(projectile) = world.projectiles.get_mut(entity) else {
            continue;
        };
        projectile.remaining_lifetime -= delta;
        if projectile.remaining_lifetime <= Fp::ZERO {
            explode(frame, entity);
        }
    }
}

/// Spawn a shell at `position`, pointed along the owner's look direction.
pub fn on_tank_shoot(frame: &mut Frame, signal: &Signal) {
    let Signal::TankShoot {
        owner,
        position,
        prototype,
    } = *signal
    else {
        return;
    };

    let look = frame
        .world
        .player_vehicles
        .get(owner)
        .map(|v| v.look_direction)
        .unwrap_or_default();

    let Some(shell) = frame.world.spawn(&frame.assets, prototype) else {
        warn!(prototype = prototype.0, "Projectile prototype missing, shot dropped");
        return;
    };
    let world = &mut frame.world;
    let Some(projectile) = world.projectiles.get_mut(shell) else {
        warn!(prototype = prototype.0, "Prototype is not a projectile, shot dropped");
        world.destroy(shell);
        return;
    };
    projectile.owner = owner;
    let speed = projectile.speed;

    let mut forward = Vec3::FORWARD;
    if let Some(transform) = world.transforms.get_mut(shell) {
        transform.rotate_euler(look.x, look.y, Fp::ZERO);
        transform.position = position;
        forward = transform.forward();
    }
    if let Some(body) = world.bodies.get_mut(shell) {
        body.velocity = forward * speed;
    }

    trace!(%owner, %shell, "Shell spawned");
    frame.notify(Notification::SoundPlayed {
        position,
        sound: SoundKind::Shot,
        local_only: false,
        player: None,
    });
    frame.notify(Notification::PlayerShot { owner });
}

pub fn on_explode_projectile(frame: &mut Frame, signal: &Signal) {
    if let Signal::ExplodeProjectile { projectile } = *signal {
        explode(frame, projectile);
    }
}

/// Replace a shell with its explosion. The explosion inherits the owner and
/// its trigger radius is set from the blast radius.
pub fn explode(frame: &mut Frame, shell: EntityRef) {
    let (Some(projectile), Some(transform)) = (
        frame.world.projectiles.get(shell).copied(),
        frame.world.transforms.get(shell).copied(),
    ) else {
        return;
    };

    match frame.world.spawn(&frame.assets, projectile.explosion_prototype) {
        Some(explosion) => {
            let world = &mut frame.world;
            if let Some(t) = world.transforms.get_mut(explosion) {
                t.position = transform.position - DETONATION_DROP;
            }
            if let Some(blast) = world.explosions.get_mut(explosion) {
                blast.owner = projectile.owner;
                let radius = blast.radius;
                if let Some(collider) = world.colliders.get_mut(explosion) {
                    collider.radius = radius;
                }
            }
            debug!(%shell, %explosion, owner = %projectile.owner, "Shell exploded");
        }
        None => warn!(
            prototype = projectile.explosion_prototype.0,
            "Explosion prototype missing"
        ),
    }
    frame.world.destroy(shell);
}

/// Radial push, fading to nothing at twice the blast radius.
pub fn on_explosion_hit_tank(frame: &mut Frame, signal: &Signal) {
    let Signal::ExplosionHitTank { explosion, victim } = *signal else {
        return;
    };
    let world = &mut frame.world;
    let (Some(center), Some(target), Some(blast)) = (
        world.transforms.get(explosion).map(|t| t.position),
        world.transforms.get(victim).map(|t| t.position),
        world.explosions.get(explosion).copied(),
    ) else {
        return;
    };
    let Some(body) = world.bodies.get_mut(victim) else {
        return;
    };

    let distance = (target - center).magnitude();
    let falloff = (Fp::ONE - (distance / (Fp::TWO * blast.radius)).abs()).clamp01();
    let direction = (target + PUSH_LIFT - center).normalized();
    body.add_linear_impulse(direction * blast.impulse * falloff);

    frame.notify(Notification::SoundPlayed {
        position: target,
        sound: SoundKind::ExplosionPush,
        local_only: false,
        player: None,
    });
}
