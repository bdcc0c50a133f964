//! Player system: look, turret aim, firing, out-of-bounds, damage

use tracing::{debug, info, trace};

use crate::ecs::EntityRef;
use crate::math::{Fp, Quat, Vec3};

use super::components::{PlayerRef, Transform};
use super::events::{Notification, SoundKind};
use super::frame::Frame;
use super::gameplay;
use super::input::Buttons;
use super::signals::Signal;

const MAX_PITCH: Fp = Fp::from_int(90);
/// Turret pivot height above the body origin
const TURRET_HEIGHT: Fp = Fp::from_ratio(45, 100);
/// Barrel pivot and muzzle height above the body origin
const BARREL_HEIGHT: Fp = Fp::HALF;
const FLIP: Fp = Fp::from_int(180);

/// Runs for tanks with a transform, body, cooldown and turret. Input only
/// applies to tanks linked to a player.
pub fn update(frame: &mut Frame) {
    let delta = frame.delta;
    let depth = frame.assets.gameplay.out_of_bounds_depth;

    for entity in frame.world.player_vehicles.entities() {
        // an earlier iteration may have killed it
        if !frame.world.exists(entity) {
            continue;
        }
        let world = &frame.world;
        if !world.transforms.contains(entity)
            || !world.bodies.contains(entity)
            || !world.turret_updaters.contains(entity)
        {
            continue;
        }
        let Some(cooldown) = frame.world.fire_cooldowns.get_mut(entity) else {
            continue;
        };
        cooldown.remaining = (cooldown.remaining - delta).max(Fp::ZERO);

        if let Some(link) = frame.world.player_links.get(entity).copied() {
            handle_input(frame, entity, link.player);
        }

        let below = frame
            .world
            .transforms
            .get(entity)
            .is_some_and(|t| t.position.y <= depth);
        if below {
            info!(%entity, tick = frame.tick, "Tank fell out of bounds");
            kill_tank(frame, entity, None);
        }
    }
}

fn handle_input(frame: &mut Frame, entity: EntityRef, player: PlayerRef) {
    let input = frame.input(player);
    let previous = frame.previous_input(player);

    let Some(vehicle) = frame.world.player_vehicles.get_mut(entity) else {
        return;
    };
    let look = &mut vehicle.look_direction;
    look.y += input.look_delta.y;
    look.x = (look.x + input.look_delta.x).clamp(-MAX_PITCH, MAX_PITCH);

    aim_turret(frame, entity);

    if input.was_pressed(&previous, Buttons::AIM) {
        if let Some(vehicle) = frame.world.player_vehicles.get_mut(entity) {
            vehicle.aiming = !vehicle.aiming;
            let aiming = vehicle.aiming;
            frame.notify(Notification::ToggleAim { entity, aiming });
        }
    }

    if input.was_pressed(&previous, Buttons::FIRE) {
        try_fire(frame, entity);
    }
}

/// Blend turret yaw and barrel pitch toward the look direction and pin both
/// to the body. The blend weight is fixed per tick, not scaled by delta.
fn aim_turret(frame: &mut Frame, entity: EntityRef) {
    let smoothing = frame.assets.gameplay.turret_smoothing;
    let world = &mut frame.world;

    let (Some(root), Some(vehicle), Some(updater)) = (
        world.transforms.get(entity).copied(),
        world.player_vehicles.get(entity).copied(),
        world.turret_updaters.get(entity).copied(),
    ) else {
        return;
    };
    let look = vehicle.look_direction;
    let root_euler = root.rotation.as_euler();

    let Some(turret) = world.turrets.get(updater.turret).copied() else {
        trace_stale(entity, updater.turret);
        return;
    };
    if let Some(transform) = world.transforms.get_mut(updater.turret) {
        let target = Quat::euler(root_euler.x, look.y, root_euler.z);
        transform.set_rotation(Quat::slerp(transform.rotation, target, smoothing));
        transform.position = root.position + root.up() * TURRET_HEIGHT;
    }
    if let Some(transform) = world.transforms.get_mut(turret.barrel) {
        let target = Quat::euler(look.x + FLIP, look.y, FLIP);
        transform.set_rotation(Quat::slerp(transform.rotation, target, smoothing));
        transform.position = root.position + root.up() * BARREL_HEIGHT;
    } else {
        trace_stale(entity, turret.barrel);
    }
}

fn trace_stale(owner: EntityRef, target: EntityRef) {
    trace!(%owner, %target, "Skipping stale turret reference");
}

fn try_fire(frame: &mut Frame, entity: EntityRef) {
    let reload = frame.assets.gameplay.fire_cooldown;
    let (Some(transform), Some(cooldown)) = (
        frame.world.transforms.get(entity).copied(),
        frame.world.fire_cooldowns.get_mut(entity),
    ) else {
        return;
    };

    if cooldown.remaining > Fp::ZERO {
        debug!(%entity, remaining = %cooldown.remaining, "Fire attempted on cooldown");
        return;
    }
    cooldown.remaining = reload;
    let prototype = cooldown.projectile_prototype;

    debug!(%entity, tick = frame.tick, "Tank fired");
    frame.raise(Signal::TankShoot {
        owner: entity,
        position: muzzle(&transform),
        prototype,
    });
}

fn muzzle(transform: &Transform) -> Vec3 {
    transform.transform_point(Vec3::UP * BARREL_HEIGHT)
}

/// Kill whoever drives `victim`, crediting whoever drives `perp`. An
/// unlinked victim is just despawned.
pub fn kill_tank(frame: &mut Frame, victim: EntityRef, perp: Option<EntityRef>) {
    let killer = perp
        .and_then(|p| frame.world.player_links.get(p))
        .map(|link| link.player);

    match frame.world.player_links.get(victim).map(|link| link.player) {
        Some(player) => gameplay::kill(frame, player, killer),
        None => gameplay::remove_avatar(frame, victim),
    }
}

pub fn on_player_added(frame: &mut Frame, signal: &Signal) {
    if let Signal::PlayerAdded { player, .. } = *signal {
        gameplay::respawn(frame, player);
    }
}

/// Damage resolution. Self-inflicted hits deal a tenth of the damage.
pub fn on_explosion_hit_tank(frame: &mut Frame, signal: &Signal) {
    let Signal::ExplosionHitTank { explosion, victim } = *signal else {
        return;
    };
    let Some(blast) = frame.world.explosions.get(explosion).copied() else {
        return;
    };
    let owner = blast.owner;
    let damage = if owner == victim {
        blast.damage / 10
    } else {
        blast.damage
    };

    let Some(vehicle) = frame.world.player_vehicles.get_mut(victim) else {
        return;
    };
    vehicle.current_health -= damage;
    let health = vehicle.current_health;
    frame.notify(Notification::PlayerHealthChanged {
        entity: victim,
        health,
    });

    if owner != victim {
        let position = frame.world.transforms.get(owner).map(|t| t.position);
        let player = frame.world.player_links.get(owner).map(|l| l.player);
        if let (Some(position), Some(player)) = (position, player) {
            frame.notify(Notification::SoundPlayed {
                position,
                sound: SoundKind::HitConfirm,
                local_only: true,
                player: Some(player),
            });
        }
    }
    frame.notify(Notification::PlayerHit { victim });

    if health <= 0 {
        kill_tank(frame, victim, Some(owner));
    }
}
