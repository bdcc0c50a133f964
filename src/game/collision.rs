//! Contact routing
//!
//! Turns the physics step's contact-enter events into game signals. The only
//! thing written here is the `ignore` flag on suppressed contacts.

use crate::physics::{ContactEvent, ContactKind, ContactTarget};

use super::frame::Frame;
use super::signals::Signal;

pub fn route(frame: &mut Frame, events: &mut [ContactEvent]) {
    for event in events.iter_mut() {
        match event.kind {
            ContactKind::Collision => on_collision_enter(frame, event),
            ContactKind::Trigger => on_trigger_enter(frame, event),
        }
    }
}

/// A shell touching anything but its own tank detonates.
fn on_collision_enter(frame: &mut Frame, event: &mut ContactEvent) {
    let Some(projectile) = frame.world.projectiles.get(event.entity) else {
        return;
    };
    if event.other == ContactTarget::Entity(projectile.owner) {
        event.ignore = true;
        return;
    }
    frame.raise(Signal::ExplodeProjectile {
        projectile: event.entity,
    });
}

fn on_trigger_enter(frame: &mut Frame, event: &mut ContactEvent) {
    if !frame.world.explosions.contains(event.entity) {
        return;
    }
    if let ContactTarget::Entity(victim) = event.other {
        if frame.world.player_vehicles.contains(victim) {
            frame.raise(Signal::ExplosionHitTank {
                explosion: event.entity,
                victim,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::ecs::EntityRef;
    use crate::game::assets::{AssetDb, PrototypeRef};

    fn frame() -> Frame {
        Frame::new(Arc::new(AssetDb::builtin()), 0, 60)
    }

    fn collision(entity: EntityRef, other: ContactTarget) -> ContactEvent {
        ContactEvent {
            kind: ContactKind::Collision,
            entity,
            other,
            ignore: false,
        }
    }

    #[test]
    fn test_shell_ignores_its_owner() {
        let mut frame = frame();
        let owner = frame.world.spawn(&frame.assets, PrototypeRef(0)).unwrap();
        let shell = frame.world.spawn(&frame.assets, PrototypeRef(3)).unwrap();
        frame.world.projectiles.get_mut(shell).unwrap().owner = owner;

        let mut events = [collision(shell, ContactTarget::Entity(owner))];
        route(&mut frame, &mut events);
        assert!(events[0].ignore);
        assert!(frame.world.exists(shell));
        assert!(frame.world.explosions.is_empty());
    }

    #[test]
    fn test_shell_hitting_ground_explodes() {
        let mut frame = frame();
        let shell = frame.world.spawn(&frame.assets, PrototypeRef(3)).unwrap();

        let mut events = [collision(shell, ContactTarget::Static(1))];
        route(&mut frame, &mut events);
        assert!(!events[0].ignore);
        assert!(!frame.world.exists(shell));
        assert_eq!(frame.world.explosions.len(), 1);
    }

    #[test]
    fn test_explosion_overlap_damages_tank() {
        let mut frame = frame();
        let tank = frame.world.spawn(&frame.assets, PrototypeRef(0)).unwrap();
        let explosion = frame.world.spawn(&frame.assets, PrototypeRef(4)).unwrap();

        let mut events = [ContactEvent {
            kind: ContactKind::Trigger,
            entity: explosion,
            other: ContactTarget::Entity(tank),
            ignore: false,
        }];
        route(&mut frame, &mut events);
        // owner is NONE, so this counts as someone else's blast
        assert_eq!(frame.world.player_vehicles.get(tank).unwrap().current_health, 60);
    }
}
