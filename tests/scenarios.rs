//! Match scenarios driven through the public systems

use std::sync::Arc;

use tank_arena_sim::ecs::EntityRef;
use tank_arena_sim::game::assets::{AssetDb, PrototypeRef};
use tank_arena_sim::game::components::{PhysicsBody, Transform};
use tank_arena_sim::game::signals::Signal;
use tank_arena_sim::game::{
    collision, commands, control, gameplay, Command, Frame, MatchState, Notification, PlayerRef,
};
use tank_arena_sim::math::{Fp, Vec3};
use tank_arena_sim::physics::PhysicsQuery;

const EXPLOSION: PrototypeRef = PrototypeRef(4);

fn frame() -> Frame {
    Frame::new(Arc::new(AssetDb::builtin()), 2024, 60)
}

fn join(frame: &mut Frame, n: u16) {
    frame.raise(Signal::PlayerAdded {
        player: PlayerRef(n),
        avatar: None,
    });
}

fn tank(frame: &Frame, n: u16) -> EntityRef {
    frame.world.player_entity(PlayerRef(n)).unwrap()
}

/// Two players in a running match.
fn running_match() -> Frame {
    let mut frame = frame();
    join(&mut frame, 0);
    join(&mut frame, 1);
    control::gameplay_control(&mut frame);
    assert_eq!(frame.gameplay.state, MatchState::Running);
    frame.events.drain();
    frame
}

fn blast(frame: &mut Frame, owner: EntityRef, victim: EntityRef) {
    let explosion = frame.world.spawn(&frame.assets, EXPLOSION).unwrap();
    frame.world.explosions.get_mut(explosion).unwrap().owner = owner;
    frame.raise(Signal::ExplosionHitTank { explosion, victim });
}

fn health(frame: &Frame, entity: EntityRef) -> i32 {
    frame.world.player_vehicles.get(entity).unwrap().current_health
}

#[test]
fn second_connect_starts_match_with_fresh_avatars() {
    let mut frame = frame();
    join(&mut frame, 0);
    control::gameplay_control(&mut frame);
    assert_eq!(frame.gameplay.state, MatchState::Limbo);

    join(&mut frame, 1);
    control::gameplay_control(&mut frame);
    assert_eq!(frame.gameplay.state, MatchState::Running);

    let extent = Fp::from_int(50);
    for n in 0..2 {
        let data = frame.gameplay.player(PlayerRef(n)).unwrap();
        assert!(data.alive);
        assert_eq!((data.kills, data.deaths, data.score), (0, 0, 0));

        let position = frame.world.transforms.get(tank(&frame, n)).unwrap().position;
        assert!(position.x.abs() <= extent);
        assert!(position.z.abs() <= extent);
    }
    // body, turret and barrel each
    assert_eq!(frame.world.entity_count(), 6);
}

#[test]
fn explosion_from_another_player_deals_full_damage() {
    let mut frame = running_match();
    let (shooter, victim) = (tank(&frame, 0), tank(&frame, 1));

    blast(&mut frame, shooter, victim);

    assert_eq!(health(&frame, victim), 60);
    assert!(frame.events.iter().any(|n| *n
        == Notification::PlayerHealthChanged {
            entity: victim,
            health: 60
        }));
    assert!(frame.gameplay.player(PlayerRef(1)).unwrap().alive);
    assert_eq!(frame.gameplay.player(PlayerRef(1)).unwrap().deaths, 0);
}

#[test]
fn lethal_hit_kills_and_timed_respawn_follows() {
    let mut frame = running_match();
    let (shooter, victim) = (tank(&frame, 0), tank(&frame, 1));

    blast(&mut frame, shooter, victim);
    blast(&mut frame, shooter, victim);
    assert_eq!(health(&frame, victim), 20);
    assert!(frame.world.exists(victim));

    blast(&mut frame, shooter, victim);
    assert!(!frame.world.exists(victim));
    assert_eq!(frame.world.player_entity(PlayerRef(1)), None);
    assert!(frame.events.iter().any(|n| *n
        == Notification::PlayerHealthChanged {
            entity: victim,
            health: -20
        }));

    let dead = frame.gameplay.player(PlayerRef(1)).unwrap();
    assert!(!dead.alive);
    assert_eq!(dead.deaths, 1);
    assert_eq!(dead.respawn_timer, Fp::from_int(3));
    assert_eq!(frame.gameplay.player(PlayerRef(0)).unwrap().kills, 1);
    assert!(frame.events.iter().any(|n| *n
        == Notification::PlayerKilled {
            killer: Some(PlayerRef(0)),
            victim: PlayerRef(1)
        }));

    // 3 s at 60 ticks per second, give or take fixed-point rounding
    for _ in 0..179 {
        control::gameplay_control(&mut frame);
    }
    assert_eq!(frame.world.player_entity(PlayerRef(1)), None);
    for _ in 0..2 {
        control::gameplay_control(&mut frame);
    }
    let respawned = tank(&frame, 1);
    assert_eq!(health(&frame, respawned), 100);
    assert!(frame.gameplay.player(PlayerRef(1)).unwrap().alive);
}

#[test]
fn shell_touching_its_owner_is_ignored() {
    let mut frame = running_match();
    let owner = tank(&frame, 0);
    *frame.world.transforms.get_mut(owner).unwrap() = Transform::at(Vec3::new(
        Fp::ZERO,
        Fp::ONE,
        Fp::ZERO,
    ));
    *frame.world.bodies.get_mut(owner).unwrap() = PhysicsBody::default();

    frame.raise(Signal::TankShoot {
        owner,
        position: Vec3::new(Fp::ZERO, Fp::from_ratio(3, 2), Fp::ZERO),
        prototype: PrototypeRef(3),
    });
    let shell = frame.world.projectiles.entities()[0];

    let arena = frame.assets.arena.clone();
    let dt = frame.delta;
    let mut contacts = arena.step(&mut frame.world, &mut frame.contacts, dt);
    collision::route(&mut frame, &mut contacts);

    assert!(contacts
        .iter()
        .any(|c| c.entity == shell && c.ignore));
    assert!(frame.world.exists(shell));
    assert!(frame.world.explosions.is_empty());
}

#[test]
fn shell_hitting_another_tank_explodes() {
    let mut frame = running_match();
    let (owner, other) = (tank(&frame, 0), tank(&frame, 1));
    let target = frame.world.transforms.get(other).unwrap().position;

    frame.raise(Signal::TankShoot {
        owner,
        position: target,
        prototype: PrototypeRef(3),
    });
    let shell = frame.world.projectiles.entities()[0];

    let arena = frame.assets.arena.clone();
    let dt = frame.delta;
    let mut contacts = arena.step(&mut frame.world, &mut frame.contacts, dt);
    collision::route(&mut frame, &mut contacts);

    assert!(!frame.world.exists(shell));
    let (_, explosion) = frame.world.explosions.iter().next().unwrap();
    assert_eq!(explosion.owner, owner);
}

#[test]
fn self_damage_is_a_tenth() {
    let mut frame = running_match();
    let me = tank(&frame, 0);
    blast(&mut frame, me, me);
    assert_eq!(health(&frame, me), 96);
}

#[test]
fn suicide_awards_no_kill() {
    let mut frame = running_match();
    gameplay::kill(&mut frame, PlayerRef(0), Some(PlayerRef(0)));
    gameplay::kill(&mut frame, PlayerRef(1), None);

    for n in 0..2 {
        let data = frame.gameplay.player(PlayerRef(n)).unwrap();
        assert_eq!((data.kills, data.deaths), (0, 1));
    }
}

#[test]
fn disconnect_leaves_no_orphans() {
    let mut frame = running_match();
    frame.raise(Signal::PlayerRemoved {
        player: PlayerRef(1),
    });

    assert!(frame.gameplay.player(PlayerRef(1)).is_none());
    assert_eq!(frame.world.entity_count(), 3);
    assert_eq!(frame.world.turrets.len(), 2);
    assert_eq!(frame.world.player_links.len(), 1);
}

#[test]
fn commands_from_unconnected_players_are_dropped() {
    let mut frame = running_match();
    let before = tank(&frame, 0);

    frame.commands.push(
        PlayerRef(9),
        Command::Respawn {
            player: PlayerRef(0),
        },
    );
    commands::execute_commands(&mut frame);

    assert!(frame.commands.is_empty());
    assert_eq!(tank(&frame, 0), before);
    assert_eq!(frame.gameplay.player(PlayerRef(0)).unwrap().deaths, 0);

    frame.commands.push(
        PlayerRef(1),
        Command::Respawn {
            player: PlayerRef(0),
        },
    );
    commands::execute_commands(&mut frame);
    assert_eq!(frame.gameplay.player(PlayerRef(0)).unwrap().deaths, 1);
}
