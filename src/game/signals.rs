//! In-tick signal dispatch
//!
//! Every signal kind maps to a fixed, ordered list of subscribers. The
//! table is compiled in, so every participant dispatches in the same order.
//! Handlers run synchronously and may raise further signals.

use tracing::trace;

use crate::ecs::EntityRef;
use crate::math::Vec3;

use super::assets::PrototypeRef;
use super::components::PlayerRef;
use super::frame::Frame;
use super::{control, player, projectile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    PlayerAdded {
        player: PlayerRef,
        avatar: Option<PrototypeRef>,
    },
    PlayerRemoved {
        player: PlayerRef,
    },
    TankShoot {
        owner: EntityRef,
        position: Vec3,
        prototype: PrototypeRef,
    },
    ExplodeProjectile {
        projectile: EntityRef,
    },
    ExplosionHitTank {
        explosion: EntityRef,
        victim: EntityRef,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    PlayerAdded,
    PlayerRemoved,
    TankShoot,
    ExplodeProjectile,
    ExplosionHitTank,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::PlayerAdded { .. } => SignalKind::PlayerAdded,
            Signal::PlayerRemoved { .. } => SignalKind::PlayerRemoved,
            Signal::TankShoot { .. } => SignalKind::TankShoot,
            Signal::ExplodeProjectile { .. } => SignalKind::ExplodeProjectile,
            Signal::ExplosionHitTank { .. } => SignalKind::ExplosionHitTank,
        }
    }
}

pub type Handler = fn(&mut Frame, &Signal);

#[derive(Clone, Copy)]
pub struct Subscriber {
    pub name: &'static str,
    pub handler: Handler,
}

const PLAYER_ADDED: &[Subscriber] = &[
    Subscriber {
        name: "gameplay_control::connect",
        handler: control::on_player_added,
    },
    Subscriber {
        name: "player_spawn::respawn",
        handler: player::on_player_added,
    },
];

const PLAYER_REMOVED: &[Subscriber] = &[Subscriber {
    name: "gameplay_control::disconnect",
    handler: control::on_player_removed,
}];

const TANK_SHOOT: &[Subscriber] = &[Subscriber {
    name: "projectile::fire",
    handler: projectile::on_tank_shoot,
}];

const EXPLODE_PROJECTILE: &[Subscriber] = &[Subscriber {
    name: "projectile::explode",
    handler: projectile::on_explode_projectile,
}];

// push lands before damage can despawn the victim
const EXPLOSION_HIT_TANK: &[Subscriber] = &[
    Subscriber {
        name: "projectile::push",
        handler: projectile::on_explosion_hit_tank,
    },
    Subscriber {
        name: "player::damage",
        handler: player::on_explosion_hit_tank,
    },
];

/// The dispatch table
pub struct SignalBus;

impl SignalBus {
    pub fn subscribers(kind: SignalKind) -> &'static [Subscriber] {
        match kind {
            SignalKind::PlayerAdded => PLAYER_ADDED,
            SignalKind::PlayerRemoved => PLAYER_REMOVED,
            SignalKind::TankShoot => TANK_SHOOT,
            SignalKind::ExplodeProjectile => EXPLODE_PROJECTILE,
            SignalKind::ExplosionHitTank => EXPLOSION_HIT_TANK,
        }
    }

    pub fn raise(frame: &mut Frame, signal: Signal) {
        for subscriber in Self::subscribers(signal.kind()) {
            trace!(?signal, subscriber = subscriber.name, "Dispatching signal");
            (subscriber.handler)(frame, &signal);
        }
    }
}
