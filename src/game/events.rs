//! Outbound notifications for the presentation layer
//!
//! Appended during the tick in the order they happen and handed out when the
//! tick ends. Nothing inside the simulation ever reads them back.

use serde::{Deserialize, Serialize};

use crate::ecs::EntityRef;
use crate::math::{Fp, Vec3};

use super::components::PlayerRef;
use super::gameplay::MatchState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SoundKind {
    /// Played only for the shooter when their explosion hurts someone else
    HitConfirm = 0,
    Shot = 1,
    ExplosionPush = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    PlayerShot {
        owner: EntityRef,
    },
    PlayerHit {
        victim: EntityRef,
    },
    SoundPlayed {
        position: Vec3,
        sound: SoundKind,
        local_only: bool,
        player: Option<PlayerRef>,
    },
    PlayerHealthChanged {
        entity: EntityRef,
        health: i32,
    },
    ToggleAim {
        entity: EntityRef,
        aiming: bool,
    },
    TimerUpdated {
        remaining: Fp,
    },
    GameplayStateChanged {
        state: MatchState,
    },
    PlayerKilled {
        killer: Option<PlayerRef>,
        victim: PlayerRef,
    },
    PlayerSpawned {
        player: PlayerRef,
        entity: EntityRef,
    },
}

/// Per-tick notification buffer
#[derive(Debug, Clone, Default)]
pub struct Events {
    queue: Vec<Notification>,
}

impl Events {
    pub fn push(&mut self, notification: Notification) {
        self.queue.push(notification);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter()
    }

    /// Hand out everything raised since the last drain.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }
}
