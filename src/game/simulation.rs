//! The tick driver
//!
//! A `Simulation` owns one `Frame` and the physics collaborator and advances
//! them one fixed step at a time. Everything a tick needs from outside
//! arrives in a `TickInput`, so the same inputs always produce the same
//! frames.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{trace, warn};

use crate::physics::{ContactSet, PhysicsQuery};

use super::assets::{AssetDb, PrototypeRef};
use super::commands::{self, Command, CommandQueue};
use super::components::PlayerRef;
use super::events::Notification;
use super::frame::Frame;
use super::gameplay::Gameplay;
use super::input::Input;
use super::signals::Signal;
use super::world::World;
use super::{collision, control, drive, explosion, player, projectile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub player: PlayerRef,
    /// Avatar override; the asset default when absent
    #[serde(default)]
    pub avatar: Option<PrototypeRef>,
}

/// Everything from outside the simulation for one tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickInput {
    pub joins: Vec<Join>,
    pub leaves: Vec<PlayerRef>,
    pub inputs: BTreeMap<PlayerRef, Input>,
    /// Encoded commands with their submitter, in submission order
    pub commands: Vec<(PlayerRef, Vec<u8>)>,
}

type Run = fn(&mut Frame, &dyn PhysicsQuery);

struct System {
    name: &'static str,
    run: Run,
}

/// Registration order is execution order.
const SYSTEMS: &[System] = &[
    System {
        name: "gameplay_control",
        run: run_gameplay_control,
    },
    System {
        name: "drive",
        run: drive::update,
    },
    System {
        name: "player",
        run: run_player,
    },
    System {
        name: "projectile",
        run: run_projectile,
    },
    System {
        name: "explosion",
        run: run_explosion,
    },
    System {
        name: "physics",
        run: run_physics,
    },
    System {
        name: "commands",
        run: run_commands,
    },
];

fn run_gameplay_control(frame: &mut Frame, _: &dyn PhysicsQuery) {
    control::gameplay_control(frame);
}

fn run_player(frame: &mut Frame, _: &dyn PhysicsQuery) {
    player::update(frame);
}

fn run_projectile(frame: &mut Frame, _: &dyn PhysicsQuery) {
    projectile::update(frame);
}

fn run_explosion(frame: &mut Frame, _: &dyn PhysicsQuery) {
    explosion::update(frame);
}

fn run_physics(frame: &mut Frame, physics: &dyn PhysicsQuery) {
    let dt = frame.delta;
    let mut contacts = physics.step(&mut frame.world, &mut frame.contacts, dt);
    collision::route(frame, &mut contacts);
}

fn run_commands(frame: &mut Frame, _: &dyn PhysicsQuery) {
    commands::execute_commands(frame);
}

pub struct Simulation {
    frame: Frame,
    physics: Box<dyn PhysicsQuery + Send + Sync>,
}

impl Simulation {
    /// Simulation over the asset database's own arena.
    pub fn new(assets: Arc<AssetDb>, seed: u64, tick_rate: u32) -> Self {
        let arena = assets.arena.clone();
        Self::with_physics(assets, seed, tick_rate, Box::new(arena))
    }

    pub fn with_physics(
        assets: Arc<AssetDb>,
        seed: u64,
        tick_rate: u32,
        physics: Box<dyn PhysicsQuery + Send + Sync>,
    ) -> Self {
        Self {
            frame: Frame::new(assets, seed, tick_rate),
            physics,
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn tick(&self) -> u64 {
        self.frame.tick
    }

    /// Copy of the full rollback state.
    pub fn snapshot(&self) -> Frame {
        self.frame.clone()
    }

    /// Rewind to a snapshot. Notifications still pending are dropped.
    pub fn restore(&mut self, mut frame: Frame) {
        frame.events.drain();
        self.frame = frame;
    }

    /// Advance one tick and return what happened, in order.
    pub fn step(&mut self, input: TickInput) -> Vec<Notification> {
        let frame = &mut self.frame;

        for join in input.joins {
            frame.raise(Signal::PlayerAdded {
                player: join.player,
                avatar: join.avatar,
            });
        }
        for player in input.leaves {
            frame.raise(Signal::PlayerRemoved { player });
        }

        frame.previous_inputs = std::mem::replace(&mut frame.inputs, input.inputs);

        for (submitter, bytes) in input.commands {
            match Command::decode(&bytes) {
                Ok(command) => frame.commands.push(submitter, command),
                Err(e) => warn!(%submitter, error = %e, tick = frame.tick, "Dropping malformed command"),
            }
        }

        for system in SYSTEMS {
            trace!(system = system.name, tick = frame.tick, "Running system");
            (system.run)(frame, &*self.physics);
        }

        frame.tick += 1;
        frame.events.drain()
    }

    /// SHA-256 over the serialized rollback state, for comparing
    /// participants.
    pub fn checksum(&self) -> Result<String, serde_json::Error> {
        checksum(&self.frame)
    }
}

#[derive(Serialize)]
struct FrameDigest<'a> {
    tick: u64,
    world: &'a World,
    gameplay: &'a Gameplay,
    inputs: &'a BTreeMap<PlayerRef, Input>,
    commands: &'a CommandQueue,
    contacts: &'a ContactSet,
}

pub fn checksum(frame: &Frame) -> Result<String, serde_json::Error> {
    let digest = FrameDigest {
        tick: frame.tick,
        world: &frame.world,
        gameplay: &frame.gameplay,
        inputs: &frame.inputs,
        commands: &frame.commands,
        contacts: &frame.contacts,
    };

    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&digest)?);
    hasher.update(frame.rng.get_seed());
    hasher.update(frame.rng.get_word_pos().to_le_bytes());
    Ok(hex::encode(hasher.finalize()))
}
