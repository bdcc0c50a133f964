//! One tick's worth of simulation state

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::math::Fp;
use crate::physics::ContactSet;

use super::assets::AssetDb;
use super::commands::CommandQueue;
use super::components::PlayerRef;
use super::events::{Events, Notification};
use super::gameplay::Gameplay;
use super::input::Input;
use super::signals::{Signal, SignalBus};
use super::world::World;

/// Everything a tick reads or writes. Cloning a frame is a full snapshot:
/// restoring it and replaying the same inputs reproduces the same ticks.
#[derive(Debug, Clone)]
pub struct Frame {
    pub tick: u64,
    pub world: World,
    pub gameplay: Gameplay,
    pub rng: ChaCha8Rng,
    /// This tick's inputs, by player
    pub inputs: BTreeMap<PlayerRef, Input>,
    /// Last tick's inputs, for edge detection
    pub previous_inputs: BTreeMap<PlayerRef, Input>,
    pub commands: CommandQueue,
    pub contacts: ContactSet,
    pub events: Events,
    pub assets: Arc<AssetDb>,
    /// Seconds per tick
    pub delta: Fp,
    /// Ticks per second
    pub update_rate: Fp,
}

impl Frame {
    pub fn new(assets: Arc<AssetDb>, seed: u64, tick_rate: u32) -> Self {
        let gameplay = Gameplay::new(&assets.gameplay);
        let rate = i64::from(tick_rate.max(1));
        Self {
            tick: 0,
            world: World::new(),
            gameplay,
            rng: ChaCha8Rng::seed_from_u64(seed),
            inputs: BTreeMap::new(),
            previous_inputs: BTreeMap::new(),
            commands: CommandQueue::default(),
            contacts: ContactSet::new(),
            events: Events::default(),
            assets,
            delta: Fp::from_ratio(1, rate),
            update_rate: Fp::from_int(rate),
        }
    }

    /// Input for `player` this tick; idle when none was submitted.
    pub fn input(&self, player: PlayerRef) -> Input {
        self.inputs.get(&player).copied().unwrap_or_default()
    }

    pub fn previous_input(&self, player: PlayerRef) -> Input {
        self.previous_inputs.get(&player).copied().unwrap_or_default()
    }

    pub fn notify(&mut self, notification: Notification) {
        self.events.push(notification);
    }

    pub fn raise(&mut self, signal: Signal) {
        SignalBus::raise(self, signal);
    }
}
