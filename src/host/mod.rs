//! Fixed-rate tick loop around a `Simulation`
//!
//! Players talk to the host through a `HostHandle`: connects, disconnects,
//! inputs and encoded commands go in over an mpsc queue, and every tick's
//! notifications come back out on a broadcast channel together with the tick
//! number and the state checksum. The loop stops once every handle is gone.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::{AssetDb, Input, Join, Notification, PlayerRef, PrototypeRef, Simulation, TickInput};
use crate::replay::ReplayLog;
use crate::util::time::{tick_duration, Timer};

/// Message from a participant to the host
#[derive(Debug, Clone)]
pub enum HostMessage {
    Join {
        player: PlayerRef,
        avatar: Option<PrototypeRef>,
    },
    Leave {
        player: PlayerRef,
    },
    /// Held until the player sends a new one
    Input {
        player: PlayerRef,
        input: Input,
    },
    Command {
        player: PlayerRef,
        bytes: Bytes,
    },
}

/// Broadcast after every tick
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// The tick that just ran
    pub tick: u64,
    pub checksum: String,
    pub notifications: Vec<Notification>,
}

/// Handle to a running host
#[derive(Clone)]
pub struct HostHandle {
    pub id: Uuid,
    pub input_tx: mpsc::Sender<HostMessage>,
    pub report_tx: broadcast::Sender<TickReport>,
    pub player_count: Arc<AtomicUsize>,
}

impl HostHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TickReport> {
        self.report_tx.subscribe()
    }
}

/// The authoritative simulation host
pub struct SimulationHost {
    id: Uuid,
    simulation: Simulation,
    tick_rate: u32,
    input_rx: mpsc::Receiver<HostMessage>,
    report_tx: broadcast::Sender<TickReport>,
    player_count: Arc<AtomicUsize>,
    joined: BTreeSet<PlayerRef>,
    /// Latest input per connected player
    held_inputs: BTreeMap<PlayerRef, Input>,
    recording: ReplayLog,
}

impl SimulationHost {
    pub fn new(assets: Arc<AssetDb>, seed: u64, tick_rate: u32) -> (Self, HostHandle) {
        let id = Uuid::new_v4();
        let (input_tx, input_rx) = mpsc::channel(256);
        let (report_tx, _) = broadcast::channel(64);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = HostHandle {
            id,
            input_tx,
            report_tx: report_tx.clone(),
            player_count: player_count.clone(),
        };

        let host = Self {
            id,
            simulation: Simulation::new(assets, seed, tick_rate),
            tick_rate,
            input_rx,
            report_tx,
            player_count,
            joined: BTreeSet::new(),
            held_inputs: BTreeMap::new(),
            recording: ReplayLog::new(seed, tick_rate),
        };

        (host, handle)
    }

    /// Tick until every handle has been dropped. Returns the inputs of every
    /// tick that ran, replayable with `ReplayLog::run`.
    pub async fn run(mut self) -> ReplayLog {
        info!(host_id = %self.id, tick_rate = self.tick_rate, "Simulation host started");

        let budget = tick_duration(self.tick_rate);
        let mut tick_interval = interval(budget);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            let Some(input) = self.drain_inbox() else {
                info!(host_id = %self.id, tick = self.simulation.tick(), "All handles dropped, stopping host");
                break;
            };

            let timer = Timer::new();
            let report = self.run_tick(input);
            if timer.elapsed() > budget {
                warn!(
                    host_id = %self.id,
                    tick = report.tick,
                    elapsed_micros = timer.elapsed_micros(),
                    "Tick overran its budget"
                );
            }

            // no subscribers is fine
            let _ = self.report_tx.send(report);
        }

        self.recording.final_checksum = self.simulation.checksum().ok();
        self.recording
    }

    /// Collect everything queued since the last tick. `None` once the
    /// queue is closed and empty.
    fn drain_inbox(&mut self) -> Option<TickInput> {
        let mut input = TickInput::default();
        loop {
            match self.input_rx.try_recv() {
                Ok(message) => self.apply(&mut input, message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return None,
            }
        }
        input.inputs = self.held_inputs.clone();
        Some(input)
    }

    fn apply(&mut self, input: &mut TickInput, message: HostMessage) {
        match message {
            HostMessage::Join { player, avatar } => {
                debug!(host_id = %self.id, %player, "Join queued");
                self.joined.insert(player);
                self.player_count.store(self.joined.len(), Ordering::Relaxed);
                input.joins.push(Join { player, avatar });
            }
            HostMessage::Leave { player } => {
                debug!(host_id = %self.id, %player, "Leave queued");
                self.joined.remove(&player);
                self.player_count.store(self.joined.len(), Ordering::Relaxed);
                self.held_inputs.remove(&player);
                input.leaves.push(player);
            }
            HostMessage::Input { player, input: sample } => {
                self.held_inputs.insert(player, sample);
            }
            HostMessage::Command { player, bytes } => {
                input.commands.push((player, bytes.to_vec()));
            }
        }
    }

    fn run_tick(&mut self, input: TickInput) -> TickReport {
        self.recording.push(input.clone());
        let tick = self.simulation.tick();
        let notifications = self.simulation.step(input);

        let checksum = match self.simulation.checksum() {
            Ok(checksum) => checksum,
            Err(e) => {
                warn!(host_id = %self.id, tick, error = %e, "Failed to checksum frame");
                String::new()
            }
        };

        TickReport {
            tick,
            checksum,
            notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MatchState;

    #[tokio::test]
    async fn test_host_runs_joined_players() {
        let (host, handle) = SimulationHost::new(Arc::new(AssetDb::builtin()), 9, 200);
        let mut reports = handle.subscribe();
        let task = tokio::spawn(host.run());

        for n in 0..2 {
            handle
                .input_tx
                .send(HostMessage::Join {
                    player: PlayerRef(n),
                    avatar: None,
                })
                .await
                .unwrap();
        }

        let mut started = false;
        for _ in 0..50 {
            let report = match reports.recv().await {
                Ok(report) => report,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("report channel closed: {e}"),
            };
            assert_eq!(report.checksum.len(), 64);
            if report.notifications.iter().any(|n| {
                matches!(
                    n,
                    Notification::GameplayStateChanged {
                        state: MatchState::Running
                    }
                )
            }) {
                started = true;
                break;
            }
        }
        assert!(started);
        assert_eq!(handle.player_count(), 2);

        drop(reports);
        drop(handle);
        let log = task.await.unwrap();
        assert!(log.final_checksum.is_some());
        assert_eq!(log.ticks.iter().map(|t| t.joins.len()).sum::<usize>(), 2);
    }

    #[test]
    fn test_player_count_tracks_distinct_joins() {
        let (mut host, handle) = SimulationHost::new(Arc::new(AssetDb::builtin()), 9, 60);
        let mut input = TickInput::default();

        host.apply(&mut input, HostMessage::Leave { player: PlayerRef(5) });
        assert_eq!(handle.player_count(), 0);

        for _ in 0..2 {
            host.apply(
                &mut input,
                HostMessage::Join {
                    player: PlayerRef(1),
                    avatar: None,
                },
            );
        }
        assert_eq!(handle.player_count(), 1);

        host.apply(&mut input, HostMessage::Leave { player: PlayerRef(5) });
        assert_eq!(handle.player_count(), 1);
        host.apply(&mut input, HostMessage::Leave { player: PlayerRef(1) });
        assert_eq!(handle.player_count(), 0);
    }
}
