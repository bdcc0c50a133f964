//! Replay logs
//!
//! A replay is the seed, the tick rate and every tick's `TickInput`. Since
//! the simulation is deterministic that is enough to rebuild every frame,
//! and the stored final checksum tells whether the rebuild matched.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::game::{AssetDb, Simulation, TickInput};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to access replay file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid replay JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Replay desynced after {ticks} ticks: expected {expected}, got {actual}")]
    Desync {
        ticks: u64,
        expected: String,
        actual: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub seed: u64,
    pub tick_rate: u32,
    pub ticks: Vec<TickInput>,
    /// Checksum after the last tick, if the recorder knew it
    #[serde(default)]
    pub final_checksum: Option<String>,
}

/// Result of a headless replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub ticks: u64,
    pub checksum: String,
    pub notifications: usize,
}

impl ReplayLog {
    pub fn new(seed: u64, tick_rate: u32) -> Self {
        Self {
            seed,
            tick_rate,
            ticks: Vec::new(),
            final_checksum: None,
        }
    }

    pub fn push(&mut self, input: TickInput) {
        self.ticks.push(input);
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let path = path.as_ref();
        std::fs::write(path, serde_json::to_vec(self)?)?;
        info!(path = %path.display(), ticks = self.ticks.len(), "Saved replay");
        Ok(())
    }

    /// Re-run every tick from a fresh simulation.
    pub fn run(&self, assets: Arc<AssetDb>) -> Result<ReplayOutcome, ReplayError> {
        let mut simulation = Simulation::new(assets, self.seed, self.tick_rate);
        let mut notifications = 0;
        for input in &self.ticks {
            notifications += simulation.step(input.clone()).len();
        }

        let checksum = simulation.checksum()?;
        let ticks = simulation.tick();
        match &self.final_checksum {
            Some(expected) if *expected != checksum => {
                warn!(ticks, %expected, actual = %checksum, "Replay desync");
                return Err(ReplayError::Desync {
                    ticks,
                    expected: expected.clone(),
                    actual: checksum,
                });
            }
            Some(_) => info!(ticks, %checksum, "Replay matched recorded checksum"),
            None => info!(ticks, %checksum, "Replay finished"),
        }

        Ok(ReplayOutcome {
            ticks,
            checksum,
            notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Join, PlayerRef};

    fn log() -> ReplayLog {
        let mut log = ReplayLog::new(42, 30);
        log.push(TickInput {
            joins: vec![
                Join {
                    player: PlayerRef(0),
                    avatar: None,
                },
                Join {
                    player: PlayerRef(1),
                    avatar: None,
                },
            ],
            ..Default::default()
        });
        for _ in 0..30 {
            log.push(TickInput::default());
        }
        log
    }

    #[test]
    fn test_replay_detects_desync() {
        let assets = Arc::new(AssetDb::builtin());
        let mut log = log();
        let outcome = log.run(assets.clone()).unwrap();
        assert_eq!(outcome.ticks, 31);

        log.final_checksum = Some(outcome.checksum.clone());
        assert_eq!(log.run(assets.clone()).unwrap(), outcome);

        log.final_checksum = Some("00".to_string());
        assert!(matches!(log.run(assets), Err(ReplayError::Desync { .. })));
    }

    #[test]
    fn test_log_survives_json() {
        let log = log();
        let json = serde_json::to_string(&log).unwrap();
        let back: ReplayLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}
