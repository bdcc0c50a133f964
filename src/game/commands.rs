//! Player-issued deterministic commands
//!
//! Wire format: one tag byte, then the payload in little-endian order.

use std::collections::{BTreeSet, VecDeque};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::components::PlayerRef;
use super::frame::Frame;
use super::gameplay;

const TAG_RESPAWN: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Kill the player's current avatar (if any) and spawn a fresh one
    Respawn { player: PlayerRef },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command buffer is empty")]
    Empty,

    #[error("Unknown command tag: {0}")]
    UnknownTag(u8),

    #[error("Command truncated: expected {expected} payload bytes, got {got}")]
    Truncated { expected: usize, got: usize },
}

impl Command {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(3);
        match self {
            Command::Respawn { player } => {
                buf.put_u8(TAG_RESPAWN);
                buf.put_u16_le(player.0);
            }
        }
        buf.freeze()
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, CommandError> {
        if !buf.has_remaining() {
            return Err(CommandError::Empty);
        }
        match buf.get_u8() {
            TAG_RESPAWN => {
                if buf.remaining() < 2 {
                    return Err(CommandError::Truncated {
                        expected: 2,
                        got: buf.remaining(),
                    });
                }
                Ok(Command::Respawn {
                    player: PlayerRef(buf.get_u16_le()),
                })
            }
            tag => Err(CommandError::UnknownTag(tag)),
        }
    }

    fn execute(self, frame: &mut Frame) {
        match self {
            Command::Respawn { player } => {
                info!(%player, tick = frame.tick, "Executing respawn command");
                gameplay::kill(frame, player, None);
                gameplay::respawn(frame, player);
            }
        }
    }
}

/// Commands waiting to execute, in submission order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandQueue {
    pending: VecDeque<(PlayerRef, Command)>,
}

impl CommandQueue {
    pub fn push(&mut self, submitter: PlayerRef, command: Command) {
        self.pending.push_back((submitter, command));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the oldest command of each submitter, keeping submission order.
    /// Anything else stays queued for later ticks.
    pub fn take_ready(&mut self) -> Vec<(PlayerRef, Command)> {
        let mut seen = BTreeSet::new();
        let mut ready = Vec::new();
        let mut waiting = VecDeque::with_capacity(self.pending.len());
        for (submitter, command) in self.pending.drain(..) {
            if seen.insert(submitter) {
                ready.push((submitter, command));
            } else {
                waiting.push_back((submitter, command));
            }
        }
        self.pending = waiting;
        ready
    }

    /// Forget everything a player submitted.
    pub fn discard(&mut self, submitter: PlayerRef) {
        self.pending.retain(|(p, _)| *p != submitter);
    }
}

/// Runs last in the tick, after timers and per-entity systems. Only
/// connected players' commands execute; the rest are dropped.
pub fn execute_commands(frame: &mut Frame) {
    let ready = frame.commands.take_ready();
    if !ready.is_empty() {
        debug!(count = ready.len(), tick = frame.tick, "Executing queued commands");
    }
    for (submitter, command) in ready {
        if frame.gameplay.player(submitter).is_none() {
            debug!(%submitter, tick = frame.tick, "Dropping command from unconnected player");
            continue;
        }
        command.execute(frame);
    }
}
