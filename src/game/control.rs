//! Match controller system

use crate::math::Fp;

use super::events::Notification;
use super::frame::Frame;
use super::gameplay::{self, MatchState};
use super::signals::Signal;

/// Advance the match clock and drive the phase machine.
///
/// Limbo -> Running once more than one avatar is linked, Running -> Ended
/// when the clock runs out, Ended -> Running after the restart grace.
pub fn gameplay_control(frame: &mut Frame) {
    notify_timer(frame);

    if frame.gameplay.state != MatchState::Limbo {
        frame.gameplay.remaining_time -= frame.delta;
    }

    let remaining = frame.gameplay.remaining_time;
    let state = frame.gameplay.state;
    match state {
        MatchState::Limbo if frame.world.player_links.len() > 1 => gameplay::start(frame),
        MatchState::Running if remaining <= Fp::ZERO => gameplay::stop(frame),
        MatchState::Ended if remaining <= -frame.gameplay.restart_grace => gameplay::start(frame),
        _ => {}
    }

    // emitted on both sides of the decrement; clients render the latest
    notify_timer(frame);
    gameplay::try_respawn(frame);
}

fn notify_timer(frame: &mut Frame) {
    let remaining = frame.gameplay.remaining_time;
    frame.notify(Notification::TimerUpdated { remaining });
}

pub fn on_player_added(frame: &mut Frame, signal: &Signal) {
    if let Signal::PlayerAdded { player, avatar } = *signal {
        gameplay::connect(frame, player, avatar);
    }
}

pub fn on_player_removed(frame: &mut Frame, signal: &Signal) {
    if let Signal::PlayerRemoved { player } = *signal {
        gameplay::disconnect(frame, player);
    }
}
