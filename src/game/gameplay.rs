//! Match controller: player bookkeeping, phases, death and respawn
//!
//! `Gameplay` is the single match-wide record. It lives in the `Frame` and
//! the operations that also touch entities take the whole frame.

use std::cmp::Reverse;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ecs::EntityRef;
use crate::math::{Fp, Vec3};

use super::assets::{GameplaySettings, PrototypeRef};
use super::components::{PlayerLink, PlayerRef};
use super::events::Notification;
use super::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Waiting for a second player
    Limbo,
    Running,
    Ended,
}

/// Unranked sentinel
pub const UNRANKED: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    pub player: PlayerRef,
    pub connected: bool,
    pub alive: bool,
    pub kills: u32,
    pub deaths: u32,
    pub score: u32,
    /// Seconds until a timed respawn; zero or less means none pending
    pub respawn_timer: Fp,
    /// 1-based scoreboard position
    pub statistic_position: u32,
    pub avatar: Option<PrototypeRef>,
}

impl PlayerData {
    fn new(player: PlayerRef) -> Self {
        Self {
            player,
            connected: false,
            alive: false,
            kills: 0,
            deaths: 0,
            score: 0,
            respawn_timer: Fp::ZERO,
            statistic_position: UNRANKED,
            avatar: None,
        }
    }

    fn reset_stats(&mut self) {
        self.respawn_timer = Fp::ZERO;
        self.kills = 0;
        self.deaths = 0;
        self.score = 0;
        self.statistic_position = UNRANKED;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gameplay {
    pub state: MatchState,
    pub remaining_time: Fp,
    pub match_duration: Fp,
    pub respawn_delay: Fp,
    pub restart_grace: Fp,
    /// Keyed by player, kept in first-connect order
    players: Vec<PlayerData>,
}

impl Gameplay {
    pub fn new(settings: &GameplaySettings) -> Self {
        Self {
            state: MatchState::Limbo,
            remaining_time: settings.match_duration,
            match_duration: settings.match_duration,
            respawn_delay: settings.respawn_delay,
            restart_grace: settings.restart_grace,
            players: Vec::new(),
        }
    }

    pub fn players(&self) -> &[PlayerData] {
        &self.players
    }

    pub fn player(&self, player: PlayerRef) -> Option<&PlayerData> {
        self.players.iter().find(|p| p.player == player)
    }

    pub fn player_mut(&mut self, player: PlayerRef) -> Option<&mut PlayerData> {
        self.players.iter_mut().find(|p| p.player == player)
    }

    fn player_refs(&self) -> Vec<PlayerRef> {
        self.players.iter().map(|p| p.player).collect()
    }

    /// Score is the kill count; position orders by kills, then fewest
    /// deaths, then connect order.
    pub fn update_ranking(&mut self) {
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.sort_by_key(|&i| (Reverse(self.players[i].kills), self.players[i].deaths));
        for (position, index) in order.into_iter().enumerate() {
            let data = &mut self.players[index];
            data.score = data.kills;
            data.statistic_position = position as u32 + 1;
        }
    }
}

fn set_state(frame: &mut Frame, state: MatchState) {
    if frame.gameplay.state != state {
        info!(from = ?frame.gameplay.state, to = ?state, tick = frame.tick, "Match state changed");
    }
    frame.gameplay.state = state;
    frame.notify(Notification::GameplayStateChanged { state });
}

/// Create the player's entry if needed and mark it connected.
pub fn connect(frame: &mut Frame, player: PlayerRef, avatar: Option<PrototypeRef>) {
    let players = &mut frame.gameplay.players;
    let index = match players.iter().position(|p| p.player == player) {
        Some(index) => index,
        None => {
            players.push(PlayerData::new(player));
            players.len() - 1
        }
    };

    let data = &mut players[index];
    if avatar.is_some() {
        data.avatar = avatar;
    }
    if data.connected {
        return;
    }
    data.connected = true;
    info!(%player, tick = frame.tick, "Player connected");
}

/// Drop the player's entry and any avatar they still have.
pub fn disconnect(frame: &mut Frame, player: PlayerRef) {
    if let Some(index) = frame.gameplay.players.iter().position(|p| p.player == player) {
        let mut data = frame.gameplay.players.remove(index);
        if data.connected {
            warn!(%player, tick = frame.tick, "Player disconnected");
        }
        data.connected = false;
        data.alive = false;
    }
    frame.commands.discard(player);

    if let Some(entity) = frame.world.player_entity(player) {
        remove_avatar(frame, entity);
    }
}

/// Enter `Running`: reset the clock and everyone's stats, then respawn all.
pub fn start(frame: &mut Frame) {
    set_state(frame, MatchState::Running);
    frame.gameplay.remaining_time = frame.gameplay.match_duration;
    for data in &mut frame.gameplay.players {
        data.reset_stats();
    }
    for player in frame.gameplay.player_refs() {
        respawn(frame, player);
    }
}

pub fn stop(frame: &mut Frame) {
    set_state(frame, MatchState::Ended);
    frame.gameplay.update_ranking();
}

/// Count down pending respawn timers; respawn whoever reaches zero.
pub fn try_respawn(frame: &mut Frame) {
    let delta = frame.delta;
    for player in frame.gameplay.player_refs() {
        let Some(data) = frame.gameplay.player_mut(player) else {
            continue;
        };
        if data.respawn_timer <= Fp::ZERO {
            continue;
        }
        data.respawn_timer -= delta;
        if data.respawn_timer <= Fp::ZERO {
            respawn(frame, player);
        }
    }
}

/// Destroy an avatar and its turret chain. Every link is checked, so a
/// partially destroyed chain is fine.
pub fn remove_avatar(frame: &mut Frame, body: EntityRef) {
    let world = &mut frame.world;
    if !world.exists(body) {
        return;
    }
    let turret = world.turret_updaters.get(body).map(|u| u.turret);
    let barrel = world.turrets.get(body).map(|t| t.barrel);

    debug!(%body, "Removing avatar");
    world.destroy(body);
    if let Some(turret) = turret {
        world.destroy(turret);
    }
    if let Some(barrel) = barrel {
        world.destroy(barrel);
    }
}

/// Replace the player's avatar with a fresh one at a random spawn point.
/// Disconnected or unknown players only lose their old avatar.
pub fn respawn(frame: &mut Frame, player: PlayerRef) {
    if let Some(entity) = frame.world.player_entity(player) {
        remove_avatar(frame, entity);
    }

    let default_avatar = frame.assets.default_avatar;
    let avatar = match frame.gameplay.player_mut(player) {
        Some(data) if data.connected => {
            data.alive = true;
            data.respawn_timer = Fp::ZERO;
            data.avatar.unwrap_or(default_avatar)
        }
        _ => return,
    };

    let Some(body) = frame.world.spawn(&frame.assets, avatar) else {
        warn!(%player, prototype = avatar.0, "Avatar prototype missing, player not spawned");
        if let Some(data) = frame.gameplay.player_mut(player) {
            data.alive = false;
        }
        return;
    };
    build_turret_chain(frame, body);
    frame.world.player_links.insert(body, PlayerLink { player });

    let settings = &frame.assets.gameplay;
    let extent = settings.spawn_extent;
    let x = frame.rng.gen_range(-extent..=extent);
    let z = frame.rng.gen_range(-extent..=extent);
    let position = Vec3::new(Fp::from(x), settings.spawn_height, Fp::from(z));
    if let Some(transform) = frame.world.transforms.get_mut(body) {
        transform.position = position;
    }

    info!(%player, entity = %body, x, z, tick = frame.tick, "Player spawned");
    frame.notify(Notification::PlayerSpawned {
        player,
        entity: body,
    });
}

/// body -> turret -> barrel, with back-references to the body.
fn build_turret_chain(frame: &mut Frame, body: EntityRef) {
    let world = &mut frame.world;
    let assets = &frame.assets;

    let Some(updater) = world.turret_updaters.get(body).copied() else {
        return;
    };
    let Some(turret) = world.spawn(assets, updater.turret_prototype) else {
        return;
    };
    if let Some(updater) = world.turret_updaters.get_mut(body) {
        updater.turret = turret;
        updater.body = body;
    }

    let Some(barrel_prototype) = world.turrets.get(turret).map(|t| t.barrel_prototype) else {
        return;
    };
    let Some(barrel) = world.spawn(assets, barrel_prototype) else {
        return;
    };
    if let Some(link) = world.turrets.get_mut(turret) {
        link.barrel = barrel;
        link.body = body;
    }
    if let Some(back_ref) = world.turrets.get_mut(body) {
        back_ref.barrel = barrel;
        back_ref.body = body;
    }
}

/// Record a death and despawn the victim. A distinct `perp` gets the kill.
pub fn kill(frame: &mut Frame, victim: PlayerRef, perp: Option<PlayerRef>) {
    let respawn_delay = frame.gameplay.respawn_delay;
    let known = match frame.gameplay.player_mut(victim) {
        Some(data) => {
            data.alive = false;
            data.deaths += 1;
            data.respawn_timer = respawn_delay;
            true
        }
        None => false,
    };

    if let Some(entity) = frame.world.player_entity(victim) {
        remove_avatar(frame, entity);
    }
    if !known {
        return;
    }

    let killer = perp.filter(|&p| p != victim);
    if let Some(killer) = killer {
        if let Some(data) = frame.gameplay.player_mut(killer) {
            data.kills += 1;
            info!(%killer, %victim, kills = data.kills, "Kill awarded");
        }
        frame.gameplay.update_ranking();
    }

    info!(%victim, tick = frame.tick, "Player killed");
    frame.notify(Notification::PlayerKilled { killer, victim });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::game::assets::AssetDb;

    fn frame() -> Frame {
        Frame::new(Arc::new(AssetDb::builtin()), 7, 60)
    }

    fn avatar_count(frame: &Frame) -> usize {
        frame.world.player_links.len()
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut frame = frame();
        connect(&mut frame, PlayerRef(1), None);
        connect(&mut frame, PlayerRef(1), None);
        assert_eq!(frame.gameplay.players().len(), 1);
        let data = frame.gameplay.player(PlayerRef(1)).unwrap();
        assert!(data.connected);
        assert!(!data.alive);
        assert_eq!(data.statistic_position, UNRANKED);
    }

    #[test]
    fn test_respawn_builds_chain_within_spawn_area() {
        let mut frame = frame();
        connect(&mut frame, PlayerRef(0), None);
        respawn(&mut frame, PlayerRef(0));

        let body = frame.world.player_entity(PlayerRef(0)).unwrap();
        let updater = *frame.world.turret_updaters.get(body).unwrap();
        let turret = *frame.world.turrets.get(updater.turret).unwrap();
        assert_eq!(updater.body, body);
        assert_eq!(turret.body, body);
        assert!(frame.world.exists(turret.barrel));
        assert_eq!(frame.world.turrets.get(body).unwrap().barrel, turret.barrel);

        let p = frame.world.transforms.get(body).unwrap().position;
        assert!(p.x.abs() <= Fp::from_int(50) && p.z.abs() <= Fp::from_int(50));
        assert_eq!(p.y, Fp::from_int(10));
        assert!(frame.gameplay.player(PlayerRef(0)).unwrap().alive);
    }

    #[test]
    fn test_respawn_twice_keeps_one_avatar() {
        let mut frame = frame();
        connect(&mut frame, PlayerRef(0), None);
        respawn(&mut frame, PlayerRef(0));
        respawn(&mut frame, PlayerRef(0));
        assert_eq!(avatar_count(&frame), 1);
        assert_eq!(frame.world.entity_count(), 3);
    }

    #[test]
    fn test_disconnected_player_never_respawns() {
        let mut frame = frame();
        respawn(&mut frame, PlayerRef(4));
        assert_eq!(frame.world.entity_count(), 0);
    }

    #[test]
    fn test_kill_bookkeeping() {
        let mut frame = frame();
        for n in 0..2 {
            connect(&mut frame, PlayerRef(n), None);
            respawn(&mut frame, PlayerRef(n));
        }

        kill(&mut frame, PlayerRef(1), Some(PlayerRef(0)));
        let victim = frame.gameplay.player(PlayerRef(1)).unwrap();
        assert_eq!(victim.deaths, 1);
        assert!(!victim.alive);
        assert_eq!(victim.respawn_timer, Fp::from_int(3));
        let killer = frame.gameplay.player(PlayerRef(0)).unwrap();
        assert_eq!(killer.kills, 1);
        assert_eq!(killer.score, 1);
        assert_eq!(killer.statistic_position, 1);
        assert_eq!(frame.world.player_entity(PlayerRef(1)), None);
        assert_eq!(frame.world.entity_count(), 3);

        // suicide awards nothing
        kill(&mut frame, PlayerRef(0), Some(PlayerRef(0)));
        assert_eq!(frame.gameplay.player(PlayerRef(0)).unwrap().kills, 1);
        assert_eq!(frame.gameplay.player(PlayerRef(0)).unwrap().deaths, 1);
    }

    #[test]
    fn test_ranking_breaks_ties_by_deaths_then_order() {
        let mut frame = frame();
        for n in 0..3 {
            connect(&mut frame, PlayerRef(n), None);
        }
        {
            let players = &mut frame.gameplay.players;
            players[0].kills = 2;
            players[0].deaths = 3;
            players[1].kills = 2;
            players[1].deaths = 1;
        }
        frame.gameplay.update_ranking();
        let position = |n| frame.gameplay.player(PlayerRef(n)).unwrap().statistic_position;
        assert_eq!((position(1), position(0), position(2)), (1, 2, 3));
    }

    #[test]
    fn test_disconnect_cleans_up() {
        let mut frame = frame();
        connect(&mut frame, PlayerRef(3), None);
        respawn(&mut frame, PlayerRef(3));
        disconnect(&mut frame, PlayerRef(3));
        assert!(frame.gameplay.player(PlayerRef(3)).is_none());
        assert_eq!(frame.world.entity_count(), 0);
    }
}
