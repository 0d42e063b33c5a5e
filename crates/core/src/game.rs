//! Game facade: owns the world, the event queue and the single RNG stream.
//! This module exists to wire the pure engines (cost maps, A*, visibility) into a seeded,
//! replayable simulation driven by `advance` and `apply_command`.
//! It does not own rendering, input handling or dungeon generation.

use std::collections::BTreeMap;
use std::mem;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};
use tracing::debug;

use crate::config::SimConfig;
use crate::content::monster_stats;
use crate::error::SetupError;
use crate::layout::Layout;
use crate::state::{Map, Monster, Player, World};
use crate::types::*;

pub mod cost_map;
pub mod events;
pub mod pathfinding;
pub mod traversal;
pub mod visibility;

mod auto_explore;
mod clouds;
mod engine;
mod hash;
mod monsters;
mod perception;
mod player;

#[cfg(test)]
pub(crate) mod test_support;

use events::{Event, EventPayload, EventQueue, MonsterAction, SimpleAction};
use visibility::VisibilitySet;

/// Uniform roll in `0..n`; zero when `n <= 1`.
pub(crate) fn roll(rng: &mut ChaCha8Rng, n: i32) -> i32 {
    if n <= 1 {
        return 0;
    }
    (rng.next_u64() % n as u64) as i32
}

pub struct Game {
    seed: u64,
    rng: ChaCha8Rng,
    config: SimConfig,
    world: World,
    events: EventQueue,
    turn: i32,
    log: Vec<LogEvent>,
    /// Player turn parked until a command arrives.
    pending_turn: Option<Event>,
    outcome: Option<RunOutcome>,
    /// Sequence number the next accepted command will be journaled under.
    next_input_seq: u64,
}

impl Game {
    pub fn new(
        seed: u64,
        config: SimConfig,
        map: Map,
        player_start: Pos,
    ) -> Result<Self, SetupError> {
        let mut game = Self::unlit(seed, config, map, player_start)?;
        game.compute_los();
        Ok(game)
    }

    pub fn from_layout(seed: u64, config: SimConfig, layout: &Layout) -> Result<Self, SetupError> {
        let mut game = Self::unlit(seed, config, layout.map.clone(), layout.player)?;
        game.world.doors.extend(layout.doors.iter().copied());
        game.world.foliage.extend(layout.foliage.iter().copied());
        game.world.features.extend(layout.features.iter().map(|(pos, feature)| (*pos, *feature)));
        for &(kind, pos) in &layout.monsters {
            let band = kind.forms_bands().then_some(kind as u32);
            game.spawn_monster(kind, pos, band)?;
        }
        game.compute_los();
        Ok(game)
    }

    /// A game whose view has not been computed yet.
    fn unlit(
        seed: u64,
        config: SimConfig,
        map: Map,
        player_start: Pos,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        if !map.in_bounds(player_start) || map.is_wall(player_start) {
            return Err(SetupError::BlockedCell(player_start));
        }
        let player = Player {
            pos: player_start,
            hp: config.player_max_hp,
            max_hp: config.player_max_hp,
            statuses: BTreeMap::new(),
        };
        let mut game = Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            world: World::new(map, player),
            events: EventQueue::new(),
            turn: 0,
            log: Vec::new(),
            pending_turn: None,
            outcome: None,
            next_input_seq: 0,
        };
        game.events.push(Event::new(0, EventPayload::Simple(SimpleAction::PlayerTurn)));
        Ok(game)
    }

    pub fn add_door(&mut self, pos: Pos) -> Result<(), SetupError> {
        self.require_free(pos)?;
        self.world.doors.insert(pos);
        self.compute_los();
        Ok(())
    }

    pub fn add_foliage(&mut self, pos: Pos) -> Result<(), SetupError> {
        self.require_free(pos)?;
        self.world.foliage.insert(pos);
        self.compute_los();
        Ok(())
    }

    pub fn add_feature(&mut self, pos: Pos, feature: Feature) -> Result<(), SetupError> {
        self.require_free(pos)?;
        self.world.features.insert(pos, feature);
        Ok(())
    }

    /// Places a resting monster and schedules its first turn.
    pub fn spawn_monster(
        &mut self,
        kind: MonsterKind,
        pos: Pos,
        band: Option<u32>,
    ) -> Result<MonsterId, SetupError> {
        self.require_free(pos)?;
        if self.world.is_occupied(pos) {
            return Err(SetupError::Occupied(pos));
        }
        let id = self.world.add_monster(Monster::new(kind, pos, band));
        let delay = 1 + roll(&mut self.rng, monster_stats(kind).movement_delay);
        self.schedule(delay, EventPayload::Monster { id, action: MonsterAction::Turn });
        self.compute_los();
        Ok(id)
    }

    /// Adds one stack of `status` that expires after `duration` ticks.
    pub fn apply_player_status(&mut self, status: PlayerStatus, duration: i32) {
        *self.world.player.statuses.entry(status).or_insert(0) += 1;
        self.schedule(duration.max(1), EventPayload::Simple(SimpleAction::StatusEnd(status)));
        if status == PlayerStatus::Shadows {
            self.compute_los();
        }
    }

    pub fn apply_monster_status(&mut self, id: MonsterId, status: MonsterStatus, duration: i32) {
        let Some(monster) = self.world.monsters.get_mut(id) else {
            return;
        };
        *monster.statuses.entry(status).or_insert(0) += 1;
        if status == MonsterStatus::Confused || status == MonsterStatus::Lignified {
            monster.path.clear();
        }
        self.schedule(
            duration.max(1),
            EventPayload::Monster { id, action: MonsterAction::StatusEnd(status) },
        );
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rank of the last dispatched event.
    pub fn turn(&self) -> i32 {
        self.turn
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn visibility(&self) -> &VisibilitySet {
        &self.world.los
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    pub fn take_log(&mut self) -> Vec<LogEvent> {
        mem::take(&mut self.log)
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    pub fn is_awaiting_input(&self) -> bool {
        self.pending_turn.is_some() && self.outcome.is_none()
    }

    pub fn next_input_seq(&self) -> u64 {
        self.next_input_seq
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn require_free(&self, pos: Pos) -> Result<(), SetupError> {
        if self.world.map.in_bounds(pos) && self.world.map.is_free(pos) {
            Ok(())
        } else {
            Err(SetupError::BlockedCell(pos))
        }
    }

    pub(crate) fn schedule(&mut self, delay: i32, payload: EventPayload) {
        self.events.push(Event::new(self.turn + delay, payload));
    }

    pub(crate) fn roll(&mut self, n: i32) -> i32 {
        roll(&mut self.rng, n)
    }

    /// A random free cell with nobody in it, or the player's cell when the
    /// map has none.
    pub(crate) fn free_cell(&mut self) -> Pos {
        let width = self.world.map.width() as i32;
        let height = self.world.map.height() as i32;
        for _ in 0..(width * height).max(1) * 2 {
            let pos = Pos { y: self.roll(height), x: self.roll(width) };
            if self.world.map.is_free(pos) && !self.world.is_occupied(pos) {
                return pos;
            }
        }
        let fallback = self
            .world
            .map
            .positions()
            .find(|pos| self.world.map.is_free(*pos) && !self.world.is_occupied(*pos));
        if fallback.is_none() {
            debug!("no free cell left for wandering targets");
        }
        fallback.unwrap_or(self.world.player.pos)
    }
}
