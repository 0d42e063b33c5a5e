//! Player perception: line of sight with its reveal side effects, hearing and noise.
//! This module exists to keep every "the player learns something" rule in one place so the
//! once-per-reveal guarantees live next to each other.
//! It does not compute sight itself; `visibility` stays a pure engine.

use tracing::{debug, info};

use super::cost_map::build_cost_map;
use super::traversal::NoisePath;
use super::visibility::{SoftBlockers, compute_visibility, ray};
use super::*;

/// Perceived intensity never exceeds this, however loud the source.
const MAX_PERCEIVED_NOISE: i32 = 25;

impl SoftBlockers for World {
    fn is_opaque(&self, pos: Pos) -> bool {
        self.clouds.contains_key(&pos) || (self.doors.contains(&pos) && !self.is_occupied(pos))
    }

    fn is_foliage(&self, pos: Pos) -> bool {
        self.foliage.contains(&pos)
    }
}

impl Game {
    pub fn los_range(&self) -> i32 {
        let range = if self.world.player.has_status(PlayerStatus::Shadows) {
            1
        } else {
            self.config.los_range
        };
        range.max(1)
    }

    /// Light path from the player to `target`, empty when `target` is out of view.
    pub fn ray_from_player(&self, target: Pos) -> Vec<Pos> {
        ray(&self.world.map, self.world.player.pos, self.los_range(), &self.world, target)
    }

    /// Recomputes the player's view and applies reveal side effects. Calling
    /// it again without a world change emits nothing new.
    pub(crate) fn compute_los(&mut self) {
        let origin = self.world.player.pos;
        let radius = self.los_range();
        let los = compute_visibility(&self.world.map, origin, radius, &self.world);
        self.world.los = los;

        let visible: Vec<Pos> = self.world.los.visible().iter().copied().collect();
        for pos in visible {
            self.see_position(pos);
        }

        let ids: Vec<MonsterId> = self.world.monsters.keys().collect();
        for id in ids {
            let pos = self.world.monsters[id].pos;
            let in_view = self.world.in_los(pos);
            let monster = &mut self.world.monsters[id];
            let entering = in_view && !monster.in_view;
            monster.in_view = in_view;
            if !entering {
                continue;
            }
            if !monster.seen {
                monster.seen = true;
                let kind = monster.kind;
                info!(?kind, y = pos.y, x = pos.x, "monster sighted");
                self.log.push(LogEvent::MonsterSighted { monster: id, kind, pos });
            }
            self.stop_auto();
        }
    }

    fn see_position(&mut self, pos: Pos) {
        if !self.world.map.is_explored(pos) {
            if let Some(&feature) = self.world.features.get(&pos) {
                self.log.push(LogEvent::FeatureSighted { pos, feature });
                self.stop_auto();
            }
            self.world.map.set_explored(pos);
        } else {
            if self.world.wrong_wall.contains(&pos) {
                self.log.push(LogEvent::TerrainChanged { pos });
                self.stop_auto();
            }
            let stale_flammable =
                self.world.wrong_door.contains(&pos) || self.world.wrong_foliage.contains(&pos);
            if self.world.clouds.get(&pos) == Some(&CloudKind::Fire) && stale_flammable {
                self.log.push(LogEvent::FlamesSpotted { pos });
                self.stop_auto();
            }
        }
        if self.world.wrong_wall.remove(&pos) && self.world.map.is_free(pos) {
            self.world.temporary_walls.remove(&pos);
        }
        self.world.wrong_door.remove(&pos);
        self.world.wrong_foliage.remove(&pos);
    }

    /// Halts every automated mode. The next player turn hands control back.
    pub(crate) fn stop_auto(&mut self) {
        let auto = &mut self.world.auto;
        if let Some(mode) = auto.active_mode() {
            debug!(?mode, "automation stopped");
            self.log.push(LogEvent::AutomationStopped { mode });
        }
        auto.halt = true;
        auto.run_dir = None;
        auto.travel_target = None;
        auto.resting = false;
    }

    /// Hearing pass run at the start of every player turn.
    pub(crate) fn compute_noise(&mut self) {
        self.world.noise.clear();
        let los = self.los_range();
        let mut range = los + 2;
        if los <= 5 {
            range += 1;
        }
        let origin = self.world.player.pos;
        let costs = build_cost_map(
            &mut NoisePath { map: &self.world.map },
            self.world.map.width(),
            self.world.map.height(),
            &[origin],
            range,
        );

        let ids: Vec<MonsterId> = self.world.monsters.keys().collect();
        let mut heard = false;
        for id in ids {
            let (kind, pos, state) = {
                let monster = &self.world.monsters[id];
                (monster.kind, monster.pos, monster.state)
            };
            if !costs.is_reached(pos) || self.world.in_los(pos) || state == MonsterState::Resting {
                continue;
            }
            if self.roll(3) == 0 {
                self.world.noise.insert(pos);
                self.log.push(LogEvent::MonsterHeard { kind, pos });
                heard = true;
            }
        }
        if heard {
            self.stop_auto();
        }
    }

    /// Spreads a sound of `intensity` from `at`. Monsters that perceive it
    /// start hunting (when in view) or walk toward the source.
    pub(crate) fn make_noise(&mut self, intensity: i32, at: Pos) {
        let costs = build_cost_map(
            &mut NoisePath { map: &self.world.map },
            self.world.map.width(),
            self.world.map.height(),
            &[at],
            intensity,
        );
        let ids: Vec<MonsterId> = self.world.monsters.keys().collect();
        for id in ids {
            let Some(monster) = self.world.monsters.get(id) else {
                continue;
            };
            if monster.state == MonsterState::Hunting || !costs.is_reached(monster.pos) {
                continue;
            }
            let mut perceived = intensity - costs.cost_at(monster.pos);
            if perceived <= 0 {
                continue;
            }
            perceived = perceived.min(MAX_PERCEIVED_NOISE);
            let resting = monster.state == MonsterState::Resting;
            let exhausted = monster.has_status(MonsterStatus::Exhausted);
            let pos = monster.pos;

            let threshold = self.roll(30);
            if resting {
                perceived /= 2;
            }
            if exhausted {
                perceived = perceived * 2 / 3;
            }
            if perceived <= threshold {
                continue;
            }
            if self.world.in_los(pos) {
                self.make_hunt(id);
            } else if let Some(monster) = self.world.monsters.get_mut(id) {
                monster.target = at;
                monster.state = MonsterState::Wandering;
                monster.path.clear();
                debug!(y = at.y, x = at.x, "monster heard a noise");
            }
            self.gather_band(id);
        }
    }
}
