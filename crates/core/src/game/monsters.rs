//! Monster turns: awareness, band gathering, chasing, digging and melee.
//! This module exists to keep monster decision rules apart from the scheduler that calls them.
//! It does not own path search or noise spread; it queries `pathfinding` and `perception`.

use tracing::debug;

use super::cost_map::build_cost_map;
use super::pathfinding::find_path;
use super::traversal::{MonsterPath, NoisePath};
use super::*;
use crate::content::{BARK_NOISE, HIT_NOISE, WALL_NOISE};

/// Lignified monsters skip this long before checking again.
const LIGNIFIED_WAIT: i32 = 10;
/// Hounds keep chasing the player within this distance after losing the trail.
const HOUND_TRACKING_RANGE: i32 = 6;
/// Digging is heard by the player within this distance.
const DIG_HEARING_RANGE: i32 = 12;

#[derive(Clone, Copy)]
struct Snapshot {
    kind: MonsterKind,
    pos: Pos,
    state: MonsterState,
    target: Pos,
}

impl Game {
    fn snapshot(&self, id: MonsterId) -> Option<Snapshot> {
        self.world.monsters.get(id).map(|monster| Snapshot {
            kind: monster.kind,
            pos: monster.pos,
            state: monster.state,
            target: monster.target,
        })
    }

    pub(crate) fn monster_turn(&mut self, id: MonsterId, event: Event) {
        if !self.world.monsters.contains_key(id) {
            return;
        }
        self.make_aware(id);
        let Some(mut me) = self.snapshot(id) else {
            return;
        };
        if me.state == MonsterState::Hunting && !self.world.in_los(me.pos) && self.roll(10) == 0 {
            self.set_state(id, MonsterState::Wandering);
            me.state = MonsterState::Wandering;
        }

        let stats = monster_stats(me.kind);
        let (slow, confused, lignified) = {
            let monster = &self.world.monsters[id];
            (
                monster.has_status(MonsterStatus::Slow),
                monster.has_status(MonsterStatus::Confused),
                monster.has_status(MonsterStatus::Lignified),
            )
        };
        let move_delay = stats.movement_delay + if slow { 3 } else { 0 };

        if me.state == MonsterState::Resting {
            if self.roll(100) == 0 {
                self.natural_awake(id);
            }
            self.events.renew(event, stats.movement_delay);
            return;
        }

        let player_pos = self.world.player.pos;
        if me.pos.is_adjacent(player_pos) {
            let cardinal = Direction::between(me.pos, player_pos).is_some_and(Direction::is_cardinal);
            if !confused || cardinal {
                self.monster_attack(id);
                let attack_delay = stats.attack_delay + if slow { 3 } else { 0 };
                self.events.renew(event, attack_delay);
                return;
            }
            self.world.monsters[id].path.clear();
        }

        if lignified {
            self.events.renew(event, LIGNIFIED_WAIT);
            return;
        }

        self.refresh_path(id, confused);
        let Some(next) = self.world.monsters.get(id).and_then(|m| m.path.first().copied()) else {
            self.pick_new_target(id, me);
            self.events.renew(event, move_delay);
            return;
        };

        match self.world.monster_at(next) {
            _ if next == player_pos => self.repath(id),
            None if me.kind.digs() && self.world.map.is_wall(next) => self.dig_into(id, next),
            None if self.world.map.is_wall(next) => self.repath(id),
            None => self.step_along(id, next),
            Some(other) => self.resolve_blocker(id, me, other),
        }
        self.events.renew(event, move_delay);
    }

    fn set_state(&mut self, id: MonsterId, state: MonsterState) {
        if let Some(monster) = self.world.monsters.get_mut(id) {
            debug!(from = ?monster.state, to = ?state, kind = ?monster.kind, "monster state change");
            monster.state = state;
        }
    }

    fn set_target(&mut self, id: MonsterId, target: Pos) {
        if let Some(monster) = self.world.monsters.get_mut(id) {
            monster.target = target;
            monster.path.clear();
        }
    }

    /// Keeps the cached path when it still leads from here to the target.
    fn refresh_path(&mut self, id: MonsterId, confused: bool) {
        let Some(monster) = self.world.monsters.get(id) else {
            return;
        };
        let valid = monster.path.last() == Some(&monster.target)
            && monster.path.first().is_some_and(|step| step.is_adjacent(monster.pos));
        if valid {
            return;
        }
        let (target, pos) = (monster.target, monster.pos);
        let mut path = self.monster_path(id, target);
        if path.is_empty() && !confused && target != pos {
            for neighbor in self.world.free_neighbors(target) {
                path = self.monster_path(id, neighbor);
                if !path.is_empty() {
                    self.world.monsters[id].target = neighbor;
                    break;
                }
            }
        }
        self.world.monsters[id].path = path;
    }

    fn monster_path(&mut self, id: MonsterId, to: Pos) -> Vec<Pos> {
        let Some(monster) = self.world.monsters.get(id) else {
            return Vec::new();
        };
        let from = monster.pos;
        let mut policy = MonsterPath { world: &self.world, monster, rng: &mut self.rng };
        find_path(&mut policy, from, to)
    }

    fn repath(&mut self, id: MonsterId) {
        let Some(target) = self.world.monsters.get(id).map(|m| m.target) else {
            return;
        };
        let path = self.monster_path(id, target);
        self.world.monsters[id].path = path;
    }

    fn pick_new_target(&mut self, id: MonsterId, me: Snapshot) {
        match me.state {
            MonsterState::Wandering => {
                let target = self.free_cell();
                self.set_target(id, target);
                self.gather_band(id);
            }
            MonsterState::Hunting => {
                let player_pos = self.world.player.pos;
                let target = if me.kind.barks() && me.pos.chebyshev(player_pos) <= HOUND_TRACKING_RANGE {
                    player_pos
                } else {
                    self.free_cell()
                };
                self.set_target(id, target);
                self.set_state(id, MonsterState::Wandering);
                self.gather_band(id);
            }
            MonsterState::Resting => {}
        }
    }

    fn step_along(&mut self, id: MonsterId, next: Pos) {
        self.move_monster_to(id, next);
        if let Some(monster) = self.world.monsters.get_mut(id)
            && monster.path.first() == Some(&next)
        {
            monster.path.remove(0);
        }
    }

    fn dig_into(&mut self, id: MonsterId, wall: Pos) {
        let Some(from) = self.world.monsters.get(id).map(|m| m.pos) else {
            return;
        };
        self.world.map.set_terrain(wall, Terrain::Free);
        if !self.world.in_los(wall) {
            self.world.wrong_wall.insert(wall);
        }
        self.make_noise(WALL_NOISE, from);
        self.fog(from, 1);
        if self.world.player.pos.chebyshev(wall) < DIG_HEARING_RANGE {
            self.log.push(LogEvent::EarthSplitting { pos: wall });
            self.stop_auto();
        }
        if self.world.monsters.contains_key(id) && !self.world.is_occupied(wall) {
            self.step_along(id, wall);
        }
    }

    /// Another monster stands on the next step: shove it along, swap plans or reroute.
    fn resolve_blocker(&mut self, id: MonsterId, me: Snapshot, other_id: MonsterId) {
        let Some(other) = self.snapshot(other_id) else {
            return;
        };
        let player_pos = self.world.player.pos;
        let other_target_far = player_pos.chebyshev(other.target) > 2;

        if me.state == MonsterState::Hunting && other.state != MonsterState::Hunting {
            let r = self.roll(5);
            if r == 0 {
                self.set_target(other_id, me.target);
                self.set_state(other_id, MonsterState::Wandering);
                self.gather_band(other_id);
            } else if (r == 1 || r == 2) && other_target_far {
                let target = self.free_cell();
                self.set_target(other_id, target);
                self.set_state(other_id, MonsterState::Wandering);
                self.gather_band(other_id);
            } else {
                self.repath(id);
            }
        } else if !self.world.in_los(other.pos)
            && other_target_far
            && other.state != MonsterState::Hunting
        {
            let r = self.roll(5);
            if r == 0 {
                let target = self.free_cell();
                self.set_target(id, target);
                self.gather_band(id);
            } else if (r == 1 || r == 2) && other.state == MonsterState::Resting {
                let target = self.free_cell();
                self.set_target(other_id, target);
                self.set_state(other_id, MonsterState::Wandering);
                self.gather_band(other_id);
            } else {
                self.repath(id);
            }
        } else if other.pos.is_adjacent(player_pos) {
            self.repath(id);
        } else if (other.state == MonsterState::Hunting && me.state == MonsterState::Hunting)
            || !self.world.in_los(me.target)
        {
            if self.roll(4) == 0 {
                self.set_target(id, other.target);
            }
            self.repath(id);
        } else {
            self.repath(id);
        }
    }

    /// Moves a monster one step, noticing it when it walks into view.
    pub(crate) fn move_monster_to(&mut self, id: MonsterId, to: Pos) {
        let Some(monster) = self.world.monsters.get(id) else {
            return;
        };
        let from = monster.pos;
        let was_visible = self.world.in_los(from);
        let will_be_visible = self.world.in_los(to);
        if !was_visible && will_be_visible {
            let monster = &mut self.world.monsters[id];
            if !monster.seen {
                monster.seen = true;
                let kind = monster.kind;
                self.log.push(LogEvent::MonsterSighted { monster: id, kind, pos: to });
            }
            self.stop_auto();
        }
        let door_changed = (was_visible && self.world.doors.contains(&from))
            || (will_be_visible && self.world.doors.contains(&to));
        self.world.move_monster(id, to);
        self.world.monsters[id].in_view = will_be_visible;
        if door_changed {
            self.compute_los();
        }
    }

    fn make_aware(&mut self, id: MonsterId) {
        let Some(me) = self.snapshot(id) else {
            return;
        };
        if !self.world.in_los(me.pos) {
            return;
        }
        let exhausted = self.world.monsters[id].has_status(MonsterStatus::Exhausted);
        let distance = me.pos.chebyshev(self.world.player.pos);
        let adjust = self.los_range() - distance;
        match me.state {
            MonsterState::Resting => {
                if exhausted && (distance > 1 || self.roll(3) > 0) {
                    return;
                }
                let mut stealth = 28 - 4 * adjust;
                if distance <= 1 {
                    stealth = stealth.min(15);
                }
                if self.roll(stealth) >= 5 {
                    return;
                }
                self.log.push(LogEvent::MonsterAwoke { monster: id, kind: me.kind });
            }
            MonsterState::Wandering => {
                let stealth = 37 - 4 * adjust;
                if self.roll(stealth) >= 25 && distance > 1 {
                    return;
                }
                self.log.push(LogEvent::MonsterNoticedPlayer { monster: id, kind: me.kind });
            }
            MonsterState::Hunting => {}
        }
        if me.state != MonsterState::Hunting && me.kind.barks() {
            self.log.push(LogEvent::MonsterBarked { monster: id });
            self.make_noise(BARK_NOISE, me.pos);
        }
        self.make_hunt(id);
    }

    pub(crate) fn make_hunt(&mut self, id: MonsterId) {
        let player_pos = self.world.player.pos;
        if let Some(monster) = self.world.monsters.get_mut(id) {
            if monster.state != MonsterState::Hunting {
                debug!(kind = ?monster.kind, "monster starts hunting");
            }
            monster.state = MonsterState::Hunting;
            monster.target = player_pos;
        }
    }

    /// A hurt monster hunts when it sees the player, otherwise a sleeper gets up.
    pub(crate) fn make_aware_if_hurt(&mut self, id: MonsterId) {
        let Some(me) = self.snapshot(id) else {
            return;
        };
        if self.world.in_los(me.pos) && me.state != MonsterState::Hunting {
            if me.state == MonsterState::Resting {
                self.log.push(LogEvent::MonsterAwoke { monster: id, kind: me.kind });
            }
            if me.kind.barks() {
                self.log.push(LogEvent::MonsterBarked { monster: id });
                self.make_noise(BARK_NOISE, me.pos);
            }
            self.make_hunt(id);
            return;
        }
        if me.state == MonsterState::Resting {
            let target = self.free_cell();
            self.set_target(id, target);
            self.set_state(id, MonsterState::Wandering);
        }
    }

    pub(crate) fn natural_awake(&mut self, id: MonsterId) {
        let target = self.free_cell();
        self.set_target(id, target);
        self.set_state(id, MonsterState::Wandering);
        self.gather_band(id);
    }

    /// Band mates close enough to `id` may adopt its target.
    pub(crate) fn gather_band(&mut self, id: MonsterId) {
        let Some(leader) = self.world.monsters.get(id) else {
            return;
        };
        let Some(band) = leader.band else {
            return;
        };
        let (origin, leader_state, target) = (leader.pos, leader.state, leader.target);
        let radius = self.config.band_radius;
        let costs = build_cost_map(
            &mut NoisePath { map: &self.world.map },
            self.world.map.width(),
            self.world.map.height(),
            &[origin],
            radius,
        );
        let mates: Vec<MonsterId> = self
            .world
            .monsters
            .iter()
            .filter(|(mate, monster)| *mate != id && monster.band == Some(band))
            .map(|(mate, _)| mate)
            .collect();
        for mate in mates {
            let monster = &self.world.monsters[mate];
            let (state, pos) = (monster.state, monster.pos);
            let exhausted = monster.has_status(MonsterStatus::Exhausted);
            if state == MonsterState::Hunting && leader_state != MonsterState::Hunting {
                continue;
            }
            if costs.cost_at(pos) > radius
                || (state == MonsterState::Resting && exhausted && self.roll(2) == 0)
            {
                continue;
            }
            let r = self.roll(100);
            if r > 50 || (state == MonsterState::Wandering && r > 10) {
                self.set_target(mate, target);
                if state == MonsterState::Resting {
                    self.set_state(mate, MonsterState::Wandering);
                }
            }
        }
    }

    fn monster_attack(&mut self, id: MonsterId) {
        let Some(kind) = self.world.monsters.get(id).map(|m| m.kind) else {
            return;
        };
        let damage = 1 + self.roll(monster_stats(kind).attack);
        self.world.player.hp -= damage;
        self.log.push(LogEvent::MonsterHitPlayer { monster: id, damage });
        self.make_noise(HIT_NOISE, self.world.player.pos);
        self.stop_auto();
    }

    /// Applies damage and removes the monster at zero hit points. Returns
    /// whether it died.
    pub(crate) fn damage_monster(&mut self, id: MonsterId, damage: i32) -> bool {
        let Some(monster) = self.world.monsters.get_mut(id) else {
            return false;
        };
        monster.hp -= damage;
        if monster.hp > 0 {
            return false;
        }
        if let Some(dead) = self.world.remove_monster(id) {
            debug!(kind = ?dead.kind, y = dead.pos.y, x = dead.pos.x, "monster killed");
            self.log.push(LogEvent::MonsterKilled { monster: id, kind: dead.kind });
            if self.world.doors.contains(&dead.pos) {
                self.compute_los();
            }
        }
        true
    }
}
