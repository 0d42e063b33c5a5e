//! Fog, fire and temporary walls, with the cloud events that age them.

use tracing::trace;

use super::cost_map::build_cost_map;
use super::events::CloudAction;
use super::traversal::NoisePath;
use super::*;
use crate::content::TEMPORARY_WALL_NOISE;

const FIRE_TICK: i32 = 10;

impl Game {
    /// Covers free cells within `radius` of `at` with fog, leaving existing
    /// clouds alone.
    pub fn fog(&mut self, at: Pos, radius: i32) {
        let costs = build_cost_map(
            &mut NoisePath { map: &self.world.map },
            self.world.map.width(),
            self.world.map.height(),
            &[at],
            radius,
        );
        for &pos in costs.settled() {
            if self.world.clouds.contains_key(&pos) {
                continue;
            }
            self.world.clouds.insert(pos, CloudKind::Fog);
            let delay = 100 + self.roll(100);
            self.schedule(delay, EventPayload::Cloud { pos, action: CloudAction::FogEnd });
        }
        self.compute_los();
    }

    /// Raises a wall on a free, empty cell that collapses after a while.
    /// Returns whether a wall was created.
    pub fn create_temporary_wall(&mut self, pos: Pos) -> bool {
        if !self.world.map.in_bounds(pos) || self.world.map.is_wall(pos) || self.world.is_occupied(pos)
        {
            return false;
        }
        if !self.world.in_los(pos) {
            self.world.wrong_wall.insert(pos);
        }
        self.world.map.set_terrain(pos, Terrain::Wall);
        self.world.clouds.remove(&pos);
        self.world.temporary_walls.insert(pos);
        let delay = 200 + self.roll(50);
        self.schedule(delay, EventPayload::Cloud { pos, action: CloudAction::WallCollapse });
        self.compute_los();
        true
    }

    /// Sets foliage or a door on fire. Returns whether anything caught.
    pub fn ignite(&mut self, pos: Pos) -> bool {
        if self.world.clouds.contains_key(&pos) {
            return false;
        }
        let was_foliage = self.world.foliage.remove(&pos);
        let was_door = self.world.doors.remove(&pos);
        if !was_foliage && !was_door {
            return false;
        }
        self.world.clouds.insert(pos, CloudKind::Fire);
        if self.world.in_los(pos) {
            self.compute_los();
        } else if was_door {
            self.world.wrong_door.insert(pos);
        } else {
            self.world.wrong_foliage.insert(pos);
        }
        self.schedule(FIRE_TICK, EventPayload::Cloud { pos, action: CloudAction::FireProgression });
        self.burn_creature(pos);
        true
    }

    pub(crate) fn cloud_event(&mut self, pos: Pos, action: CloudAction, event: Event) {
        trace!(?action, y = pos.y, x = pos.x, "cloud event");
        match action {
            CloudAction::FogEnd => {
                self.world.clouds.remove(&pos);
                self.compute_los();
            }
            CloudAction::WallCollapse => self.collapse_wall(pos),
            CloudAction::FireProgression => self.progress_fire(pos, event),
        }
    }

    fn collapse_wall(&mut self, pos: Pos) {
        let seen = self.world.in_los(pos);
        if !seen && self.world.map.is_wall(pos) {
            if !self.world.wrong_wall.remove(&pos) {
                self.world.wrong_wall.insert(pos);
            }
        } else {
            self.world.temporary_walls.remove(&pos);
        }
        if self.world.map.is_free(pos) {
            return;
        }
        self.world.map.set_terrain(pos, Terrain::Free);
        self.make_noise(TEMPORARY_WALL_NOISE, pos);
        if seen {
            self.log.push(LogEvent::WallCollapsed { pos });
        }
        self.fog(pos, 1);
    }

    fn progress_fire(&mut self, pos: Pos, event: Event) {
        if self.world.clouds.get(&pos) != Some(&CloudKind::Fire) {
            return;
        }
        self.burn_creature(pos);
        if self.roll(10) == 0 {
            self.world.clouds.remove(&pos);
            self.fog(pos, 1);
            return;
        }
        for neighbor in self.world.free_neighbors(pos) {
            if self.roll(3) > 0 {
                continue;
            }
            self.ignite(neighbor);
        }
        self.events.renew(event, FIRE_TICK);
    }

    fn burn_creature(&mut self, pos: Pos) {
        if let Some(id) = self.world.monster_at(pos) {
            let damage = 1 + self.roll(10);
            if !self.damage_monster(id, damage) {
                self.make_aware_if_hurt(id);
            }
        }
        if pos == self.world.player.pos {
            let mut damage = 1 + self.roll(10);
            if damage > self.world.player.hp {
                damage = 1 + self.roll(10);
            }
            self.world.player.hp -= damage;
            self.log.push(LogEvent::PlayerBurned { damage });
            self.stop_auto();
        }
    }
}
