//! Stable snapshot hashing for deterministic verification.
//! This module exists to keep hashing concerns separate from simulation control code.
//! It does not own replay execution or journal persistence policies.

use std::hash::{Hash, Hasher};

use super::*;
use xxhash_rust::xxh3::Xxh3;

impl Game {
    /// Hash of everything that influences future simulation, RNG position
    /// included. Two games with equal hashes evolve identically.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.seed);
        hasher.write_i32(self.turn);
        hasher.write_u64(self.next_input_seq);
        hasher.write_u64(self.rng.clone().next_u64());
        hasher.write_u8(match self.outcome {
            None => 0,
            Some(RunOutcome::Death) => 1,
            Some(RunOutcome::Quit) => 2,
        });
        self.pending_turn.hash(&mut hasher);

        let player = &self.world.player;
        player.pos.hash(&mut hasher);
        hasher.write_i32(player.hp);
        player.statuses.hash(&mut hasher);

        for (id, monster) in &self.world.monsters {
            id.hash(&mut hasher);
            monster.kind.hash(&mut hasher);
            monster.pos.hash(&mut hasher);
            hasher.write_i32(monster.hp);
            monster.state.hash(&mut hasher);
            monster.target.hash(&mut hasher);
            monster.path.hash(&mut hasher);
            monster.statuses.hash(&mut hasher);
            hasher.write_u8(u8::from(monster.seen));
            hasher.write_u8(u8::from(monster.in_view));
            monster.band.hash(&mut hasher);
        }

        let map = &self.world.map;
        for pos in map.positions() {
            hasher.write_u8(u8::from(map.is_wall(pos)));
            hasher.write_u8(u8::from(map.is_explored(pos)));
            hasher.write_u8(u8::from(self.world.is_excluded(pos)));
        }
        self.world.doors.hash(&mut hasher);
        self.world.foliage.hash(&mut hasher);
        self.world.clouds.hash(&mut hasher);
        self.world.temporary_walls.hash(&mut hasher);
        self.world.features.hash(&mut hasher);
        self.world.wrong_wall.hash(&mut hasher);
        self.world.wrong_door.hash(&mut hasher);
        self.world.wrong_foliage.hash(&mut hasher);

        let auto = &self.world.auto;
        hasher.write_u8(u8::from(auto.autoexploring));
        hasher.write_u8(u8::from(auto.halt));
        hasher.write_u8(u8::from(auto.resting));
        hasher.write_i32(auto.rest_turns);
        auto.run_dir.hash(&mut hasher);
        auto.travel_target.hash(&mut hasher);

        for (event, index) in self.events.entries() {
            event.hash(&mut hasher);
            hasher.write_u64(index);
        }
        hasher.finish()
    }
}
