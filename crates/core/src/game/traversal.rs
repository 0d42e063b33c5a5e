//! Traversal policies shared by the cost-map engine and the A* pathfinder.
//! This module exists so each agent's movement rules are a small value built per query.
//! It does not own search; policies only answer neighbor and step-cost questions.

use rand_chacha::ChaCha8Rng;

use super::roll;
use crate::state::{Map, Monster, World};
use crate::types::*;

/// Neighbor and cost rules for one query.
///
/// `neighbors` appends in-bounds positions only, in a fixed order unless the
/// policy documents otherwise. A `cost` at or above [`UNREACHABLE`] marks a
/// step that the engines must never take.
pub trait Traversal {
    fn neighbors(&mut self, pos: Pos, out: &mut Vec<Pos>);

    fn cost(&self, from: Pos, to: Pos) -> i32;

    fn estimation(&self, from: Pos, to: Pos) -> i32 {
        from.chebyshev(to)
    }
}

fn push_neighbors(
    map: &Map,
    pos: Pos,
    cardinal_only: bool,
    out: &mut Vec<Pos>,
    keep: impl Fn(Pos) -> bool,
) {
    let dirs: &[Direction] = if cardinal_only { &Direction::CARDINAL } else { &Direction::ALL };
    for dir in dirs {
        let next = pos.step(*dir);
        if map.in_bounds(next) && keep(next) {
            out.push(next);
        }
    }
}

/// Plain terrain: walls are either excluded or cost `wall_cost`.
pub struct TerrainPath<'a> {
    pub map: &'a Map,
    pub wall_cost: Option<i32>,
}

impl Traversal for TerrainPath<'_> {
    fn neighbors(&mut self, pos: Pos, out: &mut Vec<Pos>) {
        let walls_allowed = self.wall_cost.is_some();
        push_neighbors(self.map, pos, false, out, |next| walls_allowed || self.map.is_free(next));
    }

    fn cost(&self, _from: Pos, to: Pos) -> i32 {
        if self.map.is_wall(to) { self.wall_cost.unwrap_or(UNREACHABLE) } else { 1 }
    }
}

/// The player's own travel rules, based on what the player knows.
pub struct PlayerPath<'a> {
    pub world: &'a World,
    pub goal: Pos,
}

impl Traversal for PlayerPath<'_> {
    fn neighbors(&mut self, pos: Pos, out: &mut Vec<Pos>) {
        let player = &self.world.player;
        let confused = player.has_status(PlayerStatus::Confusion);
        let digging = player.has_status(PlayerStatus::Dig);
        let start = out.len();
        push_neighbors(&self.world.map, pos, confused, out, |next| {
            self.world.map.is_explored(next)
                && (digging || !self.world.believes_wall(next))
                && !self.world.known_fire(next)
        });
        let goal = self.goal;
        out[start..].sort_by_key(|next| next.chebyshev(goal));
    }

    fn cost(&self, from: Pos, to: Pos) -> i32 {
        let entering_exclusion = !self.world.is_excluded(from) && self.world.is_excluded(to);
        if entering_exclusion && from != self.world.player.pos { UNREACHABLE } else { 1 }
    }
}

/// Monster movement. Neighbor order is shuffled per call with the game RNG.
pub struct MonsterPath<'a> {
    pub world: &'a World,
    pub monster: &'a Monster,
    pub rng: &'a mut ChaCha8Rng,
}

pub const MONSTER_OCCUPIED_COST: i32 = 4;
pub const MONSTER_LIGNIFIED_OCCUPANT_COST: i32 = 8;
pub const DIG_COST: i32 = 6;

impl Traversal for MonsterPath<'_> {
    fn neighbors(&mut self, pos: Pos, out: &mut Vec<Pos>) {
        let confused = self.monster.has_status(MonsterStatus::Confused);
        let digs = self.monster.kind.digs();
        let start = out.len();
        push_neighbors(&self.world.map, pos, confused, out, |next| {
            digs || self.world.map.is_free(next)
        });
        let added = &mut out[start..];
        for i in (1..added.len()).rev() {
            let j = roll(self.rng, i as i32 + 1) as usize;
            added.swap(i, j);
        }
    }

    fn cost(&self, _from: Pos, to: Pos) -> i32 {
        match self.world.monster_at(to).and_then(|id| self.world.monsters.get(id)) {
            None => {
                let digging = self.monster.kind.digs()
                    && self.world.map.is_wall(to)
                    && self.monster.state != MonsterState::Hunting;
                if digging { DIG_COST } else { 1 }
            }
            Some(occupant) if occupant.has_status(MonsterStatus::Lignified) => {
                MONSTER_LIGNIFIED_OCCUPANT_COST
            }
            Some(_) => MONSTER_OCCUPIED_COST,
        }
    }
}

/// Uniform spread over free cells: sound, fog and band radius.
pub struct NoisePath<'a> {
    pub map: &'a Map,
}

impl Traversal for NoisePath<'_> {
    fn neighbors(&mut self, pos: Pos, out: &mut Vec<Pos>) {
        push_neighbors(self.map, pos, false, out, |next| self.map.is_free(next));
    }

    fn cost(&self, _from: Pos, _to: Pos) -> i32 {
        1
    }
}

/// Frontier expansion for autoexplore. Nothing expands out of an excluded cell.
pub struct AutoexplorePath<'a> {
    pub world: &'a World,
}

impl Traversal for AutoexplorePath<'_> {
    fn neighbors(&mut self, pos: Pos, out: &mut Vec<Pos>) {
        if self.world.is_excluded(pos) {
            return;
        }
        let confused = self.world.player.has_status(PlayerStatus::Confusion);
        push_neighbors(&self.world.map, pos, confused, out, |next| {
            !self.world.is_excluded(next)
                && !self.world.believes_wall(next)
                && !self.world.known_fire(next)
        });
    }

    fn cost(&self, _from: Pos, _to: Pos) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::rand_core::SeedableRng;

    use super::*;
    use crate::game::test_support::*;

    #[test]
    fn terrain_path_excludes_walls_unless_costed() {
        let mut map = Map::open(3, 3);
        map.set_terrain(Pos { y: 1, x: 1 }, Terrain::Wall);
        let mut out = Vec::new();

        TerrainPath { map: &map, wall_cost: None }.neighbors(Pos { y: 0, x: 0 }, &mut out);
        assert_eq!(out, vec![Pos { y: 0, x: 1 }, Pos { y: 1, x: 0 }]);

        out.clear();
        let mut costly = TerrainPath { map: &map, wall_cost: Some(4) };
        costly.neighbors(Pos { y: 0, x: 0 }, &mut out);
        assert_eq!(out.len(), 3);
        assert_eq!(costly.cost(Pos { y: 0, x: 0 }, Pos { y: 1, x: 1 }), 4);
    }

    #[test]
    fn neighbor_order_is_east_west_north_south_then_diagonals() {
        let map = Map::open(3, 3);
        let mut out = Vec::new();
        NoisePath { map: &map }.neighbors(Pos { y: 1, x: 1 }, &mut out);
        assert_eq!(
            out,
            vec![
                Pos { y: 1, x: 2 },
                Pos { y: 1, x: 0 },
                Pos { y: 0, x: 1 },
                Pos { y: 2, x: 1 },
                Pos { y: 0, x: 2 },
                Pos { y: 0, x: 0 },
                Pos { y: 2, x: 2 },
                Pos { y: 2, x: 0 },
            ]
        );
    }

    #[test]
    fn confused_player_only_gets_cardinal_neighbors() {
        let mut world = open_world(7, 7, Pos { y: 3, x: 3 });
        explore_all(&mut world);
        world.player.statuses.insert(PlayerStatus::Confusion, 1);
        let mut out = Vec::new();
        PlayerPath { world: &world, goal: Pos { y: 1, x: 1 } }.neighbors(world.player.pos, &mut out);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|p| p.x == 3 || p.y == 3));
    }

    #[test]
    fn player_neighbors_are_sorted_toward_goal_and_explored_only() {
        let mut world = open_world(7, 7, Pos { y: 3, x: 3 });
        let unexplored = Pos { y: 3, x: 4 };
        for p in world.map.positions() {
            if p != unexplored {
                world.map.set_explored(p);
            }
        }
        let mut out = Vec::new();
        PlayerPath { world: &world, goal: Pos { y: 1, x: 5 } }.neighbors(world.player.pos, &mut out);
        assert!(!out.contains(&unexplored));
        assert_eq!(out.first(), Some(&Pos { y: 2, x: 4 }));
    }

    #[test]
    fn player_path_blocks_entering_exclusion_except_from_player_cell() {
        let mut world = open_world(9, 9, Pos { y: 4, x: 1 });
        explore_all(&mut world);
        let inside = Pos { y: 4, x: 3 };
        world.set_excluded(inside, true);
        let policy = PlayerPath { world: &world, goal: inside };
        assert_eq!(policy.cost(Pos { y: 4, x: 2 }, inside), UNREACHABLE);
        assert_eq!(policy.cost(Pos { y: 4, x: 1 }, Pos { y: 4, x: 2 }), 1);
        world.player.pos = Pos { y: 4, x: 2 };
        let policy = PlayerPath { world: &world, goal: inside };
        assert_eq!(policy.cost(Pos { y: 4, x: 2 }, inside), 1);
    }

    #[test]
    fn monster_costs_prefer_empty_cells_and_avoid_rooted_occupants() {
        let mut world = open_world(9, 9, Pos { y: 1, x: 1 });
        let walker = Monster::new(MonsterKind::Goblin, Pos { y: 4, x: 4 }, None);
        let blocker = world.add_monster(Monster::new(MonsterKind::Ogre, Pos { y: 4, x: 5 }, None));
        let mut rooted = Monster::new(MonsterKind::Ogre, Pos { y: 5, x: 5 }, None);
        rooted.statuses.insert(MonsterStatus::Lignified, 1);
        world.add_monster(rooted);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let policy = MonsterPath { world: &world, monster: &walker, rng: &mut rng };

        assert_eq!(policy.cost(walker.pos, Pos { y: 3, x: 4 }), 1);
        assert_eq!(policy.cost(walker.pos, world.monsters[blocker].pos), MONSTER_OCCUPIED_COST);
        assert_eq!(policy.cost(walker.pos, Pos { y: 5, x: 5 }), MONSTER_LIGNIFIED_OCCUPANT_COST);
    }

    #[test]
    fn digger_may_enter_walls_at_a_cost() {
        let mut world = open_world(7, 7, Pos { y: 1, x: 1 });
        world.map.set_terrain(Pos { y: 3, x: 4 }, Terrain::Wall);
        let dragon = Monster::new(MonsterKind::EarthDragon, Pos { y: 3, x: 3 }, None);
        let goblin = Monster::new(MonsterKind::Goblin, Pos { y: 3, x: 3 }, None);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let mut out = Vec::new();
        MonsterPath { world: &world, monster: &dragon, rng: &mut rng }.neighbors(dragon.pos, &mut out);
        assert!(out.contains(&Pos { y: 3, x: 4 }));
        let dragon_policy = MonsterPath { world: &world, monster: &dragon, rng: &mut rng };
        assert_eq!(dragon_policy.cost(dragon.pos, Pos { y: 3, x: 4 }), DIG_COST);

        out.clear();
        MonsterPath { world: &world, monster: &goblin, rng: &mut rng }.neighbors(goblin.pos, &mut out);
        assert!(!out.contains(&Pos { y: 3, x: 4 }));
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn monster_neighbor_shuffle_is_seeded() {
        let world = open_world(9, 9, Pos { y: 1, x: 1 });
        let monster = Monster::new(MonsterKind::Goblin, Pos { y: 4, x: 4 }, None);
        let shuffled = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut out = Vec::new();
            MonsterPath { world: &world, monster: &monster, rng: &mut rng }.neighbors(monster.pos, &mut out);
            out
        };
        let first = shuffled(11);
        assert_eq!(first, shuffled(11));
        let mut sorted = first.clone();
        sorted.sort();
        let mut expected: Vec<Pos> = Direction::ALL.iter().map(|d| monster.pos.step(*d)).collect();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn autoexplore_does_not_expand_out_of_exclusions() {
        let mut world = open_world(7, 7, Pos { y: 3, x: 3 });
        world.set_excluded(Pos { y: 3, x: 3 }, true);
        world.set_excluded(Pos { y: 3, x: 4 }, true);
        let mut out = Vec::new();
        AutoexplorePath { world: &world }.neighbors(Pos { y: 3, x: 3 }, &mut out);
        assert!(out.is_empty());
        AutoexplorePath { world: &world }.neighbors(Pos { y: 3, x: 5 }, &mut out);
        assert!(!out.contains(&Pos { y: 3, x: 4 }));
        assert!(out.contains(&Pos { y: 2, x: 5 }));
    }
}
