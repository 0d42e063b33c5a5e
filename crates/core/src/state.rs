use std::collections::{BTreeMap, BTreeSet};

use slotmap::SlotMap;

use crate::content::monster_stats;
use crate::game::visibility::VisibilitySet;
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub terrain: Terrain,
    pub explored: bool,
}

/// Fixed-size cell grid stored row-major.
#[derive(Clone, Debug)]
pub struct Map {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Map {
    /// A free interior enclosed by a one-cell wall border.
    pub fn new(width: usize, height: usize) -> Self {
        let mut map = Self::open(width, height);
        for x in 0..width as i32 {
            map.set_terrain(Pos { y: 0, x }, Terrain::Wall);
            map.set_terrain(Pos { y: height as i32 - 1, x }, Terrain::Wall);
        }
        for y in 0..height as i32 {
            map.set_terrain(Pos { y, x: 0 }, Terrain::Wall);
            map.set_terrain(Pos { y, x: width as i32 - 1 }, Terrain::Wall);
        }
        map
    }

    /// A grid with no walls at all.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell { terrain: Terrain::Free, explored: false }; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Flat index of an in-bounds position.
    pub fn index(&self, pos: Pos) -> usize {
        pos.y as usize * self.width + pos.x as usize
    }

    pub fn cell(&self, pos: Pos) -> Option<Cell> {
        self.in_bounds(pos).then(|| self.cells[self.index(pos)])
    }

    /// Out-of-bounds positions read as walls.
    pub fn terrain_at(&self, pos: Pos) -> Terrain {
        self.cell(pos).map_or(Terrain::Wall, |cell| cell.terrain)
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.terrain_at(pos) == Terrain::Wall
    }

    pub fn is_free(&self, pos: Pos) -> bool {
        self.terrain_at(pos) == Terrain::Free
    }

    pub fn set_terrain(&mut self, pos: Pos, terrain: Terrain) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.cells[idx].terrain = terrain;
    }

    pub fn is_explored(&self, pos: Pos) -> bool {
        self.cell(pos).is_some_and(|cell| cell.explored)
    }

    pub fn set_explored(&mut self, pos: Pos) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.cells[idx].explored = true;
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Pos { y, x }))
    }

    pub fn explored_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.explored).count()
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Pos,
    pub hp: i32,
    pub max_hp: i32,
    /// Active statuses with their stack count.
    pub statuses: BTreeMap<PlayerStatus, u32>,
}

impl Player {
    pub fn has_status(&self, status: PlayerStatus) -> bool {
        self.statuses.get(&status).is_some_and(|count| *count > 0)
    }
}

#[derive(Clone, Debug)]
pub struct Monster {
    pub kind: MonsterKind,
    pub pos: Pos,
    pub hp: i32,
    pub state: MonsterState,
    pub target: Pos,
    /// Remaining steps toward `target`, next step first.
    pub path: Vec<Pos>,
    pub statuses: BTreeMap<MonsterStatus, u32>,
    /// Whether the player has ever had this monster in view.
    pub seen: bool,
    /// Whether the monster stood in the player's view at the last check.
    pub in_view: bool,
    pub band: Option<u32>,
}

impl Monster {
    pub fn new(kind: MonsterKind, pos: Pos, band: Option<u32>) -> Self {
        Self {
            kind,
            pos,
            hp: monster_stats(kind).max_hp,
            state: MonsterState::Resting,
            target: pos,
            path: Vec::new(),
            statuses: BTreeMap::new(),
            seen: false,
            in_view: false,
            band,
        }
    }

    pub fn has_status(&self, status: MonsterStatus) -> bool {
        self.statuses.get(&status).is_some_and(|count| *count > 0)
    }
}

/// Automated player modes. Visibility and noise set `halt`; the next player
/// turn observes it and returns control to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Automation {
    pub autoexploring: bool,
    pub halt: bool,
    pub run_dir: Option<Direction>,
    pub travel_target: Option<Pos>,
    pub resting: bool,
    pub rest_turns: i32,
}

impl Automation {
    pub fn active_mode(&self) -> Option<AutoMode> {
        if self.resting {
            Some(AutoMode::Rest)
        } else if self.travel_target.is_some() {
            Some(AutoMode::Travel)
        } else if self.run_dir.is_some() {
            Some(AutoMode::Run)
        } else if self.autoexploring && !self.halt {
            Some(AutoMode::Explore)
        } else {
            None
        }
    }
}

/// The single mutable world every engine reads.
#[derive(Clone, Debug)]
pub struct World {
    pub map: Map,
    pub player: Player,
    pub monsters: SlotMap<MonsterId, Monster>,
    occupancy: Vec<Option<MonsterId>>,
    exclusions: Vec<bool>,
    /// Closed doors. A door only blocks light while nobody stands in it.
    pub doors: BTreeSet<Pos>,
    pub foliage: BTreeSet<Pos>,
    pub clouds: BTreeMap<Pos, CloudKind>,
    pub temporary_walls: BTreeSet<Pos>,
    pub features: BTreeMap<Pos, Feature>,
    /// Cells whose wall state changed while out of view.
    pub wrong_wall: BTreeSet<Pos>,
    pub wrong_door: BTreeSet<Pos>,
    pub wrong_foliage: BTreeSet<Pos>,
    pub los: VisibilitySet,
    /// Cells where monsters were heard on the last player turn.
    pub noise: BTreeSet<Pos>,
    pub auto: Automation,
}

impl World {
    pub fn new(map: Map, player: Player) -> Self {
        let cells = map.width() * map.height();
        Self {
            map,
            player,
            monsters: SlotMap::with_key(),
            occupancy: vec![None; cells],
            exclusions: vec![false; cells],
            doors: BTreeSet::new(),
            foliage: BTreeSet::new(),
            clouds: BTreeMap::new(),
            temporary_walls: BTreeSet::new(),
            features: BTreeMap::new(),
            wrong_wall: BTreeSet::new(),
            wrong_door: BTreeSet::new(),
            wrong_foliage: BTreeSet::new(),
            los: VisibilitySet::default(),
            noise: BTreeSet::new(),
            auto: Automation::default(),
        }
    }

    pub fn monster_at(&self, pos: Pos) -> Option<MonsterId> {
        if !self.map.in_bounds(pos) {
            return None;
        }
        self.occupancy[self.map.index(pos)]
    }

    pub fn is_occupied(&self, pos: Pos) -> bool {
        pos == self.player.pos || self.monster_at(pos).is_some()
    }

    pub fn add_monster(&mut self, monster: Monster) -> MonsterId {
        let pos = monster.pos;
        let id = self.monsters.insert(monster);
        if self.map.in_bounds(pos) {
            let idx = self.map.index(pos);
            self.occupancy[idx] = Some(id);
        }
        id
    }

    pub fn move_monster(&mut self, id: MonsterId, to: Pos) {
        let Some(monster) = self.monsters.get_mut(id) else {
            return;
        };
        let from = monster.pos;
        monster.pos = to;
        let from_idx = self.map.index(from);
        if self.occupancy[from_idx] == Some(id) {
            self.occupancy[from_idx] = None;
        }
        let to_idx = self.map.index(to);
        self.occupancy[to_idx] = Some(id);
    }

    pub fn remove_monster(&mut self, id: MonsterId) -> Option<Monster> {
        let monster = self.monsters.remove(id)?;
        let idx = self.map.index(monster.pos);
        if self.occupancy[idx] == Some(id) {
            self.occupancy[idx] = None;
        }
        Some(monster)
    }

    pub fn is_excluded(&self, pos: Pos) -> bool {
        self.map.in_bounds(pos) && self.exclusions[self.map.index(pos)]
    }

    pub fn set_excluded(&mut self, pos: Pos, excluded: bool) {
        if !self.map.in_bounds(pos) {
            return;
        }
        let idx = self.map.index(pos);
        self.exclusions[idx] = excluded;
    }

    pub fn in_los(&self, pos: Pos) -> bool {
        self.los.is_visible(pos)
    }

    /// Whether the player believes `pos` holds a wall.
    pub fn believes_wall(&self, pos: Pos) -> bool {
        self.map.is_wall(pos) != self.wrong_wall.contains(&pos)
    }

    /// Fire the player knows about: burning cells flagged stale are not yet known.
    pub fn known_fire(&self, pos: Pos) -> bool {
        self.clouds.get(&pos) == Some(&CloudKind::Fire)
            && !self.wrong_door.contains(&pos)
            && !self.wrong_foliage.contains(&pos)
    }

    /// In-bounds free neighbors in the fixed direction order.
    pub fn free_neighbors(&self, pos: Pos) -> Vec<Pos> {
        Direction::ALL
            .into_iter()
            .map(|dir| pos.step(dir))
            .filter(|next| self.map.in_bounds(*next) && self.map.is_free(*next))
            .collect()
    }

    pub fn monsters_in_view(&self) -> bool {
        self.monsters.values().any(|monster| self.in_los(monster.pos))
    }
}
