//! Field-of-view from a light-cost pass intersected with symmetric shadowcasting.
//! This module exists to keep sight rules pure and deterministic: the same map, blockers
//! and origin always give the same visible set.
//! It does not own reveal side effects; `perception` applies those to the world.

use std::collections::{BTreeMap, BTreeSet};

use crate::state::Map;
use crate::types::{Pos, UNREACHABLE};

/// Dynamic light blockers layered over the map's hard walls. Soft blockers
/// only affect the light-cost pass, never the occlusion pass.
/// Hard walls are opaque to both passes.
pub trait SoftBlockers {
    /// Light leaving this cell is spent entirely (clouds, closed empty doors).
    fn is_opaque(&self, pos: Pos) -> bool;

    /// Light leaving this cell is shortened (foliage).
    fn is_foliage(&self, pos: Pos) -> bool;
}

/// Only hard walls block.
pub struct NoSoftBlockers;

impl SoftBlockers for NoSoftBlockers {
    fn is_opaque(&self, _pos: Pos) -> bool {
        false
    }

    fn is_foliage(&self, _pos: Pos) -> bool {
        false
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilitySet {
    origin: Pos,
    radius: i32,
    visible: BTreeSet<Pos>,
    cost_by_cell: BTreeMap<Pos, i32>,
}

impl VisibilitySet {
    pub fn origin(&self) -> Pos {
        self.origin
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn is_visible(&self, pos: Pos) -> bool {
        self.visible.contains(&pos)
    }

    pub fn visible(&self) -> &BTreeSet<Pos> {
        &self.visible
    }

    /// Light cost of a visible cell.
    pub fn cost_at(&self, pos: Pos) -> Option<i32> {
        self.cost_by_cell.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

/// Cells visible from `origin` within Chebyshev `radius`: lit by the cost pass
/// and not occluded by hard walls.
pub fn compute_visibility<B: SoftBlockers>(
    map: &Map,
    origin: Pos,
    radius: i32,
    blockers: &B,
) -> VisibilitySet {
    let mut set = VisibilitySet { origin, radius, ..VisibilitySet::default() };
    if !map.in_bounds(origin) {
        return set;
    }
    let light = LightPass::run(map, blockers, origin, radius);
    let occlusion = shadowcast(map, &light.frame, origin, radius);
    for pos in light.frame.positions() {
        let cost = light.cost(pos);
        if cost <= radius && occlusion[light.frame.index(pos)] {
            set.visible.insert(pos);
            set.cost_by_cell.insert(pos, cost);
        }
    }
    set
}

/// Cells the light travels through from `origin` to `target`, origin
/// excluded and target last. Empty when `target` is not visible.
pub fn ray<B: SoftBlockers>(
    map: &Map,
    origin: Pos,
    radius: i32,
    blockers: &B,
    target: Pos,
) -> Vec<Pos> {
    if !map.in_bounds(origin) || target == origin || !map.in_bounds(target) {
        return Vec::new();
    }
    let light = LightPass::run(map, blockers, origin, radius);
    if !light.frame.contains(target) || light.cost(target) > radius {
        return Vec::new();
    }
    let occlusion = shadowcast(map, &light.frame, origin, radius);
    if !occlusion[light.frame.index(target)] {
        return Vec::new();
    }

    let mut cells = vec![target];
    let mut pos = target;
    while let Some(parent) = light.best_parent(pos) {
        if parent == origin {
            break;
        }
        cells.push(parent);
        pos = parent;
    }
    cells.reverse();
    cells
}

/// The in-bounds box of Chebyshev radius around the origin.
struct Frame {
    min_x: i32,
    min_y: i32,
    width: usize,
    height: usize,
}

impl Frame {
    fn around(map: &Map, origin: Pos, radius: i32) -> Self {
        let radius = radius.max(0);
        let min_x = (origin.x - radius).max(0);
        let min_y = (origin.y - radius).max(0);
        let max_x = (origin.x + radius).min(map.width() as i32 - 1);
        let max_y = (origin.y + radius).min(map.height() as i32 - 1);
        Self {
            min_x,
            min_y,
            width: (max_x - min_x + 1) as usize,
            height: (max_y - min_y + 1) as usize,
        }
    }

    fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.min_x
            && pos.y >= self.min_y
            && ((pos.x - self.min_x) as usize) < self.width
            && ((pos.y - self.min_y) as usize) < self.height
    }

    fn index(&self, pos: Pos) -> usize {
        (pos.y - self.min_y) as usize * self.width + (pos.x - self.min_x) as usize
    }

    fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let (min_x, min_y) = (self.min_x, self.min_y);
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |dy| (0..width).map(move |dx| Pos { y: min_y + dy, x: min_x + dx }))
    }
}

struct LightPass<'a, B> {
    map: &'a Map,
    blockers: &'a B,
    origin: Pos,
    radius: i32,
    frame: Frame,
    costs: Vec<i32>,
}

impl<'a, B: SoftBlockers> LightPass<'a, B> {
    fn run(map: &'a Map, blockers: &'a B, origin: Pos, radius: i32) -> Self {
        let frame = Frame::around(map, origin, radius);
        let costs = vec![UNREACHABLE; frame.width * frame.height];
        let mut pass = Self { map, blockers, origin, radius, frame, costs };
        let idx = pass.frame.index(origin);
        pass.costs[idx] = 0;
        for ring in 1..=radius {
            for pos in ring_cells(origin, ring) {
                if !pass.frame.contains(pos) {
                    continue;
                }
                let best = pass.parents(pos).into_iter().flatten().map(|p| pass.through(p)).min();
                let idx = pass.frame.index(pos);
                pass.costs[idx] = best.unwrap_or(UNREACHABLE);
            }
        }
        pass
    }

    fn cost(&self, pos: Pos) -> i32 {
        if self.frame.contains(pos) { self.costs[self.frame.index(pos)] } else { UNREACHABLE }
    }

    /// Cost of reaching a child of `from` through `from`.
    fn through(&self, from: Pos) -> i32 {
        let base = self.cost(from);
        if base >= UNREACHABLE { UNREACHABLE } else { base + self.step_cost(from) }
    }

    fn step_cost(&self, from: Pos) -> i32 {
        if from == self.origin {
            return 1;
        }
        if self.map.is_wall(from) || self.blockers.is_opaque(from) {
            return self.radius;
        }
        if self.blockers.is_foliage(from) {
            return (self.radius - 2).max(1);
        }
        1
    }

    /// One or two neighbors on the previous ring that light can come from:
    /// the step straight toward the origin, plus the axis step for cells off
    /// both the axes and the diagonals.
    fn parents(&self, pos: Pos) -> [Option<Pos>; 2] {
        let dx = self.origin.x - pos.x;
        let dy = self.origin.y - pos.y;
        let primary = pos.offset(dx.signum(), dy.signum());
        let secondary = if dx == 0 || dy == 0 || dx.abs() == dy.abs() {
            None
        } else if dx.abs() > dy.abs() {
            Some(pos.offset(dx.signum(), 0))
        } else {
            Some(pos.offset(0, dy.signum()))
        };
        [Some(primary), secondary]
    }

    /// Cheapest parent; the primary one on ties.
    fn best_parent(&self, pos: Pos) -> Option<Pos> {
        let mut best: Option<(i32, Pos)> = None;
        for parent in self.parents(pos).into_iter().flatten() {
            let through = self.through(parent);
            if through >= UNREACHABLE {
                continue;
            }
            if best.is_none_or(|(best_cost, _)| through < best_cost) {
                best = Some((through, parent));
            }
        }
        best.map(|(_, parent)| parent)
    }
}

fn ring_cells(origin: Pos, ring: i32) -> impl Iterator<Item = Pos> {
    (-ring..=ring).flat_map(move |dy| {
        (-ring..=ring)
            .filter(move |dx| dx.abs() == ring || dy.abs() == ring)
            .map(move |dx| origin.offset(dx, dy))
    })
}

/// Rational slope `y / x` with `x > 0`.
#[derive(Clone, Copy, Debug)]
struct Slope {
    y: i32,
    x: i32,
}

impl Slope {
    fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }

    /// Slope through the near edge of the tile at `col` in row `depth`.
    fn of_tile(depth: i32, col: i32) -> Self {
        Self::new(2 * col - 1, 2 * depth)
    }
}

#[derive(Clone, Copy, Debug)]
struct Row {
    depth: i32,
    start: Slope,
    end: Slope,
}

impl Row {
    fn min_col(&self) -> i32 {
        // depth * start rounded half up
        (2 * self.depth * self.start.y + self.start.x).div_euclid(2 * self.start.x)
    }

    fn max_col(&self) -> i32 {
        // depth * end rounded half down
        -(self.end.x - 2 * self.depth * self.end.y).div_euclid(2 * self.end.x)
    }

    fn is_symmetric(&self, col: i32) -> bool {
        col * self.start.x >= self.depth * self.start.y && col * self.end.x <= self.depth * self.end.y
    }

    fn next(&self) -> Row {
        Row { depth: self.depth + 1, ..*self }
    }
}

#[derive(Clone, Copy)]
enum Quadrant {
    North,
    East,
    South,
    West,
}

impl Quadrant {
    fn transform(self, origin: Pos, depth: i32, col: i32) -> Pos {
        match self {
            Quadrant::North => Pos { y: origin.y - depth, x: origin.x + col },
            Quadrant::South => Pos { y: origin.y + depth, x: origin.x + col },
            Quadrant::East => Pos { y: origin.y + col, x: origin.x + depth },
            Quadrant::West => Pos { y: origin.y + col, x: origin.x - depth },
        }
    }
}

/// Symmetric shadowcasting over `frame`. Only map walls block; cells outside
/// the map block and are never revealed.
fn shadowcast(map: &Map, frame: &Frame, origin: Pos, radius: i32) -> Vec<bool> {
    let mut revealed = vec![false; frame.width * frame.height];
    revealed[frame.index(origin)] = true;
    for quadrant in [Quadrant::North, Quadrant::East, Quadrant::South, Quadrant::West] {
        let mut rows = vec![Row { depth: 1, start: Slope::new(-1, 1), end: Slope::new(1, 1) }];
        while let Some(mut row) = rows.pop() {
            if row.depth > radius {
                continue;
            }
            let mut prev_wall: Option<bool> = None;
            for col in row.min_col()..=row.max_col() {
                let pos = quadrant.transform(origin, row.depth, col);
                let wall = map.is_wall(pos);
                if (wall || row.is_symmetric(col)) && map.in_bounds(pos) && frame.contains(pos) {
                    revealed[frame.index(pos)] = true;
                }
                if prev_wall == Some(true) && !wall {
                    row.start = Slope::of_tile(row.depth, col);
                }
                if prev_wall == Some(false) && wall {
                    let mut next = row.next();
                    next.end = Slope::of_tile(row.depth, col);
                    rows.push(next);
                }
                prev_wall = Some(wall);
            }
            if prev_wall == Some(false) {
                rows.push(row.next());
            }
        }
    }
    revealed
}

/// ASCII picture of `set` over `map`: `@` origin, `.` visible floor, `#`
/// visible wall, `%` hidden wall, blank for hidden floor.
pub fn draw_visibility(map: &Map, set: &VisibilitySet) -> String {
    let mut text = String::new();
    for y in 0..map.height() as i32 {
        for x in 0..map.width() as i32 {
            let p = Pos { y, x };
            let c = if p == set.origin() {
                '@'
            } else if map.is_wall(p) {
                if set.is_visible(p) { '#' } else { '%' }
            } else if set.is_visible(p) {
                '.'
            } else {
                ' '
            };
            text.push(c);
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Terrain;

    struct Doors(BTreeSet<Pos>);

    impl SoftBlockers for Doors {
        fn is_opaque(&self, pos: Pos) -> bool {
            self.0.contains(&pos)
        }

        fn is_foliage(&self, _pos: Pos) -> bool {
            false
        }
    }

    struct Foliage(BTreeSet<Pos>);

    impl SoftBlockers for Foliage {
        fn is_opaque(&self, _pos: Pos) -> bool {
            false
        }

        fn is_foliage(&self, pos: Pos) -> bool {
            self.0.contains(&pos)
        }
    }

    fn pillared_room() -> Map {
        let mut map = Map::new(13, 11);
        for p in [
            Pos { y: 3, x: 3 },
            Pos { y: 3, x: 8 },
            Pos { y: 5, x: 5 },
            Pos { y: 6, x: 9 },
            Pos { y: 7, x: 3 },
            Pos { y: 7, x: 4 },
            Pos { y: 8, x: 8 },
        ] {
            map.set_terrain(p, Terrain::Wall);
        }
        map
    }

    #[test]
    fn open_room_is_fully_visible_within_radius() {
        let map = Map::new(11, 11);
        let origin = Pos { y: 5, x: 5 };
        let set = compute_visibility(&map, origin, 3, &NoSoftBlockers);
        assert!(set.is_visible(origin));
        assert_eq!(set.cost_at(origin), Some(0));
        assert!(set.is_visible(Pos { y: 2, x: 8 }));
        assert_eq!(set.cost_at(Pos { y: 2, x: 8 }), Some(3));
        assert!(!set.is_visible(Pos { y: 1, x: 5 }), "outside radius");
        assert_eq!(set.len(), 49);
    }

    #[test]
    fn closed_door_hides_the_cell_behind_it() {
        let map = Map::new(9, 5);
        let viewer = Pos { y: 2, x: 2 };
        let door = Pos { y: 2, x: 3 };
        let target = Pos { y: 2, x: 4 };
        let doors = Doors(BTreeSet::from([door]));

        let open = compute_visibility(&map, viewer, 6, &NoSoftBlockers);
        assert!(open.is_visible(target), "occlusion alone would allow the target");

        let set = compute_visibility(&map, viewer, 6, &doors);
        assert!(set.is_visible(door));
        assert!(!set.is_visible(target), "{}", draw_visibility(&map, &set));
    }

    #[test]
    fn closed_door_in_a_corridor_hides_the_room_behind_it() {
        let mut map = Map::open(9, 5);
        for x in 0..4 {
            map.set_terrain(Pos { y: 1, x }, Terrain::Wall);
            map.set_terrain(Pos { y: 3, x }, Terrain::Wall);
        }
        let viewer = Pos { y: 2, x: 2 };
        let door = Pos { y: 2, x: 3 };
        let behind = [Pos { y: 1, x: 4 }, Pos { y: 2, x: 4 }, Pos { y: 3, x: 4 }];

        let open = compute_visibility(&map, viewer, 6, &NoSoftBlockers);
        assert!(behind.iter().all(|p| open.is_visible(*p)), "{}", draw_visibility(&map, &open));

        let set = compute_visibility(&map, viewer, 6, &Doors(BTreeSet::from([door])));
        assert!(set.is_visible(door));
        for p in behind {
            assert!(!set.is_visible(p), "{p:?} seen past the door\n{}", draw_visibility(&map, &set));
            assert!(ray(&map, viewer, 6, &Doors(BTreeSet::from([door])), p).is_empty());
        }
    }

    #[test]
    fn foliage_shortens_sight_without_blocking() {
        let map = Map::new(15, 5);
        let viewer = Pos { y: 2, x: 1 };
        let bush = Pos { y: 2, x: 2 };
        let foliage = Foliage(BTreeSet::from([bush]));
        let set = compute_visibility(&map, viewer, 6, &foliage);
        assert!(set.is_visible(bush));
        assert_eq!(set.cost_at(Pos { y: 2, x: 3 }), Some(5));
        assert!(set.is_visible(Pos { y: 2, x: 4 }));
        assert!(!set.is_visible(Pos { y: 2, x: 5 }));
    }

    #[test]
    fn walls_block_what_lies_behind_them() {
        let mut map = Map::new(12, 7);
        map.set_terrain(Pos { y: 3, x: 5 }, Terrain::Wall);
        let origin = Pos { y: 3, x: 3 };
        let set = compute_visibility(&map, origin, 8, &NoSoftBlockers);
        assert!(set.is_visible(Pos { y: 3, x: 5 }), "the wall face is seen");
        assert!(!set.is_visible(Pos { y: 3, x: 6 }), "{}", draw_visibility(&map, &set));
        assert!(!set.is_visible(Pos { y: 3, x: 8 }));
    }

    #[test]
    fn diagonal_gap_between_wall_corners_is_visible() {
        let mut map = Map::new(8, 8);
        let origin = Pos { y: 1, x: 1 };
        map.set_terrain(Pos { y: 1, x: 2 }, Terrain::Wall);
        map.set_terrain(Pos { y: 2, x: 1 }, Terrain::Wall);
        let set = compute_visibility(&map, origin, 6, &NoSoftBlockers);
        assert!(set.is_visible(Pos { y: 2, x: 2 }), "{}", draw_visibility(&map, &set));
        assert!(set.is_visible(Pos { y: 3, x: 3 }), "{}", draw_visibility(&map, &set));
    }

    #[test]
    fn closed_room_does_not_leak() {
        let mut map = Map::open(16, 16);
        for i in 4..=10 {
            for (y, x) in [(4, i), (10, i), (i, 4), (i, 10)] {
                map.set_terrain(Pos { y, x }, Terrain::Wall);
            }
        }
        for y in 5..10 {
            for x in 5..10 {
                let origin = Pos { y, x };
                let set = compute_visibility(&map, origin, 12, &NoSoftBlockers);
                for p in set.visible() {
                    assert!(
                        (4..=10).contains(&p.y) && (4..=10).contains(&p.x),
                        "light leaked to {p:?} from {origin:?}\n{}",
                        draw_visibility(&map, &set)
                    );
                }
            }
        }
    }

    #[test]
    fn hard_wall_visibility_is_symmetric() {
        let map = pillared_room();
        let radius = 6;
        let floors: Vec<Pos> = map.positions().filter(|p| map.is_free(*p)).collect();
        let sets: BTreeMap<Pos, VisibilitySet> = floors
            .iter()
            .map(|p| (*p, compute_visibility(&map, *p, radius, &NoSoftBlockers)))
            .collect();
        for a in &floors {
            for b in &floors {
                if a.chebyshev(*b) > radius {
                    continue;
                }
                assert_eq!(
                    sets[a].is_visible(*b),
                    sets[b].is_visible(*a),
                    "asymmetric pair {a:?} {b:?}\n{}\n{}",
                    draw_visibility(&map, &sets[a]),
                    draw_visibility(&map, &sets[b])
                );
            }
        }
    }

    #[test]
    fn recomputation_is_identical() {
        let map = pillared_room();
        let origin = Pos { y: 4, x: 6 };
        let first = compute_visibility(&map, origin, 6, &NoSoftBlockers);
        let second = compute_visibility(&map, origin, 6, &NoSoftBlockers);
        assert_eq!(first, second);
    }

    #[test]
    fn ray_runs_from_first_step_to_target() {
        let map = Map::new(12, 9);
        let origin = Pos { y: 2, x: 2 };
        let target = Pos { y: 4, x: 7 };
        let cells = ray(&map, origin, 6, &NoSoftBlockers, target);
        assert_eq!(cells.len() as i32, origin.chebyshev(target));
        assert_eq!(cells.last(), Some(&target));
        let mut prev = origin;
        for cell in &cells {
            assert!(prev.is_adjacent(*cell));
            prev = *cell;
        }
    }

    #[test]
    fn ray_to_hidden_target_is_empty() {
        let map = Map::new(9, 5);
        let doors = Doors(BTreeSet::from([Pos { y: 2, x: 3 }]));
        assert!(ray(&map, Pos { y: 2, x: 2 }, 6, &doors, Pos { y: 2, x: 4 }).is_empty());
        assert!(ray(&map, Pos { y: 2, x: 2 }, 6, &doors, Pos { y: 2, x: 2 }).is_empty());
    }

    #[test]
    fn ray_ends_on_a_visible_wall() {
        let mut map = Map::new(9, 5);
        let wall = Pos { y: 2, x: 5 };
        map.set_terrain(wall, Terrain::Wall);
        let cells = ray(&map, Pos { y: 2, x: 2 }, 6, &NoSoftBlockers, wall);
        assert_eq!(cells, vec![Pos { y: 2, x: 3 }, Pos { y: 2, x: 4 }, wall]);
    }
}
