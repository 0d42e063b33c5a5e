//! Which cells autoexplore still wants to visit.

use super::super::World;
use crate::types::{Feature, Pos};

/// Walls buried in rock are never worth exploring.
fn is_buried_wall(world: &World, pos: Pos) -> bool {
    world.map.is_wall(pos) && world.free_neighbors(pos).is_empty()
}

fn wants_visit(world: &World, pos: Pos) -> bool {
    !world.map.is_explored(pos) || world.features.get(&pos) == Some(&Feature::Item)
}

/// Unexplored cells and uncollected items outside exclusion zones, in
/// row-major order.
pub(in crate::game) fn autoexplore_sources(world: &World) -> Vec<Pos> {
    world
        .map
        .positions()
        .filter(|pos| !is_buried_wall(world, *pos))
        .filter(|pos| !world.is_excluded(*pos))
        .filter(|pos| wants_visit(world, *pos))
        .collect()
}

/// Whether nothing is left to visit, exclusion zones included.
pub(in crate::game) fn all_explored(world: &World) -> bool {
    !world.map.positions().any(|pos| !is_buried_wall(world, pos) && wants_visit(world, pos))
}
