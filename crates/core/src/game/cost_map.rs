//! Bounded multi-source cost maps.
//! This module exists to answer "how far is every cell from the nearest source" for noise,
//! autoexplore and band queries, under any traversal policy.
//! It does not cache results; every query builds a fresh map.

use std::mem;

use super::traversal::Traversal;
use crate::types::{Pos, UNREACHABLE};

/// Dense minimal costs from the nearest source, all `<= bound`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CostMap {
    width: usize,
    height: usize,
    costs: Vec<i32>,
    bound: i32,
    settled: Vec<Pos>,
}

impl CostMap {
    pub fn bound(&self) -> i32 {
        self.bound
    }

    /// Cost from the nearest source, or [`UNREACHABLE`] when the cell is out
    /// of bounds or was never reached within the bound.
    pub fn cost_at(&self, pos: Pos) -> i32 {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.width || pos.y as usize >= self.height
        {
            return UNREACHABLE;
        }
        self.costs[pos.y as usize * self.width + pos.x as usize]
    }

    pub fn is_reached(&self, pos: Pos) -> bool {
        self.cost_at(pos) != UNREACHABLE
    }

    /// Reached cells in the order they were settled: nondecreasing cost,
    /// first-seen order among equal costs.
    pub fn settled(&self) -> &[Pos] {
        &self.settled
    }
}

/// Expands from every in-bounds source at cost 0. Sources are seeded in the
/// given order and duplicates are merged. Steps the policy prices at
/// [`UNREACHABLE`] or more are never taken, and nothing past `bound` is kept.
pub fn build_cost_map<T: Traversal>(
    policy: &mut T,
    width: usize,
    height: usize,
    sources: &[Pos],
    bound: i32,
) -> CostMap {
    let in_bounds =
        |p: Pos| p.x >= 0 && p.y >= 0 && (p.x as usize) < width && (p.y as usize) < height;
    let index = |p: Pos| p.y as usize * width + p.x as usize;

    let mut costs = vec![UNREACHABLE; width * height];
    let mut settled = Vec::new();
    let mut buckets: Vec<Vec<Pos>> = vec![Vec::new()];
    for &source in sources {
        if in_bounds(source) && costs[index(source)] != 0 {
            costs[index(source)] = 0;
            buckets[0].push(source);
        }
    }

    let mut neighbors = Vec::new();
    let mut current = 0;
    while current < buckets.len() {
        let frontier = mem::take(&mut buckets[current]);
        for pos in frontier {
            if costs[index(pos)] != current as i32 {
                continue;
            }
            settled.push(pos);
            neighbors.clear();
            policy.neighbors(pos, &mut neighbors);
            for &next in &neighbors {
                if !in_bounds(next) {
                    continue;
                }
                let step = policy.cost(pos, next);
                if step >= UNREACHABLE {
                    continue;
                }
                let cost = current as i32 + step.max(1);
                if cost > bound || cost >= costs[index(next)] {
                    continue;
                }
                costs[index(next)] = cost;
                let slot = cost as usize;
                if buckets.len() <= slot {
                    buckets.resize_with(slot + 1, Vec::new);
                }
                buckets[slot].push(next);
            }
        }
        current += 1;
    }

    CostMap { width, height, costs, bound, settled }
}
