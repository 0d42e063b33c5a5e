//! A* shortest paths under a traversal policy.
//! This module exists so monster chasing, player travel and tooling share one search.
//! It does not decide where to go; callers pick targets and interpret empty paths.

use std::collections::{BTreeMap, BTreeSet};

use super::traversal::Traversal;
use crate::types::{Pos, UNREACHABLE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: i32,
    h: i32,
    order: u64,
    y: i32,
    x: i32,
}

/// Positions strictly after `from`, ending at `to`. Empty when `to` cannot be
/// reached or when `from == to`.
pub fn find_path<T: Traversal>(policy: &mut T, from: Pos, to: Pos) -> Vec<Pos> {
    find_path_with_cost(policy, from, to).map(|(path, _)| path).unwrap_or_default()
}

/// Like [`find_path`], also returning the total policy cost of the path.
pub fn find_path_with_cost<T: Traversal>(
    policy: &mut T,
    from: Pos,
    to: Pos,
) -> Option<(Vec<Pos>, i32)> {
    if from == to {
        return None;
    }
    let mut open_set = BTreeSet::new();
    let mut open_entries: BTreeMap<Pos, OpenNode> = BTreeMap::new();
    let mut g_score = BTreeMap::new();
    let mut came_from = BTreeMap::new();
    let mut closed = BTreeSet::new();
    let mut order = 0_u64;
    let mut neighbors = Vec::new();

    let h = policy.estimation(from, to);
    let start = OpenNode { f: h, h, order, y: from.y, x: from.x };
    open_set.insert(start);
    open_entries.insert(from, start);
    g_score.insert(from, 0);

    while let Some(current) = open_set.pop_first() {
        let pos = Pos { y: current.y, x: current.x };
        open_entries.remove(&pos);
        if pos == to {
            let total = g_score.get(&pos).copied().unwrap_or(0);
            return Some((reconstruct_path(&came_from, from, to), total));
        }
        closed.insert(pos);
        let current_g = g_score.get(&pos).copied().unwrap_or(0);

        neighbors.clear();
        policy.neighbors(pos, &mut neighbors);
        for &next in &neighbors {
            if closed.contains(&next) {
                continue;
            }
            let step = policy.cost(pos, next);
            if step >= UNREACHABLE {
                continue;
            }
            let tentative = current_g + step.max(1);
            if tentative >= g_score.get(&next).copied().unwrap_or(i32::MAX) {
                continue;
            }
            if let Some(stale) = open_entries.remove(&next) {
                open_set.remove(&stale);
            }
            came_from.insert(next, pos);
            g_score.insert(next, tentative);
            order += 1;
            let h = policy.estimation(next, to);
            let node = OpenNode { f: tentative + h, h, order, y: next.y, x: next.x };
            open_set.insert(node);
            open_entries.insert(next, node);
        }
    }
    None
}

fn reconstruct_path(came_from: &BTreeMap<Pos, Pos>, start: Pos, goal: Pos) -> Vec<Pos> {
    let mut path = vec![goal];
    let mut pos = goal;
    while let Some(&prev) = came_from.get(&pos) {
        if prev == start {
            break;
        }
        path.push(prev);
        pos = prev;
    }
    path.reverse();
    path
}
