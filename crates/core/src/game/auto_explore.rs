//! Autoexplore: walk downhill on a cost map seeded from every cell still worth visiting.
//! This module exists to keep frontier policy separate from the generic cost-map engine.
//! It does not own movement rules; each step goes through `move_player`.

use tracing::{debug, info};

use super::cost_map::{CostMap, build_cost_map};
use super::traversal::{AutoexplorePath, Traversal};
use super::*;
use crate::error::ActionError;

mod frontier;

pub(super) use frontier::{all_explored, autoexplore_sources};

/// Frontier cost map for `sources` under the autoexplore policy.
pub(super) fn autoexplore_map(world: &World, sources: &[Pos]) -> CostMap {
    build_cost_map(
        &mut AutoexplorePath { world },
        world.map.width(),
        world.map.height(),
        sources,
        UNREACHABLE,
    )
}

/// Lowest-cost neighbor of the player, first in direction order on ties.
/// `finished` is set when no neighbor improves on the player's own cost.
pub(super) fn next_step(world: &World, costs: &CostMap) -> (Option<Pos>, bool) {
    let here = world.player.pos;
    if !costs.is_reached(here) {
        return (None, false);
    }
    let mut neighbors = Vec::new();
    AutoexplorePath { world }.neighbors(here, &mut neighbors);
    let Some((&first, rest)) = neighbors.split_first() else {
        return (None, false);
    };
    let mut best = first;
    let mut best_cost = costs.cost_at(first);
    for &pos in rest {
        let cost = costs.cost_at(pos);
        if cost < best_cost {
            best = pos;
            best_cost = cost;
        }
    }
    (Some(best), best_cost >= costs.cost_at(here))
}

impl Game {
    pub(crate) fn start_autoexplore(&mut self, event: Event) -> Result<(), ActionError> {
        if self.world.monsters_in_view() {
            return Err(ActionError::MonstersInView);
        }
        if self.world.is_excluded(self.world.player.pos) {
            return Err(ActionError::InExcludedArea);
        }
        if all_explored(&self.world) {
            return Err(ActionError::NothingLeftToExplore);
        }
        let sources = autoexplore_sources(&self.world);
        if sources.is_empty() {
            return Err(ActionError::NoReachableTarget);
        }
        let costs = autoexplore_map(&self.world, &sources);
        let (next, finished) = next_step(&self.world, &costs);
        let Some(next) = next.filter(|_| !finished) else {
            return Err(ActionError::NoReachableTarget);
        };
        let previous = self.world.auto.clone();
        self.world.auto.autoexploring = true;
        self.world.auto.halt = false;
        if let Err(err) = self.move_player(next, event) {
            self.world.auto = previous;
            return Err(err);
        }
        Ok(())
    }

    pub(crate) fn auto_explore(&mut self, event: Event) -> bool {
        if !self.world.auto.halt {
            if self.explore_step(event) {
                return true;
            }
        } else {
            debug!("autoexplore halted");
        }
        self.world.auto.autoexploring = false;
        false
    }

    fn explore_step(&mut self, event: Event) -> bool {
        if all_explored(&self.world) {
            self.finish_exploring();
            return false;
        }
        let sources = autoexplore_sources(&self.world);
        let costs = autoexplore_map(&self.world, &sources);
        let (next, finished) = next_step(&self.world, &costs);
        if finished {
            if all_explored(&self.world) {
                self.finish_exploring();
            }
            return false;
        }
        let Some(next) = next else {
            debug!("no safe route to the remaining frontier");
            return false;
        };
        match self.move_player(next, event) {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "autoexplore step refused");
                false
            }
        }
    }

    fn finish_exploring(&mut self) {
        info!(explored = self.world.map.explored_count(), "exploration finished");
        self.log.push(LogEvent::ExplorationFinished);
    }
}
