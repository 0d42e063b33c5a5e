//! Event loop and stop-reason handling for the game engine.

use tracing::trace;

use super::*;

impl Game {
    /// Dispatches up to `max_events` queued events.
    ///
    /// Stops early when a player turn needs a command, the run ends, or the
    /// queue runs dry. Automated player modes consume their turns here
    /// without returning to the caller.
    pub fn advance(&mut self, max_events: u32) -> AdvanceResult {
        let mut processed = 0;
        if let Some(outcome) = self.outcome {
            return AdvanceResult {
                processed_events: 0,
                stop_reason: AdvanceStopReason::Finished(outcome),
            };
        }
        if self.pending_turn.is_some() {
            return AdvanceResult {
                processed_events: 0,
                stop_reason: AdvanceStopReason::AwaitingInput,
            };
        }

        while processed < max_events {
            if let Some(result) = self.check_death(processed) {
                return result;
            }
            let Some(event) = self.events.pop_min() else {
                return AdvanceResult {
                    processed_events: processed,
                    stop_reason: AdvanceStopReason::QueueEmpty,
                };
            };
            self.turn = event.rank;
            processed += 1;
            trace!(turn = self.turn, payload = ?event.payload, "dispatch");

            if !self.dispatch(event) {
                return AdvanceResult {
                    processed_events: processed,
                    stop_reason: AdvanceStopReason::AwaitingInput,
                };
            }
            if let Some(result) = self.check_death(processed) {
                return result;
            }
        }
        AdvanceResult { processed_events: processed, stop_reason: AdvanceStopReason::BudgetExhausted }
    }

    /// Runs one event. Returns `false` once a player turn has been parked.
    fn dispatch(&mut self, event: Event) -> bool {
        match event.payload {
            EventPayload::Simple(SimpleAction::PlayerTurn) => {
                self.compute_noise();
                if self.auto_player(event) {
                    return true;
                }
                self.pending_turn = Some(event);
                false
            }
            EventPayload::Simple(SimpleAction::StatusEnd(status)) => {
                self.end_player_status(status);
                true
            }
            EventPayload::Monster { id, action: MonsterAction::Turn } => {
                self.monster_turn(id, event);
                true
            }
            EventPayload::Monster { id, action: MonsterAction::StatusEnd(status) } => {
                self.end_monster_status(id, status);
                true
            }
            EventPayload::Cloud { pos, action } => {
                self.cloud_event(pos, action, event);
                true
            }
        }
    }

    fn check_death(&mut self, processed: u32) -> Option<AdvanceResult> {
        if self.world.player.hp > 0 {
            return None;
        }
        info!(turn = self.turn, "player died");
        self.outcome = Some(RunOutcome::Death);
        self.pending_turn = None;
        Some(AdvanceResult {
            processed_events: processed,
            stop_reason: AdvanceStopReason::Finished(RunOutcome::Death),
        })
    }
}
