//! Command intake and status expiry for the event-driven engine.
//! This file wires the advance loop and its regression tests together.

use tracing::{debug, info};

use super::*;
use crate::error::ActionError;

mod advance;


impl Game {
    /// Applies `command` to the parked player turn.
    ///
    /// A rejected command keeps the turn parked and leaves the world as it
    /// was; the caller may try another command.
    pub fn apply_command(&mut self, command: Command) -> Result<(), ActionError> {
        if self.outcome.is_some() {
            return Err(ActionError::RunFinished);
        }
        let event = self.pending_turn.take().ok_or(ActionError::NoPendingTurn)?;
        match self.player_command(command, event) {
            Ok(()) => {
                debug!(?command, seq = self.next_input_seq, turn = self.turn, "command accepted");
                self.next_input_seq += 1;
                Ok(())
            }
            Err(err) => {
                debug!(?command, %err, "command rejected");
                self.pending_turn = Some(event);
                Err(err)
            }
        }
    }

    fn end_player_status(&mut self, status: PlayerStatus) {
        let statuses = &mut self.world.player.statuses;
        let Some(count) = statuses.get_mut(&status) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count > 0 {
            return;
        }
        statuses.remove(&status);
        info!(?status, "player status ended");
        self.log.push(LogEvent::StatusEnded { status });
        if status == PlayerStatus::Shadows {
            self.compute_los();
        }
    }

    fn end_monster_status(&mut self, id: MonsterId, status: MonsterStatus) {
        let Some(monster) = self.world.monsters.get_mut(id) else {
            return;
        };
        let Some(count) = monster.statuses.get_mut(&status) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            monster.statuses.remove(&status);
        }
    }
}
