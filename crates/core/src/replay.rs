//! Rebuilding a run from its layout, config and command journal.

use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::{ActionError, ReplayError};
use crate::game::Game;
use crate::journal::InputJournal;
use crate::layout::Layout;
use crate::types::{AdvanceStopReason, Command, RunOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    /// `None` when the journal ran out before the run ended.
    pub final_outcome: Option<RunOutcome>,
    pub final_turn: i32,
    pub final_snapshot_hash: u64,
    pub applied_inputs: usize,
}

/// Applies `command` and journals it when the game accepts it.
pub fn apply_recorded(
    game: &mut Game,
    journal: &mut InputJournal,
    command: Command,
) -> Result<(), ActionError> {
    let seq = game.next_input_seq();
    game.apply_command(command)?;
    journal.append(seq, command);
    Ok(())
}

/// Replays `journal` on a fresh game. Each batch may dispatch at most
/// `max_events` events before the run must ask for input or end.
pub fn replay_journal(
    config: &SimConfig,
    layout: &Layout,
    journal: &InputJournal,
    max_events: u32,
) -> Result<ReplayResult, ReplayError> {
    let mut game = Game::from_layout(journal.seed, config.clone(), layout)?;
    let mut inputs = journal.inputs.iter();
    let mut applied_inputs = 0;

    loop {
        let batch = game.advance(max_events);
        match batch.stop_reason {
            AdvanceStopReason::Finished(_) | AdvanceStopReason::QueueEmpty => break,
            AdvanceStopReason::BudgetExhausted => return Err(ReplayError::Stalled { max_events }),
            AdvanceStopReason::AwaitingInput => {
                let Some(record) = inputs.next() else {
                    debug!(turn = game.turn(), "journal exhausted before the run ended");
                    break;
                };
                let expected = game.next_input_seq();
                if record.seq != expected {
                    return Err(ReplayError::OutOfOrder { expected, found: record.seq });
                }
                game.apply_command(record.command)
                    .map_err(|error| ReplayError::CommandRejected { seq: record.seq, error })?;
                applied_inputs += 1;
            }
        }
    }

    let result = ReplayResult {
        final_outcome: game.outcome(),
        final_turn: game.turn(),
        final_snapshot_hash: game.snapshot_hash(),
        applied_inputs,
    };
    info!(
        outcome = ?result.final_outcome,
        turn = result.final_turn,
        hash = result.final_snapshot_hash,
        "replay finished"
    );
    Ok(result)
}
