use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use delve_core::{
    ActionError, AdvanceStopReason, Command, Game, InputJournal, Layout, RunOutcome, SimConfig,
    apply_recorded, draw_visibility, replay_journal,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Headless driver: replays a command journal, or plays an autoexplore
/// session and optionally records it.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ASCII layout file
    #[arg(short, long)]
    layout: PathBuf,
    /// TOML simulation config; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Journal JSON file to replay
    #[arg(short, long, conflicts_with_all = ["seed", "record"])]
    journal: Option<PathBuf>,
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Write the autoexplore session's journal here
    #[arg(short, long)]
    record: Option<PathBuf>,
    /// Events one batch may dispatch before the run must ask for input
    #[arg(long, default_value_t = 10_000)]
    max_events: u32,
    /// Commands an autoexplore session may issue
    #[arg(long, default_value_t = 500)]
    max_commands: u32,
    /// Print the final field of view
    #[arg(long)]
    show_view: bool,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Summary {
    inputs: usize,
    final_turn: i32,
    outcome: Option<RunOutcome>,
    snapshot_hash: String,
}

impl Summary {
    fn print(&self, title: &str, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }
        println!("{title}");
        println!("Inputs: {}", self.inputs);
        println!("Final turn: {}", self.final_turn);
        println!("Outcome: {:?}", self.outcome);
        println!("Snapshot hash: {}", self.snapshot_hash);
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.layout)
        .with_context(|| format!("failed to read layout {}", args.layout.display()))?;
    let layout: Layout = raw
        .parse()
        .with_context(|| format!("invalid layout {}", args.layout.display()))?;
    let config = match &args.config {
        Some(path) => SimConfig::load(path).context("failed to load config")?,
        None => SimConfig::default(),
    };

    if let Some(path) = &args.journal {
        let journal = InputJournal::load(path)
            .with_context(|| format!("failed to load journal {}", path.display()))?;
        let result = replay_journal(&config, &layout, &journal, args.max_events)
            .context("replay failed")?;
        let summary = Summary {
            inputs: result.applied_inputs,
            final_turn: result.final_turn,
            outcome: result.final_outcome,
            snapshot_hash: format!("{:016x}", result.final_snapshot_hash),
        };
        return summary.print("Replay complete.", args.json);
    }

    let mut game = Game::from_layout(args.seed, config, &layout).context("invalid setup")?;
    let journal = explore(&mut game, args.max_events, args.max_commands)?;
    if let Some(path) = &args.record {
        journal
            .save(path)
            .with_context(|| format!("failed to write journal {}", path.display()))?;
        info!(path = %path.display(), inputs = journal.inputs.len(), "journal written");
    }

    let summary = Summary {
        inputs: journal.inputs.len(),
        final_turn: game.turn(),
        outcome: game.outcome(),
        snapshot_hash: format!("{:016x}", game.snapshot_hash()),
    };
    summary.print("Session complete.", args.json)?;
    let world = game.world();
    info!(
        hp = world.player.hp,
        max_hp = world.player.max_hp,
        explored = world.map.explored_count(),
        "final player state"
    );
    if args.show_view {
        print!("{}", draw_visibility(&world.map, game.visibility()));
    }
    Ok(())
}

/// Autoexplores until nothing reachable is left, waiting out monsters in view.
fn explore(game: &mut Game, max_events: u32, max_commands: u32) -> Result<InputJournal> {
    let mut journal = InputJournal::new(game.seed());
    for _ in 0..max_commands {
        match game.advance(max_events).stop_reason {
            AdvanceStopReason::AwaitingInput => {}
            AdvanceStopReason::Finished(_) | AdvanceStopReason::QueueEmpty => return Ok(journal),
            AdvanceStopReason::BudgetExhausted => {
                bail!("no player turn within {max_events} events at turn {}", game.turn())
            }
        }
        let command = match apply_recorded(game, &mut journal, Command::Autoexplore) {
            Ok(()) => continue,
            Err(ActionError::NothingLeftToExplore | ActionError::NoReachableTarget) => Command::Quit,
            Err(err) => {
                warn!(%err, turn = game.turn(), "autoexplore refused, waiting");
                Command::Wait
            }
        };
        apply_recorded(game, &mut journal, command)
            .with_context(|| format!("{command:?} refused"))?;
    }
    warn!(max_commands, "command budget spent before exploration finished");
    Ok(journal)
}
