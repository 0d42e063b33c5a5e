use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use delve_core::{
    AdvanceStopReason, Command, Direction, Game, Layout, PlayerStatus, Pos, SimConfig,
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ASCII layout file
    #[arg(short, long)]
    layout: PathBuf,
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Number of sessions, seeded `seed`, `seed + 1`, ...
    #[arg(long, default_value_t = 16)]
    sessions: u64,
    /// Commands per session
    #[arg(short, long, default_value_t = 300)]
    commands: u32,
}

const STATUSES: [PlayerStatus; 7] = [
    PlayerStatus::Confusion,
    PlayerStatus::Lignification,
    PlayerStatus::Slow,
    PlayerStatus::Swift,
    PlayerStatus::Dig,
    PlayerStatus::Shadows,
    PlayerStatus::Exhausted,
];

fn roll(rng: &mut ChaCha8Rng, n: usize) -> usize {
    rng.next_u64() as usize % n
}

fn random_pos(rng: &mut ChaCha8Rng, game: &Game) -> Pos {
    let map = &game.world().map;
    Pos { y: roll(rng, map.height()) as i32, x: roll(rng, map.width()) as i32 }
}

fn random_command(rng: &mut ChaCha8Rng, game: &Game) -> Command {
    let dir = Direction::ALL[roll(rng, Direction::ALL.len())];
    match roll(rng, 8) {
        0 | 1 => Command::Move(dir),
        2 => Command::Wait,
        3 => Command::Rest,
        4 => Command::Autoexplore,
        5 => Command::TravelTo(random_pos(rng, game)),
        6 => Command::Run(dir),
        _ => Command::ToggleExclusion(random_pos(rng, game)),
    }
}

fn poke_world(rng: &mut ChaCha8Rng, game: &mut Game) {
    let pos = random_pos(rng, game);
    match roll(rng, 8) {
        0 => {
            let status = STATUSES[roll(rng, STATUSES.len())];
            game.apply_player_status(status, 5 + roll(rng, 40) as i32);
        }
        1 => game.fog(pos, 1),
        2 => {
            game.create_temporary_wall(pos);
        }
        3 => {
            game.ignite(pos);
        }
        _ => {}
    }
}

fn check_invariants(game: &Game) -> Result<()> {
    let world = game.world();
    let player = &world.player;
    if player.hp > player.max_hp {
        bail!("player hp {} above max {}", player.hp, player.max_hp);
    }
    if !world.map.is_free(player.pos) {
        bail!("player inside a wall at {:?}", player.pos);
    }
    let mut taken = BTreeSet::from([player.pos]);
    for (id, monster) in &world.monsters {
        if !world.map.is_free(monster.pos) {
            bail!("{:?} inside a wall at {:?}", monster.kind, monster.pos);
        }
        if !taken.insert(monster.pos) {
            bail!("two creatures share {:?}", monster.pos);
        }
        if world.monster_at(monster.pos) != Some(id) {
            bail!("occupancy lost track of {id:?}");
        }
    }
    Ok(())
}

fn run_session(layout: &Layout, seed: u64, commands: u32) -> Result<()> {
    let mut game = Game::from_layout(seed, SimConfig::default(), layout)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
    for _ in 0..commands {
        let result = game.advance(1_000);
        check_invariants(&game)?;
        match result.stop_reason {
            AdvanceStopReason::Finished(outcome) => {
                info!(seed, ?outcome, turn = game.turn(), "session finished");
                return Ok(());
            }
            AdvanceStopReason::QueueEmpty => bail!("event queue ran dry"),
            AdvanceStopReason::BudgetExhausted => continue,
            AdvanceStopReason::AwaitingInput => {}
        }
        poke_world(&mut rng, &mut game);
        let command = random_command(&mut rng, &game);
        let before = game.snapshot_hash();
        if let Err(err) = game.apply_command(command) {
            debug!(?command, %err, "command refused");
            if game.snapshot_hash() != before {
                bail!("refused {command:?} changed the world");
            }
            game.apply_command(Command::Wait)?;
        }
    }
    info!(seed, turn = game.turn(), "session reached its command budget");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let raw = fs::read_to_string(&args.layout)
        .with_context(|| format!("failed to read layout {}", args.layout.display()))?;
    let layout: Layout = raw.parse().context("invalid layout")?;

    println!("Fuzzing {} sessions from seed {}...", args.sessions, args.seed);
    for seed in args.seed..args.seed + args.sessions {
        run_session(&layout, seed, args.commands)
            .with_context(|| format!("invariant failed on seed {seed}"))?;
    }
    println!("Fuzzing completed successfully.");
    Ok(())
}
