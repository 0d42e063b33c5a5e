use delve_core::{
    AdvanceStopReason, Command, Direction, Game, Layout, LogEvent, SimConfig, TerrainPath,
    find_path, Pos,
};

const DUNGEON: &[&str] = &[
    "##################",
    "#@.....#.........#",
    "#......+...g.....#",
    "#......#.........#",
    "###.######.#######",
    "#.....h....\"\"..!.#",
    "##################",
];

fn session(seed: u64) -> (u64, i32, Vec<LogEvent>) {
    let layout = Layout::parse(&DUNGEON.join("\n")).expect("valid layout");
    let mut game = Game::from_layout(seed, SimConfig::default(), &layout).expect("valid setup");
    let script = [
        Command::Autoexplore,
        Command::Move(Direction::South),
        Command::Wait,
        Command::Autoexplore,
        Command::Rest,
        Command::Autoexplore,
    ];
    for command in script.into_iter().cycle().take(30) {
        match game.advance(5_000).stop_reason {
            AdvanceStopReason::AwaitingInput => {}
            _ => break,
        }
        if game.apply_command(command).is_err() {
            let _ = game.apply_command(Command::Wait);
        }
    }
    (game.snapshot_hash(), game.turn(), game.take_log())
}

#[test]
fn identical_seeds_produce_identical_sessions() {
    let first = session(12345);
    let second = session(12345);
    assert_eq!(first.0, second.0, "identical runs must produce identical hashes");
    assert_eq!(first.1, second.1);
    assert_eq!(first.2, second.2, "notices must match in content and order");
}

#[test]
fn different_seeds_produce_different_hashes() {
    assert_ne!(session(123).0, session(456).0);
}

#[test]
fn pathfinding_is_a_pure_function_of_its_inputs() {
    let layout = Layout::parse(&DUNGEON.join("\n")).expect("valid layout");
    let from = Pos { y: 1, x: 1 };
    let to = Pos { y: 5, x: 15 };
    let first = find_path(&mut TerrainPath { map: &layout.map, wall_cost: None }, from, to);
    let second = find_path(&mut TerrainPath { map: &layout.map, wall_cost: None }, from, to);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}
