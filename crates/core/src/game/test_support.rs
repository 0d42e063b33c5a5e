//! Shared test fixtures for the `game` submodule test suites.
//! This module exists to avoid repeating map and actor setup across many tests.
//! It does not own production gameplay logic.

use super::*;

pub(crate) const TEST_SEED: u64 = 0x5eed;

/// A bordered `w`x`h` world with nothing explored and no monsters.
pub(crate) fn open_world(w: usize, h: usize, player: Pos) -> World {
    let player = Player { pos: player, hp: 20, max_hp: 20, statuses: BTreeMap::new() };
    World::new(Map::new(w, h), player)
}

pub(crate) fn explore_all(world: &mut World) {
    for pos in world.map.positions() {
        world.map.set_explored(pos);
    }
}

/// Game built from an ASCII layout with the default config.
pub(crate) fn game_from_rows(rows: &[&str]) -> Game {
    let layout = Layout::parse(&rows.join("\n")).expect("test layout parses");
    Game::from_layout(TEST_SEED, SimConfig::default(), &layout).expect("test layout is valid")
}

pub(crate) fn only_monster(game: &Game) -> MonsterId {
    let mut ids = game.world.monsters.keys();
    let id = ids.next().expect("layout has a monster");
    assert!(ids.next().is_none(), "layout has more than one monster");
    id
}

pub(crate) fn monster_turn_event(id: MonsterId, rank: i32) -> Event {
    Event::new(rank, EventPayload::Monster { id, action: MonsterAction::Turn })
}

pub(crate) fn player_turn_event(rank: i32) -> Event {
    Event::new(rank, EventPayload::Simple(SimpleAction::PlayerTurn))
}
