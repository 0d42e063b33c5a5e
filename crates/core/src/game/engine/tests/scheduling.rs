//! Ordering of player, monster and status events through `advance`.

use super::support::*;

#[test]
fn first_advance_parks_the_opening_player_turn() {
    let mut game = game_from_rows(&["#####", "#@..#", "#####"]);
    assert!(!game.is_awaiting_input());
    let result = game.advance(10);
    assert_eq!(result.stop_reason, AdvanceStopReason::AwaitingInput);
    assert_eq!(result.processed_events, 1);
    assert_eq!(game.turn(), 0);
    assert!(game.is_awaiting_input());
}

#[test]
fn advancing_while_parked_processes_nothing() {
    let mut game = game_from_rows(&["#####", "#@..#", "#####"]);
    game.advance(10);
    let result = game.advance(10);
    assert_eq!(result, AdvanceResult {
        processed_events: 0,
        stop_reason: AdvanceStopReason::AwaitingInput,
    });
}

#[test]
fn wait_returns_control_one_move_delay_later() {
    let mut game = game_from_rows(&["#####", "#@..#", "#####"]);
    game.advance(10);
    game.apply_command(Command::Wait).expect("waiting is always allowed");
    let result = game.advance(10);
    assert_eq!(result.stop_reason, AdvanceStopReason::AwaitingInput);
    assert_eq!(game.turn(), 10);
}

#[test]
fn monster_turns_run_between_player_turns() {
    let mut game = sleeper_behind_wall();
    game.advance(10);
    game.apply_command(Command::Wait).expect("wait");
    let result = game.advance(10);
    assert_eq!(result.stop_reason, AdvanceStopReason::AwaitingInput);
    assert!(result.processed_events >= 2, "goblin turn precedes the player turn at 10");
    assert_eq!(game.turn(), 10);
}

#[test]
fn player_status_expires_through_its_own_event() {
    let mut game = game_from_rows(&["#####", "#@..#", "#####"]);
    game.advance(10);
    game.apply_player_status(PlayerStatus::Swift, 5);
    game.apply_command(Command::Wait).expect("wait");
    game.advance(10);
    assert!(!game.world().player.has_status(PlayerStatus::Swift));
    assert!(game.log().contains(&LogEvent::StatusEnded { status: PlayerStatus::Swift }));
}

#[test]
fn stacked_status_needs_every_stack_to_expire() {
    let mut game = game_from_rows(&["#####", "#@..#", "#####"]);
    game.advance(10);
    game.apply_player_status(PlayerStatus::Slow, 5);
    game.apply_player_status(PlayerStatus::Slow, 25);
    game.apply_command(Command::Wait).expect("wait");
    game.advance(10);
    assert_eq!(game.world().player.statuses.get(&PlayerStatus::Slow), Some(&1));
    assert!(!game.log().iter().any(|e| matches!(e, LogEvent::StatusEnded { .. })));
}

#[test]
fn shadows_shrink_the_view_until_they_end() {
    let mut game = game_from_rows(&[
        "#########", //
        "#@......#", //
        "#########",
    ]);
    game.advance(10);
    let wide = game.visibility().visible().len();
    game.apply_player_status(PlayerStatus::Shadows, 5);
    assert!(game.visibility().visible().len() < wide);
    game.apply_command(Command::Wait).expect("wait");
    game.advance(10);
    assert_eq!(game.visibility().visible().len(), wide);
}

#[test]
fn monster_status_expiry_removes_the_entry() {
    let mut game = sleeper_behind_wall();
    let id = only_monster(&game);
    game.advance(10);
    game.apply_monster_status(id, MonsterStatus::Confused, 5);
    game.apply_command(Command::Wait).expect("wait");
    game.advance(10);
    assert!(!game.world().monsters[id].has_status(MonsterStatus::Confused));
    assert!(game.world().monsters[id].statuses.is_empty());
}

#[test]
fn same_rank_continuation_runs_before_waiting_peers() {
    let mut queue = EventQueue::new();
    let status = |s| Event::new(5, EventPayload::Simple(SimpleAction::StatusEnd(s)));
    queue.push(status(PlayerStatus::Slow));
    queue.push(status(PlayerStatus::Swift));
    let first = queue.pop_min().expect("queued");
    queue.renew(first, 0);
    assert_eq!(queue.pop_min(), Some(first));
    assert_eq!(queue.pop_min(), Some(status(PlayerStatus::Swift)));
}
