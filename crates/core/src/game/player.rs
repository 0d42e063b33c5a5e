//! Player actions and the automation that repeats them between commands.

use tracing::debug;

use super::pathfinding::find_path;
use super::traversal::PlayerPath;
use super::*;
use crate::content::{HIT_NOISE, WALL_NOISE};
use crate::error::ActionError;

const WAIT_DELAY: i32 = 10;
const MIN_MOVE_DELAY: i32 = 3;

impl Game {
    /// Runs a command against the parked player turn `event`. Errors leave
    /// the world untouched.
    pub(crate) fn player_command(&mut self, command: Command, event: Event) -> Result<(), ActionError> {
        match command {
            Command::Move(dir) => self.move_player(self.world.player.pos.step(dir), event),
            Command::Wait => {
                self.wait_turn(event);
                Ok(())
            }
            Command::Rest => self.start_rest(event),
            Command::Autoexplore => self.start_autoexplore(event),
            Command::TravelTo(target) => self.start_travel(target, event),
            Command::Run(dir) => self.start_run(dir, event),
            Command::ToggleExclusion(at) => {
                self.toggle_exclusion(at)?;
                self.pending_turn = Some(event);
                Ok(())
            }
            Command::Quit => {
                self.outcome = Some(RunOutcome::Quit);
                Ok(())
            }
        }
    }

    fn move_delay(&self) -> i32 {
        let player = &self.world.player;
        let mut delay = self.config.move_delay;
        if player.has_status(PlayerStatus::Swift) {
            delay -= 3;
        }
        if let Some(&slow) = player.statuses.get(&PlayerStatus::Slow) {
            delay += 3 * slow as i32;
        }
        delay.max(MIN_MOVE_DELAY)
    }

    /// Steps into `to`, attacking whatever monster stands there.
    pub(crate) fn move_player(&mut self, to: Pos, event: Event) -> Result<(), ActionError> {
        if !self.world.map.in_bounds(to) {
            return Err(ActionError::OutOfBounds(to));
        }
        let player = &self.world.player;
        let digging = player.has_status(PlayerStatus::Dig);
        let wall = self.world.map.is_wall(to);
        if wall && !digging {
            return Err(ActionError::WallInTheWay(to));
        }
        if player.has_status(PlayerStatus::Confusion)
            && !Direction::between(player.pos, to).is_some_and(Direction::is_cardinal)
        {
            return Err(ActionError::DiagonalWhileConfused);
        }
        if let Some(id) = self.world.monster_at(to) {
            self.player_attack(id);
        } else {
            if player.has_status(PlayerStatus::Lignification) {
                return Err(ActionError::Lignified);
            }
            if wall {
                self.world.map.set_terrain(to, Terrain::Free);
                self.make_noise(WALL_NOISE, to);
                self.log.push(LogEvent::WallDug { pos: to });
                self.fog(to, 1);
            }
            self.world.player.pos = to;
            if self.world.features.get(&to) == Some(&Feature::Item) {
                self.world.features.remove(&to);
                self.log.push(LogEvent::ItemCollected { pos: to });
            }
            self.compute_los();
        }
        let delay = self.move_delay();
        self.events.renew(event, delay);
        Ok(())
    }

    fn player_attack(&mut self, id: MonsterId) {
        let Some(pos) = self.world.monsters.get(id).map(|m| m.pos) else {
            return;
        };
        let damage = 1 + self.roll(self.config.player_attack);
        self.log.push(LogEvent::PlayerHitMonster { monster: id, damage });
        if !self.damage_monster(id, damage) {
            self.make_aware_if_hurt(id);
        }
        self.make_noise(HIT_NOISE, pos);
    }

    fn wait_turn(&mut self, event: Event) {
        self.events.renew(event, WAIT_DELAY);
    }

    fn waiting_on_status(&self) -> bool {
        self.world.player.statuses.values().any(|count| *count > 0)
    }

    fn start_rest(&mut self, event: Event) -> Result<(), ActionError> {
        if self.world.monsters_in_view() {
            return Err(ActionError::MonstersInView);
        }
        if self.world.clouds.get(&self.world.player.pos) == Some(&CloudKind::Fire) {
            return Err(ActionError::RestOnFlames);
        }
        let waiting = self.waiting_on_status();
        if self.world.player.hp >= self.world.player.max_hp && !waiting {
            return Err(ActionError::NothingToRecover);
        }
        self.wait_turn(event);
        self.world.auto.resting = true;
        // Negative turns mean waiting for statuses to wear off, not healing.
        self.world.auto.rest_turns = if waiting { -1 } else { 0 };
        Ok(())
    }

    fn auto_rest(&mut self, event: Event) -> bool {
        let turns = self.world.auto.rest_turns;
        let enough = self.config.rest_turns;
        let monsters = self.world.monsters_in_view();
        let waiting = self.waiting_on_status();
        let hurt = self.world.player.hp < self.world.player.max_hp;
        if !monsters && (waiting || (hurt && turns >= 0)) && turns < enough {
            self.wait_turn(event);
            if !waiting && turns >= 0 {
                self.world.auto.rest_turns += 1;
            }
            return true;
        }
        if turns >= enough {
            self.apply_rest();
        } else if monsters {
            debug!("rest interrupted by monsters in view");
        }
        self.world.auto.resting = false;
        false
    }

    /// A full rest heals everyone, and the snoring may wake a sleeper.
    fn apply_rest(&mut self) {
        self.world.player.hp = self.world.player.max_hp;
        for monster in self.world.monsters.values_mut() {
            monster.hp = monster_stats(monster.kind).max_hp;
        }
        self.log.push(LogEvent::RestCompleted);
        if self.roll(5) > 2 {
            let sleepers: Vec<MonsterId> = self
                .world
                .monsters
                .iter()
                .filter(|(_, monster)| monster.state == MonsterState::Resting)
                .map(|(id, _)| id)
                .collect();
            if !sleepers.is_empty() {
                let pick = self.roll(sleepers.len() as i32) as usize;
                self.natural_awake(sleepers[pick]);
            }
        }
    }

    fn start_travel(&mut self, target: Pos, event: Event) -> Result<(), ActionError> {
        let map = &self.world.map;
        if !map.in_bounds(target) {
            return Err(ActionError::OutOfBounds(target));
        }
        if target == self.world.player.pos {
            return Err(ActionError::AlreadyThere(target));
        }
        if !map.is_explored(target) {
            return Err(ActionError::NoReachableTarget);
        }
        if self.world.believes_wall(target) && !self.world.player.has_status(PlayerStatus::Dig) {
            return Err(ActionError::WallInTheWay(target));
        }
        let path = self.player_path(target);
        let Some(&next) = path.first() else {
            return Err(ActionError::NoReachableTarget);
        };
        self.move_player(next, event)?;
        self.world.auto.halt = false;
        if self.world.player.pos != target && !self.world.monsters_in_view() {
            self.world.auto.travel_target = Some(target);
        }
        Ok(())
    }

    fn player_path(&self, goal: Pos) -> Vec<Pos> {
        let from = self.world.player.pos;
        find_path(&mut PlayerPath { world: &self.world, goal }, from, goal)
    }

    fn auto_travel(&mut self, target: Pos, event: Event) -> bool {
        if self.world.monsters_in_view() {
            self.world.auto.travel_target = None;
            return false;
        }
        let path = self.player_path(target);
        let Some(&next) = path.first() else {
            self.world.auto.travel_target = None;
            return false;
        };
        if let Err(err) = self.move_player(next, event) {
            debug!(%err, "travel step refused");
            self.world.auto.travel_target = None;
            return false;
        }
        if self.world.is_excluded(next) || self.world.player.pos == target {
            self.world.auto.travel_target = None;
        }
        true
    }

    fn start_run(&mut self, dir: Direction, event: Event) -> Result<(), ActionError> {
        if self.world.monsters_in_view() {
            return Err(ActionError::MonstersInView);
        }
        self.move_player(self.world.player.pos.step(dir), event)?;
        self.world.auto.halt = false;
        self.world.auto.run_dir = Some(dir);
        Ok(())
    }

    fn auto_run(&mut self, dir: Direction, event: Event) -> bool {
        if self.world.monsters_in_view() {
            self.world.auto.run_dir = None;
            return false;
        }
        if let Err(err) = self.move_player(self.world.player.pos.step(dir), event) {
            debug!(%err, "run stopped");
            self.world.auto.run_dir = None;
            return false;
        }
        true
    }

    /// Marks or clears the square of LOS radius around `at`.
    fn toggle_exclusion(&mut self, at: Pos) -> Result<(), ActionError> {
        if !self.world.map.in_bounds(at) {
            return Err(ActionError::OutOfBounds(at));
        }
        let excluded = !self.world.is_excluded(at);
        let range = self.los_range();
        for y in at.y - range..=at.y + range {
            for x in at.x - range..=at.x + range {
                self.world.set_excluded(Pos { y, x }, excluded);
            }
        }
        Ok(())
    }

    /// Continues whichever automated mode is active. Returns whether the
    /// player acted; on `false` the mode is over and input is needed.
    pub(crate) fn auto_player(&mut self, event: Event) -> bool {
        let auto = &self.world.auto;
        if auto.resting {
            self.auto_rest(event)
        } else if auto.autoexploring {
            self.auto_explore(event)
        } else if let Some(target) = auto.travel_target {
            self.auto_travel(target, event)
        } else if let Some(dir) = auto.run_dir {
            self.auto_run(dir, event)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::*;

    fn turn_event() -> Event {
        Event::new(0, EventPayload::Simple(SimpleAction::PlayerTurn))
    }

    #[test]
    fn move_renews_turn_with_move_delay() {
        let mut game = game_from_rows(&[
            "#####", //
            "#@..#", //
            "#####",
        ]);
        game.move_player(Pos { y: 1, x: 2 }, turn_event()).expect("free cell");
        assert_eq!(game.world.player.pos, Pos { y: 1, x: 2 });
        assert!(game.events.entries().any(|(event, _)| event.rank == 10
            && event.payload == EventPayload::Simple(SimpleAction::PlayerTurn)));
    }

    #[test]
    fn move_delay_respects_speed_statuses_and_floor() {
        let mut game = game_from_rows(&[
            "#####", //
            "#@..#", //
            "#####",
        ]);
        game.world.player.statuses.insert(PlayerStatus::Swift, 1);
        assert_eq!(game.move_delay(), 7);
        game.world.player.statuses.insert(PlayerStatus::Slow, 2);
        assert_eq!(game.move_delay(), 13);
        game.world.player.statuses.clear();
        game.config.move_delay = 4;
        game.world.player.statuses.insert(PlayerStatus::Swift, 1);
        assert_eq!(game.move_delay(), MIN_MOVE_DELAY);
    }

    #[test]
    fn refused_moves_change_nothing() {
        let mut game = game_from_rows(&[
            "#####", //
            "#@..#", //
            "#...#", //
            "#####",
        ]);
        let start = game.world.player.pos;
        let pending = game.pending_events();
        assert_eq!(
            game.move_player(Pos { y: 0, x: 1 }, turn_event()),
            Err(ActionError::WallInTheWay(Pos { y: 0, x: 1 }))
        );
        assert_eq!(
            game.move_player(Pos { y: -1, x: 1 }, turn_event()),
            Err(ActionError::OutOfBounds(Pos { y: -1, x: 1 }))
        );
        game.world.player.statuses.insert(PlayerStatus::Confusion, 1);
        assert_eq!(
            game.move_player(Pos { y: 2, x: 2 }, turn_event()),
            Err(ActionError::DiagonalWhileConfused)
        );
        game.world.player.statuses.clear();
        game.world.player.statuses.insert(PlayerStatus::Lignification, 1);
        assert_eq!(game.move_player(Pos { y: 1, x: 2 }, turn_event()), Err(ActionError::Lignified));
        assert_eq!(game.world.player.pos, start);
        assert_eq!(game.pending_events(), pending);
    }

    #[test]
    fn digging_opens_walls_and_leaves_fog() {
        let mut game = game_from_rows(&[
            "######", //
            "#@#..#", //
            "######",
        ]);
        game.world.player.statuses.insert(PlayerStatus::Dig, 1);
        let wall = Pos { y: 1, x: 2 };
        game.move_player(wall, turn_event()).expect("digging");
        assert!(game.world.map.is_free(wall));
        assert_eq!(game.world.player.pos, wall);
        assert!(game.log().contains(&LogEvent::WallDug { pos: wall }));
        assert_eq!(game.world.clouds.get(&wall), Some(&CloudKind::Fog));
    }

    #[test]
    fn bumping_a_monster_attacks_it() {
        let mut game = game_from_rows(&[
            "#####", //
            "#@O.#", //
            "#####",
        ]);
        let id = only_monster(&game);
        let hp = game.world.monsters[id].hp;
        game.move_player(Pos { y: 1, x: 2 }, turn_event()).expect("attack");
        assert_eq!(game.world.player.pos, Pos { y: 1, x: 1 });
        assert!(game.world.monsters[id].hp < hp);
        assert_eq!(game.world.monsters[id].state, MonsterState::Hunting);
    }

    #[test]
    fn walking_onto_an_item_collects_it() {
        let mut game = game_from_rows(&[
            "#####", //
            "#@!.#", //
            "#####",
        ]);
        let item = Pos { y: 1, x: 2 };
        game.move_player(item, turn_event()).expect("free cell");
        assert!(!game.world.features.contains_key(&item));
        assert!(game.log().contains(&LogEvent::ItemCollected { pos: item }));
    }

    #[test]
    fn rest_is_refused_when_healthy() {
        let mut game = game_from_rows(&[
            "#####", //
            "#@..#", //
            "#####",
        ]);
        assert_eq!(game.start_rest(turn_event()), Err(ActionError::NothingToRecover));
        game.world.player.hp -= 5;
        game.world.clouds.insert(game.world.player.pos, CloudKind::Fire);
        assert_eq!(game.start_rest(turn_event()), Err(ActionError::RestOnFlames));
    }

    #[test]
    fn uninterrupted_rest_heals_after_configured_turns() {
        let mut game = game_from_rows(&[
            "#####", //
            "#@..#", //
            "#####",
        ]);
        game.world.player.hp = 1;
        game.start_rest(turn_event()).expect("hurt player may rest");
        let mut turns = 0;
        while game.auto_player(turn_event()) {
            turns += 1;
            assert!(turns <= 100, "rest never finished");
        }
        assert_eq!(turns, game.config.rest_turns);
        assert_eq!(game.world.player.hp, game.world.player.max_hp);
        assert!(game.log().contains(&LogEvent::RestCompleted));
        assert!(!game.world.auto.resting);
    }

    #[test]
    fn exclusion_toggle_covers_los_square() {
        let mut game = game_from_rows(&[
            "###################", //
            "#@................#", //
            "#.................#", //
            "###################",
        ]);
        let at = Pos { y: 1, x: 9 };
        game.toggle_exclusion(at).expect("in bounds");
        let range = game.los_range();
        assert!(game.world.is_excluded(at));
        assert!(game.world.is_excluded(Pos { y: 2, x: 9 + range }));
        assert!(!game.world.is_excluded(Pos { y: 1, x: 9 + range + 1 }));
        game.toggle_exclusion(at).expect("in bounds");
        assert!(!game.world.is_excluded(at));
    }

    #[test]
    fn run_stops_at_a_wall() {
        let mut game = game_from_rows(&[
            "#######", //
            "#@....#", //
            "#######",
        ]);
        game.start_run(Direction::East, turn_event()).expect("open corridor");
        let mut steps = 1;
        while game.auto_player(turn_event()) {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(game.world.player.pos, Pos { y: 1, x: 5 });
        assert_eq!(game.world.auto.run_dir, None);
    }

    #[test]
    fn travel_walks_known_cells_to_the_target() {
        let mut game = game_from_rows(&[
            "#######", //
            "#@....#", //
            "#.###.#", //
            "#.....#", //
            "#######",
        ]);
        explore_all(&mut game.world);
        let target = Pos { y: 3, x: 3 };
        game.start_travel(target, turn_event()).expect("known target");
        let mut steps = 1;
        while game.auto_player(turn_event()) {
            steps += 1;
            assert!(steps < 20);
        }
        assert_eq!(game.world.player.pos, target);
        assert_eq!(steps, 3);
    }
}
