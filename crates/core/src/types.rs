use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct MonsterId;
}

/// Cost reported for cells a cost map never reached, and returned by
/// traversal policies for steps that must never be taken.
pub const UNREACHABLE: i32 = 9999;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn offset(self, dx: i32, dy: i32) -> Pos {
        Pos { y: self.y + dy, x: self.x + dx }
    }

    pub fn step(self, dir: Direction) -> Pos {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    pub fn chebyshev(self, other: Pos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn is_adjacent(self, other: Pos) -> bool {
        self.chebyshev(other) == 1
    }
}

/// Eight-way movement directions.
///
/// [`Direction::ALL`] is the iteration order every neighbor query uses; cost
/// ties are resolved in favor of the direction listed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    West,
    North,
    South,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub const CARDINAL: [Direction; 4] =
        [Direction::East, Direction::West, Direction::North, Direction::South];

    /// `(dx, dy)` with y growing southward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    pub fn is_cardinal(self) -> bool {
        matches!(self, Direction::East | Direction::West | Direction::North | Direction::South)
    }

    /// Direction of a single step from `from` to an adjacent `to`.
    pub fn between(from: Pos, to: Pos) -> Option<Direction> {
        let delta = (to.x - from.x, to.y - from.y);
        Direction::ALL.into_iter().find(|dir| dir.delta() == delta)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Wall,
    Free,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    Stairs,
    Item,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CloudKind {
    Fog,
    Fire,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    Goblin,
    Hound,
    Ogre,
    GiantBee,
    EarthDragon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonsterState {
    Resting,
    Wandering,
    Hunting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerStatus {
    Confusion,
    Lignification,
    Slow,
    Swift,
    Dig,
    Shadows,
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonsterStatus {
    Confused,
    Lignified,
    Slow,
    Exhausted,
}

/// Automated player modes that a visibility or noise interrupt can halt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AutoMode {
    Rest,
    Explore,
    Travel,
    Run,
}

/// Player commands, in the form they are journaled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Move(Direction),
    Wait,
    Rest,
    Autoexplore,
    TravelTo(Pos),
    Run(Direction),
    ToggleExclusion(Pos),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Death,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceStopReason {
    /// A player turn is parked and waits for [`Command`] input.
    AwaitingInput,
    Finished(RunOutcome),
    QueueEmpty,
    BudgetExhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdvanceResult {
    pub processed_events: u32,
    pub stop_reason: AdvanceStopReason,
}

/// Player-facing notices, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogEvent {
    FeatureSighted { pos: Pos, feature: Feature },
    TerrainChanged { pos: Pos },
    FlamesSpotted { pos: Pos },
    MonsterSighted { monster: MonsterId, kind: MonsterKind, pos: Pos },
    MonsterHeard { kind: MonsterKind, pos: Pos },
    MonsterAwoke { monster: MonsterId, kind: MonsterKind },
    MonsterNoticedPlayer { monster: MonsterId, kind: MonsterKind },
    MonsterBarked { monster: MonsterId },
    MonsterKilled { monster: MonsterId, kind: MonsterKind },
    PlayerHitMonster { monster: MonsterId, damage: i32 },
    MonsterHitPlayer { monster: MonsterId, damage: i32 },
    PlayerBurned { damage: i32 },
    WallDug { pos: Pos },
    EarthSplitting { pos: Pos },
    WallCollapsed { pos: Pos },
    ItemCollected { pos: Pos },
    StatusEnded { status: PlayerStatus },
    AutomationStopped { mode: AutoMode },
    ExplorationFinished,
    RestCompleted,
}
