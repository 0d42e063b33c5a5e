use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Pos;

/// Reasons a player command is refused. A refused command leaves the parked
/// player turn in place and the world untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no player turn is waiting for input")]
    NoPendingTurn,
    #[error("the run is over")]
    RunFinished,
    #[error("{0:?} is outside the map")]
    OutOfBounds(Pos),
    #[error("there is a wall at {0:?}")]
    WallInTheWay(Pos),
    #[error("cannot move diagonally while confused")]
    DiagonalWhileConfused,
    #[error("cannot move while lignified")]
    Lignified,
    #[error("cannot do that with monsters in view")]
    MonstersInView,
    #[error("cannot explore while standing in an excluded area")]
    InExcludedArea,
    #[error("nothing left to explore")]
    NothingLeftToExplore,
    #[error("no reachable destination")]
    NoReachableTarget,
    #[error("already at {0:?}")]
    AlreadyThere(Pos),
    #[error("nothing to recover from by resting")]
    NothingToRecover,
    #[error("cannot rest on flames")]
    RestOnFlames,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    #[error("config value {field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout is empty")]
    Empty,
    #[error("layout row {row} has width {found}, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown glyph {glyph:?} at {pos:?}")]
    UnknownGlyph { glyph: char, pos: Pos },
    #[error("layout has no player start")]
    MissingPlayer,
    #[error("layout has more than one player start")]
    DuplicatePlayer,
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("failed to access journal {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed journal")]
    Json(#[from] serde_json::Error),
    #[error("unsupported journal format version {0}")]
    UnsupportedVersion(u16),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error("journal record {found} arrived when command {expected} was due")]
    OutOfOrder { expected: u64, found: u64 },
    #[error("journaled command {seq} was rejected")]
    CommandRejected {
        seq: u64,
        #[source]
        error: ActionError,
    },
    #[error("simulation did not ask for input within {max_events} events")]
    Stalled { max_events: u32 },
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0:?} is not a free in-bounds cell")]
    BlockedCell(Pos),
    #[error("{0:?} is already occupied")]
    Occupied(Pos),
}
