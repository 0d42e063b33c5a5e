pub mod config;
pub mod content;
pub mod error;
pub mod game;
pub mod journal;
pub mod layout;
pub mod replay;
pub mod state;
pub mod types;

pub use config::SimConfig;
pub use error::{ActionError, ConfigError, JournalError, LayoutError, ReplayError, SetupError};
pub use game::Game;
pub use game::cost_map::{CostMap, build_cost_map};
pub use game::events::{Event, EventPayload, EventQueue};
pub use game::pathfinding::{find_path, find_path_with_cost};
pub use game::traversal::{
    AutoexplorePath, MonsterPath, NoisePath, PlayerPath, TerrainPath, Traversal,
};
pub use game::visibility::{
    NoSoftBlockers, SoftBlockers, VisibilitySet, compute_visibility, draw_visibility, ray,
};
pub use journal::{InputJournal, InputRecord};
pub use layout::Layout;
pub use replay::*;
pub use state::{Map, World};
pub use types::*;
