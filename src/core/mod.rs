pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, GameConfig, MatchSettings};
pub use error::{GameError, Rejection, Result};
pub use types::{Difficulty, Mood, Side, Turn, UnitId, WallOwner};
