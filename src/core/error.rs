use thiserror::Error;

use crate::core::types::{Side, UnitId};

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Unit not found: {0:?}")]
    UnitNotFound(UnitId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid map layout: {0}")]
    InvalidLayout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;

/// Reason an intent was refused
///
/// Rejections never change state. The permissive `submit` surface swallows
/// them; `try_submit` hands them back to callers that want to know why.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("game is over")]
    GameOver,

    #[error("it is not {0:?}'s turn")]
    NotYourTurn(Side),

    #[error("unit {0:?} does not exist")]
    UnitNotFound(UnitId),

    #[error("unit {0:?} belongs to the other side")]
    NotYourUnit(UnitId),

    #[error("unit {0:?} has already acted")]
    AlreadyActed(UnitId),

    #[error("target is not adjacent")]
    NotAdjacent,

    #[error("target is out of bounds")]
    OutOfBounds,

    #[error("movement is blocked")]
    Blocked,

    #[error("edge already holds a wall")]
    EdgeOccupied,

    #[error("edge is too close to a base")]
    ProtectedEdge,

    #[error("edge is cooling down after destruction")]
    EdgeCoolingDown,

    #[error("no wall on that edge")]
    NoWall,

    #[error("not enough resources")]
    InsufficientResources,

    #[error("no free tile next to the base")]
    NoSpawnTile,

    #[error("only allowed in sandbox mode")]
    NotSandbox,

    #[error("{0}")]
    Invalid(&'static str),
}
