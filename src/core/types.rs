//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for units
///
/// Ids are handed out sequentially by the engine so that every id-based
/// decision (sorting, siege split) is reproducible from the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Deterministic half of the id space
    pub fn is_even(&self) -> bool {
        self.0 % 2 == 0
    }
}

/// Global turn counter (one turn = player phase + AI phase)
pub type Turn = u32;

/// The two acting sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Human-controlled side
    Player,
    /// Autonomous opponent
    Ai,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Player, Side::Ai];

    pub fn opponent(&self) -> Side {
        match self {
            Side::Player => Side::Ai,
            Side::Ai => Side::Player,
        }
    }

    /// Index into per-side arrays
    pub fn index(&self) -> usize {
        match self {
            Side::Player => 0,
            Side::Ai => 1,
        }
    }
}

/// Owner tag for walls (neutral walls belong to nobody)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallOwner {
    Side(Side),
    Neutral,
}

impl WallOwner {
    pub fn is_neutral(&self) -> bool {
        matches!(self, WallOwner::Neutral)
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            WallOwner::Side(side) => Some(*side),
            WallOwner::Neutral => None,
        }
    }

    /// Hostile from the point of view of `side` (enemy or neutral)
    pub fn is_hostile_to(&self, side: Side) -> bool {
        *self != WallOwner::Side(side)
    }
}

impl From<Side> for WallOwner {
    fn from(side: Side) -> Self {
        WallOwner::Side(side)
    }
}

/// Difficulty level supplied by the settings provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Baby,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

impl Difficulty {
    /// Starting reserve points as (player, ai)
    pub fn starting_reserves(&self) -> (i32, i32) {
        match self {
            Difficulty::Baby => (20, 5),
            Difficulty::Normal => (10, 10),
            Difficulty::Hard => (10, 20),
            Difficulty::Nightmare => (5, 30),
        }
    }

    /// Point values of the autonomous side's starting army
    pub fn ai_starting_army(&self) -> &'static [i32] {
        match self {
            Difficulty::Baby => &[1, 1],
            Difficulty::Normal => &[2, 2, 1],
            Difficulty::Hard => &[5, 2, 2],
            Difficulty::Nightmare => &[10, 5, 5, 2],
        }
    }

    /// Turns between AI reserve bonuses (None = no bonus)
    pub fn ai_bonus_cadence(&self) -> Option<u32> {
        match self {
            Difficulty::Baby => None,
            Difficulty::Normal => Some(3),
            Difficulty::Hard => Some(2),
            Difficulty::Nightmare => Some(1),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baby" => Ok(Difficulty::Baby),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "nightmare" => Ok(Difficulty::Nightmare),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Adaptive AI mood derived from relative resource share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    None,
    Angry,
    Rage,
}

impl Mood {
    /// Mood from the player's lead in resource share (percentage points)
    pub fn from_share_lead(player_share: f32, ai_share: f32) -> Self {
        let lead = player_share - ai_share;
        if lead >= 0.5 {
            Mood::Rage
        } else if lead >= 0.25 {
            Mood::Angry
        } else {
            Mood::None
        }
    }

    /// Extra reserve points granted per turn
    pub fn reserve_bonus(&self) -> i32 {
        match self {
            Mood::None => 0,
            Mood::Angry => 1,
            Mood::Rage => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Player.opponent(), Side::Ai);
        assert_eq!(Side::Ai.opponent(), Side::Player);
        assert_ne!(Side::Player.index(), Side::Ai.index());
    }

    #[test]
    fn test_wall_owner_hostility() {
        let neutral = WallOwner::Neutral;
        let mine = WallOwner::from(Side::Player);
        assert!(neutral.is_hostile_to(Side::Player));
        assert!(!mine.is_hostile_to(Side::Player));
        assert!(mine.is_hostile_to(Side::Ai));
        assert_eq!(mine.side(), Some(Side::Player));
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("Nightmare".parse::<Difficulty>(), Ok(Difficulty::Nightmare));
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_mood_thresholds() {
        assert_eq!(Mood::from_share_lead(0.5, 0.5), Mood::None);
        assert_eq!(Mood::from_share_lead(0.6, 0.3), Mood::Angry);
        assert_eq!(Mood::from_share_lead(0.8, 0.2), Mood::Rage);
        assert!(Mood::Rage.reserve_bonus() > Mood::Angry.reserve_bonus());
    }

    #[test]
    fn test_unit_id_ordering() {
        assert!(UnitId(1) < UnitId(2));
        assert!(UnitId(4).is_even());
        assert!(!UnitId(5).is_even());
    }
}
