//! AI personality configuration loaded from TOML
//!
//! Personalities hold the policy thresholds of the decision engine: when to
//! commit to a siege, when to chase lost resource tiles, how much wood to
//! keep for fortification, and whether fog of war applies.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::Difficulty;

/// Posture switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Own attack power over enemy power that triggers siege mode
    pub siege_power_ratio: f32,
    /// Enemy share of resource tiles that triggers reclamation
    pub reclamation_share: f32,
    /// Own share of resource tiles that counts as an emergency push
    pub emergency_control_share: f32,
    /// Iron at which units stop deferring equipment to partners
    pub wealth_override_iron: i32,
    /// Wood needed before a resource holder fortifies its tile
    pub fortify_hold_wood: i32,
    /// Wood needed for fortification walls
    pub fortify_wood: i32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            siege_power_ratio: 1.2,
            reclamation_share: 0.5,
            emergency_control_share: 0.7,
            wealth_override_iron: 100,
            fortify_hold_wood: 50,
            fortify_wood: 10,
        }
    }
}

/// Distances the stages look at (Manhattan)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    /// Enemies this close to the base are threats
    pub threat: u32,
    /// Units this close to their base answer threats
    pub defense: u32,
    /// Units this close to the enemy base go for it
    pub siege: u32,
    /// Threats within this distance shape fortification walls
    pub fortify_threat: u32,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            threat: 3,
            defense: 6,
            siege: 4,
            fortify_threat: 4,
        }
    }
}

/// Opportunistic unit production
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Below this many units the AI buys tier-2 units whenever it can
    pub min_units: usize,
    pub tier2_cost: i32,
    pub tier3_cost: i32,
    /// Reserve surplus that buys a tier-3 unit regardless of army size
    pub tier3_reserve: i32,
    /// Wood left over after paying for a forge before the AI starts one
    pub forge_wood_margin: i32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            min_units: 4,
            tier2_cost: 5,
            tier3_cost: 25,
            tier3_reserve: 35,
            forge_wood_margin: 10,
        }
    }
}

/// Emergency siege priorities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiegeWeights {
    pub base_strike: f32,
    pub wall_breach: f32,
    pub advance: f32,
}

impl Default for SiegeWeights {
    fn default() -> Self {
        Self {
            base_strike: 1.0,
            wall_breach: 0.9,
            advance: 0.5,
        }
    }
}

/// Difficulty modifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Whether AI ignores fog of war
    pub ignores_fog_of_war: bool,
}

/// Complete AI personality configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPersonality {
    /// Name of this personality (set from filename)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub radii: RadiusConfig,
    #[serde(default)]
    pub production: ProductionConfig,
    #[serde(default)]
    pub siege: SiegeWeights,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            thresholds: ThresholdConfig::default(),
            radii: RadiusConfig::default(),
            production: ProductionConfig::default(),
            siege: SiegeWeights::default(),
            difficulty: DifficultyConfig::default(),
        }
    }
}

impl AiPersonality {
    /// Built-in personality for a difficulty level
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let mut personality = Self::default();
        if difficulty == Difficulty::Nightmare {
            personality.name = "nightmare".to_string();
            personality.difficulty.ignores_fog_of_war = true;
        }
        personality
    }
}

/// Load personality by name
///
/// Loads from `data/personalities/{name}.toml`
pub fn load_personality(name: &str) -> Result<AiPersonality> {
    let mut personality = load_personality_file(personality_path(name))?;
    personality.name = name.to_string();
    Ok(personality)
}

/// Load personality from an explicit TOML file
pub fn load_personality_file(path: impl AsRef<Path>) -> Result<AiPersonality> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let mut personality: AiPersonality = toml::from_str(&contents)?;
    if personality.name.is_empty() {
        personality.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(personality)
}

/// Get path to personality file
fn personality_path(name: &str) -> PathBuf {
    PathBuf::from("data/personalities").join(format!("{}.toml", name))
}
