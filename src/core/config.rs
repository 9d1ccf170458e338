//! Rule configuration with documented constants
//!
//! Every tunable rule value is collected here with an explanation of what it
//! governs. Values can be overridden from a TOML file; missing keys fall back
//! to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};
use crate::core::types::Difficulty;

/// Configuration for the rule systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === BASES ===
    /// Starting base health in a normal match
    pub base_hp: i32,

    /// Starting base health in sandbox mode
    pub sandbox_base_hp: i32,

    // === WALLS ===
    /// Health of a freshly built wall before formation bonuses
    pub wall_base_health: i32,

    /// Bonus max health each member adds to its formation
    ///
    /// A formation of k walls gives every member `wall_base_health + k * this`.
    pub wall_bonus_per_member: i32,

    /// Turns an edge stays unbuildable after its wall is destroyed
    pub wall_rebuild_cooldown: u32,

    /// Chebyshev radius around each base where walls cannot be built
    pub base_protection_radius: u32,

    /// Wood spent per wall
    pub wall_wood_cost: i32,

    // === SAFETY CAPS ===
    /// Maximum node expansions for a single path search
    pub bfs_budget: usize,

    /// Maximum wall visits during one formation recompute
    pub flood_fill_cap: usize,

    /// Maximum free actions the autonomous side takes per turn
    pub free_action_cap: usize,

    // === ECONOMY ===
    /// Wood consumed per reserve point during conversion
    pub wood_conversion_amount: i32,

    /// Wood kept back before converting (normal situation)
    pub wood_buffer: i32,

    /// Wood kept back before converting while the base is below half health
    ///
    /// Lower than `wood_buffer` so a side under siege turns wood into units sooner.
    pub emergency_wood_buffer: i32,

    /// Reserve points each side receives per completed turn
    pub reserve_trickle: i32,

    /// Consecutive turns on a forest before it produces
    pub forest_activation_turns: u32,

    /// Consecutive turns on a mine before it produces
    pub mine_activation_turns: u32,

    /// Wood per turn from an active forest
    pub forest_wood_income: i32,

    /// Iron per turn from an active mine
    pub mine_iron_income: i32,

    // === FORGES & EQUIPMENT ===
    pub forge_wood_cost: i32,
    pub forge_iron_cost: i32,

    /// Owner turns until a forge finishes construction
    pub forge_build_turns: u32,

    pub weapon_iron_cost: i32,
    pub armor_iron_cost: i32,

    /// Hit points of freshly forged armor
    pub armor_hp: i32,

    /// Minimum tier allowed to equip at a forge
    pub equip_min_tier: u8,

    // === COMBAT ===
    /// Attack power added by a weapon
    pub weapon_power: i32,

    /// Turns a unit must stay put to earn the stationary defense bonus
    pub stationary_defense_turns: u32,

    // === VISION ===
    pub base_vision: u32,
    pub unit_vision: u32,

    /// Vision for tier 3 and tier 4 units
    pub veteran_vision: u32,

    // === VICTORY ===
    /// Consecutive completed turns of total resource control for a monopoly win
    pub monopoly_turns: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_hp: 100,
            sandbox_base_hp: 1000,

            wall_base_health: 100,
            wall_bonus_per_member: 20,
            wall_rebuild_cooldown: 5,
            base_protection_radius: 2,
            wall_wood_cost: 10,

            bfs_budget: 500,
            flood_fill_cap: 10_000,
            free_action_cap: 50,

            wood_conversion_amount: 20,
            wood_buffer: 60,
            emergency_wood_buffer: 20,
            reserve_trickle: 1,
            forest_activation_turns: 3,
            mine_activation_turns: 5,
            forest_wood_income: 10,
            mine_iron_income: 5,

            forge_wood_cost: 20,
            forge_iron_cost: 30,
            forge_build_turns: 3,
            weapon_iron_cost: 20,
            armor_iron_cost: 20,
            armor_hp: 20,
            equip_min_tier: 2,

            weapon_power: 20,
            stationary_defense_turns: 3,

            base_vision: 3,
            unit_vision: 2,
            veteran_vision: 3,

            monopoly_turns: 10,
        }
    }
}

impl GameConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text; absent keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.base_hp <= 0 || self.sandbox_base_hp <= 0 {
            return Err(GameError::InvalidConfig("base hp must be positive".into()));
        }

        if self.wall_base_health <= 0 || self.wall_bonus_per_member < 0 {
            return Err(GameError::InvalidConfig(format!(
                "wall health ({}) must be positive and bonus ({}) non-negative",
                self.wall_base_health, self.wall_bonus_per_member
            )));
        }

        // The emergency rule only means something if it lowers the buffer
        if self.emergency_wood_buffer > self.wood_buffer {
            return Err(GameError::InvalidConfig(format!(
                "emergency_wood_buffer ({}) should be <= wood_buffer ({})",
                self.emergency_wood_buffer, self.wood_buffer
            )));
        }

        if self.wood_conversion_amount <= 0 {
            return Err(GameError::InvalidConfig(
                "wood_conversion_amount must be positive".into(),
            ));
        }

        if self.bfs_budget == 0 || self.flood_fill_cap == 0 || self.free_action_cap == 0 {
            return Err(GameError::InvalidConfig("safety caps must be non-zero".into()));
        }

        if self.monopoly_turns == 0 {
            return Err(GameError::InvalidConfig("monopoly_turns must be non-zero".into()));
        }

        Ok(())
    }
}

/// Load a rule config from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<GameConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    GameConfig::from_toml_str(&contents)
}

/// Per-match settings from the settings provider
/// Board side lengths a match can be played on
pub const SUPPORTED_MAP_SIZES: [u32; 3] = [10, 20, 30];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub difficulty: Difficulty,

    /// Relaxed victory checks, inflated base HP, free unit placement
    pub sandbox: bool,

    /// Side length of the square grid
    pub map_size: u32,

    /// Seed for every random roll in the match
    pub seed: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            sandbox: false,
            map_size: 10,
            seed: 42,
        }
    }
}

impl MatchSettings {
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_MAP_SIZES.contains(&self.map_size) {
            return Err(GameError::InvalidConfig(format!(
                "map_size {} is not one of {:?}",
                self.map_size, SUPPORTED_MAP_SIZES
            )));
        }
        Ok(())
    }
}
