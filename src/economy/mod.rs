//! Economy engine: wood, iron, and the reserve pool that pays for units
//!
//! Reserve points buy units at a tier/level threshold cost. Wood converts
//! into reserve once a side holds more than it needs for walls.

use serde::{Deserialize, Serialize};

use crate::combat::tiers::cost_ladder;
use crate::core::config::GameConfig;
use crate::core::error::Rejection;
use crate::spatial::map::TileKind;

/// A side's stockpile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub wood: i32,
    pub iron: i32,
    pub reserve: i32,
}

impl Resources {
    pub fn new(wood: i32, iron: i32, reserve: i32) -> Self {
        Self { wood, iron, reserve }
    }

    pub fn can_afford(&self, wood: i32, iron: i32) -> bool {
        self.wood >= wood && self.iron >= iron
    }

    /// Deduct materials, or refuse without touching anything
    pub fn spend(&mut self, wood: i32, iron: i32) -> Result<(), Rejection> {
        if !self.can_afford(wood, iron) {
            return Err(Rejection::InsufficientResources);
        }
        self.wood -= wood;
        self.iron -= iron;
        Ok(())
    }

    /// Deduct reserve points, or refuse without touching anything
    pub fn spend_reserve(&mut self, points: i32) -> Result<(), Rejection> {
        if points <= 0 || self.reserve < points {
            return Err(Rejection::InsufficientResources);
        }
        self.reserve -= points;
        Ok(())
    }

    pub fn add(&mut self, income: Income) {
        self.wood += income.wood;
        self.iron += income.iron;
    }
}

/// Per-turn production
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    pub wood: i32,
    pub iron: i32,
}

impl std::ops::AddAssign for Income {
    fn add_assign(&mut self, other: Self) {
        self.wood += other.wood;
        self.iron += other.iron;
    }
}

/// First threshold cost (scanning 500 down to 1) the reserve covers, or 0
pub fn highest_affordable_cost(reserve: i32) -> i32 {
    cost_ladder().find(|cost| *cost <= reserve).unwrap_or(0)
}

/// Wood a side keeps before converting the surplus
///
/// Drops to the emergency buffer while the side's base is below half health.
pub fn wood_buffer(base_hp: i32, max_base_hp: i32, config: &GameConfig) -> i32 {
    if base_hp * 2 < max_base_hp {
        config.emergency_wood_buffer
    } else {
        config.wood_buffer
    }
}

/// Convert one batch of wood into a reserve point if above the buffer
pub fn wood_to_reserve(resources: &mut Resources, buffer: i32, config: &GameConfig) -> bool {
    let amount = config.wood_conversion_amount;
    if resources.wood > buffer && resources.wood >= amount {
        resources.wood -= amount;
        resources.reserve += 1;
        true
    } else {
        false
    }
}

/// Convert wood until under the buffer; returns reserve points gained
pub fn convert_surplus_wood(
    resources: &mut Resources,
    buffer: i32,
    config: &GameConfig,
    cap: usize,
) -> i32 {
    let mut gained = 0;
    for _ in 0..cap {
        if !wood_to_reserve(resources, buffer, config) {
            return gained;
        }
        gained += 1;
    }
    if resources.wood > buffer && resources.wood >= config.wood_conversion_amount {
        tracing::warn!(cap, wood = resources.wood, "wood conversion loop hit its cap");
    }
    gained
}

/// Is production on `kind` running after `occupation_turns`?
pub fn is_production_active(kind: TileKind, occupation_turns: u32, config: &GameConfig) -> bool {
    match kind {
        TileKind::Forest => occupation_turns >= config.forest_activation_turns,
        TileKind::Mine => occupation_turns >= config.mine_activation_turns,
        TileKind::Plain => false,
    }
}

/// Income from a unit that has occupied `kind` for `occupation_turns`
pub fn production_income(kind: TileKind, occupation_turns: u32, config: &GameConfig) -> Income {
    if !is_production_active(kind, occupation_turns, config) {
        return Income::default();
    }
    match kind {
        TileKind::Forest => Income {
            wood: config.forest_wood_income,
            iron: 0,
        },
        TileKind::Mine => Income {
            wood: 0,
            iron: config.mine_iron_income,
        },
        TileKind::Plain => Income::default(),
    }
}

/// Fraction of all resource tiles held
pub fn resource_share(held: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    held as f32 / total as f32
}
