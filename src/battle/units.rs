//! Units: a point pool on a tile, plus equipment and per-turn counters
//!
//! Tier and level are derived from `points` on every read.

use serde::{Deserialize, Serialize};

use crate::combat::tiers::{tier_level_of, tier_ceiling, TierLevel};
use crate::core::types::{Side, UnitId};
use crate::spatial::grid::GridCoord;

/// A unit on the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub position: GridCoord,
    pub side: Side,
    pub points: i32,
    pub has_weapon: bool,
    pub has_armor: bool,
    /// Remaining armor absorption (0 when unarmored)
    pub armor_hp: i32,
    pub has_acted: bool,
    /// Moved at least once during its side's current phase
    pub moved_this_turn: bool,
    /// Consecutive own end-of-turns without moving
    pub stationary_turns: u32,
    /// Consecutive own end-of-turns on the current resource tile
    pub occupation_turns: u32,
}

impl Unit {
    pub fn new(id: UnitId, side: Side, position: GridCoord, points: i32) -> Self {
        Self {
            id,
            position,
            side,
            points,
            has_weapon: false,
            has_armor: false,
            armor_hp: 0,
            has_acted: false,
            moved_this_turn: false,
            stationary_turns: 0,
            occupation_turns: 0,
        }
    }

    pub fn tier_level(&self) -> TierLevel {
        tier_level_of(self.points)
    }

    pub fn tier(&self) -> u8 {
        self.tier_level().tier
    }

    pub fn level(&self) -> u8 {
        self.tier_level().level
    }

    /// Most points this unit's tier may hold
    pub fn ceiling(&self) -> i32 {
        tier_ceiling(self.tier())
    }

    pub fn is_alive(&self) -> bool {
        self.points > 0
    }

    pub fn is_fully_equipped(&self) -> bool {
        self.has_weapon && self.has_armor
    }

    /// Attack strength before luck
    pub fn attack_power(&self, weapon_power: i32) -> i32 {
        self.points + if self.has_weapon { weapon_power } else { 0 }
    }

    /// Move one tile; movement resets the stationary and occupation counters
    pub fn step_to(&mut self, to: GridCoord) {
        self.position = to;
        self.moved_this_turn = true;
        self.stationary_turns = 0;
        self.occupation_turns = 0;
    }

    /// Soak `damage` with armor first; returns the damage left over
    pub fn absorb_with_armor(&mut self, damage: i32) -> i32 {
        if !self.has_armor || self.armor_hp <= 0 {
            return damage;
        }
        let absorbed = damage.min(self.armor_hp);
        self.armor_hp -= absorbed;
        if self.armor_hp <= 0 {
            self.has_armor = false;
            self.armor_hp = 0;
        }
        damage - absorbed
    }
}
