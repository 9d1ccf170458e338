//! Tier and level derivation from a unit's point pool
//!
//! Tier and level are never stored; they are always read off the threshold
//! table so they cannot drift from the points they describe.

use serde::{Deserialize, Serialize};

use crate::combat::constants::{MAX_TIER, TIER_THRESHOLDS};

/// Derived strength class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TierLevel {
    pub tier: u8,
    pub level: u8,
}

/// Tier = highest t with points >= level-1 threshold of t;
/// level = highest level of that tier whose threshold <= points.
/// Zero or negative points map to tier 1 level 1.
pub fn tier_level_of(points: i32) -> TierLevel {
    let tier_index = TIER_THRESHOLDS
        .iter()
        .rposition(|levels| points >= levels[0])
        .unwrap_or(0);
    let level_index = TIER_THRESHOLDS[tier_index]
        .iter()
        .rposition(|threshold| points >= *threshold)
        .unwrap_or(0);

    TierLevel {
        tier: tier_index as u8 + 1,
        level: level_index as u8 + 1,
    }
}

pub fn tier_of(points: i32) -> u8 {
    tier_level_of(points).tier
}

/// Point cost of a given tier and level (both 1-based, clamped)
pub fn cost_of(tier: u8, level: u8) -> i32 {
    let t = tier.clamp(1, MAX_TIER) as usize - 1;
    let l = level.clamp(1, 4) as usize - 1;
    TIER_THRESHOLDS[t][l]
}

/// Level-1 cost of a tier
pub fn tier_floor(tier: u8) -> i32 {
    cost_of(tier, 1)
}

/// Level-4 cost of a tier (the most points a unit of that tier may hold)
pub fn tier_ceiling(tier: u8) -> i32 {
    cost_of(tier, 4)
}

/// Level-1 cost of the tier above, or None at the top tier
pub fn next_tier_floor(tier: u8) -> Option<i32> {
    (tier < MAX_TIER).then(|| tier_floor(tier + 1))
}

/// Every threshold in descending order (500, 375, ... 2, 1)
pub fn cost_ladder() -> impl Iterator<Item = i32> {
    TIER_THRESHOLDS.into_iter().flatten().rev()
}

/// Is `points` exactly one of the threshold costs?
pub fn is_threshold_cost(points: i32) -> bool {
    cost_ladder().any(|cost| cost == points)
}
