//! Combat system constants - all tunable values in one place
//!
//! Tier tables are indexed by `tier - 1`.

/// Point threshold of each (tier, level); row = tier, column = level
pub const TIER_THRESHOLDS: [[i32; 4]; 4] = [
    [1, 2, 3, 4],
    [5, 10, 15, 20],
    [25, 50, 75, 100],
    [125, 250, 375, 500],
];

pub const MAX_TIER: u8 = 4;
pub const MAX_LEVEL: u8 = 4;

// Hit chance: base + per-tier-gap step + weapon bonus, clamped
pub const BASE_HIT_CHANCE: f64 = 0.80;
pub const HIT_CHANCE_PER_TIER: f64 = 0.05;
pub const WEAPON_HIT_BONUS: f64 = 0.10;
pub const MIN_HIT_CHANCE: f64 = 0.50;
pub const MAX_HIT_CHANCE: f64 = 0.95;

// Counter-attacks land less often than attacks
pub const COUNTER_PENALTY: f64 = 0.30;
pub const MIN_COUNTER_CHANCE: f64 = 0.05;

// Luck swing
pub const LUCK_DELTAS: [i32; 4] = [1, 2, 4, 8];
pub const CRITICAL_CHANCE: f64 = 0.20;
pub const FUMBLE_CHANCE: f64 = 0.20;

// Exact-tie resolution
pub const MUTUAL_DESTRUCTION_CHANCE: f64 = 0.50;

// Defense bonuses
pub const STATIONARY_DEFENSE_BONUS: i32 = 1;
pub const ALLY_DEFENSE_BONUS: i32 = 1;

// Structure damage per attacking tier
pub const WALL_DAMAGE: [i32; 4] = [25, 40, 60, 90];
pub const BASE_DAMAGE: [i32; 4] = [5, 10, 20, 40];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_strictly_increase() {
        let flat: Vec<i32> = TIER_THRESHOLDS.iter().flatten().copied().collect();
        assert!(flat.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_hit_chance_bounds_ordered() {
        assert!(MIN_HIT_CHANCE < BASE_HIT_CHANCE && BASE_HIT_CHANCE < MAX_HIT_CHANCE);
        assert!(CRITICAL_CHANCE + FUMBLE_CHANCE < 1.0);
    }

    #[test]
    fn test_damage_scales_with_tier() {
        assert!(WALL_DAMAGE.windows(2).all(|w| w[0] < w[1]));
        assert!(BASE_DAMAGE.windows(2).all(|w| w[0] < w[1]));
        assert!(LUCK_DELTAS.windows(2).all(|w| w[0] < w[1]));
    }
}
