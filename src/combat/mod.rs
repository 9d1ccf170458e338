//! Combat resolver: tiers, merges, attacks, and structure damage

pub mod constants;
pub mod dice;
pub mod merge;
pub mod resolution;
pub mod tiers;

pub use dice::{Dice, FixedDice, SeededDice};
pub use merge::{can_merge, merge, MergeOutcome};
pub use resolution::{
    base_damage, counter_chance, defense_bonus, hit_chance, resolve_attack, wall_damage,
    AttackOutcome, AttackReport, Counter, Luck,
};
pub use tiers::{cost_ladder, tier_ceiling, tier_floor, tier_level_of, tier_of, TierLevel};
