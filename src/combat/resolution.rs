//! Attack resolution between two units
//!
//! Sequence: hit roll, luck roll, power comparison, then either a counter
//! roll (attacker won) or a tie-break (exact draw). Rolls are consumed in
//! that order so scripted dice reproduce a fight exactly.

use serde::{Deserialize, Serialize};

use crate::battle::units::Unit;
use crate::combat::constants::*;
use crate::combat::dice::Dice;
use crate::combat::tiers::tier_floor;
use crate::core::types::UnitId;

/// Luck swing applied to attacker power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Luck {
    Critical(i32),
    Fumble(i32),
    Steady,
}

impl Luck {
    pub fn delta(&self) -> i32 {
        match self {
            Luck::Critical(delta) => *delta,
            Luck::Fumble(delta) => -*delta,
            Luck::Steady => 0,
        }
    }
}

/// Counter-attack after the defender falls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Counter {
    Missed,
    Struck { damage: i32, absorbed: i32 },
}

/// How the encounter ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackOutcome {
    /// Hit roll failed; the attacker is lost
    Missed,
    /// Attacker overpowered the defender
    DefenderDestroyed { counter: Counter },
    /// Defender held and lost `damage` points; the attacker is lost
    DefenderHeld { damage: i32 },
    /// Exact tie, both removed
    MutualDestruction,
    /// Exact tie, one side survives at its tier floor
    LuckySurvivor { survivor: UnitId },
}

/// Full record of one attack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackReport {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub hit_chance: f64,
    pub luck: Luck,
    pub attacker_power: i32,
    pub defender_power: i32,
    pub outcome: AttackOutcome,
    pub attacker_destroyed: bool,
    pub defender_destroyed: bool,
}

/// Chance to land a blow, clamped
pub fn hit_chance(attacker_tier: u8, defender_tier: u8, has_weapon: bool) -> f64 {
    let gap = attacker_tier as f64 - defender_tier as f64;
    let weapon = if has_weapon { WEAPON_HIT_BONUS } else { 0.0 };
    (BASE_HIT_CHANCE + HIT_CHANCE_PER_TIER * gap + weapon).clamp(MIN_HIT_CHANCE, MAX_HIT_CHANCE)
}

/// Chance the defender's dying counter lands
pub fn counter_chance(defender_tier: u8, attacker_tier: u8, defender_weapon: bool) -> f64 {
    let gap = defender_tier as f64 - attacker_tier as f64;
    let weapon = if defender_weapon { WEAPON_HIT_BONUS } else { 0.0 };
    (BASE_HIT_CHANCE + HIT_CHANCE_PER_TIER * gap + weapon - COUNTER_PENALTY)
        .clamp(MIN_COUNTER_CHANCE, MAX_HIT_CHANCE)
}

fn tier_index(tier: u8) -> usize {
    tier.clamp(1, MAX_TIER) as usize - 1
}

pub fn luck_delta(tier: u8) -> i32 {
    LUCK_DELTAS[tier_index(tier)]
}

/// Sample a luck swing for an attacker of `tier`
pub fn roll_luck(tier: u8, dice: &mut dyn Dice) -> Luck {
    let roll = dice.roll();
    let delta = luck_delta(tier);
    if roll < CRITICAL_CHANCE {
        Luck::Critical(delta)
    } else if roll < CRITICAL_CHANCE + FUMBLE_CHANCE {
        Luck::Fumble(delta)
    } else {
        Luck::Steady
    }
}

/// Defense bonus for `defender`, given the units around it
pub fn defense_bonus<'a>(
    defender: &Unit,
    others: impl IntoIterator<Item = &'a Unit>,
    stationary_threshold: u32,
) -> i32 {
    let mut bonus = 0;
    if defender.stationary_turns >= stationary_threshold {
        bonus += STATIONARY_DEFENSE_BONUS;
    }
    let tier = defender.tier();
    let supported = others.into_iter().any(|ally| {
        ally.id != defender.id
            && ally.side == defender.side
            && ally.tier() == tier
            && ally.position.is_adjacent(&defender.position)
    });
    if supported {
        bonus += ALLY_DEFENSE_BONUS;
    }
    bonus
}

/// Damage a unit of `tier` deals to a wall
pub fn wall_damage(tier: u8) -> i32 {
    WALL_DAMAGE[tier_index(tier)]
}

/// Damage a unit of `tier` deals to a base
pub fn base_damage(tier: u8) -> i32 {
    BASE_DAMAGE[tier_index(tier)]
}

/// Resolve `attacker` striking `defender`, mutating both point pools
///
/// The caller removes whichever units the report marks destroyed.
pub fn resolve_attack(
    attacker: &mut Unit,
    defender: &mut Unit,
    defender_bonus: i32,
    weapon_power: i32,
    dice: &mut dyn Dice,
) -> AttackReport {
    let attacker_tier = attacker.tier();
    let defender_tier = defender.tier();
    let chance = hit_chance(attacker_tier, defender_tier, attacker.has_weapon);
    let defender_power = defender.points + defender_bonus;

    let mut report = AttackReport {
        attacker: attacker.id,
        defender: defender.id,
        hit_chance: chance,
        luck: Luck::Steady,
        attacker_power: 0,
        defender_power,
        outcome: AttackOutcome::Missed,
        attacker_destroyed: false,
        defender_destroyed: false,
    };

    if !dice.chance(chance) {
        attacker.points = 0;
        report.attacker_destroyed = true;
        return report;
    }

    let luck = roll_luck(attacker_tier, dice);
    let attacker_power = (attacker.attack_power(weapon_power) + luck.delta()).max(0);
    report.luck = luck;
    report.attacker_power = attacker_power;

    if attacker_power > defender_power {
        defender.points = 0;
        report.defender_destroyed = true;

        let counter_odds = counter_chance(defender_tier, attacker_tier, defender.has_weapon);
        let counter = if dice.chance(counter_odds) {
            let remaining = attacker.absorb_with_armor(defender_power);
            attacker.points -= remaining;
            Counter::Struck {
                damage: defender_power,
                absorbed: defender_power - remaining,
            }
        } else {
            Counter::Missed
        };
        report.attacker_destroyed = attacker.points <= 0;
        report.outcome = AttackOutcome::DefenderDestroyed { counter };
    } else if attacker_power < defender_power {
        defender.points -= attacker_power;
        attacker.points = 0;
        report.attacker_destroyed = true;
        report.defender_destroyed = defender.points <= 0;
        report.outcome = AttackOutcome::DefenderHeld {
            damage: attacker_power,
        };
    } else if dice.chance(MUTUAL_DESTRUCTION_CHANCE) {
        attacker.points = 0;
        defender.points = 0;
        report.attacker_destroyed = true;
        report.defender_destroyed = true;
        report.outcome = AttackOutcome::MutualDestruction;
    } else {
        let attacker_survives = dice.chance(0.5);
        let (survivor, fallen) = if attacker_survives {
            (attacker, defender)
        } else {
            (defender, attacker)
        };
        survivor.points = tier_floor(survivor.tier());
        fallen.points = 0;
        report.attacker_destroyed = !attacker_survives;
        report.defender_destroyed = attacker_survives;
        report.outcome = AttackOutcome::LuckySurvivor {
            survivor: survivor.id,
        };
    }

    report
}
