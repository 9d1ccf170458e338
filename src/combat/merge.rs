//! Merge arithmetic: two same-tier units combine into one
//!
//! A merge that overflows the tier ceiling promotes the target to the next
//! tier's floor and spawns the leftover points as a remainder unit on the
//! mover's tile. Points are conserved in every branch.

use serde::{Deserialize, Serialize};

use crate::battle::units::Unit;
use crate::combat::tiers::{next_tier_floor, tier_ceiling};
use crate::core::error::Rejection;
use crate::core::types::UnitId;

/// What a merge produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub survivor: UnitId,
    pub survivor_points: i32,
    /// Target moved up a tier
    pub promoted: bool,
    /// Leftover points, spawned at the mover's original tile
    pub remainder: Option<Unit>,
}

/// Can `mover` merge into `target`?
pub fn can_merge(mover: &Unit, target: &Unit) -> Result<(), Rejection> {
    if mover.id == target.id {
        return Err(Rejection::Invalid("a unit cannot merge with itself"));
    }
    if mover.side != target.side {
        return Err(Rejection::Invalid("cannot merge with an enemy unit"));
    }
    if mover.tier() != target.tier() {
        return Err(Rejection::Invalid("merge requires matching tiers"));
    }
    Ok(())
}

/// Fold `mover` into `target`
///
/// On success the caller removes the mover. `remainder_id` is only used if a
/// remainder unit is spawned.
pub fn merge(mover: &Unit, target: &mut Unit, remainder_id: UnitId) -> Result<MergeOutcome, Rejection> {
    can_merge(mover, target)?;

    let tier = target.tier();
    let sum = mover.points + target.points;
    let ceiling = tier_ceiling(tier);

    target.has_weapon |= mover.has_weapon;
    target.has_armor |= mover.has_armor;
    target.armor_hp = target.armor_hp.max(mover.armor_hp);

    if sum <= ceiling {
        target.points = sum;
        return Ok(MergeOutcome {
            survivor: target.id,
            survivor_points: sum,
            promoted: false,
            remainder: None,
        });
    }

    // Top tier has nowhere to promote to; hold at the ceiling instead
    let (survivor_points, promoted) = match next_tier_floor(tier) {
        Some(floor) => (floor, true),
        None => (ceiling, false),
    };
    target.points = survivor_points;

    let leftover = sum - survivor_points;
    let remainder = (leftover > 0).then(|| {
        let mut unit = Unit::new(remainder_id, mover.side, mover.position, leftover);
        unit.has_acted = true;
        unit
    });

    Ok(MergeOutcome {
        survivor: target.id,
        survivor_points,
        promoted,
        remainder,
    })
}
