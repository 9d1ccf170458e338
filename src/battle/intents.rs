//! Intents: the closed set of requests a presentation layer (or the AI) can make
//!
//! The acting side is implied by the current phase, except for sandbox
//! placement which names its side explicitly.

use serde::{Deserialize, Serialize};

use crate::battle::events::Equipment;
use crate::core::types::{Side, UnitId};
use crate::spatial::grid::GridCoord;
use crate::walls::edge::WallEdge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Step onto an adjacent tile: move, attack, merge, or strike a base
    MoveTo { unit: UnitId, to: GridCoord },
    /// Hit a wall on one of the unit's edges
    AttackWall { unit: UnitId, edge: WallEdge },
    /// Build a wall on one of the unit's edges (costs wood)
    BuildWall { unit: UnitId, edge: WallEdge },
    /// Tear down one of the side's own walls
    DemolishWall { unit: UnitId, edge: WallEdge },
    /// Strike the enemy base from a touching tile
    AttackBase { unit: UnitId },
    /// Spend reserve on a new unit; `points` defaults to the largest affordable cost
    Deploy {
        tile: Option<GridCoord>,
        points: Option<i32>,
    },
    /// Start a forge on a plain tile next to the unit
    BuildForge { unit: UnitId, tile: GridCoord },
    /// Buy equipment while standing on an own finished forge
    Equip { unit: UnitId, item: Equipment },
    /// Free placement, sandbox only
    PlaceUnit {
        side: Side,
        tile: GridCoord,
        points: i32,
    },
    /// Trade wood above the buffer for reserve points
    ConvertWood,
    EndTurn,
}

impl Intent {
    /// Unit the intent acts through, if any
    pub fn actor(&self) -> Option<UnitId> {
        match self {
            Intent::MoveTo { unit, .. }
            | Intent::AttackWall { unit, .. }
            | Intent::BuildWall { unit, .. }
            | Intent::DemolishWall { unit, .. }
            | Intent::AttackBase { unit }
            | Intent::BuildForge { unit, .. }
            | Intent::Equip { unit, .. } => Some(*unit),
            Intent::Deploy { .. }
            | Intent::PlaceUnit { .. }
            | Intent::ConvertWood
            | Intent::EndTurn => None,
        }
    }

    /// Does executing this intent spend the actor's action for the turn?
    pub fn consumes_action(&self) -> bool {
        !matches!(
            self,
            Intent::Equip { .. }
                | Intent::Deploy { .. }
                | Intent::PlaceUnit { .. }
                | Intent::ConvertWood
                | Intent::EndTurn
        )
    }
}
