//! Read-only snapshots for renderers and persistence
//!
//! Snapshots are owned copies; nothing in them points back into the engine.

use serde::{Deserialize, Serialize};

use crate::battle::engine::{Forge, GameEngine, Phase};
use crate::battle::record::MatchRecord;
use crate::battle::units::Unit;
use crate::core::types::{Mood, Side, Turn};
use crate::economy::Resources;
use crate::spatial::grid::GridCoord;
use crate::walls::store::Wall;

/// Per-side numbers shown in a status bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSnapshot {
    pub side: Side,
    pub resources: Resources,
    pub base_hp: i32,
    pub max_base_hp: i32,
    pub resource_tiles_held: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub turn: Turn,
    pub phase: Phase,
    pub generation: u64,
    pub map_size: u32,
    pub units: Vec<Unit>,
    pub walls: Vec<Wall>,
    pub sides: Vec<SideSnapshot>,
    /// Resource tile -> controlling side, in coordinate order
    pub control: Vec<(GridCoord, Side)>,
    pub forges: Vec<Forge>,
    /// Tiles the viewing side currently sees
    pub visible: Vec<GridCoord>,
    /// Tiles the viewing side has ever seen
    pub explored: Vec<GridCoord>,
    pub mood: Mood,
    pub outcome: Option<MatchRecord>,
}

impl GameEngine {
    /// Snapshot from the human side's point of view
    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshot_for(Side::Player)
    }

    /// Snapshot with enemy units outside `viewer`'s vision filtered out
    pub fn snapshot_for(&self, viewer: Side) -> GameSnapshot {
        let visibility = self.visibility(viewer);
        let units = self
            .units()
            .filter(|u| u.side == viewer || visibility.is_visible(u.position))
            .cloned()
            .collect();

        let sides = Side::ALL
            .iter()
            .map(|side| {
                let state = self.side_state(*side);
                SideSnapshot {
                    side: *side,
                    resources: state.resources,
                    base_hp: state.base_hp,
                    max_base_hp: state.max_base_hp,
                    resource_tiles_held: self.held_resource_count(*side),
                }
            })
            .collect();

        GameSnapshot {
            turn: self.turn(),
            phase: self.phase(),
            generation: self.generation(),
            map_size: self.map().size,
            units,
            walls: self.walls().iter().cloned().collect(),
            sides,
            control: self.control().iter().map(|(tile, side)| (*tile, *side)).collect(),
            forges: self.forges().copied().collect(),
            visible: visibility.sorted_visible(),
            explored: visibility.sorted_explored(),
            mood: self.mood(),
            outcome: self.outcome().cloned(),
        }
    }
}
