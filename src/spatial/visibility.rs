//! Per-side visibility (fog of war)
//!
//! Each side sees a Chebyshev radius around its base and around every live
//! unit. Explored tiles only ever accumulate.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::config::GameConfig;
use crate::spatial::grid::GridCoord;
use crate::spatial::map::GridMap;

/// Visibility state for one side
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideVisibility {
    /// Currently visible tiles
    pub visible: AHashSet<GridCoord>,
    /// Every tile ever seen (superset of `visible`)
    pub explored: AHashSet<GridCoord>,
}

impl SideVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is this tile currently visible?
    pub fn is_visible(&self, coord: GridCoord) -> bool {
        self.visible.contains(&coord)
    }

    /// Has this tile ever been seen?
    pub fn is_explored(&self, coord: GridCoord) -> bool {
        self.explored.contains(&coord)
    }

    /// Replace the visible set and fold it into explored
    pub fn update(&mut self, new_visible: AHashSet<GridCoord>) {
        self.explored.extend(new_visible.iter().copied());
        self.visible = new_visible;
    }

    /// Recompute from the base and a list of (position, radius) sources
    pub fn recompute(
        &mut self,
        map: &GridMap,
        base: GridCoord,
        base_radius: u32,
        sources: impl IntoIterator<Item = (GridCoord, u32)>,
    ) {
        let mut visible: AHashSet<GridCoord> = map.tiles_within(base, base_radius).into_iter().collect();
        for (position, radius) in sources {
            visible.extend(map.tiles_within(position, radius));
        }
        self.update(visible);
    }

    /// Visible tiles in coordinate order (for snapshots)
    pub fn sorted_visible(&self) -> Vec<GridCoord> {
        let mut tiles: Vec<GridCoord> = self.visible.iter().copied().collect();
        tiles.sort();
        tiles
    }

    /// Explored tiles in coordinate order (for snapshots)
    pub fn sorted_explored(&self) -> Vec<GridCoord> {
        let mut tiles: Vec<GridCoord> = self.explored.iter().copied().collect();
        tiles.sort();
        tiles
    }
}

/// Vision radius of a unit of the given tier
pub fn vision_radius(tier: u8, config: &GameConfig) -> u32 {
    if tier >= 3 {
        config.veteran_vision
    } else {
        config.unit_vision
    }
}
