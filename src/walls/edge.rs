//! Wall edges between two orthogonally adjacent tiles
//!
//! An edge is stored in canonical order (smaller coordinate first) so each
//! physical edge has exactly one key.

use serde::{Deserialize, Serialize};

use crate::spatial::grid::GridCoord;

/// Canonical edge between two adjacent tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(GridCoord, GridCoord)", into = "(GridCoord, GridCoord)")]
pub struct WallEdge {
    a: GridCoord,
    b: GridCoord,
}

impl WallEdge {
    /// Edge between `p` and `q`, or None if they are not orthogonally adjacent
    pub fn new(p: GridCoord, q: GridCoord) -> Option<Self> {
        if !p.is_adjacent(&q) {
            return None;
        }
        let (a, b) = if p <= q { (p, q) } else { (q, p) };
        Some(Self { a, b })
    }

    pub fn a(&self) -> GridCoord {
        self.a
    }

    pub fn b(&self) -> GridCoord {
        self.b
    }

    pub fn tiles(&self) -> [GridCoord; 2] {
        [self.a, self.b]
    }

    /// Is `tile` one of the two sides of this edge?
    pub fn touches_tile(&self, tile: GridCoord) -> bool {
        self.a == tile || self.b == tile
    }

    /// Tile-node shared with another edge
    pub fn shares_tile(&self, other: &Self) -> bool {
        self.touches_tile(other.a) || self.touches_tile(other.b)
    }

    /// The tile across the edge from `tile`
    pub fn other_side(&self, tile: GridCoord) -> Option<GridCoord> {
        if tile == self.a {
            Some(self.b)
        } else if tile == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    /// Twice the edge midpoint, kept integral
    pub fn midpoint_x2(&self) -> (i32, i32) {
        (self.a.x + self.b.x, self.a.y + self.b.y)
    }

    /// The four edges around a tile (may leave the map)
    pub fn around(tile: GridCoord) -> Vec<WallEdge> {
        tile.neighbors()
            .into_iter()
            .filter_map(|n| WallEdge::new(tile, n))
            .collect()
    }
}

impl TryFrom<(GridCoord, GridCoord)> for WallEdge {
    type Error = String;

    fn try_from((p, q): (GridCoord, GridCoord)) -> Result<Self, Self::Error> {
        WallEdge::new(p, q).ok_or_else(|| format!("{:?} and {:?} are not adjacent", p, q))
    }
}

impl From<WallEdge> for (GridCoord, GridCoord) {
    fn from(edge: WallEdge) -> Self {
        (edge.a, edge.b)
    }
}
