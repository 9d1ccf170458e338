//! Game map: square grid, bases, resource tiles, and the generator seam
//!
//! The map never changes after reset. Units, walls and control live in the
//! engine; this is only the static terrain.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};
use crate::core::types::Side;
use crate::spatial::grid::GridCoord;
use crate::walls::edge::WallEdge;

/// Static terrain of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    #[default]
    Plain,
    /// Produces wood once occupied long enough
    Forest,
    /// Produces iron once occupied long enough
    Mine,
}

impl TileKind {
    pub fn is_resource(&self) -> bool {
        matches!(self, TileKind::Forest | TileKind::Mine)
    }
}

/// Everything the map generator supplies at reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapLayout {
    pub size: u32,
    pub player_base: GridCoord,
    pub ai_base: GridCoord,
    pub forests: Vec<GridCoord>,
    pub mines: Vec<GridCoord>,
    pub neutral_walls: Vec<WallEdge>,
}

impl MapLayout {
    /// Empty layout with bases in opposite corners
    pub fn empty(size: u32) -> Self {
        let (player_base, ai_base) = default_bases(size);
        Self {
            size,
            player_base,
            ai_base,
            forests: Vec::new(),
            mines: Vec::new(),
            neutral_walls: Vec::new(),
        }
    }
}

/// Player base bottom-left, AI base top-right
pub fn default_bases(size: u32) -> (GridCoord, GridCoord) {
    let far = size as i32 - 1;
    (GridCoord::new(0, far), GridCoord::new(far, 0))
}

/// The static map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMap {
    pub size: u32,
    pub player_base: GridCoord,
    pub ai_base: GridCoord,
    /// Only non-plain tiles are stored
    tiles: BTreeMap<GridCoord, TileKind>,
}

impl GridMap {
    /// Create an empty map with default base positions
    pub fn new(size: u32) -> Self {
        let (player_base, ai_base) = default_bases(size);
        Self {
            size,
            player_base,
            ai_base,
            tiles: BTreeMap::new(),
        }
    }

    /// Build a map from a generator layout, checking it is coherent
    pub fn from_layout(layout: &MapLayout) -> Result<Self> {
        let mut map = Self {
            size: layout.size,
            player_base: layout.player_base,
            ai_base: layout.ai_base,
            tiles: BTreeMap::new(),
        };

        if !map.in_bounds(map.player_base) || !map.in_bounds(map.ai_base) {
            return Err(GameError::InvalidLayout("base out of bounds".into()));
        }
        if map.player_base == map.ai_base {
            return Err(GameError::InvalidLayout("bases overlap".into()));
        }

        let resources = layout
            .forests
            .iter()
            .map(|c| (*c, TileKind::Forest))
            .chain(layout.mines.iter().map(|c| (*c, TileKind::Mine)));
        for (coord, kind) in resources {
            if !map.in_bounds(coord) || map.is_base(coord) {
                return Err(GameError::InvalidLayout(format!(
                    "resource tile {:?} is out of bounds or on a base",
                    coord
                )));
            }
            map.set_tile(coord, kind);
        }

        for edge in &layout.neutral_walls {
            if !map.in_bounds(edge.a()) || !map.in_bounds(edge.b()) {
                return Err(GameError::InvalidLayout(format!(
                    "neutral wall {:?} leaves the map",
                    edge
                )));
            }
        }

        Ok(map)
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.size as i32 && coord.y < self.size as i32
    }

    pub fn tile(&self, coord: GridCoord) -> TileKind {
        self.tiles.get(&coord).copied().unwrap_or_default()
    }

    pub fn set_tile(&mut self, coord: GridCoord, kind: TileKind) {
        if kind == TileKind::Plain {
            self.tiles.remove(&coord);
        } else {
            self.tiles.insert(coord, kind);
        }
    }

    pub fn base_of(&self, side: Side) -> GridCoord {
        match side {
            Side::Player => self.player_base,
            Side::Ai => self.ai_base,
        }
    }

    pub fn is_base(&self, coord: GridCoord) -> bool {
        coord == self.player_base || coord == self.ai_base
    }

    /// In bounds and not a base tile
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.in_bounds(coord) && !self.is_base(coord)
    }

    /// Forest and mine tiles in coordinate order
    pub fn resource_tiles(&self) -> Vec<GridCoord> {
        self.tiles
            .iter()
            .filter(|(_, kind)| kind.is_resource())
            .map(|(coord, _)| *coord)
            .collect()
    }

    pub fn resource_count(&self) -> usize {
        self.tiles.values().filter(|k| k.is_resource()).count()
    }

    /// In-bounds orthogonal neighbours
    pub fn neighbors(&self, coord: GridCoord) -> impl Iterator<Item = GridCoord> + '_ {
        coord.neighbors().into_iter().filter(move |n| self.in_bounds(*n))
    }

    /// All in-bounds tiles within a Chebyshev radius (inclusive)
    pub fn tiles_within(&self, center: GridCoord, radius: u32) -> Vec<GridCoord> {
        let r = radius as i32;
        let mut out = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                let c = center.offset(dx, dy);
                if self.in_bounds(c) {
                    out.push(c);
                }
            }
        }
        out
    }
}

/// External map generator seam
pub trait MapGenerator {
    fn generate(&mut self, size: u32, seed: u64) -> MapLayout;
}

/// Scatters resources symmetrically away from both bases
///
/// The layout is point-symmetric so neither side starts with an advantage.
#[derive(Debug, Clone)]
pub struct ScatterGenerator {
    /// No resources within this Chebyshev distance of a base
    pub safe_radius: u32,
    /// Protected square radius (neutral ring sits on its boundary)
    pub protection_radius: u32,
    /// Tiles per forest (size^2 / this)
    pub forest_density: u32,
    /// Tiles per mine (size^2 / this)
    pub mine_density: u32,
}

impl Default for ScatterGenerator {
    fn default() -> Self {
        Self {
            safe_radius: 3,
            protection_radius: 2,
            forest_density: 25,
            mine_density: 50,
        }
    }
}

impl ScatterGenerator {
    fn mirror(size: u32, c: GridCoord) -> GridCoord {
        let far = size as i32 - 1;
        GridCoord::new(far - c.x, far - c.y)
    }

    /// Gapped ring of edges leaving the protected square around `base`
    fn base_ring(&self, map: &GridMap, base: GridCoord) -> Vec<WallEdge> {
        let r = self.protection_radius;
        let mut ring: Vec<WallEdge> = map
            .tiles_within(base, r)
            .into_iter()
            .filter(|t| t.chebyshev(&base) == r)
            .flat_map(|t| {
                map.neighbors(t)
                    .filter(move |n| n.chebyshev(&base) == r + 1)
                    .filter_map(move |n| WallEdge::new(t, n))
                    .collect::<Vec<_>>()
            })
            .collect();
        ring.sort();
        ring.dedup();
        // Every other edge so the ring slows but never seals the base
        ring.into_iter().step_by(2).collect()
    }
}

impl MapGenerator for ScatterGenerator {
    fn generate(&mut self, size: u32, seed: u64) -> MapLayout {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut layout = MapLayout::empty(size);
        let map = GridMap::new(size);

        let mut candidates: Vec<GridCoord> = map
            .tiles_within(GridCoord::new(0, 0), size)
            .into_iter()
            .filter(|c| {
                c.chebyshev(&layout.player_base) > self.safe_radius
                    && c.chebyshev(&layout.ai_base) > self.safe_radius
            })
            .collect();
        candidates.shuffle(&mut rng);

        let area = size * size;
        let forest_target = (area / self.forest_density.max(1)).max(2) as usize;
        let mine_target = (area / self.mine_density.max(1)).max(2) as usize;

        let mut taken: BTreeSet<GridCoord> = BTreeSet::new();
        let place = |target: usize, out: &mut Vec<GridCoord>, taken: &mut BTreeSet<GridCoord>| {
            for c in candidates.iter() {
                if out.len() >= target {
                    break;
                }
                let mirrored = Self::mirror(size, *c);
                if taken.contains(c) || taken.contains(&mirrored) {
                    continue;
                }
                taken.insert(*c);
                out.push(*c);
                if mirrored != *c {
                    taken.insert(mirrored);
                    out.push(mirrored);
                }
            }
        };
        place(forest_target, &mut layout.forests, &mut taken);
        place(mine_target, &mut layout.mines, &mut taken);

        let mut walls: BTreeSet<WallEdge> = BTreeSet::new();
        walls.extend(self.base_ring(&map, layout.player_base));
        walls.extend(self.base_ring(&map, layout.ai_base));

        for tile in layout.forests.iter().chain(layout.mines.iter()) {
            let mut edges: Vec<WallEdge> = map
                .neighbors(*tile)
                .filter_map(|n| WallEdge::new(*tile, n))
                .collect();
            edges.shuffle(&mut rng);
            let keep = rng.gen_range(1..=2usize).min(edges.len());
            walls.extend(edges.into_iter().take(keep));
        }

        layout.neutral_walls = walls.into_iter().collect();
        layout
    }
}
