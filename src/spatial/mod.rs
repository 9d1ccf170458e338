//! Spatial layer: grid coordinates, the static map, fog of war, and paths

pub mod grid;
pub mod map;
pub mod pathfinding;
pub mod visibility;

pub use grid::GridCoord;
pub use map::{GridMap, MapGenerator, MapLayout, ScatterGenerator, TileKind};
pub use pathfinding::{find_path, first_wall_on_path, reachable_steps, PathOptions, PathOutcome};
pub use visibility::{vision_radius, SideVisibility};
