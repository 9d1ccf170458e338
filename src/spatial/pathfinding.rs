//! Breadth-first pathfinding over the square grid
//!
//! Optionally treats walls as blocking and friendly units as obstacles.
//! Searches are capped so a sealed-off goal costs a bounded amount of work.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use crate::spatial::grid::GridCoord;
use crate::spatial::map::GridMap;
use crate::walls::edge::WallEdge;
use crate::walls::store::WallStore;

/// Traversal constraints for a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOptions {
    /// Never cross an edge that holds a wall
    pub respect_walls: bool,
    /// Never pass through a tile holding a same-side unit
    pub avoid_friendly_units: bool,
    /// Maximum node expansions
    pub budget: usize,
}

impl PathOptions {
    /// Wall-respecting, friend-avoiding search
    pub fn new(budget: usize) -> Self {
        Self {
            respect_walls: true,
            avoid_friendly_units: true,
            budget,
        }
    }

    /// Allow crossing walls (used to plan a breach)
    pub fn ignoring_walls(mut self) -> Self {
        self.respect_walls = false;
        self
    }

    /// Allow walking through friendly units
    pub fn through_friends(mut self) -> Self {
        self.avoid_friendly_units = false;
        self
    }
}

/// Result of a bounded search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    Found(Vec<GridCoord>),
    NoPath,
    BudgetExhausted,
}

impl PathOutcome {
    pub fn into_path(self) -> Option<Vec<GridCoord>> {
        match self {
            PathOutcome::Found(path) => Some(path),
            PathOutcome::NoPath | PathOutcome::BudgetExhausted => None,
        }
    }
}

/// Bounded BFS from `start` to `goal`
///
/// The start and goal tiles are exempt from the friendly-unit rule so a unit
/// can path to an ally it wants to merge with. Base tiles are only entered
/// when they are the goal.
pub fn search(
    map: &GridMap,
    walls: &WallStore,
    friendly: &AHashSet<GridCoord>,
    start: GridCoord,
    goal: GridCoord,
    options: PathOptions,
) -> PathOutcome {
    if start == goal {
        return PathOutcome::Found(vec![start]);
    }
    if !map.in_bounds(goal) {
        return PathOutcome::NoPath;
    }

    let mut came_from: AHashMap<GridCoord, GridCoord> = AHashMap::new();
    let mut visited: AHashSet<GridCoord> = AHashSet::from_iter([start]);
    let mut frontier = VecDeque::from([start]);
    let mut expansions = 0usize;

    while let Some(current) = frontier.pop_front() {
        expansions += 1;
        if expansions > options.budget {
            return PathOutcome::BudgetExhausted;
        }

        for neighbor in current.neighbors() {
            if visited.contains(&neighbor) || !map.in_bounds(neighbor) {
                continue;
            }
            if neighbor != goal {
                if map.is_base(neighbor) {
                    continue;
                }
                if options.avoid_friendly_units && friendly.contains(&neighbor) {
                    continue;
                }
            }
            if options.respect_walls && walls.blocks(current, neighbor) {
                continue;
            }

            visited.insert(neighbor);
            came_from.insert(neighbor, current);

            if neighbor == goal {
                return PathOutcome::Found(reconstruct_path(&came_from, goal));
            }
            frontier.push_back(neighbor);
        }
    }

    PathOutcome::NoPath
}

/// Path from `start` to `goal` inclusive, or None
pub fn find_path(
    map: &GridMap,
    walls: &WallStore,
    friendly: &AHashSet<GridCoord>,
    start: GridCoord,
    goal: GridCoord,
    options: PathOptions,
) -> Option<Vec<GridCoord>> {
    match search(map, walls, friendly, start, goal, options) {
        PathOutcome::BudgetExhausted => {
            tracing::warn!(
                ?start,
                ?goal,
                budget = options.budget,
                "path search exhausted its expansion budget"
            );
            None
        }
        outcome => outcome.into_path(),
    }
}

/// Reconstruct path from came_from map
fn reconstruct_path(
    came_from: &AHashMap<GridCoord, GridCoord>,
    mut current: GridCoord,
) -> Vec<GridCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// First walled edge crossed along a path, with the index of the step before it
pub fn first_wall_on_path(walls: &WallStore, path: &[GridCoord]) -> Option<(usize, WallEdge)> {
    path.windows(2).enumerate().find_map(|(i, step)| {
        let edge = WallEdge::new(step[0], step[1])?;
        walls.has_wall(&edge).then_some((i, edge))
    })
}

/// Tiles one legal step away: walkable, unwalled, unoccupied
pub fn reachable_steps(
    map: &GridMap,
    walls: &WallStore,
    occupied: &AHashSet<GridCoord>,
    from: GridCoord,
) -> Vec<GridCoord> {
    map.neighbors(from)
        .filter(|n| map.is_walkable(*n))
        .filter(|n| !occupied.contains(n))
        .filter(|n| !walls.blocks(from, *n))
        .collect()
}
