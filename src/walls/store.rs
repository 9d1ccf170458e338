//! Wall store: edge-keyed wall records, formations, and rebuild cooldowns
//!
//! Walls of the same (non-neutral) owner that share a tile form a formation.
//! Every member of a formation of k walls gets `base + k * bonus` max health,
//! so long connected lines are much harder to breach than isolated posts.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::config::GameConfig;
use crate::core::error::Rejection;
use crate::core::types::{Side, Turn, WallOwner};
use crate::spatial::grid::GridCoord;
use crate::spatial::map::GridMap;
use crate::walls::edge::WallEdge;

/// A single wall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    pub edge: WallEdge,
    pub owner: WallOwner,
    pub health: i32,
    pub max_health: i32,
    pub formation_id: u32,
    pub formation_size: u32,
    pub bonus_hp: i32,
}

impl Wall {
    fn new(edge: WallEdge, owner: WallOwner, health: i32) -> Self {
        Self {
            edge,
            owner,
            health,
            max_health: health,
            formation_id: 0,
            formation_size: 1,
            bonus_hp: 0,
        }
    }
}

/// Result of damaging a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallHit {
    Damaged { remaining: i32 },
    Destroyed,
}

/// Rule values the store enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallRules {
    pub base_health: i32,
    pub bonus_per_member: i32,
    pub cooldown_turns: u32,
    pub protection_radius: u32,
    pub flood_fill_cap: usize,
}

impl From<&GameConfig> for WallRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            base_health: config.wall_base_health,
            bonus_per_member: config.wall_bonus_per_member,
            cooldown_turns: config.wall_rebuild_cooldown,
            protection_radius: config.base_protection_radius,
            flood_fill_cap: config.flood_fill_cap,
        }
    }
}

impl Default for WallRules {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

/// All walls on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallStore {
    walls: BTreeMap<WallEdge, Wall>,
    /// Turn each edge's wall was destroyed
    destroyed_at: BTreeMap<WallEdge, Turn>,
    rules: WallRules,
}

impl WallStore {
    pub fn new(rules: WallRules) -> Self {
        Self {
            walls: BTreeMap::new(),
            destroyed_at: BTreeMap::new(),
            rules,
        }
    }

    pub fn rules(&self) -> &WallRules {
        &self.rules
    }

    pub fn get(&self, edge: &WallEdge) -> Option<&Wall> {
        self.walls.get(edge)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wall> {
        self.walls.values()
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    pub fn has_wall(&self, edge: &WallEdge) -> bool {
        self.walls.contains_key(edge)
    }

    /// Is the step from `from` to `to` blocked by a wall?
    pub fn blocks(&self, from: GridCoord, to: GridCoord) -> bool {
        WallEdge::new(from, to).is_some_and(|edge| self.walls.contains_key(&edge))
    }

    /// Walls on the edges of a tile
    pub fn walls_around(&self, tile: GridCoord) -> Vec<&Wall> {
        WallEdge::around(tile)
            .iter()
            .filter_map(|edge| self.walls.get(edge))
            .collect()
    }

    pub fn is_cooling_down(&self, edge: &WallEdge, turn: Turn) -> bool {
        self.cooldown_remaining(edge, turn).is_some()
    }

    /// Turns left before the edge accepts a wall again
    pub fn cooldown_remaining(&self, edge: &WallEdge, turn: Turn) -> Option<u32> {
        let destroyed = *self.destroyed_at.get(edge)?;
        let ready_at = destroyed + self.rules.cooldown_turns;
        (turn < ready_at).then(|| ready_at - turn)
    }

    /// Either side of the edge lies within the protected square of a base
    pub fn is_protected(&self, edge: &WallEdge, map: &GridMap) -> bool {
        let radius = self.rules.protection_radius;
        edge.tiles().iter().any(|tile| {
            tile.chebyshev(&map.player_base) <= radius || tile.chebyshev(&map.ai_base) <= radius
        })
    }

    /// Rule checks for a side building on `edge` (resources are checked by the caller)
    pub fn check_build(
        &self,
        edge: &WallEdge,
        map: &GridMap,
        turn: Turn,
    ) -> Result<(), Rejection> {
        if !map.in_bounds(edge.a()) || !map.in_bounds(edge.b()) {
            return Err(Rejection::OutOfBounds);
        }
        if self.has_wall(edge) {
            return Err(Rejection::EdgeOccupied);
        }
        if self.is_protected(edge, map) {
            return Err(Rejection::ProtectedEdge);
        }
        if self.is_cooling_down(edge, turn) {
            return Err(Rejection::EdgeCoolingDown);
        }
        Ok(())
    }

    /// Build a wall for `side` and regroup formations
    pub fn build(
        &mut self,
        edge: WallEdge,
        side: Side,
        map: &GridMap,
        turn: Turn,
    ) -> Result<&Wall, Rejection> {
        self.check_build(&edge, map, turn)?;
        self.walls.insert(
            edge,
            Wall::new(edge, WallOwner::Side(side), self.rules.base_health),
        );
        self.recompute_formations();
        self.walls.get(&edge).ok_or(Rejection::NoWall)
    }

    /// Map-initialisation walls; never subject to build rules
    pub fn place_neutral(&mut self, edges: &[WallEdge]) {
        for edge in edges {
            self.walls
                .entry(*edge)
                .or_insert_with(|| Wall::new(*edge, WallOwner::Neutral, self.rules.base_health));
        }
        self.recompute_formations();
    }

    /// Apply damage; the wall is destroyed at zero health
    pub fn damage(&mut self, edge: &WallEdge, amount: i32, turn: Turn) -> Option<WallHit> {
        let wall = self.walls.get_mut(edge)?;
        wall.health -= amount.max(0);
        if wall.health > 0 {
            return Some(WallHit::Damaged {
                remaining: wall.health,
            });
        }
        self.destroy(edge, turn);
        Some(WallHit::Destroyed)
    }

    /// Remove a wall, start the edge cooldown, and regroup formations
    pub fn destroy(&mut self, edge: &WallEdge, turn: Turn) -> Option<Wall> {
        let wall = self.walls.remove(edge)?;
        self.destroyed_at.insert(*edge, turn);
        self.recompute_formations();
        Some(wall)
    }

    /// Forget cooldowns that have run out
    pub fn prune_cooldowns(&mut self, turn: Turn) {
        let cooldown = self.rules.cooldown_turns;
        self.destroyed_at.retain(|_, destroyed| turn < *destroyed + cooldown);
    }

    /// Flood-fill same-owner walls into formations and rescale their health
    pub fn recompute_formations(&mut self) {
        // tile -> walls touching it
        let mut by_tile: BTreeMap<GridCoord, Vec<WallEdge>> = BTreeMap::new();
        for edge in self.walls.keys() {
            for tile in edge.tiles() {
                by_tile.entry(tile).or_default().push(*edge);
            }
        }

        let mut assignment: BTreeMap<WallEdge, (u32, u32)> = BTreeMap::new();
        let mut next_id = 1u32;
        let mut visits = 0usize;

        'components: for (edge, wall) in &self.walls {
            if assignment.contains_key(edge) {
                continue;
            }

            if wall.owner.is_neutral() {
                assignment.insert(*edge, (next_id, 1));
                next_id += 1;
                continue;
            }

            let mut members = vec![*edge];
            let mut queue = VecDeque::from([*edge]);
            let mut seen = std::collections::BTreeSet::from([*edge]);

            while let Some(current) = queue.pop_front() {
                visits += 1;
                if visits > self.rules.flood_fill_cap {
                    tracing::warn!(
                        cap = self.rules.flood_fill_cap,
                        "formation flood fill hit its iteration cap; keeping previous grouping"
                    );
                    break 'components;
                }

                for tile in current.tiles() {
                    let Some(touching) = by_tile.get(&tile) else {
                        continue;
                    };
                    for next in touching {
                        if seen.contains(next) {
                            continue;
                        }
                        let same_owner = self
                            .walls
                            .get(next)
                            .is_some_and(|w| w.owner == wall.owner);
                        if same_owner {
                            seen.insert(*next);
                            members.push(*next);
                            queue.push_back(*next);
                        }
                    }
                }
            }

            let size = members.len() as u32;
            for member in members {
                assignment.insert(member, (next_id, size));
            }
            next_id += 1;
        }

        let rules = self.rules;
        for (edge, wall) in self.walls.iter_mut() {
            let Some(&(formation_id, size)) = assignment.get(edge) else {
                continue;
            };
            let bonus = if wall.owner.is_neutral() {
                0
            } else {
                size as i32 * rules.bonus_per_member
            };
            let new_max = rules.base_health + bonus;
            let delta = new_max - wall.max_health;

            if delta > 0 {
                wall.health += delta;
            } else {
                wall.health = wall.health.min(new_max);
            }

            wall.formation_id = formation_id;
            wall.formation_size = if wall.owner.is_neutral() { 1 } else { size };
            wall.bonus_hp = bonus;
            wall.max_health = new_max;
        }
    }
}

impl Default for WallStore {
    fn default() -> Self {
        Self::new(WallRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(ax: i32, ay: i32, bx: i32, by: i32) -> WallEdge {
        WallEdge::new(GridCoord::new(ax, ay), GridCoord::new(bx, by)).unwrap()
    }

    fn open_map() -> GridMap {
        GridMap::new(20)
    }

    #[test]
    fn test_single_wall_gets_one_member_bonus() {
        let mut store = WallStore::default();
        let map = open_map();
        let wall = store.build(edge(8, 8, 9, 8), Side::Player, &map, 0).unwrap();
        assert_eq!(wall.formation_size, 1);
        assert_eq!(wall.max_health, 120);
        assert_eq!(wall.health, 120);
    }

    #[test]
    fn test_connected_walls_share_formation() {
        let mut store = WallStore::default();
        let map = open_map();
        // Three walls all touching tile (8,8)
        store.build(edge(8, 8, 9, 8), Side::Player, &map, 0).unwrap();
        store.build(edge(8, 8, 8, 9), Side::Player, &map, 0).unwrap();
        store.build(edge(8, 8, 7, 8), Side::Player, &map, 0).unwrap();

        let ids: Vec<u32> = store.iter().map(|w| w.formation_id).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        for wall in store.iter() {
            assert_eq!(wall.formation_size, 3);
            assert_eq!(wall.max_health, 160);
            assert_eq!(wall.bonus_hp, 60);
        }
    }

    #[test]
    fn test_different_owners_do_not_group() {
        let mut store = WallStore::default();
        let map = open_map();
        store.build(edge(8, 8, 9, 8), Side::Player, &map, 0).unwrap();
        store.build(edge(8, 8, 8, 9), Side::Ai, &map, 0).unwrap();
        for wall in store.iter() {
            assert_eq!(wall.formation_size, 1);
        }
    }

    #[test]
    fn test_neutral_walls_stay_singletons() {
        let mut store = WallStore::default();
        store.place_neutral(&[edge(8, 8, 9, 8), edge(8, 8, 8, 9)]);
        for wall in store.iter() {
            assert_eq!(wall.formation_size, 1);
            assert_eq!(wall.max_health, 100);
            assert_eq!(wall.health, 100);
        }
    }

    #[test]
    fn test_build_rejections() {
        let mut store = WallStore::default();
        let map = open_map();
        let e = edge(8, 8, 9, 8);
        store.build(e, Side::Player, &map, 0).unwrap();
        assert_eq!(store.check_build(&e, &map, 0), Err(Rejection::EdgeOccupied));

        // Next to the player base at (0, 19)
        let near_base = edge(1, 18, 2, 18);
        assert_eq!(
            store.check_build(&near_base, &map, 0),
            Err(Rejection::ProtectedEdge)
        );

        let off_map = edge(19, 5, 20, 5);
        assert_eq!(store.check_build(&off_map, &map, 0), Err(Rejection::OutOfBounds));
    }

    #[test]
    fn test_cooldown_window_is_exactly_five_turns() {
        let mut store = WallStore::default();
        let map = open_map();
        let e = edge(10, 10, 10, 11);
        store.build(e, Side::Ai, &map, 3).unwrap();
        assert!(store.destroy(&e, 4).is_some());

        for turn in 4..9 {
            assert_eq!(
                store.check_build(&e, &map, turn),
                Err(Rejection::EdgeCoolingDown),
                "turn {turn} should still be cooling down"
            );
        }
        assert!(store.check_build(&e, &map, 9).is_ok());
        assert_eq!(store.cooldown_remaining(&e, 6), Some(3));
    }

    #[test]
    fn test_damage_destroys_and_regroups() {
        let mut store = WallStore::default();
        let map = open_map();
        let e1 = edge(8, 8, 9, 8);
        let e2 = edge(8, 8, 8, 9);
        store.build(e1, Side::Player, &map, 0).unwrap();
        store.build(e2, Side::Player, &map, 0).unwrap();
        assert_eq!(store.get(&e2).unwrap().max_health, 140);

        assert_eq!(store.damage(&e1, 50, 1), Some(WallHit::Damaged { remaining: 90 }));
        assert_eq!(store.damage(&e1, 500, 1), Some(WallHit::Destroyed));
        assert!(!store.has_wall(&e1));

        let survivor = store.get(&e2).unwrap();
        assert_eq!(survivor.formation_size, 1);
        assert_eq!(survivor.max_health, 120);
        // Shrinking clamps to the new max
        assert_eq!(survivor.health, 120);
    }

    #[test]
    fn test_growth_preserves_damage() {
        let mut store = WallStore::default();
        let map = open_map();
        let e1 = edge(8, 8, 9, 8);
        store.build(e1, Side::Player, &map, 0).unwrap();
        store.damage(&e1, 30, 0);
        assert_eq!(store.get(&e1).unwrap().health, 90);

        store.build(edge(8, 8, 8, 9), Side::Player, &map, 0).unwrap();
        // Max grew by 20, damage taken stays 30
        let wall = store.get(&e1).unwrap();
        assert_eq!(wall.max_health, 140);
        assert_eq!(wall.health, 110);
    }

    #[test]
    fn test_blocks_is_symmetric() {
        let mut store = WallStore::default();
        let map = open_map();
        store.build(edge(8, 8, 9, 8), Side::Player, &map, 0).unwrap();
        assert!(store.blocks(GridCoord::new(8, 8), GridCoord::new(9, 8)));
        assert!(store.blocks(GridCoord::new(9, 8), GridCoord::new(8, 8)));
        assert!(!store.blocks(GridCoord::new(8, 8), GridCoord::new(8, 9)));
    }

    #[test]
    fn test_prune_cooldowns() {
        let mut store = WallStore::default();
        let map = open_map();
        let e = edge(10, 10, 10, 11);
        store.build(e, Side::Ai, &map, 0).unwrap();
        store.destroy(&e, 0);
        store.prune_cooldowns(2);
        assert!(store.is_cooling_down(&e, 2));
        store.prune_cooldowns(5);
        assert!(!store.is_cooling_down(&e, 5));
    }
}
