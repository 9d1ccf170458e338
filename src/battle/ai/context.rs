//! AI's filtered view of the game state, plus per-turn working memory
//!
//! Respects fog of war unless the personality ignores it.

use std::collections::BTreeMap;

use ahash::AHashSet;

use crate::battle::ai::personality::AiPersonality;
use crate::battle::engine::GameEngine;
use crate::battle::intents::Intent;
use crate::battle::units::Unit;
use crate::combat::resolution::{defense_bonus, luck_delta};
use crate::core::config::GameConfig;
use crate::core::types::{Side, UnitId, WallOwner};
use crate::economy::resource_share;
use crate::spatial::grid::GridCoord;
use crate::spatial::map::GridMap;
use crate::spatial::pathfinding::{find_path, first_wall_on_path, PathOptions};
use crate::walls::store::WallStore;

/// Pinned per-unit objective, scoped to one AI turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitGoal {
    NoGoal,
    /// Walk to (and take) an enemy-held resource tile
    HuntGoal(GridCoord),
    /// Merge into an ally to reach a stronger tier
    MergeGoal(UnitId),
}

impl UnitGoal {
    pub fn is_pinned(&self) -> bool {
        !matches!(self, UnitGoal::NoGoal)
    }
}

/// Turn-wide postures decided before any unit moves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Posture {
    /// The enemy holds a majority of resource tiles
    pub reclamation: bool,
    /// Our power outweighs theirs enough to commit half the army
    pub siege_mode: bool,
}

/// Working memory for one AI turn
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    /// Tiles some unit is already heading for
    pub claimed_tiles: AHashSet<GridCoord>,
    /// Enemies some unit already attacked or targeted
    pub claimed_enemies: AHashSet<UnitId>,
    /// High-value enemies near our objectives, heaviest first
    pub priority_targets: Vec<UnitId>,
    pub goals: BTreeMap<UnitId, UnitGoal>,
    pub posture: Posture,
    pub blockers_spawned: usize,
}

impl TurnContext {
    pub fn goal_of(&self, unit: UnitId) -> UnitGoal {
        self.goals.get(&unit).copied().unwrap_or(UnitGoal::NoGoal)
    }

    pub fn is_pinned(&self, unit: UnitId) -> bool {
        self.goal_of(unit).is_pinned()
    }
}

/// Read-only decision context for one side
pub struct DecisionContext<'a> {
    pub engine: &'a GameEngine,
    pub side: Side,
    pub personality: &'a AiPersonality,
}

impl<'a> DecisionContext<'a> {
    pub fn new(engine: &'a GameEngine, side: Side, personality: &'a AiPersonality) -> Self {
        Self {
            engine,
            side,
            personality,
        }
    }

    pub fn config(&self) -> &'a GameConfig {
        self.engine.config()
    }

    pub fn map(&self) -> &'a GridMap {
        self.engine.map()
    }

    pub fn walls(&self) -> &'a WallStore {
        self.engine.walls()
    }

    pub fn own_base(&self) -> GridCoord {
        self.map().base_of(self.side)
    }

    pub fn enemy_base(&self) -> GridCoord {
        self.map().base_of(self.side.opponent())
    }

    /// Get all own units
    pub fn own_units(&self) -> Vec<&'a Unit> {
        self.engine.units_of(self.side).collect()
    }

    /// Check if a position is visible
    pub fn is_visible(&self, tile: GridCoord) -> bool {
        self.personality.difficulty.ignores_fog_of_war
            || self.engine.visibility(self.side).is_visible(tile)
    }

    /// Get enemy units that are visible (or all if ignoring fog)
    pub fn visible_enemies(&self) -> Vec<&'a Unit> {
        self.engine
            .units_of(self.side.opponent())
            .filter(|u| self.is_visible(u.position))
            .collect()
    }

    /// Visible enemy standing on `tile`
    pub fn enemy_at(&self, tile: GridCoord) -> Option<&'a Unit> {
        self.engine
            .unit_at(tile)
            .filter(|u| u.side != self.side && self.is_visible(tile))
    }

    /// Visible enemies within `radius` (Manhattan) of `tile`, nearest first
    pub fn threats_near(&self, tile: GridCoord, radius: u32) -> Vec<&'a Unit> {
        let mut threats: Vec<&Unit> = self
            .visible_enemies()
            .into_iter()
            .filter(|u| u.position.manhattan(&tile) <= radius)
            .collect();
        threats.sort_by_key(|u| (u.position.manhattan(&tile), u.id));
        threats
    }

    /// Visible enemies one orthogonal step away with no wall between
    pub fn adjacent_enemies(&self, unit: &Unit) -> Vec<&'a Unit> {
        self.visible_enemies()
            .into_iter()
            .filter(|e| {
                e.position.is_adjacent(&unit.position)
                    && !self.walls().blocks(unit.position, e.position)
            })
            .collect()
    }

    /// Attack power before luck
    pub fn attack_of(&self, unit: &Unit) -> i32 {
        unit.attack_power(self.config().weapon_power)
    }

    /// Attack power after the worst luck swing
    pub fn worst_attack_of(&self, unit: &Unit) -> i32 {
        (self.attack_of(unit) - luck_delta(unit.tier())).max(0)
    }

    /// Defense power including bonuses at the unit's current tile
    pub fn defense_of(&self, unit: &Unit) -> i32 {
        unit.points
            + defense_bonus(
                unit,
                self.engine.units(),
                self.config().stationary_defense_turns,
            )
    }

    /// `attacker` wins against `defender` even on a fumble
    pub fn is_lethal(&self, attacker: &Unit, defender: &Unit) -> bool {
        self.worst_attack_of(attacker) > self.defense_of(defender)
    }

    /// Summed attack power of a side's whole army
    ///
    /// Army strength is known to both commanders (reserve spends and merges
    /// are announced), so fog does not hide it here.
    pub fn side_power(&self, side: Side) -> i32 {
        self.engine
            .units_of(side)
            .map(|u| self.attack_of(u))
            .sum()
    }

    pub fn resource_share_of(&self, side: Side) -> f32 {
        resource_share(
            self.engine.held_resource_count(side),
            self.map().resource_count(),
        )
    }

    /// Is `unit` standing on a resource tile its side controls?
    pub fn holds_resource(&self, unit: &Unit) -> bool {
        self.map().tile(unit.position).is_resource()
            && self.engine.controller(unit.position) == Some(self.side)
    }

    /// Path treating every occupied tile except the endpoints as blocked
    pub fn path_to(&self, from: GridCoord, goal: GridCoord, respect_walls: bool) -> Option<Vec<GridCoord>> {
        let occupied = self.engine.occupied_tiles();
        let mut options = PathOptions::new(self.config().bfs_budget);
        if !respect_walls {
            options = options.ignoring_walls();
        }
        find_path(self.map(), self.walls(), &occupied, from, goal, options)
    }

    /// One step toward `goal`: walk if a clear path exists, otherwise breach
    ///
    /// Breaching attacks the first hostile wall on a wall-ignoring path, or
    /// tears down an own wall in the way.
    pub fn step_toward(&self, unit: &Unit, goal: GridCoord) -> Option<Intent> {
        if unit.position == goal {
            return None;
        }
        if let Some(path) = self.path_to(unit.position, goal, true) {
            return path.get(1).map(|next| Intent::MoveTo {
                unit: unit.id,
                to: *next,
            });
        }

        let path = self.path_to(unit.position, goal, false)?;
        match first_wall_on_path(self.walls(), &path) {
            Some((0, edge)) => {
                let wall = self.walls().get(&edge)?;
                if wall.owner == WallOwner::Side(self.side) {
                    Some(Intent::DemolishWall {
                        unit: unit.id,
                        edge,
                    })
                } else {
                    Some(Intent::AttackWall {
                        unit: unit.id,
                        edge,
                    })
                }
            }
            _ => {
                let next = *path.get(1)?;
                (!self.walls().blocks(unit.position, next)).then_some(Intent::MoveTo {
                    unit: unit.id,
                    to: next,
                })
            }
        }
    }

    /// Plan the turn: postures, priority targets
    pub fn plan(&self) -> TurnContext {
        let thresholds = &self.personality.thresholds;
        let enemy_share = self.resource_share_of(self.side.opponent());
        let own_power = self.side_power(self.side) as f32;
        let enemy_power = self.side_power(self.side.opponent()) as f32;

        let posture = Posture {
            reclamation: enemy_share > thresholds.reclamation_share,
            siege_mode: own_power > enemy_power * thresholds.siege_power_ratio,
        };

        // Tier 2+ enemies within reach of a resource tile or our base
        let mut objectives = self.map().resource_tiles();
        objectives.push(self.own_base());
        let mut priority: Vec<&Unit> = self
            .visible_enemies()
            .into_iter()
            .filter(|e| e.tier() >= 2)
            .filter(|e| objectives.iter().any(|o| o.manhattan(&e.position) <= 2))
            .collect();
        priority.sort_by(|a, b| b.points.cmp(&a.points).then(a.id.cmp(&b.id)));

        tracing::debug!(
            side = ?self.side,
            reclamation = posture.reclamation,
            siege_mode = posture.siege_mode,
            priority = priority.len(),
            "AI turn planned"
        );

        TurnContext {
            posture,
            priority_targets: priority.iter().map(|u| u.id).collect(),
            ..TurnContext::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::events::EventLog;
    use crate::core::config::MatchSettings;
    use crate::spatial::map::MapLayout;
    use crate::walls::edge::WallEdge;

    fn engine() -> GameEngine {
        let mut engine =
            GameEngine::from_layout(GameConfig::default(), MatchSettings::default(), MapLayout::empty(10))
                .unwrap();
        engine.units.clear();
        engine.occupancy.clear();
        engine
    }

    fn place(engine: &mut GameEngine, side: Side, x: i32, y: i32, points: i32) -> UnitId {
        let mut log = EventLog::new();
        let id = engine.spawn_unit(side, GridCoord::new(x, y), points, false, &mut log);
        engine.refresh_visibility();
        id
    }

    #[test]
    fn test_fog_hides_distant_enemies() {
        let mut engine = engine();
        place(&mut engine, Side::Ai, 8, 1, 1);
        place(&mut engine, Side::Player, 3, 3, 2);
        let personality = AiPersonality::default();
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert!(ctx.visible_enemies().is_empty());

        let seer = AiPersonality::for_difficulty(crate::core::types::Difficulty::Nightmare);
        let ctx = DecisionContext::new(&engine, Side::Ai, &seer);
        assert_eq!(ctx.visible_enemies().len(), 1);
    }

    #[test]
    fn test_step_toward_breaches_sealed_goal() {
        let mut engine = engine();
        let id = place(&mut engine, Side::Ai, 5, 5, 2);
        let personality = AiPersonality::default();

        // Seal (5,5) off on all four sides with neutral walls
        let edges = WallEdge::around(GridCoord::new(5, 5));
        engine.walls.place_neutral(&edges);

        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        let unit = engine.unit(id).unwrap();
        match ctx.step_toward(unit, GridCoord::new(5, 1)) {
            Some(Intent::AttackWall { unit: u, edge }) => {
                assert_eq!(u, id);
                assert!(edge.touches_tile(GridCoord::new(5, 5)));
            }
            other => panic!("expected a breach, got {:?}", other),
        }
    }

    #[test]
    fn test_step_toward_walks_open_path() {
        let mut engine = engine();
        let id = place(&mut engine, Side::Ai, 5, 5, 2);
        let personality = AiPersonality::default();
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        let unit = engine.unit(id).unwrap();
        let Some(Intent::MoveTo { to, .. }) = ctx.step_toward(unit, GridCoord::new(5, 2)) else {
            panic!("expected a move");
        };
        assert_eq!(to, GridCoord::new(5, 4));
    }

    #[test]
    fn test_lethality_accounts_for_fumbles() {
        let mut engine = engine();
        let strong = place(&mut engine, Side::Ai, 5, 5, 10);
        let weak = place(&mut engine, Side::Player, 5, 6, 8);
        let personality = AiPersonality::default();
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        let (s, w) = (engine.unit(strong).unwrap(), engine.unit(weak).unwrap());
        // 10 - 2 (tier 2 fumble) = 8, not enough against 8
        assert!(!ctx.is_lethal(s, w));
        assert!(ctx.attack_of(s) > ctx.defense_of(w));
    }

    #[test]
    fn test_plan_weighs_hidden_armies() {
        // Equal starting armies, all out of sight of each other
        let opening =
            GameEngine::from_layout(GameConfig::default(), MatchSettings::default(), MapLayout::empty(10))
                .unwrap();
        let personality = AiPersonality::default();
        let ctx = DecisionContext::new(&opening, Side::Ai, &personality);
        assert!(ctx.visible_enemies().is_empty());
        assert_eq!(ctx.side_power(Side::Ai), ctx.side_power(Side::Player));
        assert!(!ctx.plan().posture.siege_mode);

        let mut engine = engine();
        place(&mut engine, Side::Ai, 8, 1, 25);
        place(&mut engine, Side::Player, 1, 8, 5);
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert!(ctx.visible_enemies().is_empty());
        assert!(ctx.plan().posture.siege_mode);
    }

    #[test]
    fn test_plan_detects_reclamation() {
        let mut layout = MapLayout::empty(10);
        layout.forests.push(GridCoord::new(4, 4));
        let mut engine =
            GameEngine::from_layout(GameConfig::default(), MatchSettings::default(), layout).unwrap();
        engine.control.insert(GridCoord::new(4, 4), Side::Player);
        let personality = AiPersonality::default();
        let plan = DecisionContext::new(&engine, Side::Ai, &personality).plan();
        assert!(plan.posture.reclamation);
    }
}
