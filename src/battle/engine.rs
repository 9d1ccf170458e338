//! Game engine: the single owner of units, walls, resources and turn state
//!
//! Every mutation enters through a validated [`Intent`]. Handlers check all
//! preconditions before touching state, so a rejected intent leaves the game
//! exactly as it was.

use std::collections::BTreeMap;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::ai::commander::AiCommander;
use crate::battle::ai::personality::AiPersonality;
use crate::battle::events::{Equipment, EventLog, GameEvent, GameEventKind};
use crate::battle::intents::Intent;
use crate::battle::record::{MatchRecord, VictoryKind};
use crate::battle::units::Unit;
use crate::combat::dice::{Dice, SeededDice};
use crate::combat::merge::merge;
use crate::combat::resolution::{base_damage, defense_bonus, resolve_attack, wall_damage};
use crate::combat::tiers::{is_threshold_cost, tier_ceiling};
use crate::core::config::{GameConfig, MatchSettings};
use crate::core::error::{Rejection, Result};
use crate::core::types::{Mood, Side, Turn, UnitId, WallOwner};
use crate::economy::{convert_surplus_wood, highest_affordable_cost, wood_buffer, Resources};
use crate::spatial::grid::GridCoord;
use crate::spatial::map::{GridMap, MapGenerator, MapLayout, ScatterGenerator, TileKind};
use crate::spatial::visibility::{vision_radius, SideVisibility};
use crate::walls::edge::WallEdge;
use crate::walls::store::{WallHit, WallRules, WallStore};

/// Point values of the human side's starting army
pub const PLAYER_STARTING_ARMY: &[i32] = &[2, 2, 1];

/// Outcome type of intent handlers
pub type IntentResult<T> = std::result::Result<T, Rejection>;

/// Whose move it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    PlayerPhase,
    AiPhase,
    GameOver,
}

impl Phase {
    pub fn acting_side(&self) -> Option<Side> {
        match self {
            Phase::PlayerPhase => Some(Side::Player),
            Phase::AiPhase => Some(Side::Ai),
            Phase::GameOver => None,
        }
    }

    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Player => Phase::PlayerPhase,
            Side::Ai => Phase::AiPhase,
        }
    }
}

/// A forge, finished once `turns_left` reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forge {
    pub tile: GridCoord,
    pub owner: Side,
    pub turns_left: u32,
}

impl Forge {
    pub fn is_complete(&self) -> bool {
        self.turns_left == 0
    }
}

/// Per-side mutable state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideState {
    pub resources: Resources,
    pub base_hp: i32,
    pub max_base_hp: i32,
    pub visibility: SideVisibility,
    /// Consecutive completed turns holding every resource tile
    pub monopoly_streak: u32,
}

impl SideState {
    fn new(reserve: i32, base_hp: i32) -> Self {
        Self {
            resources: Resources::new(0, 0, reserve),
            base_hp,
            max_base_hp: base_hp,
            visibility: SideVisibility::new(),
            monopoly_streak: 0,
        }
    }
}

/// The simulation core
pub struct GameEngine {
    pub(crate) config: GameConfig,
    pub(crate) settings: MatchSettings,
    pub(crate) layout: MapLayout,
    pub(crate) map: GridMap,
    pub(crate) walls: WallStore,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) occupancy: BTreeMap<GridCoord, UnitId>,
    pub(crate) sides: [SideState; 2],
    /// Resource tile -> controlling side (persists after the occupier leaves)
    pub(crate) control: BTreeMap<GridCoord, Side>,
    pub(crate) forges: BTreeMap<GridCoord, Forge>,
    pub(crate) phase: Phase,
    pub(crate) turn: Turn,
    /// Bumped on every reset; stale AI continuations compare against it
    pub(crate) generation: u64,
    pub(crate) next_id: u32,
    pub(crate) mood: Mood,
    pub(crate) dice: Box<dyn Dice + Send>,
    pub(crate) commanders: [AiCommander; 2],
    pub(crate) outcome: Option<MatchRecord>,
}

impl GameEngine {
    /// New match on a generated map
    pub fn new(config: GameConfig, settings: MatchSettings) -> Result<Self> {
        let mut generator = ScatterGenerator::default();
        Self::with_generator(config, settings, &mut generator)
    }

    /// New match on a map from a custom generator
    pub fn with_generator(
        config: GameConfig,
        settings: MatchSettings,
        generator: &mut dyn MapGenerator,
    ) -> Result<Self> {
        settings.validate()?;
        let layout = generator.generate(settings.map_size, settings.seed);
        Self::from_layout(config, settings, layout)
    }

    /// New match on an explicit layout
    pub fn from_layout(
        config: GameConfig,
        mut settings: MatchSettings,
        layout: MapLayout,
    ) -> Result<Self> {
        config.validate()?;
        settings.map_size = layout.size;
        settings.validate()?;

        let map = GridMap::from_layout(&layout)?;
        let hp = config.base_hp;
        let commanders = [
            AiCommander::new(AiPersonality::default()),
            AiCommander::new(AiPersonality::for_difficulty(settings.difficulty)),
        ];

        let mut engine = Self {
            walls: WallStore::new(WallRules::from(&config)),
            config,
            settings,
            layout,
            map,
            units: BTreeMap::new(),
            occupancy: BTreeMap::new(),
            sides: [SideState::new(0, hp), SideState::new(0, hp)],
            control: BTreeMap::new(),
            forges: BTreeMap::new(),
            phase: Phase::PlayerPhase,
            turn: 1,
            generation: 0,
            next_id: 1,
            mood: Mood::None,
            dice: Box::new(SeededDice::new(0)),
            commanders,
            outcome: None,
        };
        engine.setup()?;
        Ok(engine)
    }

    /// Replace the dice (scripted rolls for tests and replays)
    pub fn with_dice(mut self, dice: impl Dice + Send + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    /// Rebuild the starting position on the same map
    ///
    /// Any AI turn begun before the reset becomes stale.
    pub fn reset(&mut self) -> Result<()> {
        self.generation += 1;
        self.setup()?;
        tracing::info!(generation = self.generation, "game reset");
        Ok(())
    }

    /// Start over with new settings and a freshly generated map
    pub fn reset_with_settings(&mut self, settings: MatchSettings) -> Result<()> {
        settings.validate()?;
        let mut generator = ScatterGenerator::default();
        self.layout = generator.generate(settings.map_size, settings.seed);
        self.commanders[Side::Ai.index()] =
            AiCommander::new(AiPersonality::for_difficulty(settings.difficulty));
        self.settings = settings;
        self.reset()
    }

    fn setup(&mut self) -> Result<()> {
        self.map = GridMap::from_layout(&self.layout)?;
        self.walls = WallStore::new(WallRules::from(&self.config));
        self.walls.place_neutral(&self.layout.neutral_walls);

        self.units.clear();
        self.occupancy.clear();
        self.control.clear();
        self.forges.clear();

        let hp = if self.settings.sandbox {
            self.config.sandbox_base_hp
        } else {
            self.config.base_hp
        };
        let (player_reserve, ai_reserve) = self.settings.difficulty.starting_reserves();
        self.sides = [SideState::new(player_reserve, hp), SideState::new(ai_reserve, hp)];

        self.phase = Phase::PlayerPhase;
        self.turn = 1;
        self.next_id = 1;
        self.mood = Mood::None;
        self.outcome = None;
        self.dice = Box::new(SeededDice::new(self.settings.seed));

        let mut log = EventLog::new();
        let armies = [
            (Side::Player, PLAYER_STARTING_ARMY),
            (Side::Ai, self.settings.difficulty.ai_starting_army()),
        ];
        for (side, army) in armies {
            for &points in army {
                let Some(tile) = self.spawn_tiles(side).first().copied() else {
                    tracing::warn!(?side, "no room left to place the starting army");
                    break;
                };
                self.spawn_unit(side, tile, points, false, &mut log);
            }
        }

        self.refresh_visibility();
        tracing::info!(
            size = self.map.size,
            difficulty = ?self.settings.difficulty,
            sandbox = self.settings.sandbox,
            units = self.units.len(),
            walls = self.walls.len(),
            "match ready"
        );
        Ok(())
    }

    // ===== READ ACCESS =====

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn walls(&self) -> &WallStore {
        &self.walls
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Final record, available once the game is over
    pub fn outcome(&self) -> Option<&MatchRecord> {
        self.outcome.as_ref()
    }

    pub fn acting_side(&self) -> Option<Side> {
        self.phase.acting_side()
    }

    /// All units in id order
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn units_of(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.side == side)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_at(&self, tile: GridCoord) -> Option<&Unit> {
        self.occupancy.get(&tile).and_then(|id| self.units.get(id))
    }

    pub fn is_occupied(&self, tile: GridCoord) -> bool {
        self.occupancy.contains_key(&tile)
    }

    pub fn occupied_tiles(&self) -> AHashSet<GridCoord> {
        self.occupancy.keys().copied().collect()
    }

    pub fn side_state(&self, side: Side) -> &SideState {
        &self.sides[side.index()]
    }

    pub fn resources(&self, side: Side) -> Resources {
        self.sides[side.index()].resources
    }

    pub fn base_hp(&self, side: Side) -> i32 {
        self.sides[side.index()].base_hp
    }

    pub fn visibility(&self, side: Side) -> &SideVisibility {
        &self.sides[side.index()].visibility
    }

    pub fn controller(&self, tile: GridCoord) -> Option<Side> {
        self.control.get(&tile).copied()
    }

    pub fn control(&self) -> &BTreeMap<GridCoord, Side> {
        &self.control
    }

    pub fn held_resource_count(&self, side: Side) -> usize {
        self.control.values().filter(|owner| **owner == side).count()
    }

    pub fn forges(&self) -> impl Iterator<Item = &Forge> {
        self.forges.values()
    }

    pub fn forge_at(&self, tile: GridCoord) -> Option<&Forge> {
        self.forges.get(&tile)
    }

    pub fn commander(&self, side: Side) -> &AiCommander {
        &self.commanders[side.index()]
    }

    /// Swap the decision engine personality driving `side`
    pub fn set_personality(&mut self, side: Side, personality: AiPersonality) {
        self.commanders[side.index()] = AiCommander::new(personality);
    }

    /// Free walkable tiles in a side's deployment zone, nearest the base first
    pub fn spawn_tiles(&self, side: Side) -> Vec<GridCoord> {
        let base = self.map.base_of(side);
        let mut tiles: Vec<GridCoord> = self
            .map
            .tiles_within(base, self.config.base_protection_radius)
            .into_iter()
            .filter(|t| self.map.is_walkable(*t) && !self.occupancy.contains_key(t))
            .collect();
        tiles.sort_by_key(|t| (t.chebyshev(&base), t.manhattan(&base), *t));
        tiles
    }

    // ===== INTENTS =====

    /// Permissive surface: an invalid intent is a silent no-op
    pub fn submit(&mut self, intent: Intent) -> Vec<GameEvent> {
        match self.try_submit(intent) {
            Ok(events) => events,
            Err(rejection) => {
                tracing::debug!(?intent, %rejection, "intent rejected");
                Vec::new()
            }
        }
    }

    /// Validate and execute an intent for the side whose phase it is
    pub fn try_submit(&mut self, intent: Intent) -> IntentResult<Vec<GameEvent>> {
        let side = self.phase.acting_side().ok_or(Rejection::GameOver)?;
        let mut log = EventLog::new();

        match intent {
            Intent::MoveTo { unit, to } => self.move_to(side, unit, to, &mut log)?,
            Intent::AttackWall { unit, edge } => self.attack_wall(side, unit, edge, &mut log)?,
            Intent::BuildWall { unit, edge } => self.build_wall(side, unit, edge, &mut log)?,
            Intent::DemolishWall { unit, edge } => {
                self.demolish_wall(side, unit, edge, &mut log)?
            }
            Intent::AttackBase { unit } => self.attack_base(side, unit, &mut log)?,
            Intent::Deploy { tile, points } => self.deploy(side, tile, points, &mut log)?,
            Intent::BuildForge { unit, tile } => self.build_forge(side, unit, tile, &mut log)?,
            Intent::Equip { unit, item } => self.equip(side, unit, item, &mut log)?,
            Intent::PlaceUnit {
                side: owner,
                tile,
                points,
            } => self.place_unit(owner, tile, points, &mut log)?,
            Intent::ConvertWood => self.convert_wood(side, &mut log)?,
            Intent::EndTurn => {
                self.end_turn(side, &mut log);
                return Ok(log.into_events());
            }
        }

        self.refresh_visibility();
        self.check_annihilation(&mut log);
        Ok(log.into_events())
    }

    /// Own unit, regardless of whether it acted
    fn owned_unit(&self, side: Side, id: UnitId) -> IntentResult<&Unit> {
        let unit = self.units.get(&id).ok_or(Rejection::UnitNotFound(id))?;
        if unit.side != side {
            return Err(Rejection::NotYourUnit(id));
        }
        Ok(unit)
    }

    /// Own unit that still has its action
    fn ready_unit(&self, side: Side, id: UnitId) -> IntentResult<&Unit> {
        let unit = self.owned_unit(side, id)?;
        if unit.has_acted {
            return Err(Rejection::AlreadyActed(id));
        }
        Ok(unit)
    }

    fn mark_acted(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.has_acted = true;
        }
    }

    /// Skip a unit for the rest of the phase
    pub(crate) fn pass_unit(&mut self, id: UnitId) {
        self.mark_acted(id);
    }

    fn move_to(&mut self, side: Side, id: UnitId, to: GridCoord, log: &mut EventLog) -> IntentResult<()> {
        let from = self.ready_unit(side, id)?.position;
        if !self.map.in_bounds(to) {
            return Err(Rejection::OutOfBounds);
        }
        if !from.is_adjacent(&to) {
            return Err(Rejection::NotAdjacent);
        }
        if self.walls.blocks(from, to) {
            return Err(Rejection::Blocked);
        }
        if self.map.is_base(to) {
            if to == self.map.base_of(side.opponent()) {
                return self.attack_base(side, id, log);
            }
            return Err(Rejection::Blocked);
        }

        match self.occupancy.get(&to).copied() {
            Some(other_id) => {
                let other_side = self
                    .units
                    .get(&other_id)
                    .map(|u| u.side)
                    .ok_or(Rejection::UnitNotFound(other_id))?;
                if other_side == side {
                    self.merge_units(id, other_id, log)
                } else {
                    self.attack_unit(id, other_id, log);
                    Ok(())
                }
            }
            None => {
                self.relocate(id, to, log);
                self.mark_acted(id);
                Ok(())
            }
        }
    }

    /// Move a unit one tile and capture whatever it lands on
    fn relocate(&mut self, id: UnitId, to: GridCoord, log: &mut EventLog) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let from = unit.position;
        let side = unit.side;
        unit.step_to(to);
        if self.occupancy.get(&from) == Some(&id) {
            self.occupancy.remove(&from);
        }
        self.occupancy.insert(to, id);
        log.push(
            GameEventKind::UnitMoved { unit: id, from, to },
            format!("Unit {} moved {:?} -> {:?}", id.0, from, to),
            self.turn,
        );
        self.capture(to, side, log);
    }

    fn capture(&mut self, tile: GridCoord, side: Side, log: &mut EventLog) {
        if self.map.tile(tile).is_resource() {
            let previous = self.control.insert(tile, side);
            if let Some(loser) = previous.filter(|owner| *owner != side) {
                // Losing any tile breaks a running monopoly, even if retaken this turn
                self.sides[loser.index()].monopoly_streak = 0;
            }
            if previous != Some(side) {
                log.push(
                    GameEventKind::TileCaptured { tile, side },
                    format!("{:?} captured {:?} at {:?}", side, self.map.tile(tile), tile),
                    self.turn,
                );
            }
        }
        if let Some(forge) = self.forges.get_mut(&tile) {
            if forge.owner != side {
                forge.owner = side;
                log.push(
                    GameEventKind::TileCaptured { tile, side },
                    format!("{:?} captured the forge at {:?}", side, tile),
                    self.turn,
                );
            }
        }
    }

    pub(crate) fn spawn_unit(
        &mut self,
        side: Side,
        tile: GridCoord,
        points: i32,
        has_acted: bool,
        log: &mut EventLog,
    ) -> UnitId {
        let id = UnitId::new(self.next_id);
        self.next_id += 1;
        let mut unit = Unit::new(id, side, tile, points);
        unit.has_acted = has_acted;
        self.units.insert(id, unit);
        self.occupancy.insert(tile, id);
        log.push(
            GameEventKind::UnitSpawned {
                unit: id,
                side,
                tile,
                points,
            },
            format!("{:?} spawned a {}-point unit at {:?}", side, points, tile),
            self.turn,
        );
        self.capture(tile, side, log);
        id
    }

    fn remove_unit(&mut self, id: UnitId, log: &mut EventLog) {
        let Some(unit) = self.units.remove(&id) else {
            return;
        };
        if self.occupancy.get(&unit.position) == Some(&id) {
            self.occupancy.remove(&unit.position);
        }
        log.push(
            GameEventKind::UnitDestroyed { unit: id },
            format!("Unit {} ({:?}) destroyed", id.0, unit.side),
            self.turn,
        );
    }

    fn write_back(&mut self, unit: Unit, destroyed: bool, log: &mut EventLog) {
        if destroyed {
            self.remove_unit(unit.id, log);
        } else {
            self.units.insert(unit.id, unit);
        }
    }

    fn attack_unit(&mut self, attacker_id: UnitId, defender_id: UnitId, log: &mut EventLog) {
        let (Some(mut attacker), Some(mut defender)) = (
            self.units.get(&attacker_id).cloned(),
            self.units.get(&defender_id).cloned(),
        ) else {
            return;
        };

        let bonus = defense_bonus(
            &defender,
            self.units.values(),
            self.config.stationary_defense_turns,
        );
        let report = resolve_attack(
            &mut attacker,
            &mut defender,
            bonus,
            self.config.weapon_power,
            self.dice.as_mut(),
        );
        attacker.has_acted = true;

        tracing::debug!(
            attacker = attacker_id.0,
            defender = defender_id.0,
            outcome = ?report.outcome,
            "attack resolved"
        );
        log.push(
            GameEventKind::AttackResolved { report },
            format!(
                "Unit {} attacked unit {}: {:?}",
                attacker_id.0, defender_id.0, report.outcome
            ),
            self.turn,
        );

        let defender_tile = defender.position;
        self.write_back(defender, report.defender_destroyed, log);
        self.write_back(attacker, report.attacker_destroyed, log);

        // The victor takes the ground
        if report.defender_destroyed && !report.attacker_destroyed {
            self.relocate(attacker_id, defender_tile, log);
        }
    }

    fn merge_units(&mut self, mover_id: UnitId, target_id: UnitId, log: &mut EventLog) -> IntentResult<()> {
        let mover = self
            .units
            .get(&mover_id)
            .cloned()
            .ok_or(Rejection::UnitNotFound(mover_id))?;
        let mut target = self
            .units
            .get(&target_id)
            .cloned()
            .ok_or(Rejection::UnitNotFound(target_id))?;

        let outcome = merge(&mover, &mut target, UnitId::new(self.next_id))?;

        self.units.remove(&mover_id);
        self.occupancy.remove(&mover.position);
        self.units.insert(target_id, target);

        let remainder_id = outcome.remainder.as_ref().map(|r| r.id);
        log.push(
            GameEventKind::UnitsMerged {
                mover: mover_id,
                target: target_id,
                survivor_points: outcome.survivor_points,
                remainder: remainder_id,
            },
            format!(
                "Unit {} merged into unit {} ({} points)",
                mover_id.0, target_id.0, outcome.survivor_points
            ),
            self.turn,
        );

        if let Some(remainder) = outcome.remainder {
            self.next_id += 1;
            let (id, tile, points, side) =
                (remainder.id, remainder.position, remainder.points, remainder.side);
            self.occupancy.insert(tile, id);
            self.units.insert(id, remainder);
            log.push(
                GameEventKind::UnitSpawned {
                    unit: id,
                    side,
                    tile,
                    points,
                },
                format!("Merge overflow left a {}-point unit at {:?}", points, tile),
                self.turn,
            );
        }
        Ok(())
    }

    fn attack_base(&mut self, side: Side, id: UnitId, log: &mut EventLog) -> IntentResult<()> {
        let unit = self.ready_unit(side, id)?;
        let enemy = side.opponent();
        if !unit.position.touches(&self.map.base_of(enemy)) {
            return Err(Rejection::NotAdjacent);
        }
        let damage = base_damage(unit.tier());

        let state = &mut self.sides[enemy.index()];
        state.base_hp -= damage;
        let remaining = state.base_hp;
        self.mark_acted(id);

        log.push(
            GameEventKind::BaseStruck {
                base_owner: enemy,
                damage,
                remaining,
            },
            format!("Unit {} struck the {:?} base for {}", id.0, enemy, damage),
            self.turn,
        );
        Ok(())
    }

    fn attack_wall(&mut self, side: Side, id: UnitId, edge: WallEdge, log: &mut EventLog) -> IntentResult<()> {
        let unit = self.ready_unit(side, id)?;
        if !edge.touches_tile(unit.position) {
            return Err(Rejection::NotAdjacent);
        }
        let damage = wall_damage(unit.tier());
        let wall = self.walls.get(&edge).ok_or(Rejection::NoWall)?;
        if !wall.owner.is_hostile_to(side) {
            return Err(Rejection::Invalid("cannot attack an own wall"));
        }

        self.mark_acted(id);
        match self.walls.damage(&edge, damage, self.turn) {
            Some(WallHit::Damaged { remaining }) => log.push(
                GameEventKind::WallDamaged { edge, remaining },
                format!("Wall {:?} took {} damage ({} left)", edge, damage, remaining),
                self.turn,
            ),
            Some(WallHit::Destroyed) => log.push(
                GameEventKind::WallDestroyed { edge },
                format!("Wall {:?} destroyed", edge),
                self.turn,
            ),
            None => {}
        }
        Ok(())
    }

    fn build_wall(&mut self, side: Side, id: UnitId, edge: WallEdge, log: &mut EventLog) -> IntentResult<()> {
        let unit = self.ready_unit(side, id)?;
        if !edge.touches_tile(unit.position) {
            return Err(Rejection::NotAdjacent);
        }
        self.walls.check_build(&edge, &self.map, self.turn)?;
        let cost = self.config.wall_wood_cost;
        if !self.sides[side.index()].resources.can_afford(cost, 0) {
            return Err(Rejection::InsufficientResources);
        }

        self.sides[side.index()].resources.spend(cost, 0)?;
        self.walls.build(edge, side, &self.map, self.turn)?;
        self.mark_acted(id);
        log.push(
            GameEventKind::WallBuilt { edge, side },
            format!("{:?} built a wall on {:?}", side, edge),
            self.turn,
        );
        Ok(())
    }

    fn demolish_wall(&mut self, side: Side, id: UnitId, edge: WallEdge, log: &mut EventLog) -> IntentResult<()> {
        let unit = self.ready_unit(side, id)?;
        if !edge.touches_tile(unit.position) {
            return Err(Rejection::NotAdjacent);
        }
        let wall = self.walls.get(&edge).ok_or(Rejection::NoWall)?;
        if wall.owner != WallOwner::Side(side) {
            return Err(Rejection::Invalid("only own walls can be demolished"));
        }

        self.walls.destroy(&edge, self.turn);
        self.mark_acted(id);
        log.push(
            GameEventKind::WallDestroyed { edge },
            format!("{:?} demolished its wall on {:?}", side, edge),
            self.turn,
        );
        Ok(())
    }

    fn deploy(
        &mut self,
        side: Side,
        tile: Option<GridCoord>,
        points: Option<i32>,
        log: &mut EventLog,
    ) -> IntentResult<()> {
        let reserve = self.sides[side.index()].resources.reserve;
        let cost = points.unwrap_or_else(|| highest_affordable_cost(reserve));
        if cost <= 0 || reserve < cost {
            return Err(Rejection::InsufficientResources);
        }
        if !is_threshold_cost(cost) {
            return Err(Rejection::Invalid("deploy cost must be a tier threshold"));
        }

        let zone = self.spawn_tiles(side);
        let tile = match tile {
            Some(requested) if zone.contains(&requested) => requested,
            Some(_) => return Err(Rejection::NoSpawnTile),
            None => zone.first().copied().ok_or(Rejection::NoSpawnTile)?,
        };

        self.sides[side.index()].resources.spend_reserve(cost)?;
        self.spawn_unit(side, tile, cost, true, log);
        Ok(())
    }

    fn build_forge(&mut self, side: Side, id: UnitId, tile: GridCoord, log: &mut EventLog) -> IntentResult<()> {
        let unit = self.ready_unit(side, id)?;
        if !self.map.in_bounds(tile) {
            return Err(Rejection::OutOfBounds);
        }
        if !unit.position.is_adjacent(&tile) {
            return Err(Rejection::NotAdjacent);
        }
        if self.map.tile(tile) != TileKind::Plain || self.map.is_base(tile) {
            return Err(Rejection::Invalid("forges need a plain tile"));
        }
        if self.forges.contains_key(&tile) || self.occupancy.contains_key(&tile) {
            return Err(Rejection::Blocked);
        }

        let (wood, iron) = (self.config.forge_wood_cost, self.config.forge_iron_cost);
        self.sides[side.index()].resources.spend(wood, iron)?;
        self.forges.insert(
            tile,
            Forge {
                tile,
                owner: side,
                turns_left: self.config.forge_build_turns,
            },
        );
        self.mark_acted(id);
        log.push(
            GameEventKind::ForgeStarted { tile, side },
            format!("{:?} started a forge at {:?}", side, tile),
            self.turn,
        );
        Ok(())
    }

    fn equip(&mut self, side: Side, id: UnitId, item: Equipment, log: &mut EventLog) -> IntentResult<()> {
        let unit = self.owned_unit(side, id)?;
        if unit.tier() < self.config.equip_min_tier {
            return Err(Rejection::Invalid("unit tier too low for equipment"));
        }
        let on_own_forge = self
            .forges
            .get(&unit.position)
            .is_some_and(|f| f.owner == side && f.is_complete());
        if !on_own_forge {
            return Err(Rejection::Invalid("unit must stand on a finished own forge"));
        }
        let (already, cost) = match item {
            Equipment::Weapon => (unit.has_weapon, self.config.weapon_iron_cost),
            Equipment::Armor => (unit.has_armor, self.config.armor_iron_cost),
        };
        if already {
            return Err(Rejection::Invalid("unit already carries that equipment"));
        }

        self.sides[side.index()].resources.spend(0, cost)?;
        let armor_hp = self.config.armor_hp;
        if let Some(unit) = self.units.get_mut(&id) {
            match item {
                Equipment::Weapon => unit.has_weapon = true,
                Equipment::Armor => {
                    unit.has_armor = true;
                    unit.armor_hp = armor_hp;
                }
            }
        }
        log.push(
            GameEventKind::Equipped { unit: id, item },
            format!("Unit {} equipped {:?}", id.0, item),
            self.turn,
        );
        Ok(())
    }

    fn place_unit(&mut self, side: Side, tile: GridCoord, points: i32, log: &mut EventLog) -> IntentResult<()> {
        if !self.settings.sandbox {
            return Err(Rejection::NotSandbox);
        }
        if !self.map.in_bounds(tile) {
            return Err(Rejection::OutOfBounds);
        }
        if !self.map.is_walkable(tile) || self.occupancy.contains_key(&tile) {
            return Err(Rejection::Blocked);
        }
        if points <= 0 || points > tier_ceiling(4) {
            return Err(Rejection::Invalid("points must be between 1 and 500"));
        }
        self.spawn_unit(side, tile, points, false, log);
        Ok(())
    }

    fn convert_wood(&mut self, side: Side, log: &mut EventLog) -> IntentResult<()> {
        let state = &mut self.sides[side.index()];
        let buffer = wood_buffer(state.base_hp, state.max_base_hp, &self.config);
        let gained = convert_surplus_wood(
            &mut state.resources,
            buffer,
            &self.config,
            self.config.free_action_cap,
        );
        if gained == 0 {
            return Err(Rejection::InsufficientResources);
        }
        log.push(
            GameEventKind::WoodConverted {
                side,
                reserve_gained: gained,
            },
            format!("{:?} converted wood into reserve", side),
            self.turn,
        );
        Ok(())
    }

    // ===== DERIVED STATE =====

    pub(crate) fn refresh_visibility(&mut self) {
        for side in Side::ALL {
            let sources: Vec<(GridCoord, u32)> = self
                .units
                .values()
                .filter(|u| u.side == side)
                .map(|u| (u.position, vision_radius(u.tier(), &self.config)))
                .collect();
            let base = self.map.base_of(side);
            self.sides[side.index()].visibility.recompute(
                &self.map,
                base,
                self.config.base_vision,
                sources,
            );
        }
    }

    pub(crate) fn check_annihilation(&mut self, log: &mut EventLog) {
        if self.is_game_over() {
            return;
        }
        for side in Side::ALL {
            if self.sides[side.index()].base_hp <= 0 {
                self.finish(side.opponent(), VictoryKind::Annihilation, log);
                return;
            }
        }
    }

    pub(crate) fn finish(&mut self, winner: Side, victory: VictoryKind, log: &mut EventLog) {
        self.phase = Phase::GameOver;
        let record = MatchRecord {
            winner,
            victory,
            turns_played: self.turn,
            resource_tiles_held: self.held_resource_count(winner),
            difficulty: self.settings.difficulty,
            map_size: self.map.size,
        };
        tracing::info!(?winner, ?victory, turn = self.turn, "game over");
        log.push(
            GameEventKind::GameOver { winner, victory },
            format!("{:?} wins by {:?}", winner, victory),
            self.turn,
        );
        self.outcome = Some(record);
    }
}
