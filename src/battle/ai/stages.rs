//! Per-unit decision pipeline
//!
//! Stages run in priority order. The first stage with an opinion decides the
//! unit's action; a unit nobody claims holds (and is passed by the caller).

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::battle::ai::context::{DecisionContext, TurnContext, UnitGoal};
use crate::battle::events::Equipment;
use crate::battle::intents::Intent;
use crate::battle::units::Unit;
use crate::combat::constants::MAX_TIER;
use crate::combat::resolution::wall_damage;
use crate::combat::tiers::tier_ceiling;
use crate::core::types::UnitId;
use crate::spatial::grid::GridCoord;
use crate::spatial::pathfinding::reachable_steps;
use crate::walls::edge::WallEdge;

/// What a stage wants the unit to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Act(Intent),
    /// Stay put and spend the action
    Hold,
}

type Stage = fn(&DecisionContext<'_>, &Unit, &mut TurnContext) -> Option<Decision>;

const PIPELINE: &[(&str, Stage)] = &[
    ("reclamation", reclamation),
    ("base_defense", base_defense),
    ("resource_hold", resource_hold),
    ("siege", siege),
    ("equipment", equipment),
    ("survival", survival),
    ("siege_mode", siege_mode),
    ("objective", objective_capture),
    ("combat", combat),
    ("fortification", fortification),
    ("fallback", fallback),
];

/// Run the pipeline for one unit
pub fn decide(ctx: &DecisionContext, unit: &Unit, turn: &mut TurnContext) -> Decision {
    for (name, stage) in PIPELINE {
        if let Some(decision) = stage(ctx, unit, turn) {
            tracing::debug!(unit = unit.id.0, stage = *name, ?decision, "stage decided");
            return decision;
        }
    }
    Decision::Hold
}

fn act(intent: Option<Intent>) -> Option<Decision> {
    intent.map(Decision::Act)
}

fn move_to(unit: &Unit, to: GridCoord) -> Decision {
    Decision::Act(Intent::MoveTo { unit: unit.id, to })
}

// ===== 1. RECLAMATION =====

/// While the enemy holds most resource tiles, pin units to winning them back
fn reclamation(ctx: &DecisionContext, unit: &Unit, turn: &mut TurnContext) -> Option<Decision> {
    if !turn.posture.reclamation {
        return None;
    }

    let goal = match turn.goals.get(&unit.id) {
        Some(goal) => *goal,
        None => {
            let goal = pick_reclamation_goal(ctx, unit);
            turn.goals.insert(unit.id, goal);
            goal
        }
    };

    match goal {
        UnitGoal::NoGoal => None,
        UnitGoal::HuntGoal(tile) => {
            if ctx.engine.controller(tile) != Some(ctx.side.opponent()) {
                // Retaken or lost to neutrality: goal satisfied
                turn.goals.insert(unit.id, UnitGoal::NoGoal);
                return None;
            }
            // Pinned units only break off against a foe that wins even on bad luck
            survival(ctx, unit, turn).or_else(|| act(ctx.step_toward(unit, tile)))
        }
        UnitGoal::MergeGoal(ally_id) => {
            let ally = ctx.engine.unit(ally_id).filter(|a| a.side == ctx.side && a.tier() == unit.tier());
            let Some(ally) = ally else {
                turn.goals.insert(unit.id, UnitGoal::NoGoal);
                return None;
            };
            survival(ctx, unit, turn).or_else(|| act(ctx.step_toward(unit, ally.position)))
        }
    }
}

/// Hunt the nearest enemy-held tile if strong enough, else merge up toward it
fn pick_reclamation_goal(ctx: &DecisionContext, unit: &Unit) -> UnitGoal {
    let enemy = ctx.side.opponent();
    let mut lost: Vec<GridCoord> = ctx
        .engine
        .control()
        .iter()
        .filter(|(_, side)| **side == enemy)
        .map(|(tile, _)| *tile)
        .collect();
    lost.sort_by_key(|t| (t.manhattan(&unit.position), *t));
    let Some(&target) = lost.first() else {
        return UnitGoal::NoGoal;
    };

    // One tier above whoever sits on it
    let needed = ctx
        .enemy_at(target)
        .map(|occupier| (occupier.tier() + 1).min(MAX_TIER))
        .unwrap_or(1);
    if unit.tier() >= needed {
        return UnitGoal::HuntGoal(target);
    }

    let ceiling = tier_ceiling(unit.tier());
    let partner = ctx
        .own_units()
        .into_iter()
        .filter(|a| a.id != unit.id && a.tier() == unit.tier())
        .filter(|a| a.points + unit.points > ceiling && unit.tier() + 1 >= needed)
        .min_by_key(|a| (a.position.manhattan(&unit.position), a.id));
    match partner {
        Some(ally) => UnitGoal::MergeGoal(ally.id),
        None => UnitGoal::NoGoal,
    }
}

// ===== 2. BASE DEFENSE =====

fn base_defense(ctx: &DecisionContext, unit: &Unit, _turn: &mut TurnContext) -> Option<Decision> {
    let base = ctx.own_base();
    let radii = &ctx.personality.radii;
    if unit.position.manhattan(&base) > radii.defense {
        return None;
    }
    let threats = ctx.threats_near(base, radii.threat);
    let nearest = threats
        .into_iter()
        .min_by_key(|t| (t.position.manhattan(&unit.position), t.id))?;
    act(ctx.step_toward(unit, nearest.position))
}

// ===== 3. RESOURCE HOLD =====

fn resource_hold(ctx: &DecisionContext, unit: &Unit, _turn: &mut TurnContext) -> Option<Decision> {
    if !ctx.holds_resource(unit) || !ctx.adjacent_enemies(unit).is_empty() {
        return None;
    }
    let wood = ctx.engine.resources(ctx.side).wood;
    if wood >= ctx.personality.thresholds.fortify_hold_wood {
        let toward = ctx
            .threats_near(unit.position, ctx.personality.radii.fortify_threat)
            .first()
            .map(|t| t.position)
            .unwrap_or_else(|| ctx.enemy_base());
        if let Some(edge) = best_wall_edge(ctx, unit.position, toward) {
            return Some(Decision::Act(Intent::BuildWall { unit: unit.id, edge }));
        }
    }
    Some(Decision::Hold)
}

/// Buildable edge around `tile` whose midpoint lies closest to `toward`
fn best_wall_edge(ctx: &DecisionContext, tile: GridCoord, toward: GridCoord) -> Option<WallEdge> {
    let turn = ctx.engine.turn();
    WallEdge::around(tile)
        .into_iter()
        .filter(|edge| ctx.walls().check_build(edge, ctx.map(), turn).is_ok())
        .min_by_key(|edge| {
            let (mx, my) = edge.midpoint_x2();
            ((mx - toward.x * 2).abs() + (my - toward.y * 2).abs(), *edge)
        })
}

// ===== 4. SIEGE =====

#[derive(Debug, Clone, Copy)]
struct SiegeOption {
    intent: Intent,
    weight: f32,
    /// Manhattan distance to the enemy base afterwards
    distance: u32,
}

fn siege(ctx: &DecisionContext, unit: &Unit, _turn: &mut TurnContext) -> Option<Decision> {
    let target = ctx.enemy_base();
    let distance = unit.position.manhattan(&target);
    if distance > ctx.personality.radii.siege {
        return None;
    }
    if unit.position.touches(&target) {
        return Some(Decision::Act(Intent::AttackBase { unit: unit.id }));
    }

    let weights = &ctx.personality.siege;
    let breach = breach_toward(ctx, unit, target).map(|(edge, beyond)| SiegeOption {
        intent: Intent::AttackWall { unit: unit.id, edge },
        weight: weights.wall_breach,
        distance: beyond.manhattan(&target),
    });
    let advance = ctx.step_toward(unit, target).map(|intent| SiegeOption {
        distance: match intent {
            Intent::MoveTo { to, .. } => to.manhattan(&target),
            _ => distance,
        },
        intent,
        weight: weights.advance,
    });

    let emergency = unit.tier() >= 3
        || ctx.resource_share_of(ctx.side) >= ctx.personality.thresholds.emergency_control_share;
    if !emergency {
        return act(breach.or(advance).map(|o| o.intent));
    }

    // Plain advance only competes when it gets strictly closer than the breach
    let options = breach.into_iter().chain(advance.filter(|a| match breach {
        Some(b) => a.distance < b.distance,
        None => true,
    }));
    let best = options.max_by_key(|o| OrderedFloat(o.weight / (1.0 + o.distance as f32)))?;
    Some(Decision::Act(best.intent))
}

/// Hostile wall on one of the unit's edges whose far tile is closer to `target`
fn breach_toward(ctx: &DecisionContext, unit: &Unit, target: GridCoord) -> Option<(WallEdge, GridCoord)> {
    let here = unit.position.manhattan(&target);
    ctx.walls()
        .walls_around(unit.position)
        .into_iter()
        .filter(|w| w.owner.is_hostile_to(ctx.side))
        .filter_map(|w| Some((w.edge, w.edge.other_side(unit.position)?)))
        .filter(|(_, beyond)| beyond.manhattan(&target) < here)
        .min_by_key(|(edge, beyond)| (beyond.manhattan(&target), *edge))
}

// ===== 5. EQUIPMENT =====

fn equipment(ctx: &DecisionContext, unit: &Unit, _turn: &mut TurnContext) -> Option<Decision> {
    let config = ctx.config();
    if unit.tier() < config.equip_min_tier || unit.is_fully_equipped() {
        return None;
    }
    let (item, cost) = if !unit.has_weapon {
        (Equipment::Weapon, config.weapon_iron_cost)
    } else {
        (Equipment::Armor, config.armor_iron_cost)
    };
    let iron = ctx.engine.resources(ctx.side).iron;
    if iron < cost {
        return None;
    }

    let on_forge = ctx
        .engine
        .forge_at(unit.position)
        .is_some_and(|f| f.owner == ctx.side && f.is_complete());
    if on_forge {
        return Some(Decision::Act(Intent::Equip { unit: unit.id, item }));
    }

    // A same-tier partner already carrying it gets the iron first
    let partner_has_it = ctx.own_units().into_iter().any(|p| {
        p.id != unit.id
            && p.tier() == unit.tier()
            && match item {
                Equipment::Weapon => p.has_weapon,
                Equipment::Armor => p.has_armor,
            }
    });
    if partner_has_it && iron < ctx.personality.thresholds.wealth_override_iron {
        return None;
    }

    let forge = ctx
        .engine
        .forges()
        .filter(|f| f.owner == ctx.side && f.is_complete())
        .filter(|f| !ctx.engine.is_occupied(f.tile))
        .min_by_key(|f| (f.tile.manhattan(&unit.position), f.tile))?;
    act(ctx.step_toward(unit, forge.tile))
}

// ===== 6. SURVIVAL =====

fn survival(ctx: &DecisionContext, unit: &Unit, turn: &mut TurnContext) -> Option<Decision> {
    let adjacent = ctx.adjacent_enemies(unit);
    let defense = ctx.defense_of(unit);
    let pinned = turn.is_pinned(unit.id);

    let danger = adjacent.iter().any(|enemy| {
        if pinned {
            ctx.worst_attack_of(enemy) > defense
        } else {
            ctx.attack_of(enemy) > defense
        }
    });
    if !danger {
        return None;
    }
    // Fight instead when we can surely win against someone adjacent
    if adjacent.iter().any(|enemy| ctx.is_lethal(unit, enemy)) {
        return None;
    }

    let tile = safest_step(ctx, unit)?;
    tracing::debug!(unit = unit.id.0, ?tile, "retreating");
    Some(move_to(unit, tile))
}

/// Reachable step furthest from every visible enemy, then nearest home
fn safest_step(ctx: &DecisionContext, unit: &Unit) -> Option<GridCoord> {
    let enemies = ctx.visible_enemies();
    let base = ctx.own_base();
    let occupied = ctx.engine.occupied_tiles();
    reachable_steps(ctx.map(), ctx.walls(), &occupied, unit.position)
        .into_iter()
        .max_by_key(|tile| {
            let safety = enemies
                .iter()
                .map(|e| e.position.manhattan(tile))
                .min()
                .unwrap_or(u32::MAX);
            (safety, std::cmp::Reverse(tile.manhattan(&base)), std::cmp::Reverse(*tile))
        })
}

// ===== 7. SIEGE MODE =====

fn siege_mode(ctx: &DecisionContext, unit: &Unit, turn: &mut TurnContext) -> Option<Decision> {
    if !turn.posture.siege_mode || !unit.id.is_even() || ctx.holds_resource(unit) {
        return None;
    }
    let base = ctx.enemy_base();
    if unit.position.touches(&base) {
        return Some(Decision::Act(Intent::AttackBase { unit: unit.id }));
    }
    let to_base = unit.position.manhattan(&base);
    let prey = ctx
        .visible_enemies()
        .into_iter()
        .filter(|e| !turn.claimed_enemies.contains(&e.id))
        .map(|e| (e.position.manhattan(&unit.position), e.id, e.position))
        .min()
        .filter(|(d, _, _)| *d < to_base);
    let Some((_, id, position)) = prey else {
        return act(ctx.step_toward(unit, base));
    };
    let step = ctx.step_toward(unit, position)?;
    turn.claimed_enemies.insert(id);
    Some(Decision::Act(step))
}

// ===== 8. OBJECTIVE CAPTURE =====

fn objective_capture(ctx: &DecisionContext, unit: &Unit, turn: &mut TurnContext) -> Option<Decision> {
    let mut targets: Vec<GridCoord> = ctx
        .map()
        .resource_tiles()
        .into_iter()
        .filter(|t| ctx.engine.controller(*t) != Some(ctx.side))
        .filter(|t| !turn.claimed_tiles.contains(t))
        .filter(|t| match ctx.engine.unit_at(*t) {
            None => true,
            Some(occupier) if occupier.side == ctx.side => false,
            Some(occupier) => {
                !ctx.is_visible(*t) || ctx.attack_of(unit) > ctx.defense_of(occupier)
            }
        })
        .collect();
    targets.sort_by_key(|t| (t.manhattan(&unit.position), *t));

    for target in targets.into_iter().take(3) {
        if let Some(intent) = ctx.step_toward(unit, target) {
            turn.claimed_tiles.insert(target);
            return Some(Decision::Act(intent));
        }
    }
    None
}

// ===== 9. COMBAT =====

fn combat(ctx: &DecisionContext, unit: &Unit, turn: &mut TurnContext) -> Option<Decision> {
    let adjacent = ctx.adjacent_enemies(unit);
    let priority_rank = |id: UnitId| {
        turn.priority_targets
            .iter()
            .position(|p| *p == id)
            .unwrap_or(usize::MAX)
    };
    // Kills first, and an enemy another unit already took is only a last resort
    let preference = |e: &Unit| match (turn.claimed_enemies.contains(&e.id), ctx.is_lethal(unit, e)) {
        (false, true) => 0,
        (false, false) => 1,
        (true, true) => 2,
        (true, false) => 3,
    };
    let target = adjacent
        .iter()
        .min_by_key(|e| (preference(e), ctx.defense_of(e), priority_rank(e.id), e.id))
        .map(|e| (e.id, e.position));
    if let Some((id, position)) = target {
        turn.claimed_enemies.insert(id);
        return Some(move_to(unit, position));
    }

    let edge = best_wall_target(ctx, unit)?;
    Some(Decision::Act(Intent::AttackWall { unit: unit.id, edge }))
}

/// Adjacent hostile wall toward the enemy base, scored by how fast we break it
fn best_wall_target(ctx: &DecisionContext, unit: &Unit) -> Option<WallEdge> {
    let target = ctx.enemy_base();
    let here = unit.position.manhattan(&target);
    let damage = wall_damage(unit.tier()) as f32;
    ctx.walls()
        .walls_around(unit.position)
        .into_iter()
        .filter(|w| w.owner.is_hostile_to(ctx.side))
        .filter(|w| {
            w.edge
                .other_side(unit.position)
                .is_some_and(|beyond| beyond.manhattan(&target) < here)
        })
        .max_by_key(|w| {
            let breach = damage / w.health.max(1) as f32;
            let reinforcement = w.formation_size as f32;
            (OrderedFloat(breach / reinforcement), std::cmp::Reverse(w.edge))
        })
        .map(|w| w.edge)
}

// ===== 10. FORTIFICATION =====

fn fortification(ctx: &DecisionContext, unit: &Unit, _turn: &mut TurnContext) -> Option<Decision> {
    if ctx.engine.resources(ctx.side).wood < ctx.personality.thresholds.fortify_wood {
        return None;
    }
    let near_owned_resource = ctx.map().neighbors(unit.position).any(|t| {
        ctx.map().tile(t).is_resource() && ctx.engine.controller(t) == Some(ctx.side)
    });
    if !near_owned_resource {
        return None;
    }
    let threats = ctx.threats_near(unit.position, ctx.personality.radii.fortify_threat);
    if threats.is_empty() {
        return None;
    }
    let n = threats.len() as i32;
    let centroid = GridCoord::new(
        threats.iter().map(|t| t.position.x).sum::<i32>() / n,
        threats.iter().map(|t| t.position.y).sum::<i32>() / n,
    );
    let edge = best_wall_edge(ctx, unit.position, centroid)?;
    Some(Decision::Act(Intent::BuildWall { unit: unit.id, edge }))
}

// ===== 11. FALLBACK =====

fn fallback(ctx: &DecisionContext, unit: &Unit, _turn: &mut TurnContext) -> Option<Decision> {
    let target = ctx.enemy_base();
    let here = unit.position.manhattan(&target);

    match ctx.step_toward(unit, target) {
        Some(Intent::MoveTo { to, .. }) if to.manhattan(&target) <= here => {
            return Some(move_to(unit, to));
        }
        Some(intent @ (Intent::AttackWall { .. } | Intent::DemolishWall { .. })) => {
            return Some(Decision::Act(intent));
        }
        _ => {}
    }

    // Backing off is only allowed from a strictly stronger neighbour
    let outclassed = ctx
        .adjacent_enemies(unit)
        .iter()
        .any(|e| e.tier() > unit.tier());
    if outclassed {
        return safest_step(ctx, unit).map(|tile| move_to(unit, tile));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ai::context::Posture;
    use crate::battle::ai::personality::AiPersonality;
    use crate::battle::engine::GameEngine;
    use crate::battle::events::EventLog;
    use crate::core::config::{GameConfig, MatchSettings};
    use crate::core::types::Side;
    use crate::spatial::map::MapLayout;

    fn engine_with(layout: MapLayout) -> GameEngine {
        let mut engine =
            GameEngine::from_layout(GameConfig::default(), MatchSettings::default(), layout).unwrap();
        engine.units.clear();
        engine.occupancy.clear();
        engine.refresh_visibility();
        engine
    }

    fn engine() -> GameEngine {
        engine_with(MapLayout::empty(10))
    }

    fn place(engine: &mut GameEngine, side: Side, x: i32, y: i32, points: i32) -> UnitId {
        let mut log = EventLog::new();
        let id = engine.spawn_unit(side, GridCoord::new(x, y), points, false, &mut log);
        engine.refresh_visibility();
        id
    }

    fn decide_for(engine: &GameEngine, id: UnitId, turn: &mut TurnContext) -> Decision {
        let personality = AiPersonality::for_difficulty(crate::core::types::Difficulty::Nightmare);
        let unit = engine.unit(id).unwrap();
        let ctx = DecisionContext::new(engine, unit.side, &personality);
        decide(&ctx, unit, turn)
    }

    #[test]
    fn test_unit_touching_enemy_base_strikes_it() {
        let mut engine = engine();
        // Player base is (0, 9)
        let id = place(&mut engine, Side::Ai, 1, 8, 2);
        assert_eq!(
            decide_for(&engine, id, &mut TurnContext::default()),
            Decision::Act(Intent::AttackBase { unit: id })
        );
    }

    #[test]
    fn test_defender_intercepts_base_threat() {
        let mut engine = engine();
        let defender = place(&mut engine, Side::Ai, 8, 3, 5);
        place(&mut engine, Side::Player, 7, 1, 1);
        let Decision::Act(Intent::MoveTo { to, .. }) =
            decide_for(&engine, defender, &mut TurnContext::default())
        else {
            panic!("expected an interception move");
        };
        assert!(to.manhattan(&GridCoord::new(7, 1)) < GridCoord::new(8, 3).manhattan(&GridCoord::new(7, 1)));
    }

    #[test]
    fn test_resource_holder_stays() {
        let mut layout = MapLayout::empty(10);
        layout.forests.push(GridCoord::new(4, 4));
        let mut engine = engine_with(layout);
        let id = place(&mut engine, Side::Ai, 4, 4, 2);
        assert_eq!(engine.controller(GridCoord::new(4, 4)), Some(Side::Ai));
        assert_eq!(decide_for(&engine, id, &mut TurnContext::default()), Decision::Hold);
    }

    #[test]
    fn test_resource_holder_fortifies_when_rich() {
        let mut layout = MapLayout::empty(10);
        layout.forests.push(GridCoord::new(4, 4));
        let mut engine = engine_with(layout);
        let id = place(&mut engine, Side::Ai, 4, 4, 2);
        engine.sides[Side::Ai.index()].resources.wood = 50;
        assert!(matches!(
            decide_for(&engine, id, &mut TurnContext::default()),
            Decision::Act(Intent::BuildWall { .. })
        ));
    }

    #[test]
    fn test_outmatched_unit_retreats() {
        let mut engine = engine();
        let id = place(&mut engine, Side::Ai, 5, 5, 2);
        place(&mut engine, Side::Player, 5, 6, 10);
        let Decision::Act(Intent::MoveTo { to, .. }) =
            decide_for(&engine, id, &mut TurnContext::default())
        else {
            panic!("expected a retreat");
        };
        assert!(to.manhattan(&GridCoord::new(5, 6)) > 1);
    }

    #[test]
    fn test_lethal_kill_preferred() {
        let mut engine = engine();
        let id = place(&mut engine, Side::Ai, 5, 5, 10);
        let weak = place(&mut engine, Side::Player, 5, 6, 2);
        place(&mut engine, Side::Player, 4, 5, 9);
        assert_eq!(
            decide_for(&engine, id, &mut TurnContext::default()),
            Decision::Act(Intent::MoveTo {
                unit: id,
                to: engine.unit(weak).unwrap().position
            })
        );
    }

    #[test]
    fn test_attackers_split_between_enemies() {
        let mut engine = engine();
        let a = place(&mut engine, Side::Ai, 5, 5, 10);
        let b = place(&mut engine, Side::Ai, 6, 6, 10);
        let weak = place(&mut engine, Side::Player, 5, 6, 2);
        let other = place(&mut engine, Side::Player, 6, 5, 3);

        let mut turn = TurnContext::default();
        assert_eq!(
            decide_for(&engine, a, &mut turn),
            Decision::Act(Intent::MoveTo { unit: a, to: GridCoord::new(5, 6) })
        );
        assert!(turn.claimed_enemies.contains(&weak));
        assert_eq!(
            decide_for(&engine, b, &mut turn),
            Decision::Act(Intent::MoveTo { unit: b, to: GridCoord::new(6, 5) })
        );
        assert!(turn.claimed_enemies.contains(&other));
    }

    #[test]
    fn test_claimed_enemy_still_attacked_when_alone() {
        let mut engine = engine();
        let id = place(&mut engine, Side::Ai, 5, 5, 10);
        let enemy = place(&mut engine, Side::Player, 5, 6, 2);
        let mut turn = TurnContext::default();
        turn.claimed_enemies.insert(enemy);
        assert_eq!(
            decide_for(&engine, id, &mut turn),
            Decision::Act(Intent::MoveTo { unit: id, to: GridCoord::new(5, 6) })
        );
    }

    #[test]
    fn test_objective_claims_are_exclusive() {
        let mut layout = MapLayout::empty(10);
        layout.mines.push(GridCoord::new(5, 3));
        let mut engine = engine_with(layout);
        let a = place(&mut engine, Side::Ai, 5, 5, 1);
        let b = place(&mut engine, Side::Ai, 4, 5, 1);

        let mut turn = TurnContext::default();
        assert!(matches!(decide_for(&engine, a, &mut turn), Decision::Act(Intent::MoveTo { .. })));
        assert!(turn.claimed_tiles.contains(&GridCoord::new(5, 3)));

        // The second unit no longer heads for the claimed mine
        if let Decision::Act(Intent::MoveTo { to, .. }) = decide_for(&engine, b, &mut turn) {
            assert_ne!(to, GridCoord::new(4, 4));
        }
    }

    #[test]
    fn test_siege_mode_commits_even_ids() {
        let mut engine = engine();
        let odd = place(&mut engine, Side::Ai, 5, 4, 1);
        let even = place(&mut engine, Side::Ai, 6, 4, 1);
        let mut turn = TurnContext {
            posture: Posture {
                siege_mode: true,
                reclamation: false,
            },
            ..TurnContext::default()
        };
        assert!(even.is_even() && !odd.is_even());
        let Decision::Act(Intent::MoveTo { to, .. }) = decide_for(&engine, even, &mut turn) else {
            panic!("expected an advance");
        };
        let base = GridCoord::new(0, 9);
        assert!(to.manhattan(&base) < GridCoord::new(6, 4).manhattan(&base));
    }

    #[test]
    fn test_reclamation_pins_hunt_goal() {
        let mut layout = MapLayout::empty(10);
        layout.forests.push(GridCoord::new(3, 5));
        let mut engine = engine_with(layout);
        engine.control.insert(GridCoord::new(3, 5), Side::Player);
        let id = place(&mut engine, Side::Ai, 6, 5, 2);

        let mut turn = TurnContext {
            posture: Posture {
                reclamation: true,
                siege_mode: false,
            },
            ..TurnContext::default()
        };
        let decision = decide_for(&engine, id, &mut turn);
        assert_eq!(turn.goal_of(id), UnitGoal::HuntGoal(GridCoord::new(3, 5)));
        assert_eq!(decision, move_to(engine.unit(id).unwrap(), GridCoord::new(5, 5)));
    }

    #[test]
    fn test_pinned_hunter_ignores_a_foe_it_survives() {
        let mut layout = MapLayout::empty(10);
        layout.forests.push(GridCoord::new(3, 5));
        let mut engine = engine_with(layout);
        engine.control.insert(GridCoord::new(3, 5), Side::Player);
        let id = place(&mut engine, Side::Ai, 6, 5, 2);
        // Attack 3 beats defense 2, but its unlucky attack of 2 does not
        place(&mut engine, Side::Player, 6, 6, 3);

        let mut turn = TurnContext {
            posture: Posture {
                reclamation: true,
                siege_mode: false,
            },
            ..TurnContext::default()
        };
        let decision = decide_for(&engine, id, &mut turn);
        assert!(turn.is_pinned(id));
        assert_eq!(decision, move_to(engine.unit(id).unwrap(), GridCoord::new(5, 5)));
    }

    #[test]
    fn test_pinned_hunter_retreats_from_a_sure_loss() {
        let mut layout = MapLayout::empty(10);
        layout.forests.push(GridCoord::new(3, 5));
        let mut engine = engine_with(layout);
        engine.control.insert(GridCoord::new(3, 5), Side::Player);
        let id = place(&mut engine, Side::Ai, 6, 5, 2);
        place(&mut engine, Side::Player, 6, 6, 4);

        let mut turn = TurnContext {
            posture: Posture {
                reclamation: true,
                siege_mode: false,
            },
            ..TurnContext::default()
        };
        let Decision::Act(Intent::MoveTo { to, .. }) = decide_for(&engine, id, &mut turn) else {
            panic!("expected a retreat");
        };
        assert_ne!(to, GridCoord::new(5, 5));
        assert!(to.manhattan(&GridCoord::new(6, 6)) > 1);
    }

    #[test]
    fn test_fallback_never_steps_back_unprovoked() {
        let mut engine = engine();
        // Boxed in on the far side: only backward steps remain
        let id = place(&mut engine, Side::Ai, 9, 5, 1);
        place(&mut engine, Side::Ai, 8, 5, 1);
        engine.walls.place_neutral(&[
            WallEdge::new(GridCoord::new(9, 5), GridCoord::new(9, 6)).unwrap(),
        ]);
        match decide_for(&engine, id, &mut TurnContext::default()) {
            Decision::Act(Intent::MoveTo { to, .. }) => {
                let base = GridCoord::new(0, 9);
                assert!(to.manhattan(&base) <= GridCoord::new(9, 5).manhattan(&base));
            }
            Decision::Act(Intent::AttackWall { .. }) | Decision::Hold => {}
            other => panic!("unexpected decision {:?}", other),
        }
    }
}
