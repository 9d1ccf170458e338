//! Turn-level actions: blockers, forges, wood conversion, production

use crate::battle::ai::context::{DecisionContext, TurnContext};
use crate::battle::intents::Intent;
use crate::economy::{highest_affordable_cost, wood_buffer};
use crate::spatial::grid::GridCoord;
use crate::spatial::map::TileKind;

/// Next free action to take, or None once nothing applies
///
/// Every action returned spends something, so the caller's loop makes
/// progress; the caller still caps it.
pub fn next_free_action(ctx: &DecisionContext, turn: &mut TurnContext) -> Option<Intent> {
    emergency_blocker(ctx, turn)
        .or_else(|| build_forge(ctx))
        .or_else(|| convert_wood(ctx))
        .or_else(|| production(ctx))
}

/// Spawn a blocker between the base and each enemy that got too close
fn emergency_blocker(ctx: &DecisionContext, turn: &mut TurnContext) -> Option<Intent> {
    let threats = ctx.threats_near(ctx.own_base(), ctx.personality.radii.threat);
    if threats.len() <= turn.blockers_spawned {
        return None;
    }
    let reserve = ctx.engine.resources(ctx.side).reserve;
    let points = highest_affordable_cost(reserve);
    if points == 0 {
        return None;
    }

    let threat = threats[turn.blockers_spawned].position;
    let tile = nearest_spawn_tile(ctx, threat)?;
    turn.blockers_spawned += 1;
    tracing::debug!(side = ?ctx.side, ?threat, ?tile, points, "spawning emergency blocker");
    Some(Intent::Deploy {
        tile: Some(tile),
        points: Some(points),
    })
}

/// Start a forge beside the unit nearest home once the side can afford one
///
/// Only one forge per side; a lost forge gets replaced.
fn build_forge(ctx: &DecisionContext) -> Option<Intent> {
    let config = ctx.config();
    if ctx.engine.forges().any(|f| f.owner == ctx.side) {
        return None;
    }
    let resources = ctx.engine.resources(ctx.side);
    let wood_needed = config.forge_wood_cost + ctx.personality.production.forge_wood_margin;
    if resources.wood < wood_needed || resources.iron < config.forge_iron_cost {
        return None;
    }
    let units = ctx.own_units();
    if !units.iter().any(|u| u.tier() >= config.equip_min_tier) {
        return None;
    }

    let base = ctx.own_base();
    let (builder, tile) = units
        .into_iter()
        .filter(|u| !u.has_acted && !ctx.holds_resource(u))
        .filter_map(|u| forge_site(ctx, u.position).map(|tile| (u, tile)))
        .min_by_key(|(u, tile)| (u.position.manhattan(&base), u.id, *tile))?;
    tracing::debug!(side = ?ctx.side, unit = builder.id.0, ?tile, "starting a forge");
    Some(Intent::BuildForge {
        unit: builder.id,
        tile,
    })
}

/// Free plain tile beside `tile`, nearest the own base
fn forge_site(ctx: &DecisionContext, tile: GridCoord) -> Option<GridCoord> {
    let base = ctx.own_base();
    ctx.map()
        .neighbors(tile)
        .filter(|t| ctx.map().tile(*t) == TileKind::Plain && !ctx.map().is_base(*t))
        .filter(|t| ctx.engine.forge_at(*t).is_none() && !ctx.engine.is_occupied(*t))
        .min_by_key(|t| (t.manhattan(&base), *t))
}

fn convert_wood(ctx: &DecisionContext) -> Option<Intent> {
    let state = ctx.engine.side_state(ctx.side);
    let buffer = wood_buffer(state.base_hp, state.max_base_hp, ctx.config());
    let wood = state.resources.wood;
    (wood > buffer && wood >= ctx.config().wood_conversion_amount).then_some(Intent::ConvertWood)
}

/// Buy tier-3 units from a large surplus, tier-2 units while the army is small
fn production(ctx: &DecisionContext) -> Option<Intent> {
    let production = &ctx.personality.production;
    let reserve = ctx.engine.resources(ctx.side).reserve;
    let army = ctx.engine.units_of(ctx.side).count();

    let points = if reserve >= production.tier3_reserve && reserve >= production.tier3_cost {
        production.tier3_cost
    } else if army < production.min_units && reserve >= production.tier2_cost {
        production.tier2_cost
    } else {
        return None;
    };

    let tile = nearest_spawn_tile(ctx, ctx.enemy_base())?;
    Some(Intent::Deploy {
        tile: Some(tile),
        points: Some(points),
    })
}

/// Free deployment tile closest to `target`
fn nearest_spawn_tile(ctx: &DecisionContext, target: GridCoord) -> Option<GridCoord> {
    ctx.engine
        .spawn_tiles(ctx.side)
        .into_iter()
        .min_by_key(|t| (t.manhattan(&target), *t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ai::personality::AiPersonality;
    use crate::battle::engine::GameEngine;
    use crate::battle::events::EventLog;
    use crate::core::config::{GameConfig, MatchSettings};
    use crate::core::types::Side;
    use crate::economy::Resources;
    use crate::spatial::map::MapLayout;

    fn engine() -> GameEngine {
        let mut engine =
            GameEngine::from_layout(GameConfig::default(), MatchSettings::default(), MapLayout::empty(10))
                .unwrap();
        engine.units.clear();
        engine.occupancy.clear();
        engine.refresh_visibility();
        engine
    }

    #[test]
    fn test_blocker_spawned_toward_threat() {
        let mut engine = engine();
        let mut log = EventLog::new();
        // Player unit three tiles from the AI base (9, 0)
        engine.spawn_unit(Side::Player, GridCoord::new(7, 1), 2, false, &mut log);
        engine.refresh_visibility();

        let personality = AiPersonality::default();
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        let mut turn = TurnContext::default();
        let Some(Intent::Deploy { tile: Some(tile), points: Some(points) }) =
            next_free_action(&ctx, &mut turn)
        else {
            panic!("expected a blocker deployment");
        };
        assert_eq!(points, 10);
        assert!(tile.manhattan(&GridCoord::new(7, 1)) <= 1);
        assert_eq!(turn.blockers_spawned, 1);
    }

    #[test]
    fn test_wood_conversion_above_buffer() {
        let mut engine = engine();
        engine.sides[Side::Ai.index()].resources.wood = 61;
        engine.sides[Side::Ai.index()].resources.reserve = 0;
        let personality = AiPersonality::default();
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert_eq!(
            next_free_action(&ctx, &mut TurnContext::default()),
            Some(Intent::ConvertWood)
        );
    }

    #[test]
    fn test_forge_started_once_affordable() {
        let mut engine = engine();
        let mut log = EventLog::new();
        let smith = engine.spawn_unit(Side::Ai, GridCoord::new(8, 1), 10, false, &mut log);
        engine.spawn_unit(Side::Ai, GridCoord::new(5, 5), 10, false, &mut log);
        let personality = AiPersonality::default();

        // 20 wood + 30 iron, plus the 10 wood margin
        engine.sides[Side::Ai.index()].resources = Resources::new(29, 30, 0);
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert_eq!(next_free_action(&ctx, &mut TurnContext::default()), None);

        engine.sides[Side::Ai.index()].resources = Resources::new(30, 30, 0);
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        let Some(Intent::BuildForge { unit, tile }) = next_free_action(&ctx, &mut TurnContext::default())
        else {
            panic!("expected a forge");
        };
        assert_eq!(unit, smith);
        assert!(tile.is_adjacent(&GridCoord::new(8, 1)));

        // One forge per side
        engine.submit(Intent::EndTurn);
        engine.try_submit(Intent::BuildForge { unit, tile }).unwrap();
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert!(!matches!(
            next_free_action(&ctx, &mut TurnContext::default()),
            Some(Intent::BuildForge { .. })
        ));
    }

    #[test]
    fn test_no_forge_without_an_equippable_unit() {
        let mut engine = engine();
        let mut log = EventLog::new();
        engine.spawn_unit(Side::Ai, GridCoord::new(8, 1), 4, false, &mut log);
        engine.sides[Side::Ai.index()].resources = Resources::new(50, 50, 0);
        let personality = AiPersonality::default();
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert_eq!(next_free_action(&ctx, &mut TurnContext::default()), None);
    }

    #[test]
    fn test_production_rules() {
        let mut engine = engine();
        let personality = AiPersonality::default();

        engine.sides[Side::Ai.index()].resources.reserve = 6;
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert!(matches!(
            next_free_action(&ctx, &mut TurnContext::default()),
            Some(Intent::Deploy { points: Some(5), .. })
        ));

        engine.sides[Side::Ai.index()].resources.reserve = 40;
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert!(matches!(
            next_free_action(&ctx, &mut TurnContext::default()),
            Some(Intent::Deploy { points: Some(25), .. })
        ));

        engine.sides[Side::Ai.index()].resources.reserve = 3;
        let ctx = DecisionContext::new(&engine, Side::Ai, &personality);
        assert_eq!(next_free_action(&ctx, &mut TurnContext::default()), None);
    }
}
