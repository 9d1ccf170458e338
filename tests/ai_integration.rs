//! Decision engine integration tests: autoplay, stepping, personalities

use std::collections::BTreeSet;

use gridfront::battle::ai::{load_personality, AiPersonality};
use gridfront::battle::*;
use gridfront::core::{Difficulty, GameConfig, MatchSettings, Side};
use gridfront::spatial::{GridCoord, MapLayout};

fn settings(difficulty: Difficulty, seed: u64) -> MatchSettings {
    MatchSettings {
        difficulty,
        sandbox: false,
        map_size: 10,
        seed,
    }
}

fn autoplay(engine: &mut GameEngine, rounds: u32) {
    for _ in 0..rounds {
        if engine.is_game_over() {
            break;
        }
        engine.run_turn_for(Side::Player);
        engine.run_turn_for(Side::Ai);
    }
}

fn assert_board_consistent(engine: &GameEngine) {
    let mut tiles = BTreeSet::new();
    for unit in engine.units() {
        assert!(unit.points >= 1 && unit.points <= 500, "unit {:?}", unit);
        assert!(engine.map().is_walkable(unit.position), "unit {:?}", unit);
        assert!(tiles.insert(unit.position), "two units on {:?}", unit.position);
        assert_eq!(engine.unit_at(unit.position).map(|u| u.id), Some(unit.id));
    }
    for side in Side::ALL {
        let resources = engine.resources(side);
        assert!(resources.wood >= 0 && resources.iron >= 0 && resources.reserve >= 0);
    }
}

#[test]
fn test_autoplay_is_deterministic() {
    let run = || {
        let mut engine =
            GameEngine::new(GameConfig::default(), settings(Difficulty::Normal, 21)).unwrap();
        autoplay(&mut engine, 25);
        engine.snapshot()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_autoplay_keeps_the_board_consistent() {
    for (difficulty, seed) in [
        (Difficulty::Baby, 1),
        (Difficulty::Normal, 2),
        (Difficulty::Hard, 3),
        (Difficulty::Nightmare, 4),
    ] {
        let mut engine = GameEngine::new(GameConfig::default(), settings(difficulty, seed)).unwrap();
        for _ in 0..40 {
            if engine.is_game_over() {
                break;
            }
            engine.run_turn_for(Side::Player);
            assert_board_consistent(&engine);
            engine.run_turn_for(Side::Ai);
            assert_board_consistent(&engine);
        }
    }
}

#[test]
fn test_ai_only_acts_in_its_phase() {
    let mut engine =
        GameEngine::new(GameConfig::default(), settings(Difficulty::Normal, 9)).unwrap();
    let before = engine.snapshot();
    assert!(engine.run_turn_for(Side::Ai).is_empty());
    assert_eq!(engine.snapshot(), before);

    engine.submit(Intent::EndTurn);
    let events = engine.run_ai_turn();
    assert!(events
        .iter()
        .any(|e| e.kind == GameEventKind::TurnEnded { side: Side::Ai }));
    assert_eq!(engine.phase(), Phase::PlayerPhase);
    // Every AI unit's action was spent and then reset by its end of turn
    assert!(engine.units_of(Side::Ai).all(|u| !u.has_acted));
}

#[test]
fn test_stepping_yields_between_units() {
    let mut engine =
        GameEngine::new(GameConfig::default(), settings(Difficulty::Hard, 13)).unwrap();
    engine.submit(Intent::EndTurn);

    let mut turn = engine.begin_ai_turn();
    assert!(matches!(engine.step_ai(&mut turn), AiStep::FreeActions(_)));

    let mut acted = Vec::new();
    loop {
        match engine.step_ai(&mut turn) {
            AiStep::UnitActed { unit, .. } => acted.push(unit),
            AiStep::Done => break,
            other => panic!("unexpected step {:?}", other),
        }
    }
    let unique: BTreeSet<_> = acted.iter().copied().collect();
    assert_eq!(unique.len(), acted.len());
    assert!(!acted.is_empty());

    engine.finish_ai_turn(turn);
    assert_eq!(engine.phase(), Phase::PlayerPhase);
}

#[test]
fn test_reset_invalidates_an_ai_turn_in_flight() {
    let mut engine =
        GameEngine::new(GameConfig::default(), settings(Difficulty::Normal, 17)).unwrap();
    engine.submit(Intent::EndTurn);
    let mut turn = engine.begin_ai_turn();
    engine.step_ai(&mut turn);

    engine.reset().unwrap();
    let opening = engine.snapshot();
    assert_eq!(engine.step_ai(&mut turn), AiStep::Stale);
    assert!(engine.finish_ai_turn(turn).is_empty());
    assert_eq!(engine.snapshot(), opening);
    assert_eq!(engine.phase(), Phase::PlayerPhase);
}

#[test]
fn test_ai_answers_a_threat_to_its_base() {
    let settings = MatchSettings {
        difficulty: Difficulty::Normal,
        sandbox: true,
        map_size: 10,
        seed: 3,
    };
    let mut engine =
        GameEngine::from_layout(GameConfig::default(), settings, MapLayout::empty(10)).unwrap();
    engine
        .try_submit(Intent::PlaceUnit {
            side: Side::Player,
            tile: GridCoord::new(7, 1),
            points: 2,
        })
        .unwrap();
    let army_before = engine.units_of(Side::Ai).count();
    engine.submit(Intent::EndTurn);

    let events = engine.run_ai_turn();
    let spawned = events.iter().any(|e| {
        matches!(
            e.kind,
            GameEventKind::UnitSpawned {
                side: Side::Ai,
                ..
            }
        )
    });
    assert!(spawned);
    assert!(engine.units_of(Side::Ai).count() > army_before);
}

#[test]
fn test_personality_files_drive_the_commander() {
    let aggressive = load_personality("aggressive").unwrap();
    let cautious = load_personality("cautious").unwrap();
    assert!(aggressive.thresholds.siege_power_ratio < cautious.thresholds.siege_power_ratio);

    let mut engine =
        GameEngine::new(GameConfig::default(), settings(Difficulty::Normal, 2)).unwrap();
    engine.set_personality(Side::Ai, aggressive.clone());
    assert_eq!(engine.commander(Side::Ai).personality().name, aggressive.name);
    assert!(load_personality("no_such_personality").is_err());
}

#[test]
fn test_nightmare_commander_sees_through_fog() {
    let engine =
        GameEngine::new(GameConfig::default(), settings(Difficulty::Nightmare, 8)).unwrap();
    assert!(engine.commander(Side::Ai).ignores_fog_of_war());
    assert!(!engine.commander(Side::Player).ignores_fog_of_war());
}

#[test]
fn test_ai_builds_a_forge_and_equips() {
    let config = GameConfig {
        forge_wood_cost: 0,
        forge_iron_cost: 0,
        weapon_iron_cost: 0,
        armor_iron_cost: 0,
        ..GameConfig::default()
    };
    let settings = MatchSettings {
        difficulty: Difficulty::Normal,
        sandbox: true,
        map_size: 10,
        seed: 4,
    };
    let mut engine = GameEngine::from_layout(config, settings, MapLayout::empty(10)).unwrap();
    let mut personality = AiPersonality::default();
    personality.production.forge_wood_margin = 0;
    engine.set_personality(Side::Ai, personality);
    engine
        .try_submit(Intent::PlaceUnit {
            side: Side::Ai,
            tile: GridCoord::new(7, 2),
            points: 10,
        })
        .unwrap();

    let mut equipped = Vec::new();
    for _ in 0..30 {
        engine.submit(Intent::EndTurn);
        for event in engine.run_ai_turn() {
            if let GameEventKind::Equipped { unit, .. } = event.kind {
                equipped.push(unit);
            }
        }
        if !equipped.is_empty() {
            break;
        }
    }

    assert!(engine.forges().any(|f| f.owner == Side::Ai));
    assert!(!equipped.is_empty());
    for id in equipped {
        let unit = engine.unit(id).unwrap();
        assert_eq!(unit.side, Side::Ai);
        assert!(unit.has_weapon);
    }
}
