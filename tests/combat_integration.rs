//! Combat integration tests: attacks, merges, and base strikes through intents

use gridfront::battle::*;
use gridfront::combat::*;
use gridfront::core::{Difficulty, GameConfig, MatchSettings, Rejection, Side, UnitId};
use gridfront::spatial::{GridCoord, MapLayout};

fn sandbox_with(config: GameConfig, dice: FixedDice) -> GameEngine {
    let settings = MatchSettings {
        difficulty: Difficulty::Baby,
        sandbox: true,
        map_size: 10,
        seed: 7,
    };
    GameEngine::from_layout(config, settings, MapLayout::empty(10))
        .unwrap()
        .with_dice(dice)
}

/// Hit lands, no luck swing, no counter
fn sandbox() -> GameEngine {
    sandbox_with(GameConfig::default(), FixedDice::always(0.5))
}

fn place(engine: &mut GameEngine, side: Side, x: i32, y: i32, points: i32) -> UnitId {
    let tile = GridCoord::new(x, y);
    engine
        .try_submit(Intent::PlaceUnit { side, tile, points })
        .unwrap();
    engine.unit_at(tile).unwrap().id
}

#[test]
fn test_stronger_attacker_destroys_and_advances() {
    let mut engine = sandbox();
    let attacker = place(&mut engine, Side::Player, 4, 4, 10);
    let defender = place(&mut engine, Side::Ai, 5, 4, 5);

    let events = engine
        .try_submit(Intent::MoveTo {
            unit: attacker,
            to: GridCoord::new(5, 4),
        })
        .unwrap();

    assert!(engine.unit(defender).is_none());
    let survivor = engine.unit(attacker).unwrap();
    assert_eq!(survivor.position, GridCoord::new(5, 4));
    assert_eq!(survivor.points, 10);
    assert!(survivor.has_acted);
    assert!(!engine.is_occupied(GridCoord::new(4, 4)));

    let report = events
        .iter()
        .find_map(|e| match &e.kind {
            GameEventKind::AttackResolved { report } => Some(*report),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        report.outcome,
        AttackOutcome::DefenderDestroyed {
            counter: Counter::Missed
        }
    );
}

#[test]
fn test_weaker_attacker_is_lost_and_chips_defender() {
    let mut engine = sandbox();
    let attacker = place(&mut engine, Side::Player, 4, 4, 5);
    let defender = place(&mut engine, Side::Ai, 5, 4, 15);

    engine
        .try_submit(Intent::MoveTo {
            unit: attacker,
            to: GridCoord::new(5, 4),
        })
        .unwrap();

    assert!(engine.unit(attacker).is_none());
    assert_eq!(engine.unit(defender).unwrap().points, 10);
}

#[test]
fn test_missed_attack_costs_the_attacker() {
    let mut engine = sandbox_with(GameConfig::default(), FixedDice::always(0.99));
    let attacker = place(&mut engine, Side::Player, 4, 4, 20);
    let defender = place(&mut engine, Side::Ai, 5, 4, 5);

    engine
        .try_submit(Intent::MoveTo {
            unit: attacker,
            to: GridCoord::new(5, 4),
        })
        .unwrap();

    assert!(engine.unit(attacker).is_none());
    assert_eq!(engine.unit(defender).unwrap().points, 5);
}

#[test]
fn test_merge_overflow_promotes_and_leaves_remainder() {
    let mut engine = sandbox();
    let mover = place(&mut engine, Side::Player, 4, 4, 3);
    let target = place(&mut engine, Side::Player, 5, 4, 4);

    engine
        .try_submit(Intent::MoveTo {
            unit: mover,
            to: GridCoord::new(5, 4),
        })
        .unwrap();

    let merged = engine.unit(target).unwrap();
    assert_eq!(merged.points, 5);
    assert_eq!(merged.tier(), 2);
    assert!(engine.unit(mover).is_none());

    let remainder = engine.unit_at(GridCoord::new(4, 4)).unwrap();
    assert_eq!(remainder.points, 2);
    assert_eq!(remainder.side, Side::Player);
    assert!(remainder.has_acted);
}

#[test]
fn test_merge_target_keeps_its_action() {
    let mut engine = sandbox();
    let mover = place(&mut engine, Side::Player, 4, 4, 1);
    let target = place(&mut engine, Side::Player, 5, 4, 1);

    engine
        .try_submit(Intent::MoveTo {
            unit: mover,
            to: GridCoord::new(5, 4),
        })
        .unwrap();
    assert_eq!(engine.unit(target).unwrap().points, 2);
    assert!(!engine.unit(target).unwrap().has_acted);

    engine
        .try_submit(Intent::MoveTo {
            unit: target,
            to: GridCoord::new(6, 4),
        })
        .unwrap();
    let moved = engine.unit(target).unwrap();
    assert_eq!(moved.position, GridCoord::new(6, 4));
    assert!(moved.has_acted);
}

#[test]
fn test_merge_across_tiers_is_rejected() {
    let mut engine = sandbox();
    let mover = place(&mut engine, Side::Player, 4, 4, 3);
    place(&mut engine, Side::Player, 5, 4, 10);

    let result = engine.try_submit(Intent::MoveTo {
        unit: mover,
        to: GridCoord::new(5, 4),
    });
    assert!(matches!(result, Err(Rejection::Invalid(_))));
    assert_eq!(engine.unit(mover).unwrap().position, GridCoord::new(4, 4));
}

#[test]
fn test_unit_acts_once_per_phase() {
    let mut engine = sandbox();
    let unit = place(&mut engine, Side::Player, 4, 4, 2);
    engine
        .try_submit(Intent::MoveTo {
            unit,
            to: GridCoord::new(4, 5),
        })
        .unwrap();
    assert_eq!(
        engine.try_submit(Intent::MoveTo {
            unit,
            to: GridCoord::new(4, 6),
        }),
        Err(Rejection::AlreadyActed(unit))
    );
}

#[test]
fn test_cannot_command_enemy_units() {
    let mut engine = sandbox();
    let enemy = place(&mut engine, Side::Ai, 5, 5, 2);
    assert_eq!(
        engine.try_submit(Intent::MoveTo {
            unit: enemy,
            to: GridCoord::new(5, 6),
        }),
        Err(Rejection::NotYourUnit(enemy))
    );
}

#[test]
fn test_base_strike_scales_with_tier() {
    let mut engine = sandbox();
    // Diagonal to the AI base at (9, 0)
    let striker = place(&mut engine, Side::Player, 8, 1, 25);
    let before = engine.base_hp(Side::Ai);

    engine.try_submit(Intent::AttackBase { unit: striker }).unwrap();
    assert_eq!(engine.base_hp(Side::Ai), before - base_damage(3));
}

#[test]
fn test_destroying_a_base_ends_the_game() {
    let config = GameConfig {
        sandbox_base_hp: 20,
        ..GameConfig::default()
    };
    let mut engine = sandbox_with(config, FixedDice::always(0.5));
    let striker = place(&mut engine, Side::Player, 8, 1, 25);

    let events = engine.try_submit(Intent::AttackBase { unit: striker }).unwrap();
    assert!(engine.is_game_over());
    assert_eq!(engine.phase(), Phase::GameOver);

    let record = engine.outcome().unwrap();
    assert_eq!(record.winner, Side::Player);
    assert_eq!(record.victory, VictoryKind::Annihilation);
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, GameEventKind::GameOver { .. })));

    // Nothing is accepted after the game ends
    assert_eq!(engine.try_submit(Intent::EndTurn), Err(Rejection::GameOver));
}

#[test]
fn test_scripted_dice_reproduce_a_fight() {
    let run = || {
        let mut engine = sandbox_with(GameConfig::default(), FixedDice::new([0.1, 0.1, 0.9]));
        let attacker = place(&mut engine, Side::Player, 4, 4, 10);
        place(&mut engine, Side::Ai, 5, 4, 10);
        engine
            .try_submit(Intent::MoveTo {
                unit: attacker,
                to: GridCoord::new(5, 4),
            })
            .unwrap()
    };
    assert_eq!(run(), run());
}
