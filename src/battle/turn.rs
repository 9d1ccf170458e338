//! Turn controller: end-of-turn bookkeeping, victory checks, and AI stepping
//!
//! An AI turn is an explicit continuation ([`AiTurn`]) so a presentation
//! layer can pause between unit decisions. The continuation carries the
//! engine generation; after a reset it turns into a no-op.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::battle::ai::context::TurnContext;
use crate::battle::ai::stages::Decision;
use crate::battle::ai::BattleAI;
use crate::battle::engine::{GameEngine, Phase};
use crate::battle::events::{EventLog, GameEvent, GameEventKind};
use crate::battle::intents::Intent;
use crate::battle::record::VictoryKind;
use crate::core::types::{Mood, Side, UnitId};
use crate::economy::{production_income, resource_share, Income};

/// Decisions one unit may make in a single step (free actions like equipping
/// do not spend the unit's action, so it may decide again)
const MAX_DECISIONS_PER_UNIT: usize = 4;

/// In-flight AI turn
#[derive(Debug, Clone)]
pub struct AiTurn {
    pub generation: u64,
    pub side: Side,
    free_done: bool,
    queue: VecDeque<UnitId>,
    pub context: TurnContext,
}

impl AiTurn {
    /// Units still waiting for a decision
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Result of one `step_ai` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AiStep {
    /// Turn-level actions (blockers, conversion, production)
    FreeActions(Vec<GameEvent>),
    /// One unit decided (possibly passing with no events)
    UnitActed { unit: UnitId, events: Vec<GameEvent> },
    /// Every unit has been handled
    Done,
    /// The game was reset after this turn began
    Stale,
}

impl GameEngine {
    /// Bookkeeping for the side that just acted, then hand over the phase
    pub(crate) fn end_turn(&mut self, side: Side, log: &mut EventLog) {
        let turn = self.turn;

        // Counters accrue before the per-phase flags are cleared
        let mut income = Income::default();
        for unit in self.units.values_mut().filter(|u| u.side == side) {
            if !unit.moved_this_turn {
                unit.stationary_turns += 1;
                let kind = self.map.tile(unit.position);
                if kind.is_resource() && self.control.get(&unit.position) == Some(&side) {
                    unit.occupation_turns += 1;
                    income += production_income(kind, unit.occupation_turns, &self.config);
                }
            }
            unit.has_acted = false;
            unit.moved_this_turn = false;
        }

        if income != Income::default() {
            self.sides[side.index()].resources.add(income);
            log.push(
                GameEventKind::IncomeCollected {
                    side,
                    wood: income.wood,
                    iron: income.iron,
                },
                format!("{:?} collected {} wood, {} iron", side, income.wood, income.iron),
                turn,
            );
        }

        for forge in self.forges.values_mut() {
            if forge.owner == side && forge.turns_left > 0 {
                forge.turns_left -= 1;
                if forge.is_complete() {
                    log.push(
                        GameEventKind::ForgeCompleted {
                            tile: forge.tile,
                            side,
                        },
                        format!("{:?} finished the forge at {:?}", side, forge.tile),
                        turn,
                    );
                }
            }
        }
        self.walls.prune_cooldowns(turn);

        self.phase = Phase::for_side(side.opponent());
        if side == Side::Player {
            self.complete_turn(log);
        }

        self.refresh_visibility();
        log.push(
            GameEventKind::TurnEnded { side },
            format!("{:?} ended turn {}", side, turn),
            turn,
        );
        tracing::info!(?side, turn, next = ?self.phase, "turn ended");
    }

    /// Once per full turn: advance the counter, pay reserves, check monopoly
    fn complete_turn(&mut self, log: &mut EventLog) {
        self.turn += 1;
        let turn = self.turn;

        let trickle = self.config.reserve_trickle;
        for side in Side::ALL {
            self.grant_reserve(side, trickle, log);
        }

        if let Some(cadence) = self.settings.difficulty.ai_bonus_cadence() {
            if cadence > 0 && turn % cadence == 0 {
                self.grant_reserve(Side::Ai, 1, log);
            }
        }

        let total = self.map.resource_count();
        let player_share = resource_share(self.held_resource_count(Side::Player), total);
        let ai_share = resource_share(self.held_resource_count(Side::Ai), total);
        let mood = Mood::from_share_lead(player_share, ai_share);
        if mood != self.mood {
            tracing::debug!(from = ?self.mood, to = ?mood, "AI mood changed");
        }
        self.mood = mood;
        self.grant_reserve(Side::Ai, mood.reserve_bonus(), log);

        self.check_monopoly(total, log);
    }

    fn grant_reserve(&mut self, side: Side, amount: i32, log: &mut EventLog) {
        if amount <= 0 {
            return;
        }
        self.sides[side.index()].resources.reserve += amount;
        log.push(
            GameEventKind::ReserveGranted { side, amount },
            format!("{:?} gained {} reserve", side, amount),
            self.turn,
        );
    }

    fn check_monopoly(&mut self, total: usize, log: &mut EventLog) {
        for side in Side::ALL {
            let complete = total > 0 && self.held_resource_count(side) == total;
            let state = &mut self.sides[side.index()];
            state.monopoly_streak = if complete { state.monopoly_streak + 1 } else { 0 };
        }
        if self.settings.sandbox || self.is_game_over() {
            return;
        }
        let needed = self.config.monopoly_turns;
        let winner = Side::ALL
            .into_iter()
            .find(|side| self.sides[side.index()].monopoly_streak >= needed);
        if let Some(winner) = winner {
            self.finish(winner, VictoryKind::Monopoly, log);
        }
    }

    // ===== AI STEPPING =====

    /// Start the autonomous side's turn
    pub fn begin_ai_turn(&self) -> AiTurn {
        self.begin_turn_for(Side::Ai)
    }

    /// Start a decision-engine turn for either side
    pub fn begin_turn_for(&self, side: Side) -> AiTurn {
        let mut order: Vec<(i32, UnitId)> = self
            .units_of(side)
            .map(|u| (u.points, u.id))
            .collect();
        // Heaviest first, ties by id
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let context = self.commanders[side.index()].plan_turn(self, side);
        AiTurn {
            generation: self.generation,
            side,
            free_done: false,
            queue: order.into_iter().map(|(_, id)| id).collect(),
            context,
        }
    }

    /// Advance an AI turn by one yield point
    pub fn step_ai(&mut self, turn: &mut AiTurn) -> AiStep {
        if turn.generation != self.generation {
            return AiStep::Stale;
        }
        if self.phase.acting_side() != Some(turn.side) {
            return AiStep::Done;
        }

        let commander = self.commanders[turn.side.index()].clone();

        if !turn.free_done {
            turn.free_done = true;
            return AiStep::FreeActions(self.run_free_actions(&commander, turn));
        }

        while let Some(id) = turn.queue.pop_front() {
            let ready = self
                .units
                .get(&id)
                .is_some_and(|u| u.side == turn.side && !u.has_acted);
            if !ready {
                continue;
            }
            let events = self.run_unit(&commander, id, &mut turn.context);
            return AiStep::UnitActed { unit: id, events };
        }
        AiStep::Done
    }

    fn run_free_actions(&mut self, commander: &impl BattleAI, turn: &mut AiTurn) -> Vec<GameEvent> {
        let cap = self.config.free_action_cap;
        let mut events = Vec::new();
        for taken in 0..=cap {
            if self.is_game_over() {
                break;
            }
            let Some(intent) = commander.next_free_action(self, turn.side, &mut turn.context) else {
                break;
            };
            if taken == cap {
                tracing::warn!(cap, side = ?turn.side, "free action loop hit its cap");
                break;
            }
            match self.try_submit(intent) {
                Ok(new) => events.extend(new),
                Err(rejection) => {
                    tracing::debug!(?intent, %rejection, "free action rejected");
                    break;
                }
            }
        }
        events
    }

    fn run_unit(&mut self, commander: &impl BattleAI, id: UnitId, context: &mut TurnContext) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..MAX_DECISIONS_PER_UNIT {
            if self.is_game_over() {
                return events;
            }
            let decision = commander.decide(self, id, context);
            tracing::debug!(unit = id.0, ?decision, "AI decision");

            let intent = match decision {
                Decision::Act(intent) => intent,
                Decision::Hold => break,
            };
            let defender = match intent {
                Intent::MoveTo { unit, to } => {
                    let side = self.unit(unit).map(|u| u.side);
                    self.unit_at(to).filter(|u| Some(u.side) != side).map(|u| u.id)
                }
                _ => None,
            };
            match self.try_submit(intent) {
                Ok(new) => {
                    if let Intent::MoveTo { to, .. } = intent {
                        context.claimed_tiles.insert(to);
                    }
                    if let Some(defender) = defender {
                        context.claimed_enemies.insert(defender);
                    }
                    events.extend(new);
                    if intent.consumes_action() {
                        break;
                    }
                }
                Err(rejection) => {
                    tracing::debug!(unit = id.0, ?intent, %rejection, "AI intent rejected");
                    break;
                }
            }
        }

        // Every unit ends its step spent, so the turn always terminates
        if self.units.get(&id).is_some_and(|u| !u.has_acted) {
            self.pass_unit(id);
        }
        events
    }

    /// End the AI turn; a stale continuation does nothing
    pub fn finish_ai_turn(&mut self, turn: AiTurn) -> Vec<GameEvent> {
        if turn.generation != self.generation || self.phase.acting_side() != Some(turn.side) {
            return Vec::new();
        }
        self.submit(Intent::EndTurn)
    }

    /// Drive a whole AI turn to completion
    pub fn run_ai_turn(&mut self) -> Vec<GameEvent> {
        self.run_turn_for(Side::Ai)
    }

    /// Let the decision engine play `side`'s whole turn (used for autoplay)
    pub fn run_turn_for(&mut self, side: Side) -> Vec<GameEvent> {
        if self.phase.acting_side() != Some(side) {
            return Vec::new();
        }
        let mut turn = self.begin_turn_for(side);
        let mut events = Vec::new();
        loop {
            match self.step_ai(&mut turn) {
                AiStep::FreeActions(new) | AiStep::UnitActed { events: new, .. } => {
                    events.extend(new)
                }
                AiStep::Done => break,
                AiStep::Stale => return events,
            }
        }
        events.extend(self.finish_ai_turn(turn));
        events
    }
}
