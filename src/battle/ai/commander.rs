//! AI Commander - the decision engine driving one side
//!
//! Stateless between turns: everything it remembers lives in the
//! [`TurnContext`] the engine threads through a single turn.

use crate::battle::ai::context::{DecisionContext, TurnContext};
use crate::battle::ai::free_actions::next_free_action;
use crate::battle::ai::personality::AiPersonality;
use crate::battle::ai::stages::{decide, Decision};
use crate::battle::ai::BattleAI;
use crate::battle::engine::GameEngine;
use crate::battle::intents::Intent;
use crate::core::types::{Side, UnitId};

/// AI Commander implementing BattleAI trait
#[derive(Debug, Clone, Default)]
pub struct AiCommander {
    personality: AiPersonality,
}

impl AiCommander {
    pub fn new(personality: AiPersonality) -> Self {
        Self { personality }
    }

    fn context<'a>(&'a self, engine: &'a GameEngine, side: Side) -> DecisionContext<'a> {
        DecisionContext::new(engine, side, &self.personality)
    }
}

impl BattleAI for AiCommander {
    fn plan_turn(&self, engine: &GameEngine, side: Side) -> TurnContext {
        self.context(engine, side).plan()
    }

    fn next_free_action(
        &self,
        engine: &GameEngine,
        side: Side,
        turn: &mut TurnContext,
    ) -> Option<Intent> {
        next_free_action(&self.context(engine, side), turn)
    }

    fn decide(&self, engine: &GameEngine, unit: UnitId, turn: &mut TurnContext) -> Decision {
        let Some(unit) = engine.unit(unit) else {
            return Decision::Hold;
        };
        decide(&self.context(engine, unit.side), unit, turn)
    }

    fn personality(&self) -> &AiPersonality {
        &self.personality
    }

    fn ignores_fog_of_war(&self) -> bool {
        self.personality.difficulty.ignores_fog_of_war
    }
}
