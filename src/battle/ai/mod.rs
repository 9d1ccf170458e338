//! Enemy AI system for turn decision-making
//!
//! Architecture: Trait + Data hybrid
//! - BattleAI trait defines interface for swappable implementations
//! - AiPersonality struct holds TOML-loaded thresholds and radii
//! - DecisionContext provides fog-of-war-filtered game state
//! - TurnContext is the per-turn working memory (claims, goals, postures)

pub mod commander;
pub mod context;
pub mod free_actions;
pub mod personality;
pub mod stages;

pub use commander::AiCommander;
pub use context::{DecisionContext, Posture, TurnContext, UnitGoal};
pub use personality::{load_personality, load_personality_file, AiPersonality};
pub use stages::Decision;

use crate::battle::engine::GameEngine;
use crate::battle::intents::Intent;
use crate::core::types::{Side, UnitId};

/// Trait for turn AI implementations
pub trait BattleAI {
    /// Decide turn-wide postures before any unit acts
    fn plan_turn(&self, engine: &GameEngine, side: Side) -> TurnContext;

    /// Next action not tied to a unit (spawns, conversion), or None when done
    fn next_free_action(
        &self,
        engine: &GameEngine,
        side: Side,
        turn: &mut TurnContext,
    ) -> Option<Intent>;

    /// Pick one unit's action
    fn decide(&self, engine: &GameEngine, unit: UnitId, turn: &mut TurnContext) -> Decision;

    /// Get the personality configuration
    fn personality(&self) -> &AiPersonality;

    /// Check if AI cheats on fog of war
    fn ignores_fog_of_war(&self) -> bool;
}
