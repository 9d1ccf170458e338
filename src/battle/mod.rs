//! Battle system - the turn-based engine and its autonomous opponent
//!
//! The engine owns every unit, wall and stockpile. Callers read snapshots
//! and submit intents; each accepted intent returns the events it caused.
//!
//! - `engine`: state and intent execution
//! - `turn`: end-of-turn bookkeeping, victory, AI stepping
//! - `ai`: the decision engine (free actions + per-unit pipeline)

pub mod ai;
pub mod engine;
pub mod events;
pub mod intents;
pub mod record;
pub mod snapshot;
pub mod turn;
pub mod units;

// Re-exports for convenient access
pub use ai::{AiCommander, AiPersonality, BattleAI, Decision};
pub use engine::{Forge, GameEngine, Phase, SideState, PLAYER_STARTING_ARMY};
pub use events::{Equipment, EventLog, GameEvent, GameEventKind};
pub use intents::Intent;
pub use record::{JsonLinesRecorder, MatchRecord, MatchRecorder, MemoryRecorder, VictoryKind};
pub use snapshot::{GameSnapshot, SideSnapshot};
pub use turn::{AiStep, AiTurn};
pub use units::Unit;
