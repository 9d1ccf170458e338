//! Gridfront - Deterministic Turn-Based Grid Tactics
//!
//! Two sides fight over a square grid: units merge into stronger tiers,
//! walls pool health into formations, and an autonomous opponent plays by
//! the same validated intents as the human side.

pub mod battle;
pub mod combat;
pub mod core;
pub mod economy;
pub mod spatial;
pub mod walls;
