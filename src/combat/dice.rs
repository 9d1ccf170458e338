//! Random rolls for combat
//!
//! All combat randomness flows through [`Dice`] so a match is reproducible
//! from its seed, and tests can script exact outcomes.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform rolls in `[0, 1)`
pub trait Dice {
    fn roll(&mut self) -> f64;

    /// True with probability `chance`
    fn chance(&mut self, chance: f64) -> bool {
        self.roll() < chance
    }
}

/// Seeded ChaCha8 dice used by the engine
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Scripted rolls; falls back to a constant once the script runs out
#[derive(Debug, Clone)]
pub struct FixedDice {
    script: VecDeque<f64>,
    fallback: f64,
}

impl FixedDice {
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: rolls.into_iter().collect(),
            fallback: 0.5,
        }
    }

    /// Every roll returns `value`
    pub fn always(value: f64) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: value,
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Dice for FixedDice {
    fn roll(&mut self) -> f64 {
        self.script.pop_front().unwrap_or(self.fallback)
    }
}
