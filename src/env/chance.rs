//! Chance node resolution.
//!
//! After every state-changing action the engine may sit at a chance node
//! (a card to deal, a die to roll). The resolver keeps sampling and applying
//! outcomes from the episode's own stream until an agent is to act or the
//! game is over. Sampled outcomes are never reported to the training loop.

use log::trace;

use crate::core::EpisodeRng;
use crate::engine::GameEngine;
use crate::error::EnvError;

/// Drains chance nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChanceResolver;

impl ChanceResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve every pending chance node.
    ///
    /// Returns the number of outcomes applied. On success the engine is at a
    /// non-chance node or terminal.
    pub fn resolve<E: GameEngine>(
        &self,
        engine: &mut E,
        rng: &mut EpisodeRng,
    ) -> Result<usize, EnvError> {
        let mut applied = 0;

        while engine.is_chance_node() && !engine.is_terminal() {
            let outcomes = engine.chance_outcomes();
            if outcomes.is_empty() {
                return Err(EnvError::inconsistency(
                    "chance node reports no outcomes",
                    format!("after {} resolved outcomes", applied),
                ));
            }

            let weights: Vec<f64> = outcomes.iter().map(|&(_, p)| p).collect();
            let index = match rng.choose_weighted(&weights) {
                Some(index) => index,
                // No usable weights: any outcome is acceptable, pick uniformly.
                None => rng.gen_range_usize(0..outcomes.len()),
            };

            let outcome = outcomes[index].0;
            trace!("chance outcome {} ({} candidates)", outcome, outcomes.len());
            engine.apply_action(outcome);
            applied += 1;
        }

        debug_assert!(!engine.is_chance_node() || engine.is_terminal());
        Ok(applied)
    }
}
