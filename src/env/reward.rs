//! Reward accounting.
//!
//! Rewards are recomputed every step and never accumulated here. Precedence
//! per agent:
//!
//! 1. the agent failed this episode: its recorded penalty
//! 2. another agent failed (episode ended by rejection): neutral penalty
//! 3. the engine is terminal: the engine's return for the agent
//! 4. otherwise: the game's in-progress strategy
//!
//! The in-progress reward differs per game (zero, a small constant, a
//! shaping term), so it is a pluggable strategy with zero as the default.

use rustc_hash::FxHashMap;

use crate::core::{AgentId, AgentMap, SingleAgentReward};
use crate::engine::GameEngine;

use super::handle::GameHandle;

/// Reward paid while the game is still running.
pub trait InProgressReward<E>: Send {
    /// Reward for `agent` after a non-terminal step.
    fn reward(&mut self, engine: &E, agent: AgentId) -> f64;

    /// Clear any per-episode state. Called on every reset.
    fn reset(&mut self) {}
}

/// No reward until the game is over.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroReward;

impl<E> InProgressReward<E> for ZeroReward {
    fn reward(&mut self, _engine: &E, _agent: AgentId) -> f64 {
        0.0
    }
}

/// A fixed reward for every non-terminal step.
#[derive(Clone, Copy, Debug)]
pub struct ConstantReward(pub f64);

impl<E> InProgressReward<E> for ConstantReward {
    fn reward(&mut self, _engine: &E, _agent: AgentId) -> f64 {
        self.0
    }
}

/// Pays the increment whenever a game metric reaches a new per-agent maximum
/// (e.g. "new maximum height reached"), zero otherwise.
pub struct RecordShaping<F> {
    metric: F,
    records: FxHashMap<AgentId, f64>,
}

impl<F> RecordShaping<F> {
    /// Shape on `metric(engine, agent)`.
    pub fn new(metric: F) -> Self {
        Self {
            metric,
            records: FxHashMap::default(),
        }
    }
}

impl<E, F> InProgressReward<E> for RecordShaping<F>
where
    F: Fn(&E, AgentId) -> f64 + Send,
{
    fn reward(&mut self, engine: &E, agent: AgentId) -> f64 {
        let value = (self.metric)(engine, agent);
        match self.records.get(&agent).copied() {
            Some(best) if value <= best => 0.0,
            Some(best) => {
                self.records.insert(agent, value);
                value - best
            }
            // The first observation sets the baseline.
            None => {
                self.records.insert(agent, value);
                0.0
            }
        }
    }

    fn reset(&mut self) {
        self.records.clear();
    }
}

/// Computes per-step rewards from a handle.
pub struct RewardAccountant<E> {
    in_progress: Box<dyn InProgressReward<E>>,
    terminal_policy: SingleAgentReward,
}

impl<E: GameEngine> RewardAccountant<E> {
    /// Create an accountant with a terminal policy and an in-progress strategy.
    pub fn new(
        terminal_policy: SingleAgentReward,
        in_progress: Box<dyn InProgressReward<E>>,
    ) -> Self {
        Self {
            in_progress,
            terminal_policy,
        }
    }

    /// Swap the in-progress strategy.
    pub fn set_in_progress(&mut self, in_progress: Box<dyn InProgressReward<E>>) {
        self.in_progress = in_progress;
    }

    /// Start of a new episode.
    pub fn reset(&mut self) {
        self.in_progress.reset();
    }

    /// Reward for one agent.
    pub fn reward(&mut self, handle: &GameHandle<E>, agent: AgentId) -> f64 {
        if handle.is_failed() {
            return handle.failed_penalty(agent);
        }

        let engine = handle.engine();
        if engine.is_terminal() {
            return engine.rewards().get(agent.index()).copied().unwrap_or(0.0);
        }

        self.in_progress.reward(engine, agent)
    }

    /// Reward for every agent, in id order.
    pub fn rewards(&mut self, handle: &GameHandle<E>) -> AgentMap<f64> {
        let values = AgentId::all(handle.agent_count())
            .map(|agent| self.reward(handle, agent))
            .collect();
        AgentMap::from_vec(values)
    }

    /// Single-agent scalar reward after `mover` acted.
    pub fn scalar(&mut self, handle: &GameHandle<E>, mover: AgentId) -> f64 {
        if handle.is_failed() {
            return handle.failed_penalty(mover);
        }

        let engine = handle.engine();
        if engine.is_terminal() {
            let returns = engine.rewards();
            return match self.terminal_policy {
                SingleAgentReward::Mover => returns.get(mover.index()).copied().unwrap_or(0.0),
                SingleAgentReward::Maximum => {
                    returns.iter().copied().reduce(f64::max).unwrap_or(0.0)
                }
            };
        }

        self.in_progress.reward(engine, mover)
    }
}
