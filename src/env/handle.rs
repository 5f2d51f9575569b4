//! Game handle: one engine instance plus its sticky failure state.

use crate::core::{AgentId, AgentMap};
use crate::engine::GameEngine;

/// Penalty value held for agents that have not failed.
pub const NEUTRAL_PENALTY: f64 = 0.0;

/// Owns one game instance and records illegal-action failures.
///
/// Failure flags are monotonic: once set they stay set until the handle
/// is replaced on the next reset.
#[derive(Clone, Debug)]
pub struct GameHandle<E> {
    engine: E,
    failed: bool,
    failed_agents: AgentMap<bool>,
    failed_penalty: AgentMap<f64>,
}

impl<E: GameEngine> GameHandle<E> {
    /// Wrap a fresh engine.
    pub fn new(engine: E) -> Self {
        let agent_count = engine.num_players();
        Self {
            engine,
            failed: false,
            failed_agents: AgentMap::with_value(agent_count, false),
            failed_penalty: AgentMap::with_value(agent_count, NEUTRAL_PENALTY),
        }
    }

    /// Borrow the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutably borrow the engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Number of agents tracked.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.failed_agents.agent_count()
    }

    /// Record an illegal action by `agent`, routing `penalty` to it.
    pub fn mark_failed(&mut self, agent: AgentId, penalty: f64) {
        self.failed = true;
        self.failed_agents[agent] = true;
        self.failed_penalty[agent] = penalty;
    }

    /// Whether any agent has failed this episode.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Whether `agent` has failed this episode.
    #[must_use]
    pub fn is_agent_failed(&self, agent: AgentId) -> bool {
        self.failed_agents[agent]
    }

    /// Penalty recorded for `agent`; neutral unless it failed.
    #[must_use]
    pub fn failed_penalty(&self, agent: AgentId) -> f64 {
        self.failed_penalty[agent]
    }

    /// Agents that have failed, in id order.
    pub fn failed_agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.failed_agents
            .iter()
            .filter(|(_, &failed)| failed)
            .map(|(agent, _)| agent)
    }
}
