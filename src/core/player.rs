//! Agent identification and per-agent data storage.
//!
//! ## AgentId
//!
//! Type-safe agent identifier supporting 1-255 agents. In a game engine
//! these are the players; the environment calls them agents because the
//! training loop drives them.
//!
//! ## AgentMap
//!
//! Per-agent failed flags, penalties and rewards, indexed by `AgentId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Agent identifier supporting 1-255 agents.
///
/// Agent indices are 0-based: the first agent is `AgentId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u8);

/// Agent used as the observation perspective when the engine reports no
/// acting player (chance or terminal node).
///
/// This is an approximation: the query is meaningless at those nodes, but
/// the observation shape must stay constant, so the lowest valid id stands in.
pub const DEFAULT_AGENT: AgentId = AgentId(0);

impl AgentId {
    /// Create a new agent ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw agent index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all agent IDs for a game with `agent_count` agents.
    ///
    /// ```
    /// use turn_env::core::AgentId;
    ///
    /// let agents: Vec<_> = AgentId::all(2).collect();
    /// assert_eq!(agents, vec![AgentId::new(0), AgentId::new(1)]);
    /// ```
    pub fn all(agent_count: usize) -> impl Iterator<Item = AgentId> {
        (0..agent_count as u8).map(AgentId)
    }

    /// Convert a raw engine player index, rejecting anything out of range.
    #[must_use]
    pub fn checked(raw: i64, agent_count: usize) -> Option<AgentId> {
        if raw >= 0 && (raw as usize) < agent_count && raw <= u8::MAX as i64 {
            Some(AgentId(raw as u8))
        } else {
            None
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Agent {}", self.0)
    }
}

/// Per-agent data storage with O(1) access.
///
/// ```
/// use turn_env::core::{AgentId, AgentMap};
///
/// let mut penalty: AgentMap<f64> = AgentMap::with_value(2, 0.0);
/// penalty[AgentId::new(1)] = -100.0;
/// assert_eq!(penalty[AgentId::new(0)], 0.0);
/// assert_eq!(penalty[AgentId::new(1)], -100.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentMap<T> {
    data: Vec<T>,
}

impl<T> AgentMap<T> {
    /// Create a new AgentMap with values from a factory function.
    pub fn new(agent_count: usize, factory: impl Fn(AgentId) -> T) -> Self {
        assert!(agent_count > 0, "Must have at least 1 agent");
        assert!(agent_count <= 255, "At most 255 agents supported");

        let data = (0..agent_count as u8).map(|i| factory(AgentId(i))).collect();

        Self { data }
    }

    /// Create a new AgentMap with all entries set to the same value.
    pub fn with_value(agent_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(agent_count, |_| value.clone())
    }

    /// Build from a vector with one entry per agent.
    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(!data.is_empty(), "Must have at least 1 agent");
        assert!(data.len() <= 255, "At most 255 agents supported");
        Self { data }
    }

    /// Get the number of agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.data.len()
    }

    /// Iterate over (AgentId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (AgentId(i as u8), v))
    }

    /// Borrow the values as a slice in agent order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<AgentId> for AgentMap<T> {
    type Output = T;

    fn index(&self, agent: AgentId) -> &Self::Output {
        &self.data[agent.index()]
    }
}

impl<T> IndexMut<AgentId> for AgentMap<T> {
    fn index_mut(&mut self, agent: AgentId) -> &mut Self::Output {
        &mut self.data[agent.index()]
    }
}
