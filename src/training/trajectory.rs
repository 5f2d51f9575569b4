//! Trajectories and the transition buffer.
//!
//! A trajectory records one episode as seen by the training loop:
//! - the observations each action was chosen from
//! - the action request submitted
//! - the reward and termination kind returned by the step
//!
//! Trajectories serialize with `bincode` for hand-off to an external learner.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::{ActionRequest, AgentId, AgentMap, EpisodeRng, EpisodeSeed};
use crate::env::{Observation, RewardSignal, TerminationKind};
use crate::error::EnvError;

/// One step of an episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Observations the action was chosen from.
    pub observations: Vec<Observation>,

    /// The request submitted.
    pub action: ActionRequest,

    /// Reward returned by the step.
    pub reward: RewardSignal,

    /// Termination kind after the step.
    pub termination: TerminationKind,

    /// Step number (1-based, matches the driver's step counter).
    pub step: usize,
}

/// A complete episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub seed: EpisodeSeed,
    pub transitions: Vec<Transition>,
    /// Observations after the last step.
    pub final_observations: Vec<Observation>,
    /// Whether an agent was rejected during the episode.
    pub failed: bool,
}

impl Trajectory {
    /// Empty trajectory starting from the reset observations.
    pub fn new(seed: EpisodeSeed, initial_observations: Vec<Observation>) -> Self {
        Self {
            seed,
            transitions: Vec::new(),
            final_observations: initial_observations,
            failed: false,
        }
    }

    /// Append a step. `next_observations` become the final observations.
    pub fn push(
        &mut self,
        action: ActionRequest,
        reward: RewardSignal,
        termination: TerminationKind,
        next_observations: Vec<Observation>,
    ) {
        let observations = std::mem::replace(&mut self.final_observations, next_observations);
        let step = self.transitions.len() + 1;
        self.transitions.push(Transition {
            observations,
            action,
            reward,
            termination,
            step,
        });
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Termination kind of the last step (`Ongoing` if nothing was recorded).
    pub fn termination(&self) -> TerminationKind {
        self.transitions
            .last()
            .map_or(TerminationKind::Ongoing, |t| t.termination)
    }

    /// Sum of rewards for one agent over the episode.
    ///
    /// In single-agent mode every step's scalar counts for the agent passed.
    pub fn total_reward(&self, agent: AgentId) -> f64 {
        self.transitions
            .iter()
            .map(|t| t.reward.for_agent(agent))
            .sum()
    }

    /// Per-agent sums of rewards.
    pub fn returns(&self, agent_count: usize) -> AgentMap<f64> {
        AgentMap::new(agent_count, |agent| self.total_reward(agent))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// FIFO buffer of trajectories: when full, the oldest is dropped.
#[derive(Clone, Debug)]
pub struct TrajectoryBuffer {
    trajectories: VecDeque<Trajectory>,
    max_trajectories: usize,
}

impl TrajectoryBuffer {
    pub fn new(max_trajectories: usize) -> Self {
        assert!(max_trajectories > 0, "Buffer capacity must be positive");
        Self {
            trajectories: VecDeque::with_capacity(max_trajectories),
            max_trajectories,
        }
    }

    /// Add a trajectory, evicting the oldest if full.
    pub fn push(&mut self, trajectory: Trajectory) {
        if self.trajectories.len() >= self.max_trajectories {
            self.trajectories.pop_front();
        }
        self.trajectories.push_back(trajectory);
    }

    pub fn extend(&mut self, trajectories: impl IntoIterator<Item = Trajectory>) {
        for trajectory in trajectories {
            self.push(trajectory);
        }
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_trajectories
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories.iter()
    }

    /// Transitions across all trajectories.
    pub fn total_transitions(&self) -> usize {
        self.trajectories.iter().map(Trajectory::len).sum()
    }

    /// Sample up to `batch_size` distinct transitions, reproducibly from `seed`.
    pub fn sample_batch(&self, batch_size: usize, seed: u64) -> Vec<&Transition> {
        let all: Vec<&Transition> = self
            .trajectories
            .iter()
            .flat_map(|t| t.transitions.iter())
            .collect();
        if all.is_empty() || batch_size == 0 {
            return Vec::new();
        }

        let mut rng = EpisodeRng::new(seed);
        let n = all.len();
        let limit = batch_size.min(n);
        let mut indices: Vec<usize> = (0..n).collect();

        // Partial Fisher-Yates.
        for i in 0..limit {
            let j = i + rng.gen_range_usize(0..n - i);
            indices.swap(i, j);
        }

        indices[..limit].iter().map(|&i| all[i]).collect()
    }
}

impl Default for TrajectoryBuffer {
    fn default() -> Self {
        Self::new(10_000)
    }
}
