//! Episode rollouts.
//!
//! The training-loop side of the step boundary: a `Policy` is asked for an
//! action request every time the environment returns `Ongoing`, and nothing
//! else runs in between. `RolloutWorker` runs independent episodes on a
//! rayon pool, each with its own environment and random streams.

use log::info;
use rayon::prelude::*;

use crate::core::{
    ActionCatalogue, ActionId, ActionRequest, ActionVector, AgentId, AgentMode, EpisodeRng,
    EpisodeSeed,
};
use crate::engine::GameFactory;
use crate::env::{GameEnv, Observation, TerminationKind};
use crate::error::EnvError;

use super::trajectory::Trajectory;

/// What a policy sees before choosing.
#[derive(Clone, Copy, Debug)]
pub struct PolicyContext<'a> {
    pub observations: &'a [Observation],
    pub legal_actions: &'a [ActionId],
    pub active_agent: Option<AgentId>,
    pub catalogue: &'a ActionCatalogue,
    pub mode: AgentMode,
    pub agent_count: usize,
}

impl PolicyContext<'_> {
    /// Request that plays engine `action` for the active agent.
    ///
    /// In multi-agent mode every other agent submits the no-op. Returns
    /// `None` if `action` is not in the catalogue.
    pub fn request_for(&self, action: ActionId) -> Option<ActionRequest> {
        let values = self.catalogue.vector(action)?;
        match self.mode {
            AgentMode::Single => Some(ActionRequest::Single(values.clone())),
            AgentMode::Multi => {
                let active = self.active_agent?;
                let noop = self.catalogue.noop()?;
                let per_agent: Vec<ActionVector> = AgentId::all(self.agent_count)
                    .map(|agent| {
                        if agent == active {
                            values.clone()
                        } else {
                            noop.clone()
                        }
                    })
                    .collect();
                Some(ActionRequest::PerAgent(per_agent))
            }
        }
    }
}

/// Chooses an action request for the current step.
pub trait Policy {
    fn act(&mut self, context: &PolicyContext<'_>, rng: &mut EpisodeRng) -> ActionRequest;

    /// Called once per episode, before the first `act`.
    fn reset(&mut self) {}
}

/// Uniform over the legal actions.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomLegalPolicy;

impl Policy for RandomLegalPolicy {
    fn act(&mut self, context: &PolicyContext<'_>, rng: &mut EpisodeRng) -> ActionRequest {
        let action = rng.choose(context.legal_actions).copied().unwrap_or(0);
        context
            .request_for(action)
            .unwrap_or_else(|| ActionRequest::Single(ActionVector::new()))
    }
}

/// Uniform over the whole catalogue, legal or not.
///
/// Useful to exercise the rejection path.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformCataloguePolicy;

impl Policy for UniformCataloguePolicy {
    fn act(&mut self, context: &PolicyContext<'_>, rng: &mut EpisodeRng) -> ActionRequest {
        let count = context.catalogue.action_count().max(1);
        let action = rng.gen_range_usize(0..count) as ActionId;
        context
            .request_for(action)
            .unwrap_or_else(|| ActionRequest::Single(ActionVector::new()))
    }
}

/// Plays a fixed sequence of engine actions, then repeats the last one.
#[derive(Clone, Debug)]
pub struct ScriptedPolicy {
    actions: Vec<ActionId>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<ActionId>) -> Self {
        assert!(!actions.is_empty(), "Script must not be empty");
        Self { actions, cursor: 0 }
    }
}

impl Policy for ScriptedPolicy {
    fn act(&mut self, context: &PolicyContext<'_>, _rng: &mut EpisodeRng) -> ActionRequest {
        let index = self.cursor.min(self.actions.len() - 1);
        self.cursor += 1;
        let action = self.actions[index];
        context
            .request_for(action)
            .unwrap_or_else(|| ActionRequest::Single(ActionVector::new()))
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// Run one episode to termination and record it.
///
/// The policy draws from a stream forked off the episode seed, so the whole
/// rollout is a function of `seed`.
pub fn run_episode<F, P>(
    env: &mut GameEnv<F>,
    policy: &mut P,
    seed: EpisodeSeed,
) -> Result<Trajectory, EnvError>
where
    F: GameFactory,
    F::Engine: 'static,
    P: Policy + ?Sized,
{
    let mut policy_rng = EpisodeRng::new(seed.value()).fork();
    policy.reset();

    let initial = env.reset(seed)?;
    let mut trajectory = Trajectory::new(seed, initial);

    while env.termination() == Some(TerminationKind::Ongoing) {
        let legal = env.legal_actions().unwrap_or_default();
        let request = {
            let context = PolicyContext {
                observations: &trajectory.final_observations,
                legal_actions: &legal,
                active_agent: env.active_agent(),
                catalogue: env.catalogue(),
                mode: env.config().mode,
                agent_count: env.agent_count(),
            };
            policy.act(&context, &mut policy_rng)
        };

        let result = env.step(&request)?;
        trajectory.push(request, result.reward, result.termination, result.observations);
    }

    trajectory.failed = AgentId::all(env.agent_count()).any(|agent| env.is_failed(agent));
    Ok(trajectory)
}

/// Rollout batch settings.
#[derive(Clone, Debug)]
pub struct RolloutConfig {
    /// Episodes per batch.
    pub episodes: usize,
    /// Sample id of the first episode; episode `i` uses `first_sample + i`.
    pub first_sample: u64,
    pub launch_id: u64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            episodes: 16,
            first_sample: 0,
            launch_id: 0,
        }
    }
}

impl RolloutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    #[must_use]
    pub fn with_first_sample(mut self, first_sample: u64) -> Self {
        self.first_sample = first_sample;
        self
    }

    #[must_use]
    pub fn with_launch_id(mut self, launch_id: u64) -> Self {
        self.launch_id = launch_id;
        self
    }

    /// Seed of episode `index` in the batch.
    pub fn seed(&self, index: usize) -> EpisodeSeed {
        EpisodeSeed::new(self.first_sample + index as u64, self.launch_id)
    }
}

/// Runs batches of independent episodes in parallel.
///
/// `build_env` and `build_policy` are called once per episode; environments
/// and policies are never shared between episodes.
pub struct RolloutWorker<B, Q> {
    build_env: B,
    build_policy: Q,
    config: RolloutConfig,
}

impl<B, Q, F, P> RolloutWorker<B, Q>
where
    B: Fn() -> Result<GameEnv<F>, EnvError> + Sync,
    Q: Fn() -> P + Sync,
    F: GameFactory,
    F::Engine: 'static,
    P: Policy,
{
    pub fn new(build_env: B, build_policy: Q, config: RolloutConfig) -> Self {
        Self {
            build_env,
            build_policy,
            config,
        }
    }

    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }

    /// Run one batch. Results are in sample order.
    pub fn collect(&self) -> Result<Vec<Trajectory>, EnvError> {
        let trajectories: Vec<Trajectory> = (0..self.config.episodes)
            .into_par_iter()
            .map(|index| {
                let mut env = (self.build_env)()?;
                let mut policy = (self.build_policy)();
                run_episode(&mut env, &mut policy, self.config.seed(index))
            })
            .collect::<Result<_, _>>()?;

        let steps: usize = trajectories.iter().map(Trajectory::len).sum();
        let truncated = trajectories
            .iter()
            .filter(|t| t.termination() == TerminationKind::Truncated)
            .count();
        let failed = trajectories.iter().filter(|t| t.failed).count();
        info!(
            "{:<32}{} episodes, {} steps, {} truncated, {} failed",
            "collected rollouts",
            trajectories.len(),
            steps,
            truncated,
            failed
        );

        Ok(trajectories)
    }
}
