//! Episode driver.
//!
//! `GameEnv` owns a game factory and, between `reset` and termination, one
//! `Episode`. Each `step` runs in a fixed order:
//!
//! 1. legality guard
//! 2. engine (accepted actions only)
//! 3. chance resolver
//! 4. state encoder
//! 5. reward accountant
//!
//! The return of `step` is the only hand-off to the training loop: the
//! environment then waits, doing nothing, until the next request arrives.
//! Cancelling an episode means not calling `step` again.

use log::{debug, error, trace};
use serde::{Deserialize, Serialize};

use crate::core::{
    variable, ActionCatalogue, ActionId, ActionRequest, AgentId, AgentMap, AgentMode, EnvConfig,
    EpisodeRng, EpisodeRngState, EpisodeSeed, Variable, DEFAULT_AGENT, NOOP_ACTION,
};
use crate::engine::{ActivePlayer, GameEngine, GameFactory};
use crate::error::EnvError;

use super::chance::ChanceResolver;
use super::encoder::{perspective, Observation, StateEncoder};
use super::handle::GameHandle;
use super::legality::{LegalityGuard, Verdict};
use super::reward::{InProgressReward, RewardAccountant, ZeroReward};

/// How an episode stands after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationKind {
    /// Another step may be taken.
    Ongoing,
    /// The game's rules ended the episode (or an action was rejected).
    Terminal,
    /// The step budget ended the episode.
    Truncated,
}

impl TerminationKind {
    /// Whether the episode is over.
    #[must_use]
    pub fn is_done(self) -> bool {
        self != TerminationKind::Ongoing
    }

    /// Name as reported to the training loop.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationKind::Ongoing => "Ongoing",
            TerminationKind::Terminal => "Terminal",
            TerminationKind::Truncated => "Truncated",
        }
    }
}

/// Reward for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RewardSignal {
    /// Single-agent mode.
    Scalar(f64),
    /// Multi-agent mode, indexed by agent id.
    PerAgent(AgentMap<f64>),
}

impl RewardSignal {
    /// Reward for one agent. A scalar belongs to every agent slot.
    #[must_use]
    pub fn for_agent(&self, agent: AgentId) -> f64 {
        match self {
            RewardSignal::Scalar(r) => *r,
            RewardSignal::PerAgent(rs) => rs[agent],
        }
    }

    /// Rewards as a vector (one entry in single-agent mode).
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            RewardSignal::Scalar(r) => vec![*r],
            RewardSignal::PerAgent(rs) => rs.as_slice().to_vec(),
        }
    }
}

/// Everything the training loop receives after a step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// One observation in single-agent mode, one per agent otherwise.
    pub observations: Vec<Observation>,
    pub reward: RewardSignal,
    pub termination: TerminationKind,
}

/// One run of the game from reset to termination.
#[derive(Debug)]
pub struct Episode<E> {
    handle: GameHandle<E>,
    rng: EpisodeRng,
    seed: EpisodeSeed,
    steps: usize,
    termination: TerminationKind,
}

impl<E: GameEngine> Episode<E> {
    /// The game handle.
    pub fn handle(&self) -> &GameHandle<E> {
        &self.handle
    }

    /// Steps taken so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Current termination kind.
    #[must_use]
    pub fn termination(&self) -> TerminationKind {
        self.termination
    }

    /// Seed the episode was reset with.
    #[must_use]
    pub fn seed(&self) -> EpisodeSeed {
        self.seed
    }

    /// Position of the episode's chance stream.
    #[must_use]
    pub fn rng_state(&self) -> EpisodeRngState {
        self.rng.state()
    }
}

/// Turn-based game exposed as a fixed-shape episodic environment.
pub struct GameEnv<F: GameFactory> {
    factory: F,
    config: EnvConfig,
    guard: LegalityGuard,
    resolver: ChanceResolver,
    encoder: Box<dyn StateEncoder<F::Engine>>,
    rewards: RewardAccountant<F::Engine>,
    variables: Vec<Variable>,
    agent_count: usize,
    observation_size: usize,
    episode: Option<Episode<F::Engine>>,
}

impl<F> GameEnv<F>
where
    F: GameFactory,
    F::Engine: 'static,
{
    /// Build an environment.
    ///
    /// The catalogue is `[[0], ..., [n - 1]]` for the factory's `n` distinct
    /// actions, with the no-op appended in multi-agent mode.
    pub fn new(
        factory: F,
        encoder: impl StateEncoder<F::Engine> + 'static,
        config: EnvConfig,
    ) -> Result<Self, EnvError> {
        let catalogue = ActionCatalogue::discrete(factory.num_distinct_actions());
        Self::with_catalogue(factory, encoder, config, catalogue)
    }

    /// Build an environment with an explicit (possibly multi-dimensional) catalogue.
    pub fn with_catalogue(
        factory: F,
        encoder: impl StateEncoder<F::Engine> + 'static,
        config: EnvConfig,
        catalogue: ActionCatalogue,
    ) -> Result<Self, EnvError> {
        config.validate()?;

        if catalogue.action_count() != factory.num_distinct_actions() {
            return Err(EnvError::Config(format!(
                "catalogue declares {} actions, game has {}",
                catalogue.action_count(),
                factory.num_distinct_actions()
            )));
        }
        let catalogue = match config.mode {
            AgentMode::Multi if !catalogue.has_noop() => {
                if catalogue.collides_with_noop() {
                    return Err(EnvError::Config(format!(
                        "a catalogue entry equals the no-op vector ({})",
                        NOOP_ACTION
                    )));
                }
                catalogue.with_noop()
            }
            _ => catalogue,
        };

        let agent_count = factory.num_players();
        if agent_count == 0 || agent_count > 255 {
            return Err(EnvError::Config(format!(
                "unsupported agent count {}",
                agent_count
            )));
        }

        let observation_size = encoder.observation_size();
        let variables = variable::describe(
            observation_size,
            catalogue.dimensions(),
            config.action_bounds,
            config.exploration_noise,
        );
        let rewards = RewardAccountant::new(config.terminal_reward, Box::new(ZeroReward));

        Ok(Self {
            factory,
            config,
            guard: LegalityGuard::new(catalogue),
            resolver: ChanceResolver::new(),
            encoder: Box::new(encoder),
            rewards,
            variables,
            agent_count,
            observation_size,
            episode: None,
        })
    }

    /// Replace the in-progress reward strategy (default: zero).
    #[must_use]
    pub fn with_in_progress_reward(
        mut self,
        strategy: impl InProgressReward<F::Engine> + 'static,
    ) -> Self {
        self.rewards.set_in_progress(Box::new(strategy));
        self
    }

    // === Setup metadata ===

    /// Ordered variable descriptors: state variables, then action variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Declared action catalogue.
    pub fn catalogue(&self) -> &ActionCatalogue {
        self.guard.catalogue()
    }

    /// Length of every observation.
    #[must_use]
    pub fn observation_size(&self) -> usize {
        self.observation_size
    }

    /// Number of agents in the game.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    /// Observations per step: 1 in single-agent mode, one per agent otherwise.
    #[must_use]
    pub fn observation_slots(&self) -> usize {
        match self.config.mode {
            AgentMode::Single => 1,
            AgentMode::Multi => self.agent_count,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    // === Episode state ===

    /// The current episode, if any.
    pub fn episode(&self) -> Option<&Episode<F::Engine>> {
        self.episode.as_ref()
    }

    /// Steps taken in the current episode (0 without one).
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.episode.as_ref().map_or(0, |e| e.steps)
    }

    /// Termination kind of the current episode.
    #[must_use]
    pub fn termination(&self) -> Option<TerminationKind> {
        self.episode.as_ref().map(|e| e.termination)
    }

    /// Legal engine actions at the current node.
    #[must_use]
    pub fn legal_actions(&self) -> Option<Vec<ActionId>> {
        self.episode
            .as_ref()
            .filter(|e| !e.termination.is_done())
            .map(|e| e.handle.engine().legal_actions())
    }

    /// Agent to act at the current node.
    #[must_use]
    pub fn active_agent(&self) -> Option<AgentId> {
        self.episode
            .as_ref()
            .filter(|e| !e.termination.is_done())
            .and_then(|e| e.handle.engine().current_player().agent())
            .filter(|agent| agent.index() < self.agent_count)
    }

    /// Whether `agent` has failed in the current episode.
    #[must_use]
    pub fn is_failed(&self, agent: AgentId) -> bool {
        self.episode
            .as_ref()
            .map_or(false, |e| e.handle.is_agent_failed(agent))
    }

    /// Re-encode the current observations without stepping.
    pub fn observe(&self) -> Result<Vec<Observation>, EnvError> {
        let episode = self.episode.as_ref().ok_or(EnvError::NoEpisode)?;
        encode_all(
            self.encoder.as_ref(),
            self.config.mode,
            &episode.handle,
            self.observation_size,
        )
    }

    // === Episode control ===

    /// Start a new episode.
    ///
    /// Builds a fresh game, seeds the episode's own random stream, clears all
    /// failure state, resolves any opening chance nodes and returns the
    /// initial observations.
    pub fn reset(&mut self, seed: EpisodeSeed) -> Result<Vec<Observation>, EnvError> {
        self.episode = None;
        self.reset_episode(seed).map_err(|err| self.discard(err))
    }

    /// Take one step.
    pub fn step(&mut self, request: &ActionRequest) -> Result<StepResult, EnvError> {
        self.step_episode(request).map_err(|err| self.discard(err))
    }

    fn reset_episode(&mut self, seed: EpisodeSeed) -> Result<Vec<Observation>, EnvError> {
        let mut handle = GameHandle::new(self.factory.new_game());
        if handle.agent_count() != self.agent_count {
            return Err(EnvError::inconsistency(
                format!(
                    "game has {} players, environment was built for {}",
                    handle.agent_count(),
                    self.agent_count
                ),
                handle.engine().observation(DEFAULT_AGENT).raw(),
            ));
        }

        let mut rng = EpisodeRng::new(seed.value());
        self.rewards.reset();
        let dealt = self.resolver.resolve(handle.engine_mut(), &mut rng)?;

        let termination = if handle.engine().is_terminal() {
            TerminationKind::Terminal
        } else {
            TerminationKind::Ongoing
        };

        let observations = encode_all(
            self.encoder.as_ref(),
            self.config.mode,
            &handle,
            self.observation_size,
        )?;

        debug!(
            "reset episode ({}, seed {}): {} agents, {} chance outcomes",
            seed,
            seed.value(),
            self.agent_count,
            dealt
        );

        self.episode = Some(Episode {
            handle,
            rng,
            seed,
            steps: 0,
            termination,
        });

        Ok(observations)
    }

    fn step_episode(&mut self, request: &ActionRequest) -> Result<StepResult, EnvError> {
        let mode = self.config.mode;
        let max_steps = self.config.max_steps;
        let penalty = self.config.illegal_action_penalty;
        let agent_count = self.agent_count;

        let episode = self.episode.as_mut().ok_or(EnvError::NoEpisode)?;
        if episode.termination.is_done() {
            return Err(EnvError::EpisodeOver(episode.termination));
        }
        check_shape(mode, agent_count, self.guard.catalogue().dimensions(), request)?;

        episode.steps += 1;

        let engine = episode.handle.engine();
        let mover = match engine.current_player() {
            ActivePlayer::Agent(agent) if agent.index() < agent_count => agent,
            other => {
                return Err(EnvError::inconsistency(
                    format!("no agent to act at a live node (player {})", other.to_raw()),
                    engine.observation(DEFAULT_AGENT).raw(),
                ))
            }
        };
        let legal = engine.legal_actions();

        let verdict = match request {
            ActionRequest::Single(values) => self.guard.check_single(mover, &legal, values),
            ActionRequest::PerAgent(values) => self.guard.check_multi(mover, &legal, values),
        };

        episode.termination = match verdict {
            Verdict::Accept { agent, action } => {
                trace!("step {}: {} plays {}", episode.steps, agent, action);
                episode.handle.engine_mut().apply_action(action);
                self.resolver
                    .resolve(episode.handle.engine_mut(), &mut episode.rng)?;

                if episode.handle.engine().is_terminal() {
                    TerminationKind::Terminal
                } else if episode.steps >= max_steps {
                    TerminationKind::Truncated
                } else {
                    TerminationKind::Ongoing
                }
            }
            Verdict::Reject(offenders) => {
                debug_assert!(!offenders.is_empty(), "rejection without an offender");
                for (agent, reason) in offenders {
                    debug!(
                        "step {}: rejected {} ({:?}), legal {:?}",
                        episode.steps, agent, reason, legal
                    );
                    episode.handle.mark_failed(agent, penalty);
                }
                TerminationKind::Terminal
            }
        };

        let observations = encode_all(
            self.encoder.as_ref(),
            mode,
            &episode.handle,
            self.observation_size,
        )?;

        let reward = match mode {
            AgentMode::Single => RewardSignal::Scalar(self.rewards.scalar(&episode.handle, mover)),
            AgentMode::Multi => RewardSignal::PerAgent(self.rewards.rewards(&episode.handle)),
        };

        trace!(
            "step {}: reward {:?}, {:?}",
            episode.steps,
            reward.to_vec(),
            episode.termination
        );

        Ok(StepResult {
            observations,
            reward,
            termination: episode.termination,
        })
    }

    /// Drop the episode on a fatal error; misuse errors leave it intact.
    fn discard(&mut self, err: EnvError) -> EnvError {
        if err.is_fatal() {
            error!("aborting episode: {}", err);
            self.episode = None;
        }
        err
    }
}

fn check_shape(
    mode: AgentMode,
    agent_count: usize,
    dimensions: usize,
    request: &ActionRequest,
) -> Result<(), EnvError> {
    let shape_error = |expected: String| EnvError::RequestShape {
        expected,
        got: describe_request(request),
    };

    match (mode, request) {
        (AgentMode::Single, ActionRequest::Single(values)) if values.len() == dimensions => Ok(()),
        (AgentMode::Single, _) => Err(shape_error(format!(
            "one action vector of {} values",
            dimensions
        ))),
        (AgentMode::Multi, ActionRequest::PerAgent(values))
            if values.len() == agent_count && values.iter().all(|v| v.len() == dimensions) =>
        {
            Ok(())
        }
        (AgentMode::Multi, _) => Err(shape_error(format!(
            "{} action vectors of {} values",
            agent_count, dimensions
        ))),
    }
}

fn describe_request(request: &ActionRequest) -> String {
    match request {
        ActionRequest::Single(values) => format!("single vector of {} values", values.len()),
        ActionRequest::PerAgent(values) => format!(
            "{} vectors of lengths {:?}",
            values.len(),
            values.iter().map(|v| v.len()).collect::<Vec<_>>()
        ),
    }
}

fn encode_all<E: GameEngine>(
    encoder: &dyn StateEncoder<E>,
    mode: AgentMode,
    handle: &GameHandle<E>,
    size: usize,
) -> Result<Vec<Observation>, EnvError> {
    let engine = handle.engine();

    // Undefined active players are reported with the offending observation
    // in both modes, before any encoder sees the state.
    let agent = perspective(engine.current_player(), handle.agent_count()).map_err(|err| {
        match err {
            EnvError::EngineInconsistency { reason, .. } => {
                EnvError::inconsistency(reason, engine.observation(DEFAULT_AGENT).raw())
            }
            other => other,
        }
    })?;

    let agents: Vec<AgentId> = match mode {
        AgentMode::Single => vec![agent],
        AgentMode::Multi => AgentId::all(handle.agent_count()).collect(),
    };

    agents
        .into_iter()
        .map(|agent| {
            let observation = encoder.encode(engine, agent)?;
            if observation.len() != size {
                return Err(EnvError::inconsistency(
                    format!(
                        "encoded {} features for {}, declared {}",
                        observation.len(),
                        agent,
                        size
                    ),
                    engine.observation(agent).raw(),
                ));
            }
            Ok(observation)
        })
        .collect()
}
