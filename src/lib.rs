//! # rust-turn-env
//!
//! Turn-based games exposed as fixed-shape episodic environments for RL.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: The adapter never looks inside a game. Engines plug
//!    in through `GameEngine`/`GameFactory`.
//!
//! 2. **Fixed Shapes**: Every observation of an environment has the same
//!    length; the action catalogue and variable descriptors are declared once.
//!
//! 3. **Faithful Translation**: Illegal actions, chance nodes, turn order and
//!    terminal vs truncated endings are handled by construction, never left to
//!    the training loop.
//!
//! ## Architecture
//!
//! Each `step` runs Legality Guard → engine → Chance Resolver → State
//! Encoder → Reward Accountant, then hands control back to the caller.
//!
//! - **Per-Episode Randomness**: every episode owns a ChaCha8 stream seeded
//!   from `(sample_id, launch_id)`; there is no global RNG.
//!
//! - **Persistent Data Structures**: engine histories use `im` so engines
//!   clone in O(1).
//!
//! ## Modules
//!
//! - `core`: agents, action catalogue, RNG, configuration, variables
//! - `engine`: the game engine contract
//! - `env`: episode driver and its components
//! - `games`: reference engines (tic-tac-toe, Leduc hold'em)
//! - `training`: policies, rollouts, trajectories
//! - `error`: the crate error type

pub mod core;
pub mod engine;
pub mod env;
pub mod error;
pub mod games;
pub mod training;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::{
    ActionCatalogue, ActionId, ActionRequest, ActionVector, AgentId, AgentMap, AgentMode,
    EnvConfig, EpisodeRng, EpisodeSeed, SingleAgentReward, Variable, VariableKind,
    DEFAULT_AGENT, NOOP_ACTION,
};

pub use crate::engine::{ActivePlayer, GameEngine, GameFactory, NativeObservation};

pub use crate::env::{
    GameEnv, InProgressReward, Observation, RewardSignal, StateEncoder, StepResult,
    TerminationKind, UNKNOWN_FEATURE,
};

pub use crate::error::EnvError;

pub use crate::training::{
    run_episode, Policy, RandomLegalPolicy, RolloutConfig, RolloutWorker, Trajectory,
};
