//! Core adapter types: agents, actions, RNG, configuration, variables.
//!
//! These are game-agnostic. Games plug in through the `engine` contract;
//! nothing here knows any rules.

pub mod action;
pub mod config;
pub mod player;
pub mod rng;
pub mod variable;

pub use action::{ActionCatalogue, ActionId, ActionRequest, ActionVector, Decoded, NOOP_ACTION};
pub use config::{
    ActionBounds, AgentMode, EnvConfig, SingleAgentReward, DEFAULT_ILLEGAL_ACTION_PENALTY,
    DEFAULT_MAX_STEPS,
};
pub use player::{AgentId, AgentMap, DEFAULT_AGENT};
pub use rng::{EpisodeRng, EpisodeRngState, EpisodeSeed, LAUNCH_STRIDE};
pub use variable::{Variable, VariableKind};
