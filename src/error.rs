//! Crate error type.
//!
//! Illegal actions and budget exhaustion are *not* errors: they surface as a
//! termination kind plus a reward. Only conditions the adapter cannot
//! translate faithfully, or caller misuse, come back as `Err`.

use thiserror::Error;

use crate::env::TerminationKind;

/// Errors returned by the environment adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    /// The engine produced something the adapter cannot encode without
    /// guessing: a malformed native observation, or an undefined active
    /// player outside a terminal or chance node.
    #[error("engine inconsistency: {reason} (raw observation: {raw:?})")]
    EngineInconsistency { reason: String, raw: String },

    /// `step` was called before any `reset`, or after the episode was discarded.
    #[error("no episode in progress; call reset first")]
    NoEpisode,

    /// `step` was called after the episode ended.
    #[error("episode already ended ({0:?})")]
    EpisodeOver(TerminationKind),

    /// The action request does not match the agent mode or agent count.
    #[error("action request shape mismatch: expected {expected}, got {got}")]
    RequestShape { expected: String, got: String },

    /// Invalid environment configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Trajectory (de)serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl EnvError {
    /// Build an engine inconsistency error.
    pub fn inconsistency(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        EnvError::EngineInconsistency {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Whether this error must abort the current episode.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, EnvError::EngineInconsistency { .. })
    }
}

impl From<bincode::Error> for EnvError {
    fn from(err: bincode::Error) -> Self {
        EnvError::Serialization(err.to_string())
    }
}
