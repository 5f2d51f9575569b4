//! State encoding.
//!
//! Projects the engine's native observation into a fixed-length vector.
//! The length is declared once by the encoder and checked on every encode,
//! so the training loop sees one shape for the whole lifetime of an
//! environment.

use serde::{Deserialize, Serialize};

use crate::core::{AgentId, DEFAULT_AGENT};
use crate::engine::{ActivePlayer, GameEngine, NativeObservation};
use crate::error::EnvError;

/// Value of a slot whose field is not available (e.g. an unrevealed card).
///
/// Distinct from every in-domain value the shipped encoders produce.
pub const UNKNOWN_FEATURE: f32 = -1.0;

/// Fixed-length numeric encoding of one agent's view. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    features: Vec<f32>,
}

impl Observation {
    /// Wrap encoded features.
    pub fn new(features: Vec<f32>) -> Self {
        Self { features }
    }

    /// Observation with every slot set to `UNKNOWN_FEATURE`.
    pub fn unknown(len: usize) -> Self {
        Self {
            features: vec![UNKNOWN_FEATURE; len],
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the observation has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Slot value.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.features.get(index).copied()
    }

    /// All slots.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.features
    }

    /// Features as `f64`, the width most training loops consume.
    #[must_use]
    pub fn to_f64(&self) -> Vec<f64> {
        self.features.iter().map(|&v| v as f64).collect()
    }
}

/// Resolve whose perspective to encode from.
///
/// A chance or terminal node has no acting agent; `DEFAULT_AGENT` stands in
/// so the observation shape stays constant. Anything else without an agent
/// (simultaneous, invalid, out-of-range id) is an engine inconsistency.
pub fn perspective(active: ActivePlayer, agent_count: usize) -> Result<AgentId, EnvError> {
    match active {
        ActivePlayer::Agent(agent) if agent.index() < agent_count => Ok(agent),
        ActivePlayer::Agent(agent) => Err(EnvError::inconsistency(
            format!("active player out of range for {} agents", agent_count),
            format!("current player {}", agent.index()),
        )),
        ActivePlayer::Chance | ActivePlayer::Terminal => Ok(DEFAULT_AGENT),
        ActivePlayer::Simultaneous => Err(EnvError::inconsistency(
            "simultaneous node in a sequential game",
            format!("current player {}", active.to_raw()),
        )),
        ActivePlayer::Invalid(raw) => Err(EnvError::inconsistency(
            "undefined active player outside terminal/chance",
            format!("current player {}", raw),
        )),
    }
}

/// Encodes engine state into fixed-length observations.
pub trait StateEncoder<E: GameEngine>: Send + Sync {
    /// Encode the state from `agent`'s point of view.
    fn encode(&self, engine: &E, agent: AgentId) -> Result<Observation, EnvError>;

    /// Length of every observation this encoder produces.
    fn observation_size(&self) -> usize;
}

/// Passes through a native tensor of the declared length.
#[derive(Clone, Debug)]
pub struct TensorEncoder {
    size: usize,
}

impl TensorEncoder {
    /// Create an encoder expecting tensors of `size` values.
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl<E: GameEngine> StateEncoder<E> for TensorEncoder {
    fn encode(&self, engine: &E, agent: AgentId) -> Result<Observation, EnvError> {
        match engine.observation(agent) {
            NativeObservation::Tensor(values) if values.len() == self.size => {
                Ok(Observation::new(values))
            }
            NativeObservation::Tensor(values) => Err(EnvError::inconsistency(
                format!(
                    "tensor observation has {} values, expected {}",
                    values.len(),
                    self.size
                ),
                format!("{:?}", values),
            )),
            NativeObservation::Text(text) => Err(EnvError::inconsistency(
                "expected a tensor observation, got text",
                text,
            )),
        }
    }

    fn observation_size(&self) -> usize {
        self.size
    }
}
