//! Episodic environment over a turn-based game engine.
//!
//! - `driver`: `GameEnv`, reset/step and the episode lifecycle
//! - `handle`: engine instance plus failure flags
//! - `legality`: accept/reject action requests
//! - `chance`: resolve chance nodes from the episode stream
//! - `encoder`: fixed-length observations
//! - `reward`: per-step reward accounting

pub mod chance;
pub mod driver;
pub mod encoder;
pub mod handle;
pub mod legality;
pub mod reward;

pub use chance::ChanceResolver;
pub use driver::{Episode, GameEnv, RewardSignal, StepResult, TerminationKind};
pub use encoder::{perspective, Observation, StateEncoder, TensorEncoder, UNKNOWN_FEATURE};
pub use handle::{GameHandle, NEUTRAL_PENALTY};
pub use legality::{LegalityGuard, RejectReason, Verdict};
pub use reward::{
    ConstantReward, InProgressReward, RecordShaping, RewardAccountant, ZeroReward,
};
