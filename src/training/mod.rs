//! Rollout infrastructure for driving environments from a training loop.
//!
//! ## Overview
//!
//! - **Policy**: chooses an action request at each step boundary
//! - **run_episode**: drives one environment from reset to termination
//! - **RolloutWorker**: runs independent episodes in parallel
//! - **Trajectory**: the recorded episode, serializable with bincode
//! - **TrajectoryBuffer**: FIFO store with reproducible batch sampling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use turn_env::training::{RandomLegalPolicy, RolloutConfig, RolloutWorker, TrajectoryBuffer};
//!
//! let worker = RolloutWorker::new(
//!     || GameEnv::new(LeducConfig::new(), LeducEncoder::new(), EnvConfig::new()),
//!     || RandomLegalPolicy,
//!     RolloutConfig::new().with_episodes(64),
//! );
//!
//! let mut buffer = TrajectoryBuffer::new(10_000);
//! buffer.extend(worker.collect()?);
//! let batch = buffer.sample_batch(32, 7);
//! ```

pub mod rollout;
pub mod trajectory;

pub use rollout::{
    run_episode, Policy, PolicyContext, RandomLegalPolicy, RolloutConfig, RolloutWorker,
    ScriptedPolicy, UniformCataloguePolicy,
};
pub use trajectory::{Trajectory, TrajectoryBuffer, Transition};
