//! Game engine contract.
//!
//! Games implement `GameEngine` (and a `GameFactory` that builds them) to
//! define:
//! - Chance nodes and their outcomes
//! - Legal actions and turn order
//! - Terminal detection and returns
//! - Native observations
//!
//! The environment calls into these traits but never interprets
//! game-specific concepts directly.

pub mod engine;

pub use engine::{ActivePlayer, GameEngine, GameFactory, NativeObservation};
