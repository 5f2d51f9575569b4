//! Game engine contract.
//!
//! The adapter never looks inside a game. Everything it needs is behind
//! `GameEngine` (one live game instance) and `GameFactory` (fresh
//! instances). Engines may be in-process Rust or a proxy over some boundary;
//! the adapter assumes nothing beyond these methods.

use serde::{Deserialize, Serialize};

use crate::core::{ActionId, AgentId};

/// Who acts at the current node, as reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivePlayer {
    /// A regular agent's turn.
    Agent(AgentId),
    /// The next transition is a random draw.
    Chance,
    /// The game is over.
    Terminal,
    /// Several agents act at once. Not supported by the sequential adapter.
    Simultaneous,
    /// The engine reported something that is none of the above.
    Invalid(i64),
}

impl ActivePlayer {
    /// OpenSpiel-style code for a chance node.
    pub const CHANCE_CODE: i64 = -1;
    /// OpenSpiel-style code for a simultaneous node.
    pub const SIMULTANEOUS_CODE: i64 = -2;
    /// OpenSpiel-style code for an invalid player.
    pub const INVALID_CODE: i64 = -3;
    /// OpenSpiel-style code for a terminal node.
    pub const TERMINAL_CODE: i64 = -4;

    /// Map an integer player code, as engines behind a boundary report it.
    ///
    /// ```
    /// use turn_env::core::AgentId;
    /// use turn_env::engine::ActivePlayer;
    ///
    /// assert_eq!(ActivePlayer::from_raw(1, 2), ActivePlayer::Agent(AgentId::new(1)));
    /// assert_eq!(ActivePlayer::from_raw(-4, 2), ActivePlayer::Terminal);
    /// assert_eq!(ActivePlayer::from_raw(5, 2), ActivePlayer::Invalid(5));
    /// ```
    #[must_use]
    pub fn from_raw(raw: i64, num_players: usize) -> Self {
        match raw {
            Self::CHANCE_CODE => ActivePlayer::Chance,
            Self::SIMULTANEOUS_CODE => ActivePlayer::Simultaneous,
            Self::TERMINAL_CODE => ActivePlayer::Terminal,
            _ => match AgentId::checked(raw, num_players) {
                Some(agent) => ActivePlayer::Agent(agent),
                None => ActivePlayer::Invalid(raw),
            },
        }
    }

    /// Integer code for this player (inverse of `from_raw`).
    #[must_use]
    pub fn to_raw(self) -> i64 {
        match self {
            ActivePlayer::Agent(agent) => agent.0 as i64,
            ActivePlayer::Chance => Self::CHANCE_CODE,
            ActivePlayer::Simultaneous => Self::SIMULTANEOUS_CODE,
            ActivePlayer::Terminal => Self::TERMINAL_CODE,
            ActivePlayer::Invalid(raw) => raw,
        }
    }

    /// The acting agent, if this is a regular turn.
    #[must_use]
    pub fn agent(self) -> Option<AgentId> {
        match self {
            ActivePlayer::Agent(agent) => Some(agent),
            _ => None,
        }
    }
}

/// Observation in the engine's own format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NativeObservation {
    /// Information-state string.
    Text(String),
    /// Flat numeric tensor.
    Tensor(Vec<f32>),
}

impl NativeObservation {
    /// Raw rendering for diagnostics.
    #[must_use]
    pub fn raw(&self) -> String {
        match self {
            NativeObservation::Text(text) => text.clone(),
            NativeObservation::Tensor(values) => format!("{:?}", values),
        }
    }
}

/// One live game instance.
///
/// ## Implementation Notes
///
/// - `legal_actions` at a chance node lists the possible outcomes
/// - `chance_outcomes` may weight them; the default is uniform
/// - `apply_action` is called only with legal actions
/// - `rewards` is only meaningful once `is_terminal` is true
pub trait GameEngine {
    /// Number of players in this game.
    fn num_players(&self) -> usize;

    /// Whether the next transition is a random draw.
    fn is_chance_node(&self) -> bool;

    /// Legal actions at the current node (outcomes, at a chance node).
    fn legal_actions(&self) -> Vec<ActionId>;

    /// Who acts at the current node.
    fn current_player(&self) -> ActivePlayer;

    /// Apply an action (or chance outcome).
    fn apply_action(&mut self, action: ActionId);

    /// Whether the game is over.
    fn is_terminal(&self) -> bool;

    /// Observation from an agent's point of view.
    fn observation(&self, agent: AgentId) -> NativeObservation;

    /// Per-player returns. Valid only once terminal.
    fn rewards(&self) -> Vec<f64>;

    // === Provided ===

    /// Weighted chance outcomes at a chance node.
    ///
    /// Default: uniform over `legal_actions`.
    fn chance_outcomes(&self) -> Vec<(ActionId, f64)> {
        let outcomes = self.legal_actions();
        if outcomes.is_empty() {
            return Vec::new();
        }
        let p = 1.0 / outcomes.len() as f64;
        outcomes.into_iter().map(|a| (a, p)).collect()
    }
}

/// Creates fresh game instances: `new(params) -> handle`.
///
/// The factory holds the game parameters; each call yields an independent
/// instance in its initial state.
pub trait GameFactory {
    type Engine: GameEngine;

    /// Create a game in its initial state.
    fn new_game(&self) -> Self::Engine;

    /// Number of players every created game has.
    fn num_players(&self) -> usize;

    /// Number of distinct engine actions, i.e. the catalogue size.
    ///
    /// Engines only report legal actions per node, so this cannot be
    /// recovered from a single state.
    fn num_distinct_actions(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_player_roundtrip() {
        for raw in [-4, -3, -2, -1, 0, 1] {
            assert_eq!(ActivePlayer::from_raw(raw, 2).to_raw(), raw);
        }
    }

    #[test]
    fn test_active_player_out_of_range() {
        assert_eq!(ActivePlayer::from_raw(2, 2), ActivePlayer::Invalid(2));
        assert_eq!(ActivePlayer::from_raw(-7, 2), ActivePlayer::Invalid(-7));
        assert_eq!(ActivePlayer::from_raw(-3, 2), ActivePlayer::Invalid(-3));
    }

    #[test]
    fn test_active_player_agent() {
        assert_eq!(
            ActivePlayer::Agent(AgentId::new(1)).agent(),
            Some(AgentId::new(1))
        );
        assert_eq!(ActivePlayer::Chance.agent(), None);
    }

    #[test]
    fn test_native_observation_raw() {
        assert_eq!(NativeObservation::Text("0, 4".into()).raw(), "0, 4");
        assert_eq!(NativeObservation::Tensor(vec![1.0, 0.0]).raw(), "[1.0, 0.0]");
    }
}
