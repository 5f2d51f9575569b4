//! Variable descriptors declared to the training loop at setup.
//!
//! The ordering is part of the contract: state variables first, one per
//! observation slot, then one Action variable per action dimension.

use serde::{Deserialize, Serialize};

use super::config::ActionBounds;

/// Kind of a declared variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    State,
    Action,
}

/// One declared variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    /// Bounds hint (Action variables only).
    pub bounds: Option<ActionBounds>,
    /// Exploration noise hint (Action variables only).
    pub exploration_noise: Option<f64>,
}

impl Variable {
    /// A state variable.
    pub fn state(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::State,
            bounds: None,
            exploration_noise: None,
        }
    }

    /// An action variable without hints.
    pub fn action(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Action,
            bounds: None,
            exploration_noise: None,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Option<ActionBounds>) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn with_exploration_noise(mut self, noise: Option<f64>) -> Self {
        self.exploration_noise = noise;
        self
    }
}

/// Build the ordered descriptor list for an environment.
///
/// State variables are named `State Variable i`. A single action dimension
/// is named `Move`; several are named `Move i`.
pub fn describe(
    state_count: usize,
    action_dimensions: usize,
    bounds: Option<ActionBounds>,
    exploration_noise: Option<f64>,
) -> Vec<Variable> {
    let states = (0..state_count).map(|i| Variable::state(format!("State Variable {}", i)));

    let actions = (0..action_dimensions).map(|i| {
        let name = if action_dimensions == 1 {
            "Move".to_string()
        } else {
            format!("Move {}", i)
        };
        Variable::action(name)
            .with_bounds(bounds)
            .with_exploration_noise(exploration_noise)
    });

    states.chain(actions).collect()
}
