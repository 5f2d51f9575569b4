//! Environment configuration.
//!
//! Everything here is fixed when the environment is built; none of it can be
//! renegotiated mid-episode. Configs deserialize with defaults so a training
//! loop can supply only the fields it cares about.

use serde::{Deserialize, Serialize};

use crate::error::EnvError;

/// Default per-episode step budget.
pub const DEFAULT_MAX_STEPS: usize = 500;

/// Default reward for an illegal action.
pub const DEFAULT_ILLEGAL_ACTION_PENALTY: f64 = -100.0;

/// How the training loop drives the agents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentMode {
    /// One action per step, applied for whoever is to act.
    #[default]
    Single,
    /// Every agent submits an action every step; idle agents submit the no-op.
    Multi,
}

/// Which engine reward a single-agent environment reports at terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SingleAgentReward {
    /// Terminal reward of the agent that made the final move.
    #[default]
    Mover,
    /// Largest terminal reward over all agents.
    Maximum,
}

/// Bounds hint for an Action variable. Consumed by the training loop only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Environment configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Single- or multi-agent driving.
    pub mode: AgentMode,

    /// Steps after which a non-terminal episode is truncated.
    pub max_steps: usize,

    /// Reward routed to an agent whose action was rejected.
    pub illegal_action_penalty: f64,

    /// Terminal reward selection in single-agent mode.
    pub terminal_reward: SingleAgentReward,

    /// Optional bounds hint copied into Action variable descriptors.
    pub action_bounds: Option<ActionBounds>,

    /// Optional exploration noise hint copied into Action variable descriptors.
    pub exploration_noise: Option<f64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            mode: AgentMode::Single,
            max_steps: DEFAULT_MAX_STEPS,
            illegal_action_penalty: DEFAULT_ILLEGAL_ACTION_PENALTY,
            terminal_reward: SingleAgentReward::Mover,
            action_bounds: None,
            exploration_noise: None,
        }
    }
}

impl EnvConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config in multi-agent mode.
    pub fn multi_agent() -> Self {
        Self::default().with_mode(AgentMode::Multi)
    }

    /// Set the agent mode.
    #[must_use]
    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the step budget.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the illegal-action penalty.
    #[must_use]
    pub fn with_illegal_action_penalty(mut self, penalty: f64) -> Self {
        self.illegal_action_penalty = penalty;
        self
    }

    /// Set the single-agent terminal reward policy.
    #[must_use]
    pub fn with_terminal_reward(mut self, policy: SingleAgentReward) -> Self {
        self.terminal_reward = policy;
        self
    }

    /// Set the action bounds hint.
    #[must_use]
    pub fn with_action_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.action_bounds = Some(ActionBounds { lower, upper });
        self
    }

    /// Set the exploration noise hint.
    #[must_use]
    pub fn with_exploration_noise(mut self, noise: f64) -> Self {
        self.exploration_noise = Some(noise);
        self
    }

    /// Check the config for values the adapter cannot honour.
    pub fn validate(&self) -> Result<(), EnvError> {
        if self.max_steps == 0 {
            return Err(EnvError::Config("max_steps must be at least 1".into()));
        }
        if !self.illegal_action_penalty.is_finite() {
            return Err(EnvError::Config(
                "illegal_action_penalty must be finite".into(),
            ));
        }
        if let Some(bounds) = self.action_bounds {
            if !(bounds.lower <= bounds.upper) {
                return Err(EnvError::Config(format!(
                    "action bounds are inverted: {} > {}",
                    bounds.lower, bounds.upper
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnvConfig::default();
        assert_eq!(config.mode, AgentMode::Single);
        assert_eq!(config.max_steps, 500);
        assert_eq!(config.illegal_action_penalty, -100.0);
        assert_eq!(config.terminal_reward, SingleAgentReward::Mover);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EnvConfig::multi_agent()
            .with_max_steps(20)
            .with_illegal_action_penalty(-5.0)
            .with_action_bounds(0.0, 2.0)
            .with_exploration_noise(0.1);

        assert_eq!(config.mode, AgentMode::Multi);
        assert_eq!(config.max_steps, 20);
        assert_eq!(config.illegal_action_penalty, -5.0);
        assert_eq!(config.action_bounds, Some(ActionBounds { lower: 0.0, upper: 2.0 }));
        assert_eq!(config.exploration_noise, Some(0.1));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let err = EnvConfig::new().with_max_steps(0).validate().unwrap_err();
        assert!(matches!(err, EnvError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_nan_penalty() {
        assert!(EnvConfig::new()
            .with_illegal_action_penalty(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        assert!(EnvConfig::new().with_action_bounds(3.0, 1.0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EnvConfig =
            serde_json::from_str(r#"{"mode": "Multi", "max_steps": 64}"#).unwrap();

        assert_eq!(config.mode, AgentMode::Multi);
        assert_eq!(config.max_steps, 64);
        assert_eq!(config.illegal_action_penalty, DEFAULT_ILLEGAL_ACTION_PENALTY);
    }
}
