//! Shared conversions for the Python bindings.

use numpy::PyArray1;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::core::{ActionRequest, AgentMode, EnvConfig, SingleAgentReward, Variable, VariableKind};
use crate::env::{Observation, RewardSignal};
use crate::error::EnvError;

/// Map an adapter error onto a Python exception.
///
/// Misuse (bad shapes, bad config, stepping a finished episode) is a
/// `ValueError`; everything else is a `RuntimeError`.
pub fn to_py_err(err: EnvError) -> PyErr {
    match err {
        EnvError::RequestShape { .. } | EnvError::Config(_) | EnvError::EpisodeOver(_) => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Build an environment configuration from keyword arguments.
pub fn env_config(
    multi_agent: bool,
    max_steps: usize,
    illegal_action_penalty: f64,
    maximum_terminal_reward: bool,
) -> EnvConfig {
    let mode = if multi_agent {
        AgentMode::Multi
    } else {
        AgentMode::Single
    };
    let terminal = if maximum_terminal_reward {
        SingleAgentReward::Maximum
    } else {
        SingleAgentReward::Mover
    };
    EnvConfig::new()
        .with_mode(mode)
        .with_max_steps(max_steps)
        .with_illegal_action_penalty(illegal_action_penalty)
        .with_terminal_reward(terminal)
}

/// `[[a0], [a1], ...]` from Python, shaped for the mode.
pub fn action_request(mode: AgentMode, actions: Vec<Vec<f64>>) -> ActionRequest {
    match mode {
        AgentMode::Single if actions.len() == 1 => ActionRequest::single(&actions[0]),
        _ => ActionRequest::per_agent(&actions),
    }
}

pub fn observations_to_numpy<'py>(
    py: Python<'py>,
    observations: &[Observation],
) -> Vec<Bound<'py, PyArray1<f32>>> {
    observations
        .iter()
        .map(|obs| PyArray1::from_slice_bound(py, obs.as_slice()))
        .collect()
}

/// Scalar reward as a float, per-agent rewards as a list.
pub fn reward_to_py(py: Python<'_>, reward: &RewardSignal) -> PyObject {
    match reward {
        RewardSignal::Scalar(r) => r.into_py(py),
        RewardSignal::PerAgent(rs) => rs.as_slice().to_vec().into_py(py),
    }
}

/// Variable descriptors as `(name, kind)` pairs.
pub fn variables_to_py(variables: &[Variable]) -> Vec<(String, &'static str)> {
    variables
        .iter()
        .map(|v| {
            let kind = match v.kind {
                VariableKind::State => "State",
                VariableKind::Action => "Action",
            };
            (v.name.clone(), kind)
        })
        .collect()
}
