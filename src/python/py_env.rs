//! Environment bindings for Python.

use numpy::PyArray1;
use pyo3::prelude::*;

use crate::core::{EpisodeSeed, LAUNCH_STRIDE};
use crate::engine::GameFactory;
use crate::env::{ConstantReward, GameEnv};
use crate::games::leduc::{LeducConfig, LeducEncoder};
use crate::games::tic_tac_toe::{HistoryEncoder, TicTacToeFactory};

use super::py_core::{
    action_request, env_config, observations_to_numpy, reward_to_py, to_py_err, variables_to_py,
};

type StepOutput<'py> = (Vec<Bound<'py, PyArray1<f32>>>, PyObject, &'static str);

fn reset<'py, F>(
    py: Python<'py>,
    env: &mut GameEnv<F>,
    sample_id: u64,
    launch_id: u64,
) -> PyResult<Vec<Bound<'py, PyArray1<f32>>>>
where
    F: GameFactory,
    F::Engine: 'static,
{
    if launch_id >= LAUNCH_STRIDE {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "launch_id must be below {}",
            LAUNCH_STRIDE
        )));
    }
    let observations = env
        .reset(EpisodeSeed::new(sample_id, launch_id))
        .map_err(to_py_err)?;
    Ok(observations_to_numpy(py, &observations))
}

fn step<'py, F>(
    py: Python<'py>,
    env: &mut GameEnv<F>,
    actions: Vec<Vec<f64>>,
) -> PyResult<StepOutput<'py>>
where
    F: GameFactory,
    F::Engine: 'static,
{
    let request = action_request(env.config().mode, actions);
    let result = env.step(&request).map_err(to_py_err)?;
    Ok((
        observations_to_numpy(py, &result.observations),
        reward_to_py(py, &result.reward),
        result.termination.as_str(),
    ))
}

/// Leduc hold'em environment.
///
/// Observations are the 10-slot information-string encoding. In-progress
/// steps pay a constant reward (default 1.0).
#[pyclass(name = "LeducEnv")]
pub struct PyLeducEnv {
    env: GameEnv<LeducConfig>,
}

#[pymethods]
impl PyLeducEnv {
    #[new]
    #[pyo3(signature = (
        multi_agent = false,
        max_steps = 500,
        illegal_action_penalty = -100.0,
        maximum_terminal_reward = true,
        step_reward = 1.0
    ))]
    fn new(
        multi_agent: bool,
        max_steps: usize,
        illegal_action_penalty: f64,
        maximum_terminal_reward: bool,
        step_reward: f64,
    ) -> PyResult<Self> {
        let config = env_config(
            multi_agent,
            max_steps,
            illegal_action_penalty,
            maximum_terminal_reward,
        );
        let env = GameEnv::new(LeducConfig::new(), LeducEncoder::new(), config)
            .map_err(to_py_err)?
            .with_in_progress_reward(ConstantReward(step_reward));
        Ok(Self { env })
    }

    /// Start an episode; returns the initial observation(s).
    fn reset<'py>(
        &mut self,
        py: Python<'py>,
        sample_id: u64,
        launch_id: u64,
    ) -> PyResult<Vec<Bound<'py, PyArray1<f32>>>> {
        reset(py, &mut self.env, sample_id, launch_id)
    }

    /// Take a step with `[[action]]` (single) or one `[action]` per agent.
    fn step<'py>(&mut self, py: Python<'py>, actions: Vec<Vec<f64>>) -> PyResult<StepOutput<'py>> {
        step(py, &mut self.env, actions)
    }

    fn variables(&self) -> Vec<(String, &'static str)> {
        variables_to_py(self.env.variables())
    }

    fn possible_actions(&self) -> Vec<Vec<f64>> {
        self.env.catalogue().possible_actions()
    }

    fn legal_actions(&self) -> Vec<i64> {
        self.env.legal_actions().unwrap_or_default()
    }

    #[getter]
    fn step_count(&self) -> usize {
        self.env.step_count()
    }

    #[getter]
    fn observation_size(&self) -> usize {
        self.env.observation_size()
    }

    fn __repr__(&self) -> String {
        format!(
            "LeducEnv(mode={:?}, steps={})",
            self.env.config().mode,
            self.env.step_count()
        )
    }
}

/// Tic-tac-toe environment.
///
/// Observations are the acting agent followed by the move history.
#[pyclass(name = "TicTacToeEnv")]
pub struct PyTicTacToeEnv {
    env: GameEnv<TicTacToeFactory>,
}

#[pymethods]
impl PyTicTacToeEnv {
    #[new]
    #[pyo3(signature = (
        multi_agent = false,
        max_steps = 500,
        illegal_action_penalty = -100.0,
        maximum_terminal_reward = true
    ))]
    fn new(
        multi_agent: bool,
        max_steps: usize,
        illegal_action_penalty: f64,
        maximum_terminal_reward: bool,
    ) -> PyResult<Self> {
        let config = env_config(
            multi_agent,
            max_steps,
            illegal_action_penalty,
            maximum_terminal_reward,
        );
        let env =
            GameEnv::new(TicTacToeFactory, HistoryEncoder::new(), config).map_err(to_py_err)?;
        Ok(Self { env })
    }

    fn reset<'py>(
        &mut self,
        py: Python<'py>,
        sample_id: u64,
        launch_id: u64,
    ) -> PyResult<Vec<Bound<'py, PyArray1<f32>>>> {
        reset(py, &mut self.env, sample_id, launch_id)
    }

    fn step<'py>(&mut self, py: Python<'py>, actions: Vec<Vec<f64>>) -> PyResult<StepOutput<'py>> {
        step(py, &mut self.env, actions)
    }

    fn variables(&self) -> Vec<(String, &'static str)> {
        variables_to_py(self.env.variables())
    }

    fn possible_actions(&self) -> Vec<Vec<f64>> {
        self.env.catalogue().possible_actions()
    }

    fn legal_actions(&self) -> Vec<i64> {
        self.env.legal_actions().unwrap_or_default()
    }

    #[getter]
    fn step_count(&self) -> usize {
        self.env.step_count()
    }

    #[getter]
    fn observation_size(&self) -> usize {
        self.env.observation_size()
    }

    fn __repr__(&self) -> String {
        format!(
            "TicTacToeEnv(mode={:?}, steps={})",
            self.env.config().mode,
            self.env.step_count()
        )
    }
}
