//! Python bindings for the reference environments.
//!
//! # Quick Start
//!
//! ```python
//! import turn_env
//!
//! env = turn_env.LeducEnv()
//! [obs] = env.reset(sample_id=0, launch_id=0)
//!
//! termination = "Ongoing"
//! while termination == "Ongoing":
//!     action = env.legal_actions()[0]
//!     [obs], reward, termination = env.step([[action]])
//! ```

use pyo3::prelude::*;

mod py_core;
mod py_env;

pub use py_env::*;

/// turn_env: turn-based games as fixed-shape RL environments.
#[pymodule]
fn turn_env(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLeducEnv>()?;
    m.add_class::<PyTicTacToeEnv>()?;
    m.add("LAUNCH_STRIDE", crate::core::LAUNCH_STRIDE)?;
    Ok(())
}
