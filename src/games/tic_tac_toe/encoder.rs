//! Move-history encoder for tic-tac-toe.

use crate::core::AgentId;
use crate::engine::{GameEngine, NativeObservation};
use crate::env::{perspective, Observation, StateEncoder, UNKNOWN_FEATURE};
use crate::error::EnvError;

use super::game::{TicTacToe, CELLS};

/// Slot 0 holds the acting agent; slots 1..=9 hold the moves played so
/// far, in order, with `UNKNOWN_FEATURE` for moves not yet made.
#[derive(Clone, Copy, Debug, Default)]
pub struct HistoryEncoder;

impl HistoryEncoder {
    pub const SIZE: usize = CELLS + 1;

    pub fn new() -> Self {
        Self
    }
}

impl StateEncoder<TicTacToe> for HistoryEncoder {
    fn encode(&self, engine: &TicTacToe, agent: AgentId) -> Result<Observation, EnvError> {
        let text = match engine.observation(agent) {
            NativeObservation::Text(text) => text,
            NativeObservation::Tensor(values) => {
                return Err(EnvError::inconsistency(
                    "expected a move history, got a tensor",
                    format!("{:?}", values),
                ))
            }
        };

        let mut features = vec![UNKNOWN_FEATURE; Self::SIZE];
        features[0] = perspective(engine.current_player(), engine.num_players())?.index() as f32;

        let moves = text.split(", ").filter(|m| !m.is_empty());
        for (i, token) in moves.enumerate() {
            if i >= CELLS {
                return Err(EnvError::inconsistency("more moves than cells", text));
            }
            let cell: u8 = match token.trim().parse() {
                Ok(cell) if (cell as usize) < CELLS => cell,
                _ => {
                    return Err(EnvError::inconsistency(
                        format!("bad move token {:?}", token),
                        text,
                    ))
                }
            };
            features[i + 1] = cell as f32;
        }

        Ok(Observation::new(features))
    }

    fn observation_size(&self) -> usize {
        Self::SIZE
    }
}
