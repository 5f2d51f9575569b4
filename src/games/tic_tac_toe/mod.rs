//! Tic-tac-toe.
//!
//! Two agents, no chance nodes, text observations. The smallest game that
//! exercises turn order and terminal rewards.

mod encoder;
mod game;

pub use encoder::HistoryEncoder;
pub use game::{TicTacToe, TicTacToeFactory, CELLS};
