//! Tic-tac-toe engine.

use im::Vector;

use crate::core::{ActionId, AgentId};
use crate::engine::{ActivePlayer, GameEngine, GameFactory, NativeObservation};

/// Number of board cells, and of distinct actions.
pub const CELLS: usize = 9;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A game of tic-tac-toe. Agent 0 plays first (X).
///
/// Action `i` marks cell `i` (row-major). The native observation is the
/// move history as text, e.g. `"4, 0, 8"`.
#[derive(Clone, Debug, Default)]
pub struct TicTacToe {
    board: [Option<AgentId>; CELLS],
    history: Vector<ActionId>,
    winner: Option<AgentId>,
}

impl TicTacToe {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves played so far.
    #[must_use]
    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    /// Move history, oldest first.
    pub fn history(&self) -> &Vector<ActionId> {
        &self.history
    }

    /// Owner of a cell.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<AgentId> {
        self.board.get(index).copied().flatten()
    }

    /// Winning agent, if the game ended with a line.
    #[must_use]
    pub fn winner(&self) -> Option<AgentId> {
        self.winner
    }

    fn to_move(&self) -> AgentId {
        AgentId::new((self.history.len() % 2) as u8)
    }

    fn completes_line(&self, agent: AgentId, cell: usize) -> bool {
        LINES
            .iter()
            .filter(|line| line.contains(&cell))
            .any(|line| line.iter().all(|&c| self.board[c] == Some(agent)))
    }
}

impl GameEngine for TicTacToe {
    fn num_players(&self) -> usize {
        2
    }

    fn is_chance_node(&self) -> bool {
        false
    }

    fn legal_actions(&self) -> Vec<ActionId> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..CELLS)
            .filter(|&c| self.board[c].is_none())
            .map(|c| c as ActionId)
            .collect()
    }

    fn current_player(&self) -> ActivePlayer {
        if self.is_terminal() {
            ActivePlayer::Terminal
        } else {
            ActivePlayer::Agent(self.to_move())
        }
    }

    fn apply_action(&mut self, action: ActionId) {
        assert!(!self.is_terminal(), "Game is already over");
        let cell = usize::try_from(action)
            .ok()
            .filter(|&c| c < CELLS && self.board[c].is_none());
        let Some(cell) = cell else {
            panic!("Illegal tic-tac-toe move {}", action);
        };

        let agent = self.to_move();
        self.board[cell] = Some(agent);
        self.history.push_back(action);
        if self.completes_line(agent, cell) {
            self.winner = Some(agent);
        }
    }

    fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.history.len() == CELLS
    }

    fn observation(&self, _agent: AgentId) -> NativeObservation {
        let moves: Vec<String> = self.history.iter().map(|a| a.to_string()).collect();
        NativeObservation::Text(moves.join(", "))
    }

    fn rewards(&self) -> Vec<f64> {
        match self.winner {
            Some(AgentId(0)) => vec![1.0, -1.0],
            Some(_) => vec![-1.0, 1.0],
            None => vec![0.0, 0.0],
        }
    }
}

/// Builds fresh tic-tac-toe games.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToeFactory;

impl GameFactory for TicTacToeFactory {
    type Engine = TicTacToe;

    fn new_game(&self) -> TicTacToe {
        TicTacToe::new()
    }

    fn num_players(&self) -> usize {
        2
    }

    fn num_distinct_actions(&self) -> usize {
        CELLS
    }
}
