//! Tic-tac-toe, the small reference game.
//!
//! X (player 0) moves first. The signature of a position is its canonical
//! form under the eight symmetries of the square, so the coarse partition of
//! the Elastic builder already groups symmetric positions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Game, Player};

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

/// Cell permutations of the square's symmetry group.
const SYMMETRIES: [[usize; 9]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8],
    [2, 5, 8, 1, 4, 7, 0, 3, 6],
    [8, 7, 6, 5, 4, 3, 2, 1, 0],
    [6, 3, 0, 7, 4, 1, 8, 5, 2],
    [0, 3, 6, 1, 4, 7, 2, 5, 8],
    [2, 1, 0, 5, 4, 3, 8, 7, 6],
    [8, 5, 2, 7, 4, 1, 6, 3, 0],
    [6, 7, 8, 3, 4, 5, 0, 1, 2],
];

/// A 3×3 board. Cells hold `1` for X, `-1` for O and `0` when empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [i8; 9],
}

impl Board {
    #[inline]
    pub fn cells(&self) -> &[i8; 9] {
        &self.cells
    }

    fn mark(player: Player) -> i8 {
        if player == 0 { 1 } else { -1 }
    }

    /// Player owning a complete line, if any.
    pub fn winner(&self) -> Option<Player> {
        LINES.iter().find_map(|&[a, b, c]| {
            let mark = self.cells[a];
            if mark != 0 && mark == self.cells[b] && mark == self.cells[c] {
                Some(if mark == 1 { 0 } else { 1 })
            } else {
                None
            }
        })
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&cell| cell != 0)
    }

    /// Base-3 code of the board seen through `permutation`.
    fn code(&self, permutation: &[usize; 9]) -> u64 {
        permutation
            .iter()
            .fold(0, |acc, &cell| acc * 3 + (self.cells[cell] + 1) as u64)
    }

    /// Smallest code over the eight symmetries.
    pub fn canonical_code(&self) -> u64 {
        SYMMETRIES
            .iter()
            .map(|permutation| self.code(permutation))
            .min()
            .unwrap_or_default()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(3) {
            for &cell in row {
                f.write_str(match cell {
                    1 => "X",
                    -1 => "O",
                    _ => ".",
                })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Standard tic-tac-toe rules. Actions are cell indices in row-major order.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToe;

impl Game for TicTacToe {
    type State = Board;
    type Action = usize;

    fn initial_state(&self) -> Self::State {
        Board::default()
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if state.winner().is_some() {
            return Vec::new();
        }
        (0..9).filter(|&cell| state.cells[cell] == 0).collect()
    }

    fn step(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        assert!(
            *action < 9 && state.cells[*action] == 0 && state.winner().is_none(),
            "illegal move {action} on\n{state}"
        );
        let mut next = *state;
        next.cells[*action] = Board::mark(self.current_player(state));
        next
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.winner().is_some() || state.is_full()
    }

    fn reward(&self, state: &Self::State, action: &Self::Action, perspective: Player) -> f64 {
        let actor = self.current_player(state);
        match self.step(state, action).winner() {
            Some(winner) if winner == actor && actor == perspective => 1.0,
            Some(winner) if winner == actor => -1.0,
            _ => 0.0,
        }
    }

    fn current_player(&self, state: &Self::State) -> Player {
        let filled = state.cells.iter().filter(|&&cell| cell != 0).count();
        (filled % 2) as Player
    }

    fn evaluate(&self, state: &Self::State, perspective: Player) -> f64 {
        match state.winner() {
            Some(winner) if winner == perspective => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        }
    }

    fn signature(&self, state: &Self::State) -> u64 {
        state.canonical_code()
    }
}
