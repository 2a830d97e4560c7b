//! Test utilities for the search engine

use crate::{Game, Player};

/// A simple test game: two players alternately pick distinct numbers in
/// `0..4`. Once all four are picked, player 0 wins if its picks sum higher.
///
/// The reward encodes the whole pick history, so no two states share a
/// reward signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct GameTest;

impl GameTest {
    fn encode(state: &[usize]) -> f64 {
        state
            .iter()
            .fold(0.0, |acc, &pick| acc * 5.0 + (pick + 1) as f64)
    }
}

impl Game for GameTest {
    type State = Vec<usize>;
    type Action = usize;

    fn initial_state(&self) -> Self::State {
        Vec::new()
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        (0..4).filter(|index| !state.contains(index)).collect()
    }

    fn step(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        assert!(
            *action < 4 && !state.contains(action),
            "illegal pick {action} in {state:?}"
        );
        let mut next = state.clone();
        next.push(*action);
        next
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.len() == 4
    }

    fn reward(&self, state: &Self::State, action: &Self::Action, perspective: Player) -> f64 {
        let value = Self::encode(state) + *action as f64 / 10.0;
        if self.current_player(state) == perspective { value } else { -value }
    }

    fn current_player(&self, state: &Self::State) -> Player {
        (state.len() % 2) as Player
    }

    fn evaluate(&self, state: &Self::State, perspective: Player) -> f64 {
        if state.len() != 4 {
            return 0.0;
        }

        let rel = (state[0] + state[2]) as i64 - (state[1] + state[3]) as i64;
        let result = rel.signum() as f64;
        if perspective == 0 { result } else { -result }
    }

    fn is_priority(&self, action: &Self::Action) -> bool {
        *action == 3
    }
}

/// A game that gets stuck: the root offers two actions, after which the
/// state is neither terminal nor has any legal action.
#[derive(Clone, Copy, Debug, Default)]
pub struct StuckGame;

impl Game for StuckGame {
    type State = u8;
    type Action = u8;

    fn initial_state(&self) -> Self::State {
        0
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if *state == 0 { vec![1, 2] } else { Vec::new() }
    }

    fn step(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        assert_eq!(*state, 0, "no action is legal once stuck");
        *action
    }

    fn is_terminal(&self, _state: &Self::State) -> bool {
        false
    }

    fn reward(&self, _state: &Self::State, _action: &Self::Action, _perspective: Player) -> f64 {
        0.0
    }

    fn current_player(&self, state: &Self::State) -> Player {
        if *state == 0 { 0 } else { 1 }
    }

    fn evaluate(&self, _state: &Self::State, _perspective: Player) -> f64 {
        0.5
    }
}

/// Utility function to compare floats with tolerance
#[allow(dead_code)]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-8
}
