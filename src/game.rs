//! Module defining the game contract consumed by the search engine.

use std::fmt::Debug;

/// Identifier of one of the two players, `0` or `1`.
pub type Player = u8;

/// Returns the opponent of `player` in a two-player game.
#[inline]
pub fn opponent(player: Player) -> Player {
    1 - player
}

/// Trait defining the interface for a game that can be searched.
///
/// The game value itself holds the rules (board size, turn cap, ...) and is
/// never mutated; every transition produces a fresh state. Any game
/// implementing this trait can be searched by all three variants without
/// modification.
pub trait Game {
    /// Immutable snapshot of the game.
    type State: Clone + Debug;

    /// A discrete choice available to the player to move.
    type Action: Clone + PartialEq + Debug;

    /// Creates the starting state of a new game.
    ///
    /// # Examples
    /// ```rust
    /// use elastic_mcts::Game;
    /// use elastic_mcts::test_utils::GameTest;
    /// let game = GameTest;
    /// assert!(game.initial_state().is_empty());
    /// ```
    fn initial_state(&self) -> Self::State;

    /// Returns the legal actions in `state`.
    ///
    /// The ordering is significant: it is the action index used to break
    /// ties during selection and decision. A terminal state returns no action.
    ///
    /// # Examples
    /// ```rust
    /// use elastic_mcts::Game;
    /// use elastic_mcts::test_utils::GameTest;
    /// let game = GameTest;
    /// assert_eq!(game.legal_actions(&vec![2]), vec![0, 1, 3]);
    /// ```
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Applies `action` to `state` and returns the successor.
    ///
    /// # Panics
    /// `action` must come from [`Game::legal_actions`] for `state`. Anything
    /// else is a contract violation and implementations are expected to fail
    /// fast.
    fn step(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Determines if `state` ends the game.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Immediate reward of playing `action` in `state`, seen by `perspective`.
    ///
    /// Must be defined for non-terminal transitions as well; the Elastic
    /// abstraction compares these values between candidate states.
    fn reward(&self, state: &Self::State, action: &Self::Action, perspective: Player) -> f64;

    /// The player whose turn it is in `state`.
    fn current_player(&self, state: &Self::State) -> Player;

    /// Scalar outcome of `state` seen by `perspective`.
    ///
    /// For terminal states this is `1.0` for a win, `-1.0` for a loss and
    /// `0.0` for a draw. Non-terminal states (a rollout cut by its depth cap)
    /// return a heuristic estimate in the same range.
    fn evaluate(&self, state: &Self::State, perspective: Player) -> f64;

    /// Whether `action` is salient enough to be tried first (unit ordering).
    fn is_priority(&self, _action: &Self::Action) -> bool {
        false
    }

    /// Cheap structural fingerprint of `state` used to build the coarse
    /// partition before refinement. States with different signatures are
    /// never merged.
    fn signature(&self, state: &Self::State) -> u64 {
        self.current_player(state) as u64
    }
}
