//! Data stored in each ground node of the search tree.

use serde::Serialize;

use crate::{Game, Player};

/// Visit count and cumulative value of a ground node or an abstract class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Stats {
    /// Number of backed-up outcomes.
    pub n: usize,
    /// Sum of backed-up outcomes.
    pub w: f64,
}

impl Stats {
    /// Mean value, `0.0` when never visited.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.n != 0 { self.w / self.n as f64 } else { 0.0 }
    }

    /// Incorporates one backed-up outcome.
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.n += 1;
        self.w += value;
    }

    /// Adds the counts of `other` into `self`.
    #[inline]
    pub fn merge(&mut self, other: Stats) {
        self.n += other.n;
        self.w += other.w;
    }
}

/// One search-tree node tied to a concrete game state.
///
/// The legal actions are fetched once at creation. `untried` keeps the
/// indices of those not yet expanded; tried actions are the children of the
/// node in the tree, each remembering its `action_index`.
#[derive(Debug)]
pub struct GroundNode<S, A> {
    state: S,
    action: Option<A>,
    action_index: usize,
    actions: Vec<A>,
    untried: Vec<usize>,
    pub(crate) stats: Stats,
    terminal: bool,
    player: Player,
    mover: Option<Player>,
}

impl<S, A> GroundNode<S, A> {
    /// Creates the root node for `state`.
    pub fn root<G: Game<State = S, Action = A>>(game: &G, state: S) -> Self {
        Self::new(game, state, None, 0, None)
    }

    /// Creates the node reached by playing `actions[action_index]` from a
    /// state where `mover` was to play.
    pub fn child<G: Game<State = S, Action = A>>(
        game: &G,
        state: S,
        action: A,
        action_index: usize,
        mover: Player,
    ) -> Self {
        Self::new(game, state, Some(action), action_index, Some(mover))
    }

    fn new<G: Game<State = S, Action = A>>(
        game: &G,
        state: S,
        action: Option<A>,
        action_index: usize,
        mover: Option<Player>,
    ) -> Self {
        let terminal = game.is_terminal(&state);
        let actions = if terminal { Vec::new() } else { game.legal_actions(&state) };

        GroundNode {
            untried: (0..actions.len()).collect(),
            player: game.current_player(&state),
            state,
            action,
            action_index,
            actions,
            stats: Stats::default(),
            terminal,
            mover,
        }
    }

    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Action that led from the parent to this node, `None` for the root.
    #[inline]
    pub fn action(&self) -> Option<&A> {
        self.action.as_ref()
    }

    /// Index of [`GroundNode::action`] in the parent's legal actions.
    #[inline]
    pub fn action_index(&self) -> usize {
        self.action_index
    }

    /// Legal actions of the state, in the game's order.
    #[inline]
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// Indices of the legal actions not expanded yet.
    #[inline]
    pub fn untried(&self) -> &[usize] {
        &self.untried
    }

    #[inline]
    pub fn has_untried(&self) -> bool {
        !self.untried.is_empty()
    }

    /// Marks the action at `action_index` as tried.
    pub(crate) fn take_untried(&mut self, action_index: usize) {
        self.untried.retain(|&index| index != action_index);
    }

    /// The node's own statistics, frozen while it belongs to an abstract class.
    #[inline]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Non-terminal yet without any legal action.
    #[inline]
    pub fn is_stuck(&self) -> bool {
        !self.terminal && self.actions.is_empty()
    }

    /// Player to move in this node's state.
    #[inline]
    pub fn player(&self) -> Player {
        self.player
    }

    /// Player whose perspective this node's values are stored in: the player
    /// who moved into it, or the player to move for the root.
    #[inline]
    pub fn perspective(&self) -> Player {
        self.mover.unwrap_or(self.player)
    }

    /// Player who played the incoming action.
    #[inline]
    pub fn mover(&self) -> Option<Player> {
        self.mover
    }
}
