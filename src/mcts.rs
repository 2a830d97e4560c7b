//! Implementation of the Monte Carlo Tree Search control loop.
//!
//! One [`Mcts`] searcher runs Selection → Expansion → Rollout →
//! Backpropagation for a fixed iteration budget on a fresh tree per
//! decision. Statistics are always read and written through the active
//! [`Resolution`], so the same loop drives Standard MCTS (identity
//! resolution), Random-Grouping MCTS and Elastic MCTS; the variants only
//! differ in how the resolution is rebuilt every `batch_size` iterations.

use log::{debug, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    grouping, utils, Game, GroundNode, HomomorphismBuilder, IterationRecord, MctsConfig, MctsError, NodeId,
    Partition, Player, Resolution, Result, RunStatistics, SearchSummary, Stats, Tree, Variant,
};

/// A very large floating-point number used to represent infinity in score calculations.
///
/// Unvisited children score `INFINITY`, so they are always selected first.
/// Using `1e300` instead of `f64::INFINITY` keeps comparisons well-behaved
/// when the value takes part in arithmetic.
const INFINITY: f64 = 1e300;

/// Type alias for a function pointer used to determine a child's selection score.
///
/// This function takes the following parameters:
/// - `value`: The resolved mean value of the child.
/// - `n_visits`: The resolved visit count of the child.
/// - `parent_n_visits`: The resolved visit count of the parent, at least `1`.
/// - `exploration_coef`: The exploration coefficient from [`MctsConfig`].
///
/// It returns an `f64` score used to rank children during selection.
pub type SelectionFunction = fn(value: f64, n_visits: f64, parent_n_visits: f64, exploration_coef: f64) -> f64;

/// The standard Upper Confidence Bound 1 (UCB1) selection function.
///
/// # Parameters
/// - `value`: The mean value (exploitation term) of the child.
/// - `n_visits`: Number of visits to the child.
/// - `parent_n_visits`: Number of visits to the parent.
/// - `exploration_coef`: The exploration coefficient.
///
/// # Returns
/// The UCB1 score of the child, [`INFINITY`] if it was never visited.
///
/// # Examples
/// ```rust
/// use elastic_mcts::ucb1;
///
/// assert_eq!(ucb1(0.5, 4.0, 1.0, 2.0), 0.5);
/// assert!(ucb1(0.0, 0.0, 10.0, 1.0) > 1e100);
/// ```
pub fn ucb1(value: f64, n_visits: f64, parent_n_visits: f64, exploration_coef: f64) -> f64 {
    if n_visits == 0.0 {
        return INFINITY;
    }
    value + exploration_coef * (parent_n_visits.ln() / n_visits).sqrt()
}

/// Outcome of one decision's search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult<A> {
    /// Recommended action.
    pub action: A,
    /// Index of `action` in the root's legal actions.
    pub action_index: usize,
    /// Resolved visit count of the recommended child.
    pub visits: usize,
    /// Resolved mean value of the recommended child, from the searching
    /// player's perspective.
    pub value: f64,
    /// Visit count of the root; always the iteration budget.
    pub root_visits: usize,
    pub summary: SearchSummary,
}

/// Tree and abstraction state private to one decision.
struct Search<S, A> {
    tree: Tree<GroundNode<S, A>>,
    resolution: Resolution<A>,
    /// First node id not yet considered by an abstraction rebuild.
    window_start: usize,
    compression_rate: Option<f64>,
    /// Blocks of the last rebuild's partition, singletons included.
    partition_blocks: Option<usize>,
    abstraction_events: usize,
}

impl<S, A: Clone + PartialEq> Search<S, A> {
    fn new(root: GroundNode<S, A>) -> Self {
        Search {
            tree: Tree::new_root(root),
            resolution: Resolution::identity(),
            window_start: 1,
            compression_rate: None,
            partition_blocks: None,
            abstraction_events: 0,
        }
    }

    #[inline]
    fn stats(&self, id: NodeId) -> Stats {
        self.resolution.stats(&self.tree, id)
    }

    /// Root child with the highest resolved visit count, then the highest
    /// resolved mean, then the lowest action index.
    fn best_child(&self) -> Option<NodeId> {
        let tree = &self.tree;
        tree.node(tree.root()).children().iter().copied().max_by(|&a, &b| {
            let (left, right) = (self.stats(a), self.stats(b));
            left.n
                .cmp(&right.n)
                .then(left.mean().total_cmp(&right.mean()))
                .then(tree.get(b).action_index().cmp(&tree.get(a).action_index()))
        })
    }

    /// Adds `outcome` to every node from `leaf` up to the root. Nodes stored
    /// from the opponent's perspective receive `-outcome`.
    fn backpropagation(&mut self, leaf: NodeId, perspective: Player, outcome: f64) {
        for id in self.tree.path_to_root(leaf) {
            let value = if self.tree.get(id).perspective() == perspective { outcome } else { -outcome };
            self.resolution.record(&mut self.tree, id, value);
        }
    }
}

/// The Monte Carlo Tree Search algorithm implementation.
///
/// A searcher lives for a whole match: its random source and lifetime
/// iteration counter carry over between decisions, while the tree is rebuilt
/// for every call to [`Mcts::search`].
///
/// # Type Parameters
/// - `G`: The game type that implements the [`Game`] trait.
pub struct Mcts<G: Game> {
    game: G,
    config: MctsConfig,
    variant: Variant,
    rng: StdRng,
    total_iterations: usize,
    statistics: RunStatistics,
    selection_function: SelectionFunction,
}

impl<G: Game> Mcts<G> {
    /// Score backed up when a rollout reaches a state that is not terminal
    /// but has no legal action.
    pub const EQUALITY_SCORE: f64 = 0.0;

    /// Creates a new searcher.
    ///
    /// # Parameters
    /// - `game`: The rules to search.
    /// - `variant`: How the resolution map is rebuilt.
    /// - `config`: Search parameters. With `seed` unset the random source is
    ///   seeded from the operating system.
    ///
    /// # Returns
    /// The searcher, or [`MctsError::InvalidConfiguration`] if `config` does
    /// not validate.
    pub fn new(game: G, variant: Variant, config: MctsConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Mcts {
            game,
            config,
            variant,
            rng,
            total_iterations: 0,
            statistics: RunStatistics::new(),
            selection_function: ucb1,
        })
    }

    /// Builder pattern: replace the UCB1 selection function.
    pub fn with_selection_function(mut self, selection_function: SelectionFunction) -> Self {
        self.selection_function = selection_function;
        self
    }

    #[inline]
    pub fn game(&self) -> &G {
        &self.game
    }

    #[inline]
    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Iterations run by this searcher over all its decisions.
    #[inline]
    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    /// One record per iteration ever run by this searcher.
    #[inline]
    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    /// Runs the iteration budget from `state` and recommends an action.
    ///
    /// # Parameters
    /// - `state`: The state to decide in. It is cloned into the root.
    ///
    /// # Returns
    /// The recommended action with its statistics, or
    /// [`MctsError::TerminalState`] / [`MctsError::NoLegalActions`] when
    /// there is nothing to decide.
    ///
    /// # Examples
    /// ```rust
    /// use elastic_mcts::{tictactoe::TicTacToe, Game, Mcts, MctsConfig, Variant};
    ///
    /// let game = TicTacToe;
    /// let config = MctsConfig::default().with_iterations(200).with_seed(1);
    /// let mut mcts = Mcts::new(game, Variant::Elastic, config).unwrap();
    ///
    /// let result = mcts.search(&game.initial_state()).unwrap();
    /// assert_eq!(result.root_visits, 200);
    /// assert!(game.legal_actions(&game.initial_state()).contains(&result.action));
    /// ```
    pub fn search(&mut self, state: &G::State) -> Result<SearchResult<G::Action>> {
        if self.game.is_terminal(state) {
            return Err(MctsError::TerminalState);
        }
        let root = GroundNode::root(&self.game, state.clone());
        if root.actions().is_empty() {
            return Err(MctsError::NoLegalActions);
        }

        let mut search = Search::new(root);
        for iteration in 0..self.config.iterations {
            if self.should_rebuild(iteration) {
                self.rebuild_abstraction(&mut search);
            }

            self.iterate(&mut search);
            self.total_iterations += 1;
            self.statistics.push(IterationRecord {
                iteration: self.total_iterations,
                ground_nodes: search.tree.len(),
                abstract_classes: self.variant.abstracts().then(|| search.resolution.classes().len()),
                root_choices: search.tree.get(search.tree.root()).actions().len(),
                compression_rate: search.compression_rate,
                partition_blocks: search.partition_blocks,
            });
        }

        let best = search.best_child().ok_or(MctsError::NoLegalActions)?;
        let node = search.tree.get(best);
        let stats = search.stats(best);
        let root = search.tree.root();
        let root_stats = search.stats(root);

        let summary = SearchSummary {
            variant: self.variant,
            iterations: self.config.iterations,
            ground_nodes: search.tree.len(),
            abstract_classes: search.resolution.classes().len(),
            compression_rate: search.compression_rate.unwrap_or(1.0),
            partition_blocks: search.partition_blocks.unwrap_or(0),
            root_choices: search.tree.get(root).actions().len(),
            abstraction_events: search.abstraction_events,
            root_value: root_stats.mean(),
        };

        debug!(
            "{}: {} nodes after {} iterations, chose {:?} (n = {}, mean = {:.3})",
            self.variant,
            summary.ground_nodes,
            summary.iterations,
            node.action(),
            stats.n,
            stats.mean()
        );

        Ok(SearchResult {
            action: node.action().cloned().ok_or(MctsError::NoLegalActions)?,
            action_index: node.action_index(),
            visits: stats.n,
            value: stats.mean(),
            root_visits: root_stats.n,
            summary,
        })
    }

    /// Every `batch_size` iterations once the lifetime counter passed `alpha_abs`.
    fn should_rebuild(&self, iteration: usize) -> bool {
        self.variant.abstracts()
            && iteration > 0
            && iteration % self.config.batch_size == 0
            && self.total_iterations > self.config.alpha_abs
    }

    /// Performs one full iteration of MCTS (selection, expansion, simulation, backpropagation).
    fn iterate(&mut self, search: &mut Search<G::State, G::Action>) {
        let leaf = self.selection(search);
        let node = if search.tree.get(leaf).has_untried() {
            self.expansion(&mut search.tree, leaf)
        } else {
            leaf
        };

        let perspective = search.tree.get(node).perspective();
        let outcome = self.simulation(search.tree.get(node));
        trace!("iteration {}: leaf {:?} outcome {:.3}", self.total_iterations + 1, node, outcome);

        search.backpropagation(node, perspective, outcome);
    }

    /// Performs the selection phase of MCTS.
    ///
    /// # Returns
    /// The first node on the UCB path that is terminal, still has untried
    /// actions, or has no child at all.
    fn selection(&self, search: &Search<G::State, G::Action>) -> NodeId {
        let tree = &search.tree;
        let mut current = tree.root();

        loop {
            let node = tree.get(current);
            let children = tree.node(current).children();
            if node.is_terminal() || node.has_untried() || children.is_empty() {
                return current;
            }

            let parent_n = search.stats(current).n.max(1) as f64;
            let mut best: Option<(f64, usize, NodeId)> = None;
            for &child in children {
                let stats = search.stats(child);
                let score = (self.selection_function)(stats.mean(), stats.n as f64, parent_n, self.config.exploration);
                let index = tree.get(child).action_index();

                let better = match best {
                    None => true,
                    Some((best_score, best_index, _)) => {
                        score > best_score || (score == best_score && index < best_index)
                    }
                };
                if better {
                    best = Some((score, index, child));
                }
            }

            match best {
                Some((_, _, child)) => current = child,
                None => return current,
            }
        }
    }

    /// Performs the expansion phase of MCTS.
    ///
    /// With unit ordering, untried priority actions are expanded before any
    /// other untried action.
    ///
    /// # Returns
    /// The newly created child.
    fn expansion(&mut self, tree: &mut Tree<GroundNode<G::State, G::Action>>, parent: NodeId) -> NodeId {
        let node = tree.get(parent);
        let mut pool: Vec<usize> = Vec::new();
        if self.config.unit_ordering {
            pool.extend(
                node.untried()
                    .iter()
                    .copied()
                    .filter(|&index| self.game.is_priority(&node.actions()[index])),
            );
        }
        if pool.is_empty() {
            pool.extend_from_slice(node.untried());
        }

        let action_index = pool[self.rng.random_range(0..pool.len())];
        let action = node.actions()[action_index].clone();
        let state = self.game.step(node.state(), &action);
        let child = GroundNode::child(&self.game, state, action, action_index, node.player());

        tree.get_mut(parent).take_untried(action_index);
        tree.add_child(parent, child)
    }

    /// Performs the simulation phase of MCTS.
    ///
    /// # Returns
    /// The outcome from `node`'s perspective: the game's evaluation of the
    /// last state reached, or [`Self::EQUALITY_SCORE`] if the playout got
    /// stuck.
    fn simulation(&mut self, node: &GroundNode<G::State, G::Action>) -> f64 {
        if node.is_stuck() {
            return Self::EQUALITY_SCORE;
        }

        let mut state = node.state().clone();
        for _ in 0..self.config.rollout_depth {
            if self.game.is_terminal(&state) {
                break;
            }
            let actions = self.game.legal_actions(&state);
            if actions.is_empty() {
                return Self::EQUALITY_SCORE;
            }
            let index = self.rollout_choice(&actions);
            state = self.game.step(&state, &actions[index]);
        }

        self.game.evaluate(&state, node.perspective())
    }

    /// Default policy: uniform, or with unit ordering `attack_bias` of the
    /// probability mass spread over the priority actions.
    fn rollout_choice(&mut self, actions: &[G::Action]) -> usize {
        if self.config.unit_ordering {
            let priority = actions.iter().filter(|action| self.game.is_priority(action)).count();
            if priority > 0 && priority < actions.len() {
                let bias = self.config.attack_bias;
                let weights: Vec<f64> = actions
                    .iter()
                    .map(|action| {
                        if self.game.is_priority(action) {
                            bias / priority as f64
                        } else {
                            (1.0 - bias) / (actions.len() - priority) as f64
                        }
                    })
                    .collect();
                return utils::sample(&weights, &mut self.rng);
            }
        }
        self.rng.random_range(0..actions.len())
    }

    /// Dissolves the current resolution and partitions the nodes created
    /// since the previous rebuild.
    fn rebuild_abstraction(&mut self, search: &mut Search<G::State, G::Action>) {
        std::mem::take(&mut search.resolution).dissolve(&mut search.tree);

        let candidates: Vec<NodeId> = search.tree.ids_from(search.window_start).collect();
        search.window_start = search.tree.len();
        if candidates.is_empty() {
            debug!("{}: no new node since the last rebuild", self.variant);
            return;
        }
        search.abstraction_events += 1;

        let partition = match self.variant {
            Variant::Standard => return,
            Variant::RandomGrouping => {
                // as many classes as the Elastic abstraction forms on the same nodes
                let classes = self.elastic_partition(&search.tree, &candidates).len();
                grouping::random_partition(
                    &self.game,
                    &search.tree,
                    &candidates,
                    classes,
                    self.config.unit_ordering,
                    &mut self.rng,
                )
            }
            Variant::Elastic => self.elastic_partition(&search.tree, &candidates),
        };

        search.compression_rate = Some(partition.compression_rate());
        search.partition_blocks = Some(partition.len());
        search.resolution = Resolution::build(&partition, &search.tree, self.config.action_policy);

        debug!(
            "{}: rebuilt over {} nodes into {} classes ({} merged), compression {:.2}",
            self.variant,
            partition.considered(),
            partition.len(),
            search.resolution.classes().len(),
            partition.compression_rate()
        );
    }

    /// Elastic partition of `candidates`, or the identity when refinement fails.
    fn elastic_partition(&self, tree: &Tree<GroundNode<G::State, G::Action>>, candidates: &[NodeId]) -> Partition {
        match HomomorphismBuilder::from_config(&self.config).build(&self.game, tree, candidates) {
            Ok(partition) => partition,
            Err(error) => {
                warn!("{error}, no abstraction until the next rebuild");
                Partition::identity(candidates)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{approx_eq, GameTest, StuckGame};
    use crate::{ActionPolicy, KillTheKing, TicTacToe};

    fn config(iterations: usize) -> MctsConfig {
        MctsConfig::default().with_iterations(iterations).with_seed(42)
    }

    #[test]
    fn test_ucb1() {
        assert_eq!(ucb1(0.3, 0.0, 5.0, 1.4), INFINITY);
        assert!(approx_eq(ucb1(0.5, 2.0, 8.0, 1.0), 0.5 + (8f64.ln() / 2.0).sqrt()));
        // a parent visited once gives no exploration bonus
        assert!(approx_eq(ucb1(0.25, 1.0, 1.0, 10.0), 0.25));
    }

    #[test]
    fn test_invalid_config() {
        let result = Mcts::new(GameTest, Variant::Standard, config(0));
        assert!(matches!(result, Err(MctsError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_root_visits_match_budget() {
        let game = KillTheKing::default();
        for variant in Variant::ALL {
            let config = config(120).with_batching(10, 0).with_thresholds(0.5, 1.0);
            let mut mcts = Mcts::new(game, variant, config).unwrap();

            let result = mcts.search(&game.initial_state()).unwrap();
            assert_eq!(result.root_visits, 120, "{variant}");
            assert_eq!(mcts.total_iterations(), 120);
            assert_eq!(mcts.statistics().len(), 120);
        }
    }

    #[test]
    fn test_backpropagation_signs() {
        let game = GameTest;
        let mut search = Search::new(GroundNode::root(&game, vec![]));
        let root = search.tree.root();
        let a = search.tree.add_child(root, GroundNode::child(&game, vec![0], 0, 0, 0));
        let b = search.tree.add_child(a, GroundNode::child(&game, vec![0, 1], 1, 0, 1));
        let c = search.tree.add_child(b, GroundNode::child(&game, vec![0, 1, 2], 2, 0, 0));

        search.backpropagation(c, 0, 0.5);

        for (id, value) in [(c, 0.5), (b, -0.5), (a, 0.5), (root, 0.5)] {
            assert_eq!(search.stats(id), Stats { n: 1, w: value });
        }
    }

    #[test]
    fn test_backpropagation_with_repeated_mover() {
        // a player acting twice in a row, as between unit phases of one turn
        let game = GameTest;
        let mut search = Search::new(GroundNode::root(&game, vec![]));
        let root = search.tree.root();
        let a = search.tree.add_child(root, GroundNode::child(&game, vec![0], 0, 0, 0));
        let b = search.tree.add_child(a, GroundNode::child(&game, vec![0, 1], 1, 0, 0));

        search.backpropagation(b, 1, 1.0);

        assert_eq!(search.stats(b).w, -1.0);
        assert_eq!(search.stats(a).w, -1.0);
        assert_eq!(search.stats(root).w, -1.0);
    }

    #[test]
    fn test_backpropagation_through_class() {
        let game = GameTest;
        let mut search = Search::new(GroundNode::root(&game, vec![]));
        let root = search.tree.root();
        let a = search.tree.add_child(root, GroundNode::child(&game, vec![0], 0, 0, 0));
        let b = search.tree.add_child(root, GroundNode::child(&game, vec![1], 1, 1, 0));
        search.resolution = Resolution::build(&Partition::new(vec![vec![a, b]]), &search.tree, ActionPolicy::Union);

        search.backpropagation(a, 0, 1.0);
        search.backpropagation(b, 0, -0.5);

        assert_eq!(search.stats(a), Stats { n: 2, w: 0.5 });
        assert_eq!(search.stats(b), search.stats(a));
        assert_eq!(search.tree.get(a).stats(), Stats::default());
        assert_eq!(search.stats(root), Stats { n: 2, w: 0.5 });
    }

    #[test]
    fn test_best_child_tie_breaks() {
        let game = GameTest;
        let mut search = Search::new(GroundNode::root(&game, vec![]));
        let root = search.tree.root();
        let last = search.tree.add_child(root, GroundNode::child(&game, vec![3], 3, 3, 0));
        let first = search.tree.add_child(root, GroundNode::child(&game, vec![0], 0, 0, 0));
        let middle = search.tree.add_child(root, GroundNode::child(&game, vec![1], 1, 1, 0));

        for (id, value) in [(last, 1.0), (first, 1.0), (middle, 0.0)] {
            search.tree.get_mut(id).stats = Stats { n: 3, w: value };
        }
        assert_eq!(search.best_child(), Some(first));

        search.tree.get_mut(middle).stats = Stats { n: 4, w: -2.0 };
        assert_eq!(search.best_child(), Some(middle));
    }

    #[test]
    fn test_search_finds_winning_move() {
        let game = TicTacToe;
        // X to play and win on cell 2
        let state = [0, 3, 1, 4].iter().fold(game.initial_state(), |state, action| game.step(&state, action));
        let mut mcts = Mcts::new(game, Variant::Standard, config(300)).unwrap();

        let result = mcts.search(&state).unwrap();
        assert_eq!(result.action, 2);
        assert!(result.value > 0.9);
    }

    #[test]
    fn test_stuck_game_is_a_draw() {
        let game = StuckGame;
        let mut mcts = Mcts::new(game, Variant::Standard, config(10)).unwrap();

        let result = mcts.search(&0).unwrap();
        assert_eq!(result.root_visits, 10);
        assert_eq!(result.value, Mcts::<StuckGame>::EQUALITY_SCORE);
        assert_eq!(result.summary.root_value, 0.0);
        assert_eq!(result.summary.ground_nodes, 3);
    }

    #[test]
    fn test_nothing_to_decide() {
        let mut mcts = Mcts::new(GameTest, Variant::Elastic, config(10)).unwrap();
        assert!(matches!(mcts.search(&vec![0, 1, 2, 3]), Err(MctsError::TerminalState)));

        let mut stuck = Mcts::new(StuckGame, Variant::Standard, config(10)).unwrap();
        assert!(matches!(stuck.search(&1), Err(MctsError::NoLegalActions)));
    }

    #[test]
    fn test_same_seed_same_search() {
        let game = KillTheKing::default();
        let run = || {
            let config = config(80).with_batching(20, 0);
            let mut mcts = Mcts::new(game, Variant::Elastic, config).unwrap();
            let result = mcts.search(&game.initial_state()).unwrap();
            (result, mcts.statistics().clone())
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_variants_agree_without_abstraction() {
        let game = KillTheKing::default();
        let state = game.initial_state();
        let mut reference = None;

        for variant in Variant::ALL {
            // the batch never completes within the budget
            let config = config(50).with_batching(50, 0);
            let mut mcts = Mcts::new(game, variant, config).unwrap();
            let result = mcts.search(&state).unwrap();
            assert_eq!(result.summary.abstraction_events, 0);

            let counts: Vec<(usize, usize)> = mcts
                .statistics()
                .iter()
                .map(|record| (record.ground_nodes, record.root_choices))
                .collect();
            let outcome = (result.action_index, result.visits, counts);
            match &reference {
                None => reference = Some(outcome),
                Some(expected) => assert_eq!(&outcome, expected, "{variant}"),
            }
        }
    }

    #[test]
    fn test_warm_up_delays_abstraction() {
        let game = KillTheKing::default();
        let config = config(50).with_batching(10, 60);
        let mut mcts = Mcts::new(game, Variant::RandomGrouping, config).unwrap();

        // lifetime counter is at most 49 during the first decision
        let first = mcts.search(&game.initial_state()).unwrap();
        assert_eq!(first.summary.abstraction_events, 0);
        assert_eq!(first.summary.compression_rate, 1.0);

        // and exceeds 60 from iteration 20 of the second one on
        let second = mcts.search(&game.initial_state()).unwrap();
        assert!(second.summary.abstraction_events > 0);
        assert_eq!(mcts.total_iterations(), 100);
    }

    #[test]
    fn test_abstraction_events_are_recorded() {
        let game = KillTheKing::default();
        for variant in [Variant::RandomGrouping, Variant::Elastic] {
            let config = config(40).with_batching(5, 0).with_thresholds(1.0, 1.0);
            let mut mcts = Mcts::new(game, variant, config).unwrap();
            let result = mcts.search(&game.initial_state()).unwrap();

            assert!(result.summary.abstraction_events > 0, "{variant}");
            assert!(result.summary.abstraction_events <= 7);
            assert!(result.summary.compression_rate >= 1.0);
            assert_eq!(result.root_visits, 40);

            let records = mcts.statistics().records();
            assert!(records[..5].iter().all(|record| record.compression_rate.is_none()));
            assert!(records.iter().all(|record| record.abstract_classes.is_some()));

            // the rate is taken over every block, singletons included
            for record in records {
                if let (Some(rate), Some(blocks), Some(merged)) =
                    (record.compression_rate, record.partition_blocks, record.abstract_classes)
                {
                    assert!(merged <= blocks);
                    let considered = rate * blocks as f64;
                    assert!(approx_eq(considered, considered.round()));
                    assert!(considered.round() as usize <= record.ground_nodes);
                }
            }
        }
    }

    #[test]
    fn test_random_grouping_matches_elastic_cardinality() {
        let game = KillTheKing::default();
        let config = config(40).with_batching(5, 0).with_thresholds(0.1, 1.0);
        let mut elastic = Mcts::new(game, Variant::Elastic, config.clone()).unwrap();
        let mut random = Mcts::new(game, Variant::RandomGrouping, config).unwrap();
        elastic.search(&game.initial_state()).unwrap();
        random.search(&game.initial_state()).unwrap();

        // both see the same nodes at the first rebuild, after five iterations
        let first = |mcts: &Mcts<KillTheKing>| {
            let record = &mcts.statistics().records()[5];
            (record.compression_rate, record.partition_blocks)
        };
        assert!(first(&elastic).1.is_some());
        assert_eq!(first(&elastic), first(&random));
    }

    #[test]
    fn test_standard_records_no_classes() {
        let mut mcts = Mcts::new(GameTest, Variant::Standard, config(12)).unwrap();
        mcts.search(&vec![]).unwrap();

        let records = mcts.statistics().records();
        assert_eq!(records.len(), 12);
        assert!(records.iter().all(|record| record.abstract_classes.is_none()));
        assert!(records.iter().all(|record| record.root_choices == 4));
        assert_eq!(records.last().map(|record| record.iteration), Some(12));
    }

    #[test]
    fn test_custom_selection_function() {
        fn greedy(value: f64, n_visits: f64, _: f64, _: f64) -> f64 {
            if n_visits == 0.0 { f64::MAX } else { value }
        }

        let mut mcts = Mcts::new(GameTest, Variant::Standard, config(30))
            .unwrap()
            .with_selection_function(greedy);
        let result = mcts.search(&vec![]).unwrap();
        assert_eq!(result.root_visits, 30);
    }
}
