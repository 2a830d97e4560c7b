//! Elastic abstraction: approximate MDP homomorphism by partition refinement.
//!
//! Candidates are first split by a cheap coarse key. Each block is then
//! refined Moore-style: two states stay together only if, for every action
//! legal in both, their immediate rewards differ by at most η_R and their
//! successor distributions are within η_T in total-variation distance.
//! Successors are labelled by their previous-round class when both sides are
//! candidates, by their signature otherwise, so whether an action has been
//! expanded yet never changes the outcome. Rounds repeat until nothing splits.

use std::collections::{BTreeMap, HashMap};

use log::trace;

use crate::{AbstractionError, Game, GroundNode, MctsConfig, NodeId, Partition, Player, Tree};

/// Label of a successor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Label {
    /// Class of a candidate successor in the previous round.
    Class(usize),
    /// Signature of the successor state.
    Signature(u64),
}

/// Probability distribution over successor labels.
type Distribution = BTreeMap<Label, f64>;

/// Total-variation distance between two label distributions.
pub(crate) fn total_variation<K: Ord>(p: &BTreeMap<K, f64>, q: &BTreeMap<K, f64>) -> f64 {
    let mut distance = 0.0;
    for (key, &mass) in p {
        distance += (mass - q.get(key).copied().unwrap_or(0.0)).abs();
    }
    for (key, &mass) in q {
        if !p.contains_key(key) {
            distance += mass;
        }
    }
    distance / 2.0
}

/// Reward and successor of one legal action of a candidate.
#[derive(Debug)]
struct Transition<A> {
    action: A,
    reward: f64,
    /// Expanded child reached by the action, if any.
    child: Option<NodeId>,
    signature: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct CoarseKey {
    signature: u64,
    mover: Option<Player>,
    terminal: bool,
    priority: bool,
}

/// Builds Elastic partitions from a fixed set of candidate ground nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct HomomorphismBuilder {
    eta_r: f64,
    eta_t: f64,
    max_rounds: usize,
    unit_ordering: bool,
}

impl HomomorphismBuilder {
    pub fn new(eta_r: f64, eta_t: f64, max_rounds: usize) -> Self {
        HomomorphismBuilder {
            eta_r,
            eta_t,
            max_rounds,
            unit_ordering: false,
        }
    }

    pub fn from_config(config: &MctsConfig) -> Self {
        HomomorphismBuilder {
            eta_r: config.eta_r,
            eta_t: config.eta_t,
            max_rounds: config.max_refinement_rounds,
            unit_ordering: config.unit_ordering,
        }
    }

    pub fn with_unit_ordering(mut self, unit_ordering: bool) -> Self {
        self.unit_ordering = unit_ordering;
        self
    }

    /// Groups candidates by signature, mover, terminal flag and, with unit
    /// ordering, by whether they were reached through a priority action.
    ///
    /// Blocks come out in key order; members keep candidate order.
    pub fn coarse_partition<G: Game>(
        &self,
        game: &G,
        tree: &Tree<GroundNode<G::State, G::Action>>,
        candidates: &[NodeId],
    ) -> Vec<Vec<NodeId>> {
        let mut blocks: BTreeMap<CoarseKey, Vec<NodeId>> = BTreeMap::new();
        for &id in candidates {
            let node = tree.get(id);
            let key = CoarseKey {
                signature: game.signature(node.state()),
                mover: node.mover(),
                terminal: node.is_terminal(),
                priority: self.unit_ordering && node.action().is_some_and(|action| game.is_priority(action)),
            };
            blocks.entry(key).or_default().push(id);
        }
        blocks.into_values().collect()
    }

    /// Partitions `candidates`.
    ///
    /// Deterministic: the same tree, candidates and thresholds always give the
    /// same partition.
    ///
    /// # Errors
    /// [`AbstractionError::EmptyPartition`] without candidates and
    /// [`AbstractionError::RoundCapExceeded`] when refinement is still
    /// splitting after the last allowed round.
    pub fn build<G: Game>(
        &self,
        game: &G,
        tree: &Tree<GroundNode<G::State, G::Action>>,
        candidates: &[NodeId],
    ) -> Result<Partition, AbstractionError> {
        let mut blocks = self.coarse_partition(game, tree, candidates);
        if blocks.is_empty() {
            return Err(AbstractionError::EmptyPartition);
        }

        let position: HashMap<NodeId, usize> = candidates.iter().enumerate().map(|(index, &id)| (id, index)).collect();
        let transitions: Vec<Vec<Transition<G::Action>>> =
            candidates.iter().map(|&id| Self::transitions(game, tree, id)).collect();

        for round in 1..=self.max_rounds {
            let mut class_of = vec![0; candidates.len()];
            for (class, block) in blocks.iter().enumerate() {
                for id in block {
                    class_of[position[id]] = class;
                }
            }

            // previous-round class of every successor that is itself a candidate
            let classes: Vec<Vec<Option<usize>>> = transitions
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|transition| {
                            transition
                                .child
                                .and_then(|child| position.get(&child))
                                .map(|&index| class_of[index])
                        })
                        .collect()
                })
                .collect();

            let mut refined = Vec::with_capacity(blocks.len());
            for block in &blocks {
                refined.extend(self.split(block, &position, &transitions, &classes));
            }

            trace!("refinement round {round}: {} -> {} classes", blocks.len(), refined.len());

            if refined.len() == blocks.len() {
                return Ok(Partition::new(refined));
            }
            blocks = refined;
        }

        Err(AbstractionError::RoundCapExceeded {
            rounds: self.max_rounds,
        })
    }

    fn transitions<G: Game>(
        game: &G,
        tree: &Tree<GroundNode<G::State, G::Action>>,
        id: NodeId,
    ) -> Vec<Transition<G::Action>> {
        let node = tree.get(id);
        let children = tree.node(id).children();

        node.actions()
            .iter()
            .enumerate()
            .map(|(index, action)| {
                let child = children.iter().copied().find(|&child| tree.get(child).action_index() == index);
                let signature = match child {
                    Some(child) => game.signature(tree.get(child).state()),
                    None => game.signature(&game.step(node.state(), action)),
                };

                Transition {
                    action: action.clone(),
                    reward: game.reward(node.state(), action, node.player()),
                    child,
                    signature,
                }
            })
            .collect()
    }

    /// Splits one block: a candidate joins the first sub-class whose every
    /// member it is similar to, otherwise it opens a new sub-class.
    fn split<A: PartialEq>(
        &self,
        block: &[NodeId],
        position: &HashMap<NodeId, usize>,
        transitions: &[Vec<Transition<A>>],
        classes_of: &[Vec<Option<usize>>],
    ) -> Vec<Vec<NodeId>> {
        let mut classes: Vec<Vec<NodeId>> = Vec::new();

        'candidates: for &id in block {
            let index = position[&id];
            for class in classes.iter_mut() {
                let similar = class
                    .iter()
                    .all(|member| self.similar(index, position[member], transitions, classes_of));
                if similar {
                    class.push(id);
                    continue 'candidates;
                }
            }
            classes.push(vec![id]);
        }

        classes
    }

    fn similar<A: PartialEq>(
        &self,
        a: usize,
        b: usize,
        transitions: &[Vec<Transition<A>>],
        classes_of: &[Vec<Option<usize>>],
    ) -> bool {
        // actions legal in only one of the two states are not compared
        for (i, left) in transitions[a].iter().enumerate() {
            let Some(j) = transitions[b].iter().position(|right| right.action == left.action) else {
                continue;
            };
            let right = &transitions[b][j];

            if !((left.reward - right.reward).abs() <= self.eta_r) {
                return false;
            }

            let (left_label, right_label) = match (classes_of[a][i], classes_of[b][j]) {
                (Some(left_class), Some(right_class)) => (Label::Class(left_class), Label::Class(right_class)),
                _ => (Label::Signature(left.signature), Label::Signature(right.signature)),
            };
            let p: Distribution = BTreeMap::from([(left_label, 1.0)]);
            let q: Distribution = BTreeMap::from([(right_label, 1.0)]);
            if !(total_variation(&p, &q) <= self.eta_t) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::GameTest;
    use crate::tictactoe::TicTacToe;

    /// Expands every node of `game` down to `depth` plies below the root.
    fn full_tree<G: Game>(game: &G, depth: usize) -> (Tree<GroundNode<G::State, G::Action>>, Vec<NodeId>) {
        let mut tree = Tree::new_root(GroundNode::root(game, game.initial_state()));
        let mut frontier = vec![tree.root()];

        for _ in 0..depth {
            let mut next = Vec::new();
            for parent in frontier {
                let actions = tree.get(parent).actions().to_vec();
                let mover = tree.get(parent).player();
                for (index, action) in actions.into_iter().enumerate() {
                    let state = game.step(tree.get(parent).state(), &action);
                    let child = GroundNode::child(game, state, action, index, mover);
                    next.push(tree.add_child(parent, child));
                }
            }
            frontier = next;
        }

        let candidates = tree.ids_from(1).collect();
        (tree, candidates)
    }

    #[test]
    fn test_total_variation() {
        let p = BTreeMap::from([(0, 0.5), (1, 0.5)]);
        let q = BTreeMap::from([(1, 0.5), (2, 0.5)]);
        assert!((total_variation(&p, &q) - 0.5).abs() < 1e-12);
        assert_eq!(total_variation(&p, &p), 0.0);

        let r = BTreeMap::from([(3, 1.0)]);
        assert_eq!(total_variation(&p, &r), 1.0);
    }

    #[test]
    fn test_zero_thresholds_give_identity() {
        // every pair of first picks shares two actions with distinct rewards
        let game = GameTest;
        let (tree, candidates) = full_tree(&game, 1);
        let builder = HomomorphismBuilder::new(0.0, 0.0, 16);

        let partition = builder.build(&game, &tree, &candidates).unwrap();
        assert_eq!(partition.len(), candidates.len());
        assert_eq!(partition.compression_rate(), 1.0);
    }

    #[test]
    fn test_loose_thresholds_give_one_class_per_coarse_block() {
        let game = GameTest;
        let (tree, candidates) = full_tree(&game, 2);
        let builder = HomomorphismBuilder::new(1e9, 1.0, 16);

        let coarse = builder.coarse_partition(&game, &tree, &candidates);
        let partition = builder.build(&game, &tree, &candidates).unwrap();

        // depth 1 and depth 2 differ by mover and signature
        assert_eq!(coarse.len(), 2);
        assert_eq!(partition.blocks(), coarse.as_slice());
        assert_eq!(partition.considered(), 4 + 12);
        assert_eq!(partition.compression_rate(), 8.0);
    }

    #[test]
    fn test_unit_ordering_separates_priority_actions() {
        let game = GameTest;
        let (tree, candidates) = full_tree(&game, 1);
        let builder = HomomorphismBuilder::new(1e9, 1.0, 16).with_unit_ordering(true);

        let partition = builder.build(&game, &tree, &candidates).unwrap();
        assert_eq!(partition.len(), 2);
        assert!(partition
            .blocks()
            .iter()
            .any(|block| block.len() == 1 && tree.get(block[0]).action() == Some(&3)));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let game = TicTacToe;
        let (tree, candidates) = full_tree(&game, 2);
        let builder = HomomorphismBuilder::new(0.5, 0.5, 16);

        let first = builder.build(&game, &tree, &candidates).unwrap();
        let second = builder.build(&game, &tree, &candidates).unwrap();
        assert_eq!(first, second);
        assert!(first.compression_rate() >= 1.0);
        assert!(first.compression_rate() <= first.considered() as f64);
    }

    #[test]
    fn test_symmetric_openings_merge() {
        let game = TicTacToe;
        let (tree, candidates) = full_tree(&game, 1);
        let builder = HomomorphismBuilder::new(0.0, 1.0, 16);

        // corners, edges and centre
        let partition = builder.build(&game, &tree, &candidates).unwrap();
        assert_eq!(partition.len(), 3);
        let mut sizes: Vec<usize> = partition.blocks().iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 4, 4]);
    }

    #[test]
    fn test_transition_threshold_splits() {
        let game = TicTacToe;
        let (tree, candidates) = full_tree(&game, 1);

        // symmetric openings lead to successors of different signatures
        // under the same cell index, so a zero transition threshold splits them
        let loose = HomomorphismBuilder::new(1e9, 1.0, 16).build(&game, &tree, &candidates).unwrap();
        let strict = HomomorphismBuilder::new(1e9, 0.0, 16).build(&game, &tree, &candidates).unwrap();
        assert!(strict.len() > loose.len());
    }

    #[test]
    fn test_expanding_a_child_keeps_the_partition() {
        let game = GameTest;
        let (mut tree, candidates) = full_tree(&game, 1);
        let builder = HomomorphismBuilder::new(1e9, 0.5, 16);

        let before = builder.build(&game, &tree, &candidates).unwrap();
        assert_eq!(before.blocks(), &[candidates.clone()]);

        // expand pick 1 under pick 0; its siblings leave that action untried
        let parent = candidates[0];
        let state = game.step(tree.get(parent).state(), &1);
        let child = tree.add_child(parent, GroundNode::child(&game, state, 1, 0, 1));

        let after = builder.build(&game, &tree, &tree.ids_from(1).collect::<Vec<_>>()).unwrap();
        assert_eq!(after.len(), 2);
        assert!(after.blocks().contains(&candidates));
        assert!(after.blocks().contains(&vec![child]));
    }

    #[test]
    fn test_empty_candidates() {
        let game = GameTest;
        let (tree, _) = full_tree(&game, 1);
        let builder = HomomorphismBuilder::new(0.1, 1.0, 4);

        assert_eq!(builder.build(&game, &tree, &[]), Err(AbstractionError::EmptyPartition));
    }

    #[test]
    fn test_round_cap() {
        let game = TicTacToe;
        let (tree, candidates) = full_tree(&game, 2);

        // the first round already splits at zero thresholds, so one round
        // is not enough to reach a fixed point
        let builder = HomomorphismBuilder::new(0.0, 0.0, 1);
        assert_eq!(
            builder.build(&game, &tree, &candidates),
            Err(AbstractionError::RoundCapExceeded { rounds: 1 })
        );
    }
}
