//! Abstract classes and the resolution map.
//!
//! Merging ground nodes never touches the nodes themselves. A [`Resolution`]
//! redirects statistics lookups and updates from a member node to the
//! [`AbstractClass`] it belongs to. Each rebuild dissolves the previous
//! resolution and creates a new one from a [`Partition`].

use serde::{Deserialize, Serialize};

use crate::{GroundNode, NodeId, Stats, Tree};

/// How the representative action set of a class is formed from its members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPolicy {
    /// Actions legal in at least one member.
    Union,
    /// Actions legal in every member.
    #[default]
    Intersection,
}

/// Grouping of a set of candidate ground nodes into disjoint blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    blocks: Vec<Vec<NodeId>>,
    considered: usize,
}

impl Partition {
    /// Builds a partition from its blocks. Empty blocks are dropped.
    pub fn new(blocks: Vec<Vec<NodeId>>) -> Self {
        let blocks: Vec<Vec<NodeId>> = blocks.into_iter().filter(|block| !block.is_empty()).collect();
        let considered = blocks.iter().map(Vec::len).sum();
        Partition { blocks, considered }
    }

    /// Every candidate in its own block.
    pub fn identity(candidates: &[NodeId]) -> Self {
        Partition::new(candidates.iter().map(|&id| vec![id]).collect())
    }

    #[inline]
    pub fn blocks(&self) -> &[Vec<NodeId>] {
        &self.blocks
    }

    /// Number of classes.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of ground nodes the partition covers.
    #[inline]
    pub fn considered(&self) -> usize {
        self.considered
    }

    /// Ground nodes per class; `1.0` means no compression.
    ///
    /// # Examples
    /// ```rust
    /// use elastic_mcts::Partition;
    /// assert_eq!(Partition::new(Vec::new()).compression_rate(), 1.0);
    /// ```
    pub fn compression_rate(&self) -> f64 {
        if self.blocks.is_empty() {
            1.0
        } else {
            self.considered as f64 / self.blocks.len() as f64
        }
    }
}

/// Index of a class inside its [`Resolution`].
pub type ClassId = usize;

/// A set of ground nodes sharing one set of statistics.
///
/// The class starts from the sum of its members' statistics. Updates
/// arriving through a member are added to the class total and remembered
/// per member, so they can be handed back when the class is dissolved.
#[derive(Clone, Debug)]
pub struct AbstractClass<A> {
    members: Vec<NodeId>,
    contributions: Vec<Stats>,
    stats: Stats,
    actions: Vec<A>,
}

impl<A: Clone + PartialEq> AbstractClass<A> {
    fn new<S>(tree: &Tree<GroundNode<S, A>>, members: &[NodeId], policy: ActionPolicy) -> Self {
        let mut stats = Stats::default();
        for &member in members {
            stats.merge(tree.get(member).stats());
        }

        AbstractClass {
            members: members.to_vec(),
            contributions: vec![Stats::default(); members.len()],
            stats,
            actions: representative_actions(tree, members, policy),
        }
    }

    #[inline]
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Aggregated statistics of the class.
    #[inline]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Representative action set, formed according to the [`ActionPolicy`].
    #[inline]
    pub fn representative_actions(&self) -> &[A] {
        &self.actions
    }

    /// Updates recorded through the member at `slot` since the class was built.
    #[inline]
    pub fn contribution(&self, slot: usize) -> Stats {
        self.contributions[slot]
    }
}

fn representative_actions<S, A: Clone + PartialEq>(
    tree: &Tree<GroundNode<S, A>>,
    members: &[NodeId],
    policy: ActionPolicy,
) -> Vec<A> {
    let Some((&first, rest)) = members.split_first() else {
        return Vec::new();
    };

    let mut actions = tree.get(first).actions().to_vec();
    for &member in rest {
        let other = tree.get(member).actions();
        match policy {
            ActionPolicy::Union => {
                for action in other {
                    if !actions.contains(action) {
                        actions.push(action.clone());
                    }
                }
            }
            ActionPolicy::Intersection => actions.retain(|action| other.contains(action)),
        }
    }
    actions
}

/// Where the statistics of a ground node currently live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolved {
    Ground(NodeId),
    Abstract(ClassId),
}

/// Map from ground node to its current abstract class.
///
/// Total over every node of the tree: a node that is not a member of any
/// class resolves to itself, including nodes created after the map was built.
#[derive(Clone, Debug)]
pub struct Resolution<A> {
    classes: Vec<AbstractClass<A>>,
    owner: Vec<Option<(ClassId, usize)>>,
}

impl<A> Default for Resolution<A> {
    fn default() -> Self {
        Resolution {
            classes: Vec::new(),
            owner: Vec::new(),
        }
    }
}

impl<A: Clone + PartialEq> Resolution<A> {
    /// Every node resolves to itself.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Creates one class per block of `partition` with at least two members.
    /// Singleton blocks stay unabstracted.
    pub fn build<S>(partition: &Partition, tree: &Tree<GroundNode<S, A>>, policy: ActionPolicy) -> Self {
        let mut resolution = Resolution {
            classes: Vec::new(),
            owner: vec![None; tree.len()],
        };

        for block in partition.blocks().iter().filter(|block| block.len() > 1) {
            let id = resolution.classes.len();
            for (slot, member) in block.iter().enumerate() {
                debug_assert!(
                    resolution.owner[member.index()].is_none(),
                    "{member:?} belongs to two classes"
                );
                resolution.owner[member.index()] = Some((id, slot));
            }
            resolution.classes.push(AbstractClass::new(tree, block, policy));
        }

        resolution
    }

    /// Hands the updates recorded by each class back to its members.
    pub fn dissolve<S>(self, tree: &mut Tree<GroundNode<S, A>>) {
        for class in self.classes {
            for (member, contribution) in class.members.iter().zip(class.contributions) {
                tree.get_mut(*member).stats.merge(contribution);
            }
        }
    }

    pub fn resolve(&self, id: NodeId) -> Resolved {
        match self.owner.get(id.index()).copied().flatten() {
            Some((class, _)) => Resolved::Abstract(class),
            None => Resolved::Ground(id),
        }
    }

    /// Statistics that are authoritative for `id`.
    pub fn stats<S>(&self, tree: &Tree<GroundNode<S, A>>, id: NodeId) -> Stats {
        match self.resolve(id) {
            Resolved::Ground(id) => tree.get(id).stats(),
            Resolved::Abstract(class) => self.classes[class].stats,
        }
    }

    /// Adds one backed-up value to whatever is authoritative for `id`.
    pub fn record<S>(&mut self, tree: &mut Tree<GroundNode<S, A>>, id: NodeId, value: f64) {
        match self.owner.get(id.index()).copied().flatten() {
            Some((class, slot)) => {
                let class = &mut self.classes[class];
                class.stats.add(value);
                class.contributions[slot].add(value);
            }
            None => tree.get_mut(id).stats.add(value),
        }
    }

    #[inline]
    pub fn classes(&self) -> &[AbstractClass<A>] {
        &self.classes
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &AbstractClass<A> {
        &self.classes[id]
    }

    /// True when no node is merged with another.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::GameTest;
    use crate::Game;

    /// Root with the four first picks expanded, each visited once.
    fn sample_tree() -> (Tree<GroundNode<Vec<usize>, usize>>, Vec<NodeId>) {
        let game = GameTest;
        let root_state = game.initial_state();
        let mut tree = Tree::new_root(GroundNode::root(&game, root_state.clone()));
        let mut children = Vec::new();

        for (index, action) in game.legal_actions(&root_state).into_iter().enumerate() {
            let state = game.step(&root_state, &action);
            let id = tree.add_child(tree.root(), GroundNode::child(&game, state, action, index, 0));
            tree.get_mut(id).stats.add(index as f64);
            children.push(id);
        }

        (tree, children)
    }

    #[test]
    fn test_partition_compression() {
        let (_, children) = sample_tree();
        let partition = Partition::new(vec![children[..3].to_vec(), vec![children[3]], Vec::new()]);

        assert_eq!(partition.len(), 2);
        assert_eq!(partition.considered(), 4);
        assert_eq!(partition.compression_rate(), 2.0);

        let identity = Partition::identity(&children);
        assert_eq!(identity.len(), 4);
        assert_eq!(identity.compression_rate(), 1.0);
    }

    #[test]
    fn test_identity_resolution() {
        let (tree, children) = sample_tree();
        let resolution = Resolution::<usize>::identity();

        assert!(resolution.is_identity());
        for &child in &children {
            assert_eq!(resolution.resolve(child), Resolved::Ground(child));
            assert_eq!(resolution.stats(&tree, child), tree.get(child).stats());
        }
    }

    #[test]
    fn test_build_aggregates_members() {
        let (tree, children) = sample_tree();
        let partition = Partition::new(vec![vec![children[1], children[3]], vec![children[0]], vec![children[2]]]);
        let resolution = Resolution::build(&partition, &tree, ActionPolicy::Intersection);

        assert_eq!(resolution.classes().len(), 1);
        assert_eq!(resolution.resolve(children[1]), Resolved::Abstract(0));
        assert_eq!(resolution.resolve(children[3]), Resolved::Abstract(0));
        assert_eq!(resolution.resolve(children[0]), Resolved::Ground(children[0]));
        assert_eq!(resolution.resolve(tree.root()), Resolved::Ground(tree.root()));

        let class = resolution.class(0);
        assert_eq!(class.members(), &[children[1], children[3]]);
        assert_eq!(class.stats(), Stats { n: 2, w: 4.0 });
        assert_eq!(resolution.stats(&tree, children[1]), class.stats());
    }

    #[test]
    fn test_representative_actions() {
        let (tree, children) = sample_tree();
        let partition = Partition::new(vec![vec![children[0], children[1]]]);

        // picks 0 then 1 leave {1, 2, 3} and {0, 2, 3}
        let intersection = Resolution::build(&partition, &tree, ActionPolicy::Intersection);
        assert_eq!(intersection.class(0).representative_actions(), &[2, 3]);

        let union = Resolution::build(&partition, &tree, ActionPolicy::Union);
        assert_eq!(union.class(0).representative_actions(), &[1, 2, 3, 0]);
    }

    #[test]
    fn test_updates_flow_to_class_and_back() {
        let (mut tree, children) = sample_tree();
        let partition = Partition::new(vec![vec![children[0], children[1]]]);
        let mut resolution = Resolution::build(&partition, &tree, ActionPolicy::Intersection);

        resolution.record(&mut tree, children[0], 1.0);
        resolution.record(&mut tree, children[1], -0.5);
        resolution.record(&mut tree, children[2], 2.0);

        // members are frozen while abstracted
        assert_eq!(tree.get(children[0]).stats(), Stats { n: 1, w: 0.0 });
        assert_eq!(tree.get(children[1]).stats(), Stats { n: 1, w: 1.0 });
        assert_eq!(resolution.class(0).stats(), Stats { n: 4, w: 1.5 });
        assert_eq!(resolution.class(0).contribution(1), Stats { n: 1, w: -0.5 });
        assert_eq!(tree.get(children[2]).stats(), Stats { n: 2, w: 4.0 });

        resolution.dissolve(&mut tree);
        assert_eq!(tree.get(children[0]).stats(), Stats { n: 2, w: 1.0 });
        assert_eq!(tree.get(children[1]).stats(), Stats { n: 2, w: 0.5 });
    }

    #[test]
    fn test_nodes_created_after_build_resolve_to_themselves() {
        let (mut tree, children) = sample_tree();
        let resolution = Resolution::build(&Partition::new(vec![children.clone()]), &tree, ActionPolicy::Union);

        let game = GameTest;
        let state = game.step(tree.get(children[0]).state(), &1);
        let late = tree.add_child(children[0], GroundNode::child(&game, state, 1, 0, 1));

        assert_eq!(resolution.resolve(late), Resolved::Ground(late));
        assert_eq!(resolution.stats(&tree, late), Stats::default());
    }
}
