//! Random grouping, the noise baseline for the Elastic abstraction.

use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};

use crate::{Game, GroundNode, NodeId, Partition, Player, Tree};

/// Randomly partitions `candidates` into about `classes` blocks.
///
/// Candidates are first bucketed by the player who moved into them, so that
/// every class stores values from a single perspective. With
/// `unit_ordering`, nodes reached through a priority action form one block
/// per mover of their own. The remaining classes are spread over the other
/// buckets in proportion to their size, and each bucket is shuffled and
/// dealt round-robin into its share, so blocks of a bucket differ in size by
/// at most one.
///
/// Every bucket yields at least one block and no block is empty, so the
/// block count is `classes` clamped to that range.
pub fn random_partition<G: Game, R: Rng + ?Sized>(
    game: &G,
    tree: &Tree<GroundNode<G::State, G::Action>>,
    candidates: &[NodeId],
    classes: usize,
    unit_ordering: bool,
    rng: &mut R,
) -> Partition {
    let mut buckets: BTreeMap<(bool, Option<Player>), Vec<NodeId>> = BTreeMap::new();
    for &id in candidates {
        let node = tree.get(id);
        let priority = unit_ordering && node.action().is_some_and(|action| game.is_priority(action));
        buckets.entry((priority, node.mover())).or_default().push(id);
    }

    let mut blocks = Vec::new();
    let mut others = Vec::new();
    for ((priority, _), bucket) in buckets {
        if priority {
            blocks.push(bucket);
        } else {
            others.push(bucket);
        }
    }

    let sizes: Vec<usize> = others.iter().map(Vec::len).collect();
    let shares = allocate(classes.saturating_sub(blocks.len()), &sizes);
    for (mut bucket, share) in others.into_iter().zip(shares) {
        bucket.shuffle(rng);
        let mut dealt = vec![Vec::new(); share];
        for (slot, id) in bucket.into_iter().enumerate() {
            dealt[slot % share].push(id);
        }
        blocks.extend(dealt);
    }
    Partition::new(blocks)
}

/// Splits `total` classes over buckets of the given sizes: one each, then
/// the rest proportionally, never more than a bucket's size.
fn allocate(total: usize, sizes: &[usize]) -> Vec<usize> {
    let mut shares = vec![1; sizes.len()];
    let population: usize = sizes.iter().sum();
    let spare = total.saturating_sub(sizes.len());
    if spare == 0 || population == 0 {
        return shares;
    }

    for (share, &size) in shares.iter_mut().zip(sizes) {
        *share = (1 + spare * size / population).min(size);
    }

    // hand out what flooring left over, first bucket first
    let mut left = total.min(population).saturating_sub(shares.iter().sum());
    while left > 0 {
        let mut given = false;
        for (share, &size) in shares.iter_mut().zip(sizes) {
            if left > 0 && *share < size {
                *share += 1;
                left -= 1;
                given = true;
            }
        }
        if !given {
            break;
        }
    }
    shares
}
