//! Instrumentation: per-iteration records and per-decision summaries.
//!
//! Nothing recorded here feeds back into the search.

use serde::{Deserialize, Serialize};

use crate::Variant;

/// Counters captured after one iteration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Lifetime iteration counter of the searcher, starting at 1.
    pub iteration: usize,
    /// Ground nodes in the current tree.
    pub ground_nodes: usize,
    /// Merged classes (two members or more) of the active resolution,
    /// `None` for Standard MCTS.
    pub abstract_classes: Option<usize>,
    /// Legal actions at the root.
    pub root_choices: usize,
    /// Compression rate of the last rebuild, `None` before any rebuild.
    /// Nodes considered by that rebuild over `partition_blocks`.
    pub compression_rate: Option<f64>,
    /// Blocks of the last rebuild's partition, singletons included.
    pub partition_blocks: Option<usize>,
}

/// Append-only sequence of [`IterationRecord`]s.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    records: Vec<IterationRecord>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    #[inline]
    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IterationRecord> {
        self.records.iter()
    }
}

/// What one decision's search looked like when it finished.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub variant: Variant,
    /// Iterations run for this decision.
    pub iterations: usize,
    pub ground_nodes: usize,
    /// Classes with at least two members at the end of the search.
    pub abstract_classes: usize,
    /// Compression rate of the last rebuild, `1.0` if none happened.
    pub compression_rate: f64,
    /// Blocks of the last rebuild's partition, singletons included; `0` if
    /// none happened.
    pub partition_blocks: usize,
    pub root_choices: usize,
    /// Abstraction rebuilds triggered, failed ones included.
    pub abstraction_events: usize,
    /// Mean value of the root from the perspective of the player to move.
    pub root_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(iteration: usize) -> IterationRecord {
        IterationRecord {
            iteration,
            ground_nodes: iteration + 1,
            abstract_classes: None,
            root_choices: 3,
            compression_rate: None,
            partition_blocks: None,
        }
    }

    #[test]
    fn test_append_only() {
        let mut statistics = RunStatistics::new();
        assert!(statistics.is_empty());
        assert!(statistics.last().is_none());

        statistics.push(record(1));
        statistics.push(record(2));

        assert_eq!(statistics.len(), 2);
        assert_eq!(statistics.last(), Some(&record(2)));
        assert_eq!(
            statistics.iter().map(|record| record.iteration).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_summary_serializes() {
        let summary = SearchSummary {
            variant: Variant::RandomGrouping,
            iterations: 50,
            ground_nodes: 51,
            abstract_classes: 4,
            compression_rate: 2.5,
            partition_blocks: 6,
            root_choices: 3,
            abstraction_events: 2,
            root_value: 0.25,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["variant"], "random_grouping");
        assert_eq!(json["ground_nodes"], 51);
        assert_eq!(serde_json::from_value::<SearchSummary>(json).unwrap(), summary);
    }
}
