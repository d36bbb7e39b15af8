//! Community detection module

pub mod aggregate;
pub mod context;
pub mod dendrogram;
pub mod louvain;
pub mod metrics;
pub mod optimizer;
pub mod quality;
pub mod table;

pub use aggregate::aggregate;
pub use context::RunContext;
pub use dendrogram::{ClusterNode, Dendrogram};
pub use louvain::{LevelStats, Louvain, LouvainResult};
pub use metrics::{CommunitySummary, SizeDistribution};
pub use optimizer::{one_level, LevelOutcome};
pub use quality::{Modularity, Quality, QualityFunction};
pub use table::CommunityTable;

use crate::error::{InputFault, Result};
use crate::graph::WeightedGraph;
use serde::{Deserialize, Serialize};

/// Assignment of every node to a community, with ids dense in `[0, k)`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Partition {
    /// Community id per node
    assignment: Vec<u32>,

    /// Number of distinct communities
    community_count: usize,
}

impl Partition {
    /// Every node in its own community
    pub fn singletons(node_count: usize) -> Self {
        Self {
            assignment: (0..node_count as u32).collect(),
            community_count: node_count,
        }
    }

    /// Build from arbitrary labels, renumbering them densely in order of first
    /// appearance.
    pub fn from_labels(labels: &[u32]) -> Self {
        let bound = labels.iter().map(|&l| l as usize + 1).max().unwrap_or(0);
        let mut renumber = vec![u32::MAX; bound];
        let mut next = 0u32;

        let assignment = labels
            .iter()
            .map(|&label| {
                let slot = &mut renumber[label as usize];
                if *slot == u32::MAX {
                    *slot = next;
                    next += 1;
                }
                *slot
            })
            .collect();

        Self {
            assignment,
            community_count: next as usize,
        }
    }

    /// Number of nodes covered
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    pub fn community_count(&self) -> usize {
        self.community_count
    }

    pub fn community_of(&self, node: usize) -> u32 {
        self.assignment[node]
    }

    pub fn assignment(&self) -> &[u32] {
        &self.assignment
    }

    /// Members of each community, in node order
    pub fn members(&self) -> Vec<Vec<u32>> {
        let mut members = vec![Vec::new(); self.community_count];
        for (node, &community) in self.assignment.iter().enumerate() {
            members[community as usize].push(node as u32);
        }
        members
    }

    /// Whether no two nodes share a community
    pub fn is_singletons(&self) -> bool {
        self.community_count == self.assignment.len()
    }

    /// Ensure the partition assigns every node of `graph` to an id in `[0, k)`
    pub fn check_covers(&self, graph: &WeightedGraph) -> Result<()> {
        let fits = self.assignment.len() == graph.node_count()
            && self.community_count <= self.assignment.len()
            && self.assignment.iter().all(|&c| (c as usize) < self.community_count);

        if fits {
            Ok(())
        } else {
            Err(InputFault::PartitionMismatch {
                len: self.assignment.len(),
                community_count: self.community_count,
                node_count: graph.node_count(),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_labels_is_dense_in_first_appearance_order() {
        let partition = Partition::from_labels(&[7, 3, 7, 9, 3]);
        assert_eq!(partition.assignment(), &[0, 1, 0, 2, 1]);
        assert_eq!(partition.community_count(), 3);
        assert_eq!(partition.members(), vec![vec![0, 2], vec![1, 4], vec![3]]);
    }

    #[test]
    fn test_check_covers() {
        let graph = crate::graph::from_pairs(3, &[(0, 1)]).unwrap();
        assert!(Partition::from_labels(&[4, 4, 9]).check_covers(&graph).is_ok());
        assert!(Partition::singletons(2).check_covers(&graph).is_err());
        assert!(Partition::singletons(4).check_covers(&graph).is_err());

        let inconsistent = Partition {
            assignment: vec![0, 0, 3],
            community_count: 2,
        };
        assert!(inconsistent.check_covers(&graph).is_err());
    }

    #[test]
    fn test_singletons() {
        let partition = Partition::singletons(3);
        assert!(partition.is_singletons());
        assert_eq!(partition.community_of(2), 2);
        assert!(Partition::singletons(0).is_empty());
    }
}
