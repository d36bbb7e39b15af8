//! Multi-level hierarchy of partitions

use crate::community::Partition;
use crate::error::{InputFault, Result};
use serde::{Deserialize, Serialize};

/// Ordered partitions, one per level
///
/// Partition `i + 1` assigns the communities of partition `i` (the nodes of
/// the level `i + 1` graph) to coarser communities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dendrogram {
    levels: Vec<Partition>,
}

/// One entry of the cluster tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Id unique across all heights
    pub id: u64,
    /// 0 for original nodes, `level_count()` for top-level communities
    pub height: usize,
    /// Enclosing cluster, `None` for the root
    pub parent: Option<u64>,
    /// Original node index, for leaves
    pub node: Option<u32>,
}

impl Dendrogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a sequence of partitions, checking that consecutive levels
    /// fit together.
    pub fn from_levels(levels: Vec<Partition>) -> Result<Self> {
        let mut dendrogram = Self::new();
        for partition in levels {
            dendrogram.push(partition)?;
        }
        Ok(dendrogram)
    }

    /// Append the partition of the next level. It must cover exactly the
    /// communities of the previous level.
    pub fn push(&mut self, partition: Partition) -> Result<()> {
        if let Some(last) = self.levels.last() {
            if partition.len() != last.community_count() {
                return Err(InputFault::CorruptGraph(format!(
                    "level {} covers {} nodes but the previous level has {} communities",
                    self.levels.len(),
                    partition.len(),
                    last.community_count()
                ))
                .into());
            }
        }
        self.levels.push(partition);
        Ok(())
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Partition] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> Option<&Partition> {
        self.levels.get(level)
    }

    /// Number of original nodes
    pub fn node_count(&self) -> usize {
        self.levels.first().map_or(0, Partition::len)
    }

    /// Number of communities at the top level
    pub fn top_community_count(&self) -> usize {
        self.levels.last().map_or(0, Partition::community_count)
    }

    /// Community of original `node` after `level` (inclusive), if both exist
    pub fn community_at(&self, node: usize, level: usize) -> Option<u32> {
        if level >= self.levels.len() || node >= self.node_count() {
            return None;
        }
        let mut community = node as u32;
        for partition in &self.levels[..=level] {
            community = partition.community_of(community as usize);
        }
        Some(community)
    }

    /// Community ids of `node` at every level, finest first
    pub fn ancestors(&self, node: usize) -> Vec<u32> {
        let mut chain = Vec::with_capacity(self.levels.len());
        let mut community = node as u32;
        for partition in &self.levels {
            community = partition.community_of(community as usize);
            chain.push(community);
        }
        chain
    }

    /// Community of every original node after `level`, if that level exists
    pub fn assignment_at(&self, level: usize) -> Option<Vec<u32>> {
        let levels = self.levels.get(..=level)?;
        let mut assignment: Vec<u32> = (0..self.node_count() as u32).collect();
        for partition in levels {
            for community in assignment.iter_mut() {
                *community = partition.community_of(*community as usize);
            }
        }
        Some(assignment)
    }

    /// Top-level community of every original node
    pub fn final_assignment(&self) -> Vec<u32> {
        self.levels
            .len()
            .checked_sub(1)
            .and_then(|top| self.assignment_at(top))
            .unwrap_or_default()
    }

    /// Flatten the hierarchy into a tree of globally numbered clusters
    ///
    /// Nodes of level `h` are numbered after all nodes of lower levels, the
    /// top-level communities come next, and a root is appended when more than
    /// one top-level community remains.
    pub fn cluster_tree(&self) -> Vec<ClusterNode> {
        if self.levels.is_empty() {
            return Vec::new();
        }

        let mut tree = Vec::new();
        let mut base = 0u64;

        for (height, partition) in self.levels.iter().enumerate() {
            let next_base = base + partition.len() as u64;
            for (idx, &community) in partition.assignment().iter().enumerate() {
                tree.push(ClusterNode {
                    id: base + idx as u64,
                    height,
                    parent: Some(next_base + community as u64),
                    node: (height == 0).then_some(idx as u32),
                });
            }
            base = next_base;
        }

        let height = self.levels.len();
        let top = self.top_community_count() as u64;
        let root = (top > 1).then_some(base + top);

        for community in 0..top {
            tree.push(ClusterNode {
                id: base + community,
                height,
                parent: root,
                node: None,
            });
        }
        if let Some(root) = root {
            tree.push(ClusterNode {
                id: root,
                height: height + 1,
                parent: None,
                node: None,
            });
        }

        tree
    }
}
