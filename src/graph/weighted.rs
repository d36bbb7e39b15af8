//! Compressed weighted adjacency for undirected graphs

use crate::error::{InputFault, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;

/// Compressed sparse representation of an undirected weighted graph.
///
/// Every edge `{u, v}` with `u != v` is stored in both adjacency lists, a
/// self-loop is stored once in its node's list. Adjacency lists are sorted by
/// neighbor id and hold no duplicates.
///
/// Degrees count a self-loop twice, `total_weight` counts it once, so the
/// weighted degrees always sum to `2 * total_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedGraph {
    /// Number of nodes in the graph
    node_count: usize,

    /// offsets[i] to offsets[i+1] defines the adjacency range for node i
    offsets: Vec<usize>,

    /// Concatenated neighbor lists
    neighbors: Vec<u32>,

    /// Edge weights, parallel to `neighbors`
    weights: Vec<f64>,

    /// Weighted degree per node
    degrees: Vec<f64>,

    /// Self-loop weight per node (0 when absent)
    self_loops: Vec<f64>,

    /// Sum of undirected edge weights
    total_weight: f64,
}

impl WeightedGraph {
    /// Graph with `node_count` isolated nodes.
    pub fn empty(node_count: usize) -> Self {
        Self {
            node_count,
            offsets: vec![0; node_count + 1],
            neighbors: Vec::new(),
            weights: Vec::new(),
            degrees: vec![0.0; node_count],
            self_loops: vec![0.0; node_count],
            total_weight: 0.0,
        }
    }

    /// Assemble a graph from raw CSR arrays, deriving degrees and total weight.
    ///
    /// The arrays must already be symmetric, sorted and duplicate free. Every
    /// invariant is checked and a violation is reported as malformed input.
    pub fn from_csr(
        node_count: usize,
        offsets: Vec<usize>,
        neighbors: Vec<u32>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        check_layout(node_count, &offsets, &neighbors, &weights)?;

        let mut degrees = vec![0.0; node_count];
        let mut self_loops = vec![0.0; node_count];
        let mut total_weight = 0.0;

        for node in 0..node_count {
            let range = offsets[node]..offsets[node + 1];
            for (&neighbor, &weight) in neighbors[range.clone()].iter().zip(&weights[range]) {
                let neighbor = neighbor as usize;
                degrees[node] += weight;
                if neighbor == node {
                    degrees[node] += weight;
                    self_loops[node] = weight;
                    total_weight += weight;
                } else if neighbor > node {
                    total_weight += weight;
                }
                // Quality divides by twice the total weight, so that must stay finite too.
                if !degrees[node].is_finite() || !(2.0 * total_weight).is_finite() {
                    return Err(InputFault::WeightOverflow {
                        src: node as u64,
                        dst: neighbor as u64,
                        weight,
                    }
                    .into());
                }
            }
        }

        let graph = Self {
            node_count,
            offsets,
            neighbors,
            weights,
            degrees,
            self_loops,
            total_weight,
        };
        graph.check_symmetry()?;

        Ok(graph)
    }

    /// Re-check every invariant, including the derived per-node arrays.
    ///
    /// Graphs built through [`WeightedGraph::from_csr`] always pass; this is
    /// meant for values obtained by deserialization.
    pub fn validate(&self) -> Result<()> {
        if self.degrees.len() != self.node_count || self.self_loops.len() != self.node_count {
            return Err(corrupt("per-node arrays do not match node count"));
        }

        let rebuilt = Self::from_csr(
            self.node_count,
            self.offsets.clone(),
            self.neighbors.clone(),
            self.weights.clone(),
        )?;

        if rebuilt.degrees != self.degrees || rebuilt.self_loops != self.self_loops {
            return Err(corrupt("stored degrees disagree with adjacency"));
        }
        if rebuilt.total_weight != self.total_weight {
            return Err(corrupt("stored total weight disagrees with adjacency"));
        }

        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of undirected edges, self-loops included.
    pub fn edge_count(&self) -> usize {
        let loop_entries = (0..self.node_count)
            .filter(|&node| self.edge_weight(node, node as u32).is_some())
            .count();
        (self.neighbors.len() - loop_entries) / 2 + loop_entries
    }

    /// Sum of undirected edge weights (self-loops counted once).
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Weighted degree of a node, self-loop counted twice.
    pub fn degree(&self, node: usize) -> f64 {
        self.degrees[node]
    }

    /// Number of adjacency entries of a node.
    pub fn neighbor_count(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    /// `(neighbor, weight)` pairs of a node, sorted by neighbor id.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (u32, f64)> + '_ {
        let range = self.offsets[node]..self.offsets[node + 1];
        self.neighbors[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    pub fn selfloop_weight(&self, node: usize) -> f64 {
        self.self_loops[node]
    }

    /// Weight of edge `{src, dst}` if present
    pub fn edge_weight(&self, src: usize, dst: u32) -> Option<f64> {
        let range = self.offsets[src]..self.offsets[src + 1];
        self.neighbors[range.clone()]
            .binary_search(&dst)
            .ok()
            .map(|pos| self.weights[range.start + pos])
    }

    /// Each undirected edge once as `(u, v, weight)` with `u <= v`.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        (0..self.node_count).flat_map(move |node| {
            self.neighbors(node)
                .filter(move |&(neighbor, _)| neighbor as usize >= node)
                .map(move |(neighbor, weight)| (node as u32, neighbor, weight))
        })
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = self.offsets.capacity() * mem::size_of::<usize>();
        let neighbors = self.neighbors.capacity() * mem::size_of::<u32>();
        let per_edge = self.weights.capacity() * mem::size_of::<f64>();
        let per_node =
            (self.degrees.capacity() + self.self_loops.capacity()) * mem::size_of::<f64>();

        base + offsets + neighbors + per_edge + per_node
    }

    fn check_symmetry(&self) -> Result<()> {
        for node in 0..self.node_count {
            for (neighbor, weight) in self.neighbors(node) {
                if neighbor as usize == node {
                    continue;
                }
                match self.edge_weight(neighbor as usize, node as u32) {
                    Some(back) if back == weight => {}
                    _ => {
                        return Err(corrupt(&format!(
                            "edge ({}, {}) has no matching reverse entry",
                            node, neighbor
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_layout(
    node_count: usize,
    offsets: &[usize],
    neighbors: &[u32],
    weights: &[f64],
) -> Result<()> {
    if node_count > u32::MAX as usize {
        return Err(InputFault::TooManyNodes { count: node_count as u64 }.into());
    }
    if offsets.len() != node_count + 1 || offsets.first() != Some(&0) {
        return Err(corrupt("offset array does not match node count"));
    }
    if offsets[node_count] != neighbors.len() || neighbors.len() != weights.len() {
        return Err(corrupt("offset array does not match adjacency length"));
    }

    if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(corrupt("offsets are not monotone"));
    }

    for node in 0..node_count {
        let (start, end) = (offsets[node], offsets[node + 1]);
        let list = &neighbors[start..end];
        if list.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(corrupt(&format!(
                "adjacency of node {} is unsorted or has duplicates",
                node
            )));
        }
        for (&neighbor, &weight) in list.iter().zip(&weights[start..end]) {
            if neighbor as usize >= node_count {
                return Err(InputFault::NodeOutOfRange {
                    node: neighbor as u64,
                    node_count,
                }
                .into());
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(InputFault::InvalidWeight {
                    src: node as u64,
                    dst: neighbor as u64,
                    weight,
                }
                .into());
            }
        }
    }

    Ok(())
}

fn corrupt(reason: &str) -> crate::error::LouvainError {
    InputFault::CorruptGraph(reason.to_string()).into()
}

impl fmt::Display for WeightedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in 0..self.node_count {
            write!(f, "{}:", node)?;
            for (neighbor, weight) in self.neighbors(node) {
                write!(f, " ({} {})", neighbor, weight)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
