//! Graph construction module

use crate::error::{InputFault, Result};
use crate::graph::WeightedGraph;
use itertools::Itertools;
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// How edge weights in the input are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    /// Every edge has unit weight; repeated edges collapse into one.
    #[default]
    Unweighted,
    /// Edges carry weights; repeated edges have their weights summed.
    Weighted,
}

/// Builder that cleans an edge list into a [`WeightedGraph`]
///
/// Edges are validated as they are added. Both directions of every
/// undirected edge are recorded, parallel edges and repeated self-loops are
/// merged when the graph is built.
pub struct GraphBuilder {
    /// Declared node count
    node_count: usize,

    /// Weight interpretation
    kind: GraphKind,

    /// Adjacency lists for each node, possibly with repeated neighbors
    adjacency_lists: Vec<Vec<(u32, f64)>>,
}

impl GraphBuilder {
    /// Create a builder for a graph over the dense id space `[0, node_count)`
    pub fn new(node_count: usize, kind: GraphKind) -> Result<Self> {
        if node_count > u32::MAX as usize {
            return Err(InputFault::TooManyNodes { count: node_count as u64 }.into());
        }

        Ok(Self {
            node_count,
            kind,
            adjacency_lists: vec![Vec::new(); node_count],
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Add an undirected edge. `weight` of `None` means unit weight.
    pub fn add_edge(&mut self, src: u64, dst: u64, weight: Option<f64>) -> Result<()> {
        let src_idx = self.check_node(src)?;
        let dst_idx = self.check_node(dst)?;

        let weight = match (self.kind, weight) {
            (_, None) => 1.0,
            (GraphKind::Unweighted, Some(w)) if w == 1.0 => 1.0,
            (GraphKind::Unweighted, Some(w)) => {
                return Err(InputFault::UnexpectedWeight { src, dst, weight: w }.into())
            }
            (GraphKind::Weighted, Some(w)) => w,
        };
        if !weight.is_finite() || weight < 0.0 {
            return Err(InputFault::InvalidWeight { src, dst, weight }.into());
        }

        self.adjacency_lists[src_idx].push((dst_idx as u32, weight));
        if src_idx != dst_idx {
            self.adjacency_lists[dst_idx].push((src_idx as u32, weight));
        }

        Ok(())
    }

    /// Build the compressed graph
    pub fn build(self) -> Result<WeightedGraph> {
        let kind = self.kind;
        let node_count = self.node_count;

        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        let mut neighbors = Vec::new();
        let mut weights = Vec::new();

        for (node, mut list) in self.adjacency_lists.into_iter().enumerate() {
            // Stable, so both directions of a parallel edge are summed in the same order.
            list.sort_by_key(|&(neighbor, _)| neighbor);

            let merged = list.into_iter().coalesce(|a, b| {
                if a.0 == b.0 {
                    match kind {
                        GraphKind::Weighted => Ok((a.0, a.1 + b.1)),
                        GraphKind::Unweighted => Ok(a),
                    }
                } else {
                    Err((a, b))
                }
            });

            for (neighbor, weight) in merged {
                if !weight.is_finite() {
                    return Err(InputFault::InvalidWeight {
                        src: node as u64,
                        dst: neighbor as u64,
                        weight,
                    }
                    .into());
                }
                neighbors.push(neighbor);
                weights.push(weight);
            }
            offsets.push(neighbors.len());
        }

        let graph = WeightedGraph::from_csr(node_count, offsets, neighbors, weights)?;

        log::debug!(
            "Built graph with {} nodes, {} edges, total weight {}",
            graph.node_count(),
            graph.edge_count(),
            graph.total_weight()
        );

        Ok(graph)
    }

    fn check_node(&self, node: u64) -> Result<usize> {
        if node >= self.node_count as u64 {
            return Err(InputFault::NodeOutOfRange {
                node,
                node_count: self.node_count,
            }
            .into());
        }
        Ok(node as usize)
    }
}

/// Build a graph from `(src, dst, weight)` triples over `[0, node_count)`
pub fn from_edges<I>(node_count: usize, kind: GraphKind, edges: I) -> Result<WeightedGraph>
where
    I: IntoIterator<Item = (u64, u64, Option<f64>)>,
{
    let mut builder = GraphBuilder::new(node_count, kind)?;
    for (src, dst, weight) in edges {
        builder.add_edge(src, dst, weight)?;
    }
    builder.build()
}

/// Build a graph from unit-weight `(src, dst)` pairs over `[0, node_count)`
pub fn from_pairs(node_count: usize, pairs: &[(u32, u32)]) -> Result<WeightedGraph> {
    from_edges(
        node_count,
        GraphKind::Unweighted,
        pairs.iter().map(|&(src, dst)| (src as u64, dst as u64, None)),
    )
}

/// Convert a petgraph undirected graph, reading edge weights with `weight_of`
///
/// Node indices are already dense in petgraph, so they are used unchanged.
pub fn from_petgraph<N, E, F>(graph: &UnGraph<N, E>, weight_of: F) -> Result<WeightedGraph>
where
    F: Fn(&E) -> f64,
{
    let mut builder = GraphBuilder::new(graph.node_count(), GraphKind::Weighted)?;
    for edge in graph.edge_references() {
        builder.add_edge(
            edge.source().index() as u64,
            edge.target().index() as u64,
            Some(weight_of(edge.weight())),
        )?;
    }
    builder.build()
}
