//! Data preprocessing module for graph construction

use crate::data::{EdgeList, RawEdge};
use crate::error::{InputFault, Result};
use crate::graph::{GraphBuilder, WeightedGraph};
use std::collections::HashMap;

/// Graph built from an edge list, with the original labels when renumbered
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: WeightedGraph,

    /// Original label of every node, present when labels were renumbered
    pub labels: Option<Vec<u64>>,
}

impl LoadedGraph {
    /// Original label of a node
    pub fn label(&self, node: usize) -> u64 {
        match &self.labels {
            Some(labels) => labels[node],
            None => node as u64,
        }
    }
}

/// Map arbitrary labels onto `[0, n)` in order of first appearance
///
/// Returns the relabelled edges and the original label of every new id.
pub fn renumber(list: &EdgeList) -> (EdgeList, Vec<u64>) {
    let mut label_to_index: HashMap<u64, u64> = HashMap::new();
    let mut labels: Vec<u64> = Vec::new();

    let mut index_of = |label: u64| {
        *label_to_index.entry(label).or_insert_with(|| {
            labels.push(label);
            (labels.len() - 1) as u64
        })
    };

    let edges = list
        .edges
        .iter()
        .map(|edge| RawEdge {
            src: index_of(edge.src),
            dst: index_of(edge.dst),
            weight: edge.weight,
        })
        .collect();

    (
        EdgeList {
            kind: list.kind,
            edges,
        },
        labels,
    )
}

/// Build the level-0 graph from an edge list
///
/// Without renumbering, labels are used as node ids directly and the graph
/// has `max label + 1` nodes; unused ids become isolated nodes.
pub fn build_graph(list: &EdgeList, do_renumber: bool) -> Result<LoadedGraph> {
    let (edges, labels) = if do_renumber {
        let (edges, labels) = renumber(list);
        log::info!("Renumbered {} distinct node labels", labels.len());
        (edges, Some(labels))
    } else {
        (list.clone(), None)
    };

    let node_count = match &labels {
        Some(labels) => labels.len() as u64,
        None => edges.max_label().map_or(0, |max| max + 1),
    };
    if node_count > u32::MAX as u64 {
        return Err(InputFault::TooManyNodes { count: node_count }.into());
    }

    let mut builder = GraphBuilder::new(node_count as usize, edges.kind)?;
    for edge in &edges.edges {
        builder.add_edge(edge.src, edge.dst, edge.weight)?;
    }
    let graph = builder.build()?;

    log::info!(
        "Built graph with {} nodes, {} edges, total weight {}",
        graph.node_count(),
        graph.edge_count(),
        graph.total_weight()
    );

    Ok(LoadedGraph { graph, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphKind;

    fn list(pairs: &[(u64, u64)]) -> EdgeList {
        EdgeList {
            kind: GraphKind::Unweighted,
            edges: pairs
                .iter()
                .map(|&(src, dst)| RawEdge { src, dst, weight: None })
                .collect(),
        }
    }

    #[test]
    fn test_renumber_first_appearance() {
        let (edges, labels) = renumber(&list(&[(100, 7), (7, 42), (42, 100)]));
        assert_eq!(labels, vec![100, 7, 42]);
        assert_eq!(edges.edges[1], RawEdge { src: 1, dst: 2, weight: None });
    }

    #[test]
    fn test_sparse_labels_without_renumbering_leave_isolated_nodes() {
        let loaded = build_graph(&list(&[(0, 5)]), false).unwrap();
        assert_eq!(loaded.graph.node_count(), 6);
        assert_eq!(loaded.graph.degree(3), 0.0);
        assert_eq!(loaded.label(5), 5);
    }

    #[test]
    fn test_renumbered_graph_is_dense() {
        let loaded = build_graph(&list(&[(1000, 2000), (2000, 3000)]), true).unwrap();
        assert_eq!(loaded.graph.node_count(), 3);
        assert_eq!(loaded.label(2), 3000);
        assert_eq!(loaded.graph.degree(1), 2.0);
    }

    #[test]
    fn test_huge_labels_need_renumbering() {
        let err = build_graph(&list(&[(0, u64::from(u32::MAX) + 5)]), false).unwrap_err();
        assert!(matches!(
            err,
            crate::error::LouvainError::MalformedInput(InputFault::TooManyNodes { .. })
        ));
        assert!(build_graph(&list(&[(0, u64::from(u32::MAX) + 5)]), true).is_ok());
    }

    #[test]
    fn test_empty_list() {
        let loaded = build_graph(&list(&[]), false).unwrap();
        assert_eq!(loaded.graph.node_count(), 0);
    }
}
