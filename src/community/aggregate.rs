//! Coarsening of a graph by its communities

use crate::community::Partition;
use crate::error::{InputFault, LouvainError, Result};
use crate::graph::{GraphBuilder, GraphKind, WeightedGraph};

/// Collapse every community of `partition` into a single node
///
/// Weights between communities are summed. Edges inside a community, member
/// self-loops included, become that node's self-loop, so the total weight of
/// the coarse graph equals the total weight of `graph`. `level` only labels
/// diagnostics.
pub fn aggregate(
    graph: &WeightedGraph,
    partition: &Partition,
    level: usize,
) -> Result<WeightedGraph> {
    partition.check_covers(graph)?;

    let mut builder = GraphBuilder::new(partition.community_count(), GraphKind::Weighted)?;
    for (src, dst, weight) in graph.edges() {
        let c1 = partition.community_of(src as usize);
        let c2 = partition.community_of(dst as usize);
        builder.add_edge(c1 as u64, c2 as u64, Some(weight))?;
    }

    let coarse = builder.build().map_err(|err| match err {
        LouvainError::MalformedInput(InputFault::InvalidWeight { src, dst, weight })
        | LouvainError::MalformedInput(InputFault::WeightOverflow { src, dst, weight }) => {
            LouvainError::NumericInstability {
                level,
                detail: format!(
                    "aggregated edge between communities {} and {} has weight {}",
                    src, dst, weight
                ),
            }
        }
        other => other,
    })?;

    log::debug!(
        "level {} aggregated into {} nodes, {} edges",
        level,
        coarse.node_count(),
        coarse.edge_count()
    );

    Ok(coarse)
}
