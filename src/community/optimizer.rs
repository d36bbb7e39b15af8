//! Local greedy moving phase of one level

use crate::community::table::NeighborCommunities;
use crate::community::{CommunityTable, Partition, QualityFunction, RunContext};
use crate::error::{LouvainError, Result};
use crate::graph::WeightedGraph;

/// Gains closer than this are treated as equal
const GAIN_TOLERANCE: f64 = 1e-12;

/// Result of optimizing one level
#[derive(Debug, Clone)]
pub struct LevelOutcome {
    /// Converged partition, dense ids
    pub partition: Partition,
    /// Whether at least one node changed community
    pub improved: bool,
    pub passes: usize,
    pub moves: usize,
    pub quality_before: f64,
    pub quality_after: f64,
}

/// Repeatedly sweep the nodes of `graph`, moving each into the neighboring
/// community with the best quality gain, starting from `initial`.
///
/// Sweeps stop once a pass moves nothing, gains less than the context's
/// precision, or the pass cap is reached.
pub fn one_level(
    ctx: &mut RunContext,
    graph: &WeightedGraph,
    initial: &Partition,
) -> Result<LevelOutcome> {
    let node_count = graph.node_count();
    let total_weight = graph.total_weight();
    let mut table = CommunityTable::new(graph, initial)?;

    let quality_before = ctx.quality().table_quality(&table);
    check_finite(ctx, quality_before, "initial quality")?;

    let order = ctx.visit_order(node_count);
    let quality = *ctx.quality();
    let mut scratch = NeighborCommunities::new(node_count);

    let mut current = quality_before;
    let mut passes = 0;
    let mut total_moves = 0;

    loop {
        passes += 1;
        let mut moves = 0;

        for &node in &order {
            let node = node as usize;
            let own = table.community_of(node);
            let degree = graph.degree(node);
            let self_loop = graph.selfloop_weight(node);

            scratch.collect(graph, &table, node);
            table.remove(node, degree, scratch.weight(own), self_loop);

            let mut best = own;
            let mut best_weight = scratch.weight(own);
            let mut best_gain =
                quality.insertion_gain(total_weight, table.sigma_tot(own), degree, best_weight);

            for (community, weight) in scratch.iter() {
                if community == own {
                    continue;
                }
                let sigma_tot = table.sigma_tot(community);
                let gain = quality.insertion_gain(total_weight, sigma_tot, degree, weight);
                let better = gain > best_gain + GAIN_TOLERANCE;
                let tie_to_lower =
                    (gain - best_gain).abs() <= GAIN_TOLERANCE && best != own && community < best;
                if better || tie_to_lower {
                    best = community;
                    best_weight = weight;
                    best_gain = best_gain.max(gain);
                }
            }

            // Isolation scores zero; take it when every community costs quality.
            if best_gain < -GAIN_TOLERANCE {
                if let Some(empty) = table.take_empty() {
                    best = empty;
                    best_weight = 0.0;
                }
            }

            table.insert(node, best, degree, best_weight, self_loop);
            if best != own {
                moves += 1;
            }
        }

        total_moves += moves;

        let next = quality.table_quality(&table);
        check_finite(ctx, next, "quality after pass")?;
        let gain = next - current;
        current = next;

        log::debug!(
            "level {} pass {}: {} moves, quality {:.6} ({:+.3e})",
            ctx.level(),
            passes,
            moves,
            current,
            gain
        );

        let capped = ctx.max_passes().map_or(false, |cap| passes >= cap);
        if moves == 0 || gain < ctx.precision() || capped {
            break;
        }
    }

    Ok(LevelOutcome {
        partition: table.to_partition(),
        improved: total_moves > 0,
        passes,
        moves: total_moves,
        quality_before,
        quality_after: current,
    })
}

fn check_finite(ctx: &RunContext, value: f64, what: &str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LouvainError::NumericInstability {
            level: ctx.level(),
            detail: format!("{} is {}", what, value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LouvainConfig;
    use crate::error::InputFault;
    use crate::graph::from_pairs;

    fn sequential() -> RunContext {
        RunContext::new(&LouvainConfig::sequential().with_precision(0.0)).unwrap()
    }

    #[test]
    fn test_two_triangles_split() {
        let graph = from_pairs(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)]).unwrap();
        let mut ctx = sequential();
        let outcome = one_level(&mut ctx, &graph, &Partition::singletons(6)).unwrap();

        assert!(outcome.improved);
        assert_eq!(outcome.partition.community_count(), 2);
        assert_eq!(outcome.partition.assignment(), &[0, 0, 0, 1, 1, 1]);
        assert!(outcome.quality_after > outcome.quality_before);
    }

    #[test]
    fn test_isolated_nodes_stay_alone() {
        let graph = from_pairs(4, &[(0, 1)]).unwrap();
        let mut ctx = sequential();
        let outcome = one_level(&mut ctx, &graph, &Partition::singletons(4)).unwrap();

        let p = &outcome.partition;
        assert_eq!(p.community_of(0), p.community_of(1));
        assert_ne!(p.community_of(2), p.community_of(3));
        assert_ne!(p.community_of(2), p.community_of(0));
    }

    #[test]
    fn test_converged_partition_is_stable() {
        let graph = from_pairs(
            8,
            &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2), (4, 5), (5, 6), (6, 7), (7, 4), (3, 4)],
        )
        .unwrap();
        let mut ctx = sequential();
        let first = one_level(&mut ctx, &graph, &Partition::singletons(8)).unwrap();
        let second = one_level(&mut ctx, &graph, &first.partition).unwrap();

        assert_eq!(second.moves, 0);
        assert!(!second.improved);
        assert_eq!(second.partition, first.partition);
    }

    #[test]
    fn test_node_with_only_a_self_loop_is_isolated() {
        // Node 3 has no link to the triangle it starts in, so staying costs
        // quality and it moves to an empty community.
        let graph = crate::graph::from_edges(
            4,
            crate::graph::GraphKind::Weighted,
            vec![(0, 1, None), (1, 2, None), (0, 2, None), (3, 3, Some(1.0))],
        )
        .unwrap();
        let mut ctx = sequential();
        let outcome = one_level(&mut ctx, &graph, &Partition::from_labels(&[0; 4])).unwrap();

        let p = &outcome.partition;
        assert!(outcome.improved);
        assert_eq!(p.community_count(), 2);
        assert_eq!(p.community_of(0), p.community_of(2));
        assert_ne!(p.community_of(0), p.community_of(3));
    }

    #[test]
    fn test_edgeless_graph_is_a_no_op() {
        let graph = WeightedGraph::empty(3);
        let mut ctx = sequential();
        let outcome = one_level(&mut ctx, &graph, &Partition::singletons(3)).unwrap();

        assert!(!outcome.improved);
        assert_eq!(outcome.passes, 1);
        assert_eq!(outcome.quality_after, 0.0);
        assert!(outcome.partition.is_singletons());
    }

    #[test]
    fn test_partition_of_wrong_size_is_rejected() {
        let graph = from_pairs(3, &[(0, 1), (1, 2)]).unwrap();
        let mut ctx = sequential();

        for partition in [Partition::singletons(2), Partition::singletons(4)] {
            let err = one_level(&mut ctx, &graph, &partition).unwrap_err();
            let fault = match err {
                LouvainError::MalformedInput(fault) => fault,
                other => panic!("unexpected error: {other}"),
            };
            assert_eq!(
                fault,
                InputFault::PartitionMismatch {
                    len: partition.len(),
                    community_count: partition.len(),
                    node_count: 3,
                }
            );
        }
    }

    #[test]
    fn test_pass_cap() {
        let graph = from_pairs(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let mut ctx = RunContext::new(&LouvainConfig::sequential().with_max_passes(1)).unwrap();
        let outcome = one_level(&mut ctx, &graph, &Partition::singletons(4)).unwrap();
        assert_eq!(outcome.passes, 1);
    }
}
