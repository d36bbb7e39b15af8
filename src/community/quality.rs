//! Partition quality functions
//!
//! Modularity of a partition with communities `c`:
//!
//! ```text
//! Q = Σ_c [ in_c / m − γ (tot_c / 2m)² ]
//! ```
//!
//! where `m` is the total edge weight, `in_c` the weight inside `c` (each
//! undirected edge once) and `tot_c` the summed degree of its members.
//!
//! Inserting an isolated node `i` of degree `k_i` into `c`, to which it is
//! linked with weight `k_{i,c}`, changes `Q` by
//!
//! ```text
//! ΔQ = (k_{i,c} − γ k_i tot_c / 2m) / m
//! ```
//!
//! Moving a node between communities is a removal followed by an insertion,
//! so every gain the optimizer needs is a difference of two such terms.

use crate::community::{CommunityTable, Partition};
use crate::config::QualityKind;
use crate::graph::WeightedGraph;
use serde::{Deserialize, Serialize};

/// Capability interface of a partition quality measure
pub trait QualityFunction {
    /// Human readable name
    fn name(&self) -> &'static str;

    /// Quality of `partition` over `graph`, recomputed from scratch in O(n + m).
    fn global_quality(&self, graph: &WeightedGraph, partition: &Partition) -> f64;

    /// Quality from the aggregates of a community table, O(n).
    fn table_quality(&self, table: &CommunityTable) -> f64;

    /// Quality change from inserting an isolated node of degree `node_degree`
    /// into a community with aggregate degree `sigma_tot`, given the weight
    /// between the node and that community.
    fn insertion_gain(
        &self,
        total_weight: f64,
        sigma_tot: f64,
        node_degree: f64,
        weight_to_community: f64,
    ) -> f64;

    /// Exact quality change of moving `node` from its current community to
    /// `target`, in O(degree(node)).
    fn gain_of_move(
        &self,
        node: usize,
        target: u32,
        graph: &WeightedGraph,
        table: &CommunityTable,
    ) -> f64 {
        let own = table.community_of(node);
        if own == target {
            return 0.0;
        }

        let mut weight_to_own = 0.0;
        let mut weight_to_target = 0.0;
        for (neighbor, weight) in graph.neighbors(node) {
            if neighbor as usize == node {
                continue;
            }
            let community = table.community_of(neighbor as usize);
            if community == own {
                weight_to_own += weight;
            } else if community == target {
                weight_to_target += weight;
            }
        }

        let degree = graph.degree(node);
        let m = graph.total_weight();
        let leave = self.insertion_gain(m, table.sigma_tot(own) - degree, degree, weight_to_own);
        let join = self.insertion_gain(m, table.sigma_tot(target), degree, weight_to_target);

        join - leave
    }
}

/// Newman-Girvan modularity with a resolution parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modularity {
    pub resolution: f64,
}

impl Default for Modularity {
    fn default() -> Self {
        Self { resolution: 1.0 }
    }
}

impl Modularity {
    pub fn new(resolution: f64) -> Self {
        Self { resolution }
    }

    fn from_sums(&self, total_weight: f64, sums: impl Iterator<Item = (f64, f64)>) -> f64 {
        if total_weight <= 0.0 {
            return 0.0;
        }
        let m2 = 2.0 * total_weight;
        sums.map(|(inside, tot)| inside / total_weight - self.resolution * (tot / m2) * (tot / m2))
            .sum()
    }
}

impl QualityFunction for Modularity {
    fn name(&self) -> &'static str {
        "modularity"
    }

    fn global_quality(&self, graph: &WeightedGraph, partition: &Partition) -> f64 {
        let k = partition.community_count();
        let mut inside = vec![0.0; k];
        let mut tot = vec![0.0; k];

        for node in 0..graph.node_count() {
            let community = partition.community_of(node) as usize;
            tot[community] += graph.degree(node);
            for (neighbor, weight) in graph.neighbors(node) {
                let neighbor = neighbor as usize;
                if neighbor >= node && partition.community_of(neighbor) as usize == community {
                    inside[community] += weight;
                }
            }
        }

        self.from_sums(graph.total_weight(), inside.into_iter().zip(tot))
    }

    fn table_quality(&self, table: &CommunityTable) -> f64 {
        self.from_sums(table.total_weight(), table.occupied())
    }

    fn insertion_gain(
        &self,
        total_weight: f64,
        sigma_tot: f64,
        node_degree: f64,
        weight_to_community: f64,
    ) -> f64 {
        if total_weight <= 0.0 {
            return 0.0;
        }
        let expected = self.resolution * node_degree * (sigma_tot / (2.0 * total_weight));
        (weight_to_community - expected) / total_weight
    }
}

/// Closed set of quality functions selectable by configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Quality {
    Modularity(Modularity),
}

impl Quality {
    pub fn from_kind(kind: QualityKind, resolution: f64) -> Self {
        match kind {
            QualityKind::Modularity => Quality::Modularity(Modularity::new(resolution)),
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Modularity(Modularity::default())
    }
}

impl QualityFunction for Quality {
    fn name(&self) -> &'static str {
        match self {
            Quality::Modularity(q) => q.name(),
        }
    }

    fn global_quality(&self, graph: &WeightedGraph, partition: &Partition) -> f64 {
        match self {
            Quality::Modularity(q) => q.global_quality(graph, partition),
        }
    }

    fn table_quality(&self, table: &CommunityTable) -> f64 {
        match self {
            Quality::Modularity(q) => q.table_quality(table),
        }
    }

    fn insertion_gain(
        &self,
        total_weight: f64,
        sigma_tot: f64,
        node_degree: f64,
        weight_to_community: f64,
    ) -> f64 {
        match self {
            Quality::Modularity(q) => {
                q.insertion_gain(total_weight, sigma_tot, node_degree, weight_to_community)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::from_pairs;
    use approx::assert_abs_diff_eq;

    fn two_triangles() -> WeightedGraph {
        from_pairs(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)]).unwrap()
    }

    #[test]
    fn test_two_triangles_modularity() {
        let graph = two_triangles();
        let q = Modularity::default();

        let split = Partition::from_labels(&[0, 0, 0, 1, 1, 1]);
        assert_abs_diff_eq!(q.global_quality(&graph, &split), 0.5, epsilon = 1e-12);

        let whole = Partition::from_labels(&[0; 6]);
        assert_abs_diff_eq!(q.global_quality(&graph, &whole), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_table_quality_matches_global() {
        let graph = two_triangles();
        let q = Quality::default();
        let partition = Partition::from_labels(&[0, 0, 1, 1, 2, 2]);
        let table = CommunityTable::new(&graph, &partition).unwrap();
        assert_abs_diff_eq!(
            q.table_quality(&table),
            q.global_quality(&graph, &partition),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_gain_of_move_matches_recomputation() {
        let graph = two_triangles();
        let q = Quality::default();
        let before = Partition::from_labels(&[0, 0, 1, 1, 1, 2]);
        let table = CommunityTable::new(&graph, &before).unwrap();

        // Move node 2 from {2, 3, 4} into {0, 1}.
        let gain = q.gain_of_move(2, 0, &graph, &table);
        let after = Partition::from_labels(&[0, 0, 0, 1, 1, 2]);
        let delta = q.global_quality(&graph, &after) - q.global_quality(&graph, &before);
        assert_abs_diff_eq!(gain, delta, epsilon = 1e-12);
        assert!(gain > 0.0);
    }

    #[test]
    fn test_self_loops_count_as_internal() {
        let graph = crate::graph::from_edges(
            2,
            crate::graph::GraphKind::Weighted,
            vec![(0, 0, Some(2.0)), (0, 1, Some(1.0))],
        )
        .unwrap();
        let q = Modularity::default();
        let partition = Partition::singletons(2);

        // m = 3, tot = (5, 1): 2/3 - (5/6)^2 - (1/6)^2
        let expected = 2.0 / 3.0 - 25.0 / 36.0 - 1.0 / 36.0;
        assert_abs_diff_eq!(q.global_quality(&graph, &partition), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_graph_has_zero_quality() {
        let graph = WeightedGraph::empty(3);
        let q = Modularity::default();
        assert_eq!(q.global_quality(&graph, &Partition::singletons(3)), 0.0);
        assert_eq!(q.insertion_gain(0.0, 0.0, 0.0, 0.0), 0.0);
    }
}
