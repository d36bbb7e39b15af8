//! Per-community aggregates maintained while nodes move

use crate::community::Partition;
use crate::error::Result;
use crate::graph::WeightedGraph;

/// Marker for a node that is temporarily outside every community
const DETACHED: u32 = u32::MAX;

/// Community aggregate table
///
/// Community ids live in `[0, n)`, so every node can always be given a
/// community of its own. `sigma_tot[c]` is the summed degree of the members of
/// `c`, `sigma_in[c]` the weight of edges with both ends in `c` (each
/// undirected edge once, self-loops included).
#[derive(Debug, Clone)]
pub struct CommunityTable {
    assignment: Vec<u32>,
    sigma_tot: Vec<f64>,
    sigma_in: Vec<f64>,
    sizes: Vec<u32>,
    /// Ids that were empty when pushed; entries may be stale
    free: Vec<u32>,
    total_weight: f64,
}

impl CommunityTable {
    /// Aggregates of `partition` over `graph`
    pub fn new(graph: &WeightedGraph, partition: &Partition) -> Result<Self> {
        partition.check_covers(graph)?;
        let n = graph.node_count();

        let mut sigma_tot = vec![0.0; n];
        let mut sigma_in = vec![0.0; n];
        let mut sizes = vec![0u32; n];

        for node in 0..n {
            let community = partition.community_of(node) as usize;
            sizes[community] += 1;
            sigma_tot[community] += graph.degree(node);
            for (neighbor, weight) in graph.neighbors(node) {
                let neighbor = neighbor as usize;
                if neighbor >= node && partition.community_of(neighbor) as usize == community {
                    sigma_in[community] += weight;
                }
            }
        }

        let free = (0..n as u32).rev().filter(|&c| sizes[c as usize] == 0).collect();

        Ok(Self {
            assignment: partition.assignment().to_vec(),
            sigma_tot,
            sigma_in,
            sizes,
            free,
            total_weight: graph.total_weight(),
        })
    }

    pub fn node_count(&self) -> usize {
        self.assignment.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn community_of(&self, node: usize) -> u32 {
        self.assignment[node]
    }

    pub fn sigma_tot(&self, community: u32) -> f64 {
        self.sigma_tot[community as usize]
    }

    pub fn sigma_in(&self, community: u32) -> f64 {
        self.sigma_in[community as usize]
    }

    pub fn size(&self, community: u32) -> u32 {
        self.sizes[community as usize]
    }

    /// `(sigma_in, sigma_tot)` of every non-empty community
    pub fn occupied(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.sizes
            .iter()
            .enumerate()
            .filter(|(_, &size)| size > 0)
            .map(move |(c, _)| (self.sigma_in[c], self.sigma_tot[c]))
    }

    /// Take `node` out of its community.
    ///
    /// `weight_to_community` is the weight between `node` and the other
    /// members of its community, self-loop excluded.
    pub fn remove(&mut self, node: usize, degree: f64, weight_to_community: f64, self_loop: f64) {
        let community = self.assignment[node];
        debug_assert_ne!(community, DETACHED);

        let c = community as usize;
        self.sigma_tot[c] -= degree;
        self.sigma_in[c] -= weight_to_community + self_loop;
        self.sizes[c] -= 1;
        if self.sizes[c] == 0 {
            // Exact zero keeps rounding residue out of later gains.
            self.sigma_tot[c] = 0.0;
            self.sigma_in[c] = 0.0;
            self.free.push(community);
        }
        self.assignment[node] = DETACHED;
    }

    /// Put a detached `node` into `community`
    pub fn insert(
        &mut self,
        node: usize,
        community: u32,
        degree: f64,
        weight_to_community: f64,
        self_loop: f64,
    ) {
        debug_assert_eq!(self.assignment[node], DETACHED);

        let c = community as usize;
        if self.sizes[c] == 0 && self.free.last() == Some(&community) {
            self.free.pop();
        }
        self.sigma_tot[c] += degree;
        self.sigma_in[c] += weight_to_community + self_loop;
        self.sizes[c] += 1;
        self.assignment[node] = community;
    }

    /// An id with no members, if one exists. The slot is no longer tracked as
    /// free, so the caller is expected to insert into it.
    pub fn take_empty(&mut self) -> Option<u32> {
        while let Some(community) = self.free.pop() {
            if self.sizes[community as usize] == 0 {
                return Some(community);
            }
        }
        None
    }

    /// Dense partition of the current assignment
    pub fn to_partition(&self) -> Partition {
        Partition::from_labels(&self.assignment)
    }
}

/// Scratch space collecting the weight from one node to each neighboring
/// community, reused across nodes of a level.
pub(crate) struct NeighborCommunities {
    weights: Vec<f64>,
    seen: Vec<bool>,
    communities: Vec<u32>,
}

impl NeighborCommunities {
    pub(crate) fn new(node_count: usize) -> Self {
        Self {
            weights: vec![0.0; node_count],
            seen: vec![false; node_count],
            communities: Vec::new(),
        }
    }

    /// Record the communities around `node`. Its own community always comes
    /// first, even without links to it.
    pub(crate) fn collect(&mut self, graph: &WeightedGraph, table: &CommunityTable, node: usize) {
        self.clear();
        self.touch(table.community_of(node));

        for (neighbor, weight) in graph.neighbors(node) {
            if neighbor as usize == node {
                continue;
            }
            let community = table.community_of(neighbor as usize);
            self.touch(community);
            self.weights[community as usize] += weight;
        }
    }

    pub(crate) fn weight(&self, community: u32) -> f64 {
        self.weights[community as usize]
    }

    /// `(community, weight)` in discovery order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.communities.iter().map(move |&c| (c, self.weights[c as usize]))
    }

    fn touch(&mut self, community: u32) {
        let c = community as usize;
        if !self.seen[c] {
            self.seen[c] = true;
            self.communities.push(community);
        }
    }

    fn clear(&mut self) {
        for &c in &self.communities {
            self.weights[c as usize] = 0.0;
            self.seen[c as usize] = false;
        }
        self.communities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::from_pairs;

    #[test]
    fn test_aggregates_of_two_triangles() {
        let graph = from_pairs(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)]).unwrap();
        let partition = Partition::from_labels(&[0, 0, 0, 1, 1, 1]);
        let table = CommunityTable::new(&graph, &partition).unwrap();

        assert_eq!(table.sigma_in(0), 3.0);
        assert_eq!(table.sigma_tot(0), 6.0);
        assert_eq!(table.sigma_in(1), 3.0);
        assert_eq!(table.size(2), 0);

        let tot: f64 = table.occupied().map(|(_, tot)| tot).sum();
        assert_eq!(tot, 2.0 * graph.total_weight());
    }

    #[test]
    fn test_remove_and_insert_restore_aggregates() {
        let graph = from_pairs(3, &[(0, 1), (1, 2), (0, 2)]).unwrap();
        let partition = Partition::from_labels(&[0, 0, 0]);
        let mut table = CommunityTable::new(&graph, &partition).unwrap();

        table.remove(2, graph.degree(2), 2.0, 0.0);
        assert_eq!(table.sigma_in(0), 1.0);
        assert_eq!(table.sigma_tot(0), 4.0);

        table.insert(2, 0, graph.degree(2), 2.0, 0.0);
        assert_eq!(table.sigma_in(0), 3.0);
        assert_eq!(table.sigma_tot(0), 6.0);
        assert_eq!(table.to_partition(), partition);
    }

    #[test]
    fn test_take_empty_skips_refilled_slots() {
        let graph = from_pairs(3, &[(0, 1), (1, 2)]).unwrap();
        let partition = Partition::from_labels(&[0, 0, 1]);
        let mut table = CommunityTable::new(&graph, &partition).unwrap();

        // Slot 2 starts empty.
        assert_eq!(table.take_empty(), Some(2));
        assert_eq!(table.take_empty(), None);

        table.remove(2, graph.degree(2), 0.0, 0.0);
        table.insert(2, 0, graph.degree(2), 1.0, 0.0);
        assert_eq!(table.take_empty(), Some(1));
    }

    #[test]
    fn test_neighbor_communities_lists_own_first() {
        let graph = from_pairs(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        let partition = Partition::from_labels(&[0, 1, 1, 2]);
        let table = CommunityTable::new(&graph, &partition).unwrap();
        let mut scratch = NeighborCommunities::new(4);
        scratch.collect(&graph, &table, 0);

        let seen: Vec<_> = scratch.iter().collect();
        assert_eq!(seen, vec![(0, 0.0), (1, 2.0), (2, 1.0)]);
        assert_eq!(scratch.weight(1), 2.0);
    }
}
