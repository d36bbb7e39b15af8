//! Community statistics and metrics

use crate::graph::WeightedGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Communities at or above this count are summarized in parallel
const PARALLEL_THRESHOLD: usize = 1000;

/// Number of central nodes reported per community
const CENTRAL_NODES: usize = 5;

/// Summary of one community of the final assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySummary {
    /// Community id
    pub id: u32,

    /// Members (original node indices)
    pub members: Vec<u32>,

    /// Number of members
    pub size: usize,

    /// Weight of edges with both ends inside, self-loops included
    pub internal_weight: f64,

    /// Summed weighted degree of the members
    pub total_degree: f64,

    /// Internal edge weight over the number of member pairs
    pub density: f64,

    /// Members with the highest weighted degree inside the community
    pub central_nodes: Vec<u32>,
}

/// Distribution of community sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeDistribution {
    pub count: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub singletons: usize,
}

/// Summaries of the communities in `assignment`, largest first
pub fn summarize_communities(graph: &WeightedGraph, assignment: &[u32]) -> Vec<CommunitySummary> {
    let community_count = assignment.iter().map(|&c| c as usize + 1).max().unwrap_or(0);

    let mut members = vec![Vec::new(); community_count];
    for (node, &community) in assignment.iter().enumerate() {
        members[community as usize].push(node as u32);
    }

    let summarize =
        |(id, members): (usize, Vec<u32>)| summarize_one(graph, assignment, id as u32, members);

    let mut summaries: Vec<CommunitySummary> = if community_count >= PARALLEL_THRESHOLD {
        members
            .into_par_iter()
            .enumerate()
            .filter(|(_, m)| !m.is_empty())
            .map(summarize)
            .collect()
    } else {
        members
            .into_iter()
            .enumerate()
            .filter(|(_, m)| !m.is_empty())
            .map(summarize)
            .collect()
    };

    // Sort communities by size (largest first)
    summaries.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));

    log::debug!("Summarized {} communities", summaries.len());

    summaries
}

fn summarize_one(
    graph: &WeightedGraph,
    assignment: &[u32],
    id: u32,
    members: Vec<u32>,
) -> CommunitySummary {
    let mut internal_weight = 0.0;
    let mut total_degree = 0.0;
    let mut inner_degrees = Vec::with_capacity(members.len());

    for &node in &members {
        let node_idx = node as usize;
        total_degree += graph.degree(node_idx);

        let mut inner = 0.0;
        for (neighbor, weight) in graph.neighbors(node_idx) {
            if assignment[neighbor as usize] != id {
                continue;
            }
            inner += weight;
            if neighbor >= node {
                internal_weight += weight;
            }
        }
        inner_degrees.push((node, inner));
    }

    let size = members.len();
    let density = if size <= 1 {
        1.0 // By convention, singleton communities have density 1
    } else {
        internal_weight / (size * (size - 1) / 2) as f64
    };

    // Sort by inner degree (highest first), ties by node id
    inner_degrees.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let central_nodes = inner_degrees
        .iter()
        .take(CENTRAL_NODES)
        .map(|&(node, _)| node)
        .collect();

    CommunitySummary {
        id,
        members,
        size,
        internal_weight,
        total_degree,
        density,
        central_nodes,
    }
}

/// Size distribution of a set of summaries
pub fn size_distribution(summaries: &[CommunitySummary]) -> SizeDistribution {
    let mut sizes: Vec<usize> = summaries.iter().map(|s| s.size).collect();
    sizes.sort_unstable();

    let as_f64: Vec<f64> = sizes.iter().map(|&s| s as f64).collect();
    let count = sizes.len();

    let median = match count {
        0 => 0.0,
        n if n % 2 == 1 => as_f64[n / 2],
        n => (as_f64[n / 2 - 1] + as_f64[n / 2]) / 2.0,
    };

    SizeDistribution {
        count,
        min: sizes.first().copied().unwrap_or(0),
        max: sizes.last().copied().unwrap_or(0),
        mean: if count == 0 { 0.0 } else { as_f64.iter().mean() },
        std_dev: if count < 2 { 0.0 } else { as_f64.iter().std_dev() },
        median,
        singletons: sizes.iter().filter(|&&s| s == 1).count(),
    }
}
