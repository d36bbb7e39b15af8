//! Graph representation and construction module

pub mod builder;
pub mod weighted;

pub use builder::{from_edges, from_pairs, from_petgraph, GraphBuilder, GraphKind};
pub use weighted::WeightedGraph;
