//! Error types for graph construction and community detection

use crate::community::Dendrogram;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, LouvainError>;

/// Reasons an edge list or cached graph is rejected before optimization starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputFault {
    /// An edge references a node outside the declared id space.
    #[error("node {node} is out of range for a graph of {node_count} nodes")]
    NodeOutOfRange { node: u64, node_count: usize },

    /// Node ids must fit the `u32` index space used by the adjacency arrays.
    #[error("graph declares {count} nodes, more than the supported maximum")]
    TooManyNodes { count: u64 },

    /// Weights must be finite and non-negative.
    #[error("edge ({src}, {dst}) has invalid weight {weight}")]
    InvalidWeight { src: u64, dst: u64, weight: f64 },

    /// Weights are finite one by one but their sum is not.
    #[error("edge ({src}, {dst}) with weight {weight} overflows the accumulated weight")]
    WeightOverflow { src: u64, dst: u64, weight: f64 },

    /// A partition does not cover the nodes of the graph it is applied to.
    #[error("partition of {len} nodes and {community_count} communities does not fit {node_count}")]
    PartitionMismatch {
        len: usize,
        community_count: usize,
        node_count: usize,
    },

    /// An explicit weight was supplied for a graph declared unweighted.
    #[error("edge ({src}, {dst}) carries weight {weight} but the graph is unweighted")]
    UnexpectedWeight { src: u64, dst: u64, weight: f64 },

    /// A line of a text edge list could not be parsed.
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A deserialized graph violates the adjacency invariants.
    #[error("corrupted graph: {0}")]
    CorruptGraph(String),
}

/// Errors surfaced by the library.
#[derive(Debug, Error)]
pub enum LouvainError {
    /// The input graph is malformed. Raised before any optimization begins.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] InputFault),

    /// A quality value or aggregated weight became non-finite.
    #[error("numeric instability at level {level}: {detail}")]
    NumericInstability { level: usize, detail: String },

    /// The level loop stopped early. `partial` holds every level completed
    /// before the failure.
    #[error("optimization aborted at level {level}: {source}")]
    Aborted {
        level: usize,
        partial: Dendrogram,
        #[source]
        source: Box<LouvainError>,
    },

    /// Invalid run configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Binary graph cache could not be encoded or decoded.
    #[error("graph cache error: {0}")]
    Cache(#[from] bincode::Error),
}

impl LouvainError {
    /// Dendrogram of the levels completed before an abort, if any.
    pub fn partial_dendrogram(&self) -> Option<&Dendrogram> {
        match self {
            LouvainError::Aborted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_message_names_edge() {
        let err: LouvainError = InputFault::InvalidWeight { src: 3, dst: 7, weight: -1.0 }.into();
        assert_eq!(err.to_string(), "malformed input: edge (3, 7) has invalid weight -1");
    }

    #[test]
    fn test_partial_dendrogram_only_on_abort() {
        let err = LouvainError::Config("precision must be finite".into());
        assert!(err.partial_dendrogram().is_none());

        let aborted = LouvainError::Aborted {
            level: 1,
            partial: Dendrogram::default(),
            source: Box::new(LouvainError::NumericInstability {
                level: 1,
                detail: "quality is NaN".into(),
            }),
        };
        assert_eq!(aborted.partial_dendrogram().map(|d| d.level_count()), Some(0));
    }
}
