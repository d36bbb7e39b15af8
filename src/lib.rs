//! Core library functions for multilevel Louvain community detection

pub mod community;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod storage;

pub use community::{Dendrogram, Louvain, LouvainResult, Partition};
pub use config::LouvainConfig;
pub use error::{LouvainError, Result};
pub use graph::WeightedGraph;
