//! Edge-list loading and preprocessing

pub mod edgelist;
pub mod preprocessing;

pub use edgelist::{load_edge_list, read_edge_list, EdgeList, RawEdge};
pub use preprocessing::{build_graph, renumber, LoadedGraph};
