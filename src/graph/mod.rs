//! Graph representation and algorithms module

pub mod algorithms;
pub mod builder;
pub mod centrality;
pub mod weighted;

pub use algorithms::{connected_components, threshold_graph, DisjointSets};
pub use builder::GraphBuilder;
pub use centrality::{node_profiles, NodeProfile};
pub use weighted::{Edge, WeightedGraph};
