//! Consensus clustering of weighted undirected graphs
//!
//! Candidate partitions are folded into a co-membership matrix, the graph is
//! thresholded on it and re-clustered until every candidate agrees. The
//! consistency module then scores edges and nodes by how stable their
//! community membership was.

pub mod cluster;
pub mod config;
pub mod consensus;
pub mod consistency;
pub mod error;
pub mod graph;

pub use cluster::{CommunityDetection, Louvain, Partition};
pub use config::ConsensusConfig;
pub use consensus::{consensus_partition, ConsensusEngine, ConsensusMatrix, ConsensusOutcome};
pub use consistency::{edge_consistency, node_consistency, EdgeConsistency, NodeConsistency};
pub use error::{Error, Result};
pub use graph::{GraphBuilder, WeightedGraph};
